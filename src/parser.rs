//! Top-level entry points: `ParserOptions`, `Parser::from_string`/`from_file`
//! (spec.md §6.1, §6.3).
//!
//! Mirrors the teacher's `SerializeOptions` shape (plain bool fields, chained
//! `const fn` setters) rather than pulling in a bitflags crate for five
//! options — see SPEC_FULL.md §2.3.

use std::path::Path;

use crate::error::ParseError;
use crate::navigator::Token;
use crate::store::TokenStore;
use crate::value_parser;

/// Which bulk passes to run immediately after scanning (spec.md §6.1).
/// `parse_doubles` takes precedence over `parse_floats` when both are set,
/// matching `parseNumbers`'s documented behavior in the source this was
/// distilled from: asking for both is not an error, Doubles just wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    parse_literals: bool,
    parse_doubles: bool,
    parse_floats: bool,
    parse_string_keys: bool,
    parse_strings: bool,
}

impl ParserOptions {
    pub const fn new() -> Self {
        ParserOptions {
            parse_literals: false,
            parse_doubles: false,
            parse_floats: false,
            parse_string_keys: false,
            parse_strings: false,
        }
    }

    pub const fn parse_literals(mut self) -> Self {
        self.parse_literals = true;
        self
    }

    pub const fn parse_doubles(mut self) -> Self {
        self.parse_doubles = true;
        self
    }

    pub const fn parse_floats(mut self) -> Self {
        self.parse_floats = true;
        self
    }

    /// Parsing strings already implies parsing keys (an object cannot be
    /// iterated by key without them), so this sets both.
    pub const fn parse_string_keys(mut self) -> Self {
        self.parse_string_keys = true;
        self
    }

    pub const fn parse_strings(mut self) -> Self {
        self.parse_strings = true;
        self.parse_string_keys = true;
        self
    }
}

/// A located, fully rendered failure from `Parser::from_string`/`from_file`
/// (spec.md §6.4 format: `jsontok::<op>: <msg> at <file>:<line>:<col>`).
/// Rendered eagerly, since at the point of failure we still hold the
/// `TokenStore` needed to resolve a byte offset into a line/column — the
/// `Error` type itself carries no store reference, so it can outlive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Scan(String),
    Parse(String),
    Io(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Scan(msg) | Error::Parse(msg) | Error::Io(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// A scanned (and optionally bulk-parsed) document plus the options it was
/// built with (spec.md §6.1). Owns the `TokenStore`.
pub struct Parser<'s> {
    store: TokenStore<'s>,
}

impl<'s> Parser<'s> {
    /// Scans `source` and applies `options`'s bulk passes over the whole
    /// store (spec.md §6.1 `from_string`).
    pub fn from_string(source: &'s str, options: ParserOptions) -> Result<Self, Error> {
        Self::from_string_with_position(source, options, None, 0, 0)
    }

    /// `from_string`, but with the diagnostic `filename`/`line_offset`/
    /// `column_offset` spec.md §6.1 says are accepted for error formatting
    /// only — they bias reported positions, never parsing itself.
    pub fn from_string_with_position(
        source: &'s str,
        options: ParserOptions,
        filename: Option<&str>,
        line_offset: u32,
        column_offset: u32,
    ) -> Result<Self, Error> {
        log::debug!("jsontok::parser: from_string, {} bytes", source.len());
        let mut store =
            TokenStore::new_borrow(source).with_position(filename.map(str::to_string), line_offset, column_offset);
        crate::scanner::scan(&mut store).map_err(|e| {
            Error::Scan(e.display(store.source(), store.filename(), store.line_offset, store.column_offset).to_string())
        })?;
        Self::apply_options(&mut store, options)?;
        Ok(Parser { store })
    }

    /// Reads `path`, scans, and applies `options` the same way `from_string`
    /// does, attributing errors to the file's own line/column (spec.md §6.1
    /// `from_file`).
    pub fn from_file(path: impl AsRef<Path>, options: ParserOptions) -> Result<Parser<'static>, Error> {
        let path = path.as_ref();
        log::debug!("jsontok::parser: from_file {}", path.display());
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("jsontok::parse: I/O error reading {}: {e}", path.display())))?;
        let filename = path.to_string_lossy().into_owned();
        let mut store = TokenStore::new_own(source).with_position(Some(filename), 0, 0);
        crate::scanner::scan(&mut store).map_err(|e| {
            Error::Scan(e.display(store.source(), store.filename(), store.line_offset, store.column_offset).to_string())
        })?;
        Self::apply_options(&mut store, options)?;
        Ok(Parser { store })
    }

    fn apply_options(store: &mut TokenStore, options: ParserOptions) -> Result<(), Error> {
        let render = |e: ParseError, store: &TokenStore| {
            Error::Parse(e.display(store.source(), store.filename(), store.line_offset, store.column_offset).to_string())
        };
        if options.parse_literals {
            value_parser::parse_literals(store, 0).map_err(|e| render(e, &*store))?;
        }
        if options.parse_doubles {
            value_parser::parse_doubles(store, 0).map_err(|e| render(e, &*store))?;
        } else if options.parse_floats {
            value_parser::parse_floats(store, 0).map_err(|e| render(e, &*store))?;
        }
        if options.parse_strings {
            value_parser::parse_strings(store, 0).map_err(|e| render(e, &*store))?;
        } else if options.parse_string_keys {
            value_parser::parse_string_keys(store, 0).map_err(|e| render(e, &*store))?;
        }
        Ok(())
    }

    /// The document's single root token.
    pub fn root(&self) -> Token<'_, 's> {
        Token::new(&self.store, 0)
    }

    pub fn store(&self) -> &TokenStore<'s> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TokenStore<'s> {
        &mut self.store
    }

    pub fn source(&self) -> &str {
        self.store.source()
    }
}

/// Accepts a prebuilt token store's source as owned text, for callers that
/// built a `TokenStore` directly via `TokenStore::from_prebuilt`.
impl Parser<'static> {
    pub fn from_prebuilt_store(store: TokenStore<'static>) -> Self {
        Parser { store }
    }
}
