//! Error types shared by the scanner, value parser, writer and store.
//!
//! All four error enums follow the same shape `facet-json`'s `JsonError`
//! uses: a `kind` plus the `Span`(s) that locate it in the source, with
//! `Display` rendering `jsontok::<op>: <msg> at <file>:<line>:<col>` and
//! `miette::Diagnostic` attaching one labeled span per location cited.

use core::fmt;
use std::fmt::Display;

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first byte.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
}

impl Span {
    pub const fn new(offset: usize, len: usize) -> Self {
        Span { offset, len }
    }
}

/// A 1-based line/column position, resolved on demand from a byte offset.
///
/// Computing this eagerly for every token would cost a linear scan per
/// token; resolving it lazily keeps the hot (error-free) path free of the
/// cost, per spec.md §4.C ("errors are off the fast path").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// Resolve `offset` (relative to `source`) into a line/column pair,
    /// applying the store's `line_offset`/`column_offset` bias (spec.md §3.1).
    pub fn from_offset(source: &str, offset: usize, line_offset: u32, column_offset: u32) -> Self {
        let prefix = &source.as_bytes()[..offset.min(source.len())];
        let mut line: u32 = 1;
        let mut last_newline = None;
        for (i, &b) in prefix.iter().enumerate() {
            if b == b'\n' {
                line += 1;
                last_newline = Some(i);
            }
        }
        let column = match last_newline {
            Some(nl) => (offset - nl) as u32,
            None => offset as u32 + 1,
        };
        let column = if line == 1 {
            column + column_offset
        } else {
            column
        };
        Position {
            line: line + line_offset,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Formats the common `jsontok::<op>: <msg> at <file>:<line>:<col>` suffix
/// (spec.md §6.4). `filename` defaults to `<in>` when the store has none.
fn write_located(
    f: &mut fmt::Formatter<'_>,
    op: &str,
    msg: &dyn Display,
    filename: &str,
    pos: Option<Position>,
) -> fmt::Result {
    match pos {
        Some(pos) => write!(f, "jsontok::{op}: {msg} at {filename}:{pos}"),
        None => write!(f, "jsontok::{op}: {msg}"),
    }
}

/// Errors raised while scanning the raw grammar (spec.md §7.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanErrorKind {
    UnexpectedByte { byte: Option<u8>, context: &'static str },
    UnterminatedString,
    BadEscape { byte: u8 },
    BraceMismatch { open_kind: &'static str, open_span: Span },
    TruncatedInput { expected: &'static str },
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanErrorKind::UnexpectedByte { byte: Some(b), context } => {
                write!(f, "unexpected {:?} at {context}", *b as char)
            }
            ScanErrorKind::UnexpectedByte { byte: None, context } => {
                write!(f, "file too short, expected {context}")
            }
            ScanErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            ScanErrorKind::BadEscape { byte } => {
                write!(f, "unexpected string escape sequence '\\{}'", *byte as char)
            }
            ScanErrorKind::BraceMismatch { open_kind, .. } => {
                write!(f, "unexpected closing bracket for {open_kind} starting at")
            }
            ScanErrorKind::TruncatedInput { expected } => {
                write!(f, "file too short, expected {expected}")
            }
        }
    }
}

/// A scan-time grammar error, with source position attached lazily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub span: Span,
    pub secondary: Option<Span>,
}

impl ScanError {
    pub fn new(kind: ScanErrorKind, span: Span) -> Self {
        ScanError { kind, span, secondary: None }
    }

    pub fn with_secondary(mut self, secondary: Span) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn display<'a>(&'a self, source: &'a str, filename: &'a str, line_offset: u32, column_offset: u32) -> impl Display + 'a {
        struct D<'a> {
            err: &'a ScanError,
            source: &'a str,
            filename: &'a str,
            line_offset: u32,
            column_offset: u32,
        }
        impl fmt::Display for D<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let pos = Position::from_offset(self.source, self.err.span.offset, self.line_offset, self.column_offset);
                write_located(f, "scan", &self.err.kind, self.filename, Some(pos))
            }
        }
        D { err: self, source, filename, line_offset, column_offset }
    }
}

impl std::error::Error for ScanError {}
impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// Errors raised by the deferred value parser (spec.md §7.2-§7.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidNullLiteral,
    InvalidBoolLiteral,
    InvalidNumericLiteral { text: String },
    OutOfRange { text: String, target: &'static str },
    LiteralTooLong,
    InvalidUnicodeEscape,
    ExpectedArray,
    ExpectedHomogeneousType { expected: &'static str, got: &'static str },
    ExpectedSize { expected: usize, got: usize },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidNullLiteral => write!(f, "invalid null literal"),
            ParseErrorKind::InvalidBoolLiteral => write!(f, "invalid bool literal"),
            ParseErrorKind::InvalidNumericLiteral { text } => {
                write!(f, "invalid floating-point literal {text}")
            }
            ParseErrorKind::OutOfRange { text, target } => {
                write!(f, "number {text} out of range for {target}")
            }
            ParseErrorKind::LiteralTooLong => write!(f, "too long numeric literal"),
            ParseErrorKind::InvalidUnicodeEscape => write!(f, "invalid unicode escape sequence"),
            ParseErrorKind::ExpectedArray => write!(f, "token is not an array"),
            ParseErrorKind::ExpectedHomogeneousType { expected, got } => {
                write!(f, "expected array of {expected}, got {got}")
            }
            ParseErrorKind::ExpectedSize { expected, got } => {
                write!(f, "expected array of size {expected}, got {got}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        ParseError { kind, span }
    }

    pub fn display<'a>(&'a self, source: &'a str, filename: &'a str, line_offset: u32, column_offset: u32) -> impl Display + 'a {
        struct D<'a> {
            err: &'a ParseError,
            source: &'a str,
            filename: &'a str,
            line_offset: u32,
            column_offset: u32,
        }
        impl fmt::Display for D<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let pos = Position::from_offset(self.source, self.err.span.offset, self.line_offset, self.column_offset);
                write_located(f, "parse", &self.err.kind, self.filename, Some(pos))
            }
        }
        D { err: self, source, filename, line_offset, column_offset }
    }
}

impl std::error::Error for ParseError {}
impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// Topology violations raised by `TokenStore::from_prebuilt` (spec.md §4.B/§7.9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Empty,
    LengthMismatch { tokens: usize, offset_size: usize },
    ChildCountOverflow { token: usize },
    ExtraneousRootTokens { first_complete_end: usize, total: usize },
    ObjectChildNotKey { token: usize },
    KeyWithoutObjectParent { token: usize },
    EscapedStringIndexOutOfRange { token: usize, index: usize, cache_len: usize },
    SpanOutOfRange { token: usize },
    StringTooShort { token: usize },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Empty => write!(f, "token store must contain at least one token"),
            StoreError::LengthMismatch { tokens, offset_size } => write!(
                f,
                "tokens.len() ({tokens}) != offsetSize.len() ({offset_size})"
            ),
            StoreError::ChildCountOverflow { token } => {
                write!(f, "token {token} declares a child count overflowing its subtree")
            }
            StoreError::ExtraneousRootTokens { first_complete_end, total } => write!(
                f,
                "extraneous root-level tokens: first subtree ends at {first_complete_end}, store has {total}"
            ),
            StoreError::ObjectChildNotKey { token } => {
                write!(f, "immediate child of object at token {token} is not a key string")
            }
            StoreError::KeyWithoutObjectParent { token } => {
                write!(f, "token {token} is marked as a key but is not an immediate child of an object")
            }
            StoreError::EscapedStringIndexOutOfRange { token, index, cache_len } => write!(
                f,
                "token {token} references escaped string {index}, cache has {cache_len} entries"
            ),
            StoreError::SpanOutOfRange { token } => {
                write!(f, "token {token}'s (offset, size) lies outside the source")
            }
            StoreError::StringTooShort { token } => {
                write!(f, "string token {token} is shorter than the two surrounding quotes")
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl miette::Diagnostic for StoreError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new("jsontok::store"))
    }
}

/// Errors surfaced from the writer's non-asserted failure mode (file I/O,
/// spec.md §7.8). State-machine and data-range violations are `assert!`s,
/// matching the teacher's treatment of programming errors.
#[derive(Debug)]
pub enum WriterError {
    Io(std::io::Error),
}

impl fmt::Display for WriterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriterError::Io(e) => write!(f, "jsontok::write: I/O error: {e}"),
        }
    }
}

impl std::error::Error for WriterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriterError::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for WriterError {
    fn from(e: std::io::Error) -> Self {
        WriterError::Io(e)
    }
}

impl miette::Diagnostic for WriterError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new("jsontok::write"))
    }
}

impl miette::Diagnostic for ScanError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new("jsontok::scan"))
    }
    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        let mut labels = vec![miette::LabeledSpan::new(
            Some(self.kind.to_string()),
            self.span.offset,
            self.span.len.max(1),
        )];
        if let Some(secondary) = self.secondary {
            labels.push(miette::LabeledSpan::new(
                Some("opened here".into()),
                secondary.offset,
                secondary.len.max(1),
            ));
        }
        Some(Box::new(labels.into_iter()))
    }
}

impl miette::Diagnostic for ParseError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new("jsontok::parse"))
    }
    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        Some(Box::new(core::iter::once(miette::LabeledSpan::new(
            Some(self.kind.to_string()),
            self.span.offset,
            self.span.len.max(1),
        ))))
    }
}
