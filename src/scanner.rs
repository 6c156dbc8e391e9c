//! The scanner: a single linear sweep over the source producing the token
//! array, enforcing JSON grammar without recursive descent (spec.md §4.C).
//!
//! Depth is tracked only through the *back-pointer overload* (spec.md
//! §3.2.2): an Object/Array's child-count payload temporarily holds the
//! index of its enclosing container while it is open, and is rewritten to
//! the final child count at the matching `}`/`]`. This lets the scanner
//! avoid an explicit stack entirely.

use crate::error::{ScanError, ScanErrorKind, Span};
use crate::store::TokenStore;
use crate::token::{self, LargeKind, NO_PARENT, OffsetSize, Tag, build};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Value,
    ValueOrArrayEnd,
    ObjectKey,
    ObjectKeyOrEnd,
    ObjectKeyColon,
    CommaOrObjectEnd,
    CommaOrArrayEnd,
    DocumentEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenKind {
    Object,
    Array,
}

struct Scanner<'b> {
    src: &'b [u8],
    i: usize,
    parent: u64,
    expecting: Expect,
    tokens: Vec<u64>,
    offset_size: Vec<OffsetSize>,
}

/// Run the scanner over `store.source`, appending tokens in place.
pub(crate) fn scan(store: &mut TokenStore<'_>) -> Result<(), ScanError> {
    let bytes: Vec<u8> = store.source().as_bytes().to_vec();
    let mut sc = Scanner {
        src: &bytes,
        i: 0,
        parent: NO_PARENT,
        expecting: Expect::Value,
        tokens: Vec::new(),
        offset_size: Vec::new(),
    };
    sc.run()?;
    store.tokens = sc.tokens;
    store.offset_size = sc.offset_size;
    Ok(())
}

impl<'b> Scanner<'b> {
    fn run(&mut self) -> Result<(), ScanError> {
        loop {
            self.skip_whitespace();
            let Some(&byte) = self.src.get(self.i) else {
                return self.finish_at_eof();
            };

            if self.expecting == Expect::DocumentEnd {
                return Err(ScanError::new(
                    ScanErrorKind::UnexpectedByte { byte: Some(byte), context: "document end" },
                    Span::new(self.i, 1),
                ));
            }

            log::trace!("scan: byte={:?} at {} expecting={:?}", byte as char, self.i, self.expecting);

            match byte {
                b'{' => self.open(OpenKind::Object)?,
                b'[' => self.open(OpenKind::Array)?,
                b'}' => self.close(OpenKind::Object)?,
                b']' => self.close(OpenKind::Array)?,
                b'"' => self.scan_string()?,
                b'-' | b'0'..=b'9' => self.scan_number()?,
                b'n' => self.scan_literal(true)?,
                b't' | b'f' => self.scan_literal(false)?,
                b':' => self.colon()?,
                b',' => self.comma()?,
                other => {
                    return Err(ScanError::new(
                        ScanErrorKind::UnexpectedByte { byte: Some(other), context: "a value" },
                        Span::new(self.i, 1),
                    ));
                }
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&b) = self.src.get(self.i) {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.i += 1,
                _ => break,
            }
        }
    }

    fn finish_at_eof(&mut self) -> Result<(), ScanError> {
        match self.expecting {
            Expect::DocumentEnd => Ok(()),
            Expect::Value if self.parent == NO_PARENT => Err(ScanError::new(
                ScanErrorKind::UnexpectedByte { byte: None, context: "a value" },
                Span::new(self.i, 0),
            )),
            Expect::CommaOrObjectEnd | Expect::ObjectKeyOrEnd | Expect::ObjectKeyColon | Expect::ObjectKey => {
                let open_offset = self.container_open_offset();
                Err(ScanError::new(
                    ScanErrorKind::TruncatedInput { expected: "closing }" },
                    Span::new(self.i, 0),
                )
                .with_secondary(Span::new(open_offset, 1)))
            }
            Expect::CommaOrArrayEnd | Expect::ValueOrArrayEnd | Expect::Value => {
                let open_offset = self.container_open_offset();
                Err(ScanError::new(
                    ScanErrorKind::TruncatedInput { expected: "closing ]" },
                    Span::new(self.i, 0),
                )
                .with_secondary(Span::new(open_offset, 1)))
            }
        }
    }

    fn container_open_offset(&self) -> usize {
        if self.parent == NO_PARENT {
            0
        } else {
            self.offset_size[self.parent as usize].offset()
        }
    }

    fn is_parent_object(&self) -> bool {
        matches!(
            token::decode_tag(self.tokens[self.parent as usize]),
            Tag::Large { kind: LargeKind::Object, .. }
        )
    }

    fn value_follow_up(&self) -> Expect {
        if self.parent == NO_PARENT {
            Expect::DocumentEnd
        } else if self.is_parent_object() {
            Expect::CommaOrObjectEnd
        } else {
            Expect::CommaOrArrayEnd
        }
    }

    fn open(&mut self, kind: OpenKind) -> Result<(), ScanError> {
        if !matches!(self.expecting, Expect::Value | Expect::ValueOrArrayEnd) {
            return Err(ScanError::new(
                ScanErrorKind::UnexpectedByte { byte: Some(self.src[self.i]), context: "a value" },
                Span::new(self.i, 1),
            ));
        }
        let idx = self.tokens.len() as u64;
        let bits = match kind {
            OpenKind::Object => build::object_with_backpointer(self.parent),
            OpenKind::Array => build::array_with_backpointer(self.parent),
        };
        self.tokens.push(bits);
        self.offset_size.push(OffsetSize::narrow(self.i, 1));
        self.parent = idx;
        self.i += 1;
        self.expecting = match kind {
            OpenKind::Object => Expect::ObjectKeyOrEnd,
            OpenKind::Array => Expect::ValueOrArrayEnd,
        };
        Ok(())
    }

    fn close(&mut self, kind: OpenKind) -> Result<(), ScanError> {
        let expect_ok = matches!(
            (self.expecting, kind),
            (Expect::ObjectKeyOrEnd, OpenKind::Object)
                | (Expect::CommaOrObjectEnd, OpenKind::Object)
                | (Expect::ValueOrArrayEnd, OpenKind::Array)
                | (Expect::CommaOrArrayEnd, OpenKind::Array)
        );
        if self.parent == NO_PARENT || !expect_ok {
            return Err(ScanError::new(
                ScanErrorKind::UnexpectedByte { byte: Some(self.src[self.i]), context: "document end" },
                Span::new(self.i, 1),
            ));
        }

        let parent_idx = self.parent as usize;
        let open_offset = self.offset_size[parent_idx].offset();
        let actual_is_object = matches!(
            token::decode_tag(self.tokens[parent_idx]),
            Tag::Large { kind: LargeKind::Object, .. }
        );
        let expected_object = kind == OpenKind::Object;
        if actual_is_object != expected_object {
            let open_kind_name = if actual_is_object { "an object" } else { "an array" };
            return Err(ScanError::new(
                ScanErrorKind::BraceMismatch { open_kind: open_kind_name, open_span: Span::new(open_offset, 1) },
                Span::new(self.i, 1),
            )
            .with_secondary(Span::new(open_offset, 1)));
        }

        let child_count = (self.tokens.len() - parent_idx - 1) as u64;
        let stored_parent = token::container_payload(self.tokens[parent_idx]);
        self.tokens[parent_idx] = build::with_child_count(self.tokens[parent_idx], child_count);
        self.offset_size[parent_idx].set_size(self.i + 1 - open_offset);
        self.parent = stored_parent;
        self.i += 1;

        self.expecting = if self.parent == NO_PARENT {
            Expect::DocumentEnd
        } else if self.is_parent_object() {
            Expect::CommaOrObjectEnd
        } else {
            Expect::CommaOrArrayEnd
        };
        Ok(())
    }

    fn colon(&mut self) -> Result<(), ScanError> {
        if self.expecting != Expect::ObjectKeyColon {
            return Err(ScanError::new(
                ScanErrorKind::UnexpectedByte { byte: Some(b':'), context: "a value" },
                Span::new(self.i, 1),
            ));
        }
        self.i += 1;
        self.expecting = Expect::Value;
        Ok(())
    }

    fn comma(&mut self) -> Result<(), ScanError> {
        match self.expecting {
            Expect::CommaOrObjectEnd => {
                self.i += 1;
                self.expecting = Expect::ObjectKey;
                Ok(())
            }
            Expect::CommaOrArrayEnd => {
                self.i += 1;
                self.expecting = Expect::Value;
                Ok(())
            }
            _ => Err(ScanError::new(
                ScanErrorKind::UnexpectedByte { byte: Some(b','), context: "a value" },
                Span::new(self.i, 1),
            )),
        }
    }

    fn scan_string(&mut self) -> Result<(), ScanError> {
        let is_key = matches!(self.expecting, Expect::ObjectKey | Expect::ObjectKeyOrEnd);
        if !is_key && !matches!(self.expecting, Expect::Value | Expect::ValueOrArrayEnd) {
            return Err(ScanError::new(
                ScanErrorKind::UnexpectedByte { byte: Some(b'"'), context: "a value" },
                Span::new(self.i, 1),
            ));
        }

        let start = self.i;
        self.i += 1; // opening quote
        let mut escaped = false;
        loop {
            let Some(&b) = self.src.get(self.i) else {
                return Err(ScanError::new(ScanErrorKind::UnterminatedString, Span::new(start, self.i - start)));
            };
            match b {
                b'"' => {
                    self.i += 1;
                    break;
                }
                b'\\' => {
                    escaped = true;
                    let Some(&esc) = self.src.get(self.i + 1) else {
                        return Err(ScanError::new(ScanErrorKind::UnterminatedString, Span::new(start, self.i - start)));
                    };
                    match esc {
                        b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' | b'u' => {
                            self.i += 2;
                        }
                        other => {
                            return Err(ScanError::new(ScanErrorKind::BadEscape { byte: other }, Span::new(self.i, 2)));
                        }
                    }
                }
                _ => self.i += 1,
            }
        }

        let bits = if escaped {
            build::string_escaped_unparsed(is_key)
        } else {
            build::string_unparsed(is_key)
        };
        self.tokens.push(bits);
        self.offset_size.push(OffsetSize::narrow(start, self.i - start));

        self.expecting = if is_key { Expect::ObjectKeyColon } else { self.value_follow_up() };
        Ok(())
    }

    fn scan_number(&mut self) -> Result<(), ScanError> {
        if !matches!(self.expecting, Expect::Value | Expect::ValueOrArrayEnd) {
            return Err(ScanError::new(
                ScanErrorKind::UnexpectedByte { byte: Some(self.src[self.i]), context: "a value" },
                Span::new(self.i, 1),
            ));
        }
        let start = self.i;
        self.i += 1;
        self.scan_literal_bytes();
        self.tokens.push(build::number_unparsed());
        self.offset_size.push(OffsetSize::narrow(start, self.i - start));
        self.expecting = self.value_follow_up();
        Ok(())
    }

    fn scan_literal(&mut self, is_null: bool) -> Result<(), ScanError> {
        if !matches!(self.expecting, Expect::Value | Expect::ValueOrArrayEnd) {
            return Err(ScanError::new(
                ScanErrorKind::UnexpectedByte { byte: Some(self.src[self.i]), context: "a value" },
                Span::new(self.i, 1),
            ));
        }
        let start = self.i;
        self.scan_literal_bytes();
        let bits = if is_null { build::null_unparsed() } else { build::bool_unparsed() };
        self.tokens.push(bits);
        self.offset_size.push(OffsetSize::narrow(start, self.i - start));
        self.expecting = self.value_follow_up();
        Ok(())
    }

    /// Greedily consume bytes that could continue a number or bare literal.
    /// Not validated here: malformed literals are caught later by the
    /// value parser (spec.md §4.C: scanning is grammar-only, not lexical).
    fn scan_literal_bytes(&mut self) {
        while let Some(&b) = self.src.get(self.i) {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' | b',' | b']' | b'}' | b'"' | b'{' | b'[' => break,
                _ => self.i += 1,
            }
        }
    }
}
