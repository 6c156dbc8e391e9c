//! Streaming writer: a state-machine emitter enforcing grammatical validity
//! as values are pushed (spec.md §3.4, §4.G, §4.H).
//!
//! Grounded in the teacher's `JsonSerializer` (`src/serializer.rs`): a byte
//! buffer, a stack of "are we mid-container, have we written anything yet"
//! frames, and a `before_value` hook that inserts separators. This writer
//! generalizes that stack with a third frame kind (`CompactArray`, for
//! wrap-after-N arrays) and derives the spec's six-state `Expecting` enum
//! from the frame stack rather than tracking it redundantly.

use crate::error::WriterError;
use crate::navigator::Token;
use crate::token::{ParsedType, Type};

const LONG_MAGNITUDE_LIMIT: u64 = 1 << 52;

/// Options accepted by [`Writer::new`] (spec.md §6.3).
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterOptions {
    wrap: bool,
    typographical_space: bool,
}

impl WriterOptions {
    pub const fn new() -> Self {
        WriterOptions { wrap: false, typographical_space: false }
    }

    /// Permits `begin_compact_array`'s `wrap_after` to take effect; without
    /// this, compact arrays never wrap regardless of the value passed.
    pub const fn wrap(mut self) -> Self {
        self.wrap = true;
        self
    }

    pub const fn typographical_space(mut self) -> Self {
        self.typographical_space = true;
        self
    }
}

/// Derived, not stored: the spec's six writer states (spec.md §3.4), computed
/// from the top of [`Writer::frames`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expecting {
    Value,
    ArrayValueOrEnd,
    CompactArrayValueOrEnd,
    ObjectKeyOrEnd,
    ObjectValue,
    DocumentEnd,
}

enum Frame {
    Object { count: usize, awaiting_value: bool },
    Array { count: usize },
    CompactArray { count: usize, wrap_after: usize },
}

/// A streaming JSON emitter (spec.md §4.G). Values are pushed via
/// `write`/`begin_object`/`begin_array`/etc.; the writer rejects (via
/// assertion) any call that violates JSON's grammar given what has been
/// written so far.
pub struct Writer {
    buf: Vec<u8>,
    indent_width: u32,
    initial_indentation: u32,
    typographical_space: bool,
    wrap_enabled: bool,
    frames: Vec<Frame>,
    finished: bool,
}

impl Writer {
    /// `indentation` is spaces per nesting level; 0 means fully compact
    /// output. Capped at 8 (spec.md §4.G "Formatting rules").
    pub fn new(options: WriterOptions, indentation: u32, initial_indentation: u32) -> Self {
        assert!(indentation <= 8, "jsontok writer: indentation must be <= 8");
        Writer {
            buf: Vec::new(),
            indent_width: indentation,
            initial_indentation,
            typographical_space: options.typographical_space,
            wrap_enabled: options.wrap,
            frames: Vec::new(),
            finished: false,
        }
    }

    fn expecting(&self) -> Expecting {
        match self.frames.last() {
            None => {
                if self.finished {
                    Expecting::DocumentEnd
                } else {
                    Expecting::Value
                }
            }
            Some(Frame::Object { awaiting_value: true, .. }) => Expecting::ObjectValue,
            Some(Frame::Object { awaiting_value: false, .. }) => Expecting::ObjectKeyOrEnd,
            Some(Frame::Array { .. }) => Expecting::ArrayValueOrEnd,
            Some(Frame::CompactArray { .. }) => Expecting::CompactArrayValueOrEnd,
        }
    }

    /// Number of elements written to the innermost open array (spec.md §8 W3).
    pub fn current_array_size(&self) -> usize {
        match self.frames.last() {
            Some(Frame::Array { count }) => *count,
            Some(Frame::CompactArray { count, .. }) => *count,
            _ => panic!("current_array_size requires an open array"),
        }
    }

    fn push_indent(&mut self, level: usize) {
        if self.indent_width == 0 {
            return;
        }
        self.buf.push(b'\n');
        let total = (self.initial_indentation as usize + level) * self.indent_width as usize;
        self.buf.resize(self.buf.len() + total, b' ');
    }

    fn push_comma(&mut self) {
        self.buf.push(b',');
        if self.typographical_space && self.indent_width == 0 {
            self.buf.push(b' ');
        }
    }

    /// Pre-value formatting shared by object keys and array elements
    /// (spec.md §4.G table footnote, the "†" rule).
    fn format_before_element(&mut self) {
        let level = self.frames.len();
        match self.frames.last_mut() {
            None => {}
            Some(Frame::Object { count, .. }) | Some(Frame::Array { count }) => {
                let count = *count;
                if count > 0 {
                    self.push_comma();
                }
                self.push_indent(level);
            }
            Some(Frame::CompactArray { count, wrap_after }) => {
                let (count, wrap_after) = (*count, *wrap_after);
                if count > 0 {
                    self.push_comma();
                }
                if wrap_after > 0 && count % wrap_after == 0 {
                    self.push_indent(level);
                }
            }
        }
    }

    /// Entry point shared by every "about to write a value" call
    /// (`begin_object`/`begin_array`/`write`/`writeJson` leaves).
    fn enter_value(&mut self) {
        match self.expecting() {
            Expecting::Value | Expecting::ArrayValueOrEnd | Expecting::CompactArrayValueOrEnd => {
                self.format_before_element();
            }
            Expecting::ObjectValue => {}
            other => panic!("jsontok writer: cannot write a value while expecting {other:?}"),
        }
    }

    /// Counterpart to `enter_value`: records that the value just written (or
    /// the container just closed) completed, updating the parent frame.
    fn exit_value(&mut self) {
        match self.frames.last_mut() {
            None => {
                self.finished = true;
                if self.indent_width > 0 && self.initial_indentation == 0 {
                    self.buf.push(b'\n');
                }
            }
            Some(Frame::Object { count, awaiting_value }) => {
                assert!(*awaiting_value, "jsontok writer: value written without a preceding write_key");
                *count += 1;
                *awaiting_value = false;
            }
            Some(Frame::Array { count }) => *count += 1,
            Some(Frame::CompactArray { count, .. }) => *count += 1,
        }
    }

    pub fn begin_object(&mut self) -> &mut Self {
        self.enter_value();
        self.buf.push(b'{');
        self.frames.push(Frame::Object { count: 0, awaiting_value: false });
        self
    }

    pub fn end_object(&mut self) -> &mut Self {
        let frame = self.frames.pop().expect("jsontok writer: end_object without a matching begin_object");
        let count = match frame {
            Frame::Object { count, awaiting_value } => {
                assert!(!awaiting_value, "jsontok writer: end_object with a key still awaiting its value");
                count
            }
            _ => panic!("jsontok writer: end_object does not match the innermost open container (expected an object)"),
        };
        if count > 0 {
            self.push_indent(self.frames.len());
        }
        self.buf.push(b'}');
        self.exit_value();
        self
    }

    pub fn begin_array(&mut self) -> &mut Self {
        self.enter_value();
        self.buf.push(b'[');
        self.frames.push(Frame::Array { count: 0 });
        self
    }

    /// A compact array writes its elements with no per-element newline
    /// unless `wrap_after > 0` and this writer was built with
    /// [`WriterOptions::wrap`], in which case a line break is inserted every
    /// `wrap_after` elements (spec.md §4.G, §8 E5).
    pub fn begin_compact_array(&mut self, wrap_after: usize) -> &mut Self {
        self.enter_value();
        self.buf.push(b'[');
        let wrap_after = if self.wrap_enabled { wrap_after } else { 0 };
        self.frames.push(Frame::CompactArray { count: 0, wrap_after });
        self
    }

    pub fn end_array(&mut self) -> &mut Self {
        let frame = self.frames.pop().expect("jsontok writer: end_array without a matching begin_array");
        let count = match frame {
            Frame::Array { count } => count,
            Frame::CompactArray { count, .. } => count,
            Frame::Object { .. } => panic!("jsontok writer: end_array does not match the innermost open container (expected an array)"),
        };
        if count > 0 {
            self.push_indent(self.frames.len());
        }
        self.buf.push(b']');
        self.exit_value();
        self
    }

    pub fn write_key(&mut self, key: &str) -> &mut Self {
        assert_eq!(self.expecting(), Expecting::ObjectKeyOrEnd, "jsontok writer: write_key requires the ObjectKeyOrEnd state");
        self.format_before_element();
        self.write_quoted_escaped(key);
        self.buf.push(b':');
        if self.typographical_space {
            self.buf.push(b' ');
        }
        if let Some(Frame::Object { awaiting_value, .. }) = self.frames.last_mut() {
            *awaiting_value = true;
        }
        self
    }

    /// Writes a key whose text is already quoted JSON source, e.g. a raw
    /// token slice via [`Token::data`] (spec.md §4.H).
    pub fn write_json_key(&mut self, raw_quoted: &str) -> &mut Self {
        assert_eq!(self.expecting(), Expecting::ObjectKeyOrEnd, "jsontok writer: write_json_key requires the ObjectKeyOrEnd state");
        self.format_before_element();
        self.buf.extend_from_slice(raw_quoted.as_bytes());
        self.buf.push(b':');
        if self.typographical_space {
            self.buf.push(b' ');
        }
        if let Some(Frame::Object { awaiting_value, .. }) = self.frames.last_mut() {
            *awaiting_value = true;
        }
        self
    }

    fn write_quoted_escaped(&mut self, s: &str) {
        self.buf.push(b'"');
        for &b in s.as_bytes() {
            match b {
                b'"' => self.buf.extend_from_slice(b"\\\""),
                b'\\' => self.buf.extend_from_slice(b"\\\\"),
                0x08 => self.buf.extend_from_slice(b"\\b"),
                0x0C => self.buf.extend_from_slice(b"\\f"),
                b'\n' => self.buf.extend_from_slice(b"\\n"),
                b'\r' => self.buf.extend_from_slice(b"\\r"),
                b'\t' => self.buf.extend_from_slice(b"\\t"),
                other => self.buf.push(other),
            }
        }
        self.buf.push(b'"');
    }

    pub fn write<T: WriteValue>(&mut self, value: T) -> &mut Self {
        self.enter_value();
        value.write_value(self);
        self.exit_value();
        self
    }

    /// `begin_compact_array(wrap_after)` + write-each + `end_array` (spec.md §4.G).
    pub fn write_array<T: WriteValue + Copy>(&mut self, values: &[T], wrap_after: usize) -> &mut Self {
        self.begin_compact_array(wrap_after);
        for &v in values {
            self.write(v);
        }
        self.end_array();
        self
    }

    /// Re-emits a token from any parser instance, recursing through
    /// Object/Array children and dispatching leaves on `parsed_type`
    /// (spec.md §4.H).
    pub fn write_json(&mut self, token: Token) -> &mut Self {
        assert!(!token.is_key(), "jsontok writer: write_json cannot re-emit a bare object key; write_json_key(key.data()) it and recurse on its value instead");
        match token.ty() {
            Type::Array => {
                self.begin_array();
                let mut child = token.first_child();
                while let Some(c) = child {
                    self.write_json(c);
                    child = c.next();
                }
                self.end_array();
            }
            Type::Object => {
                self.begin_object();
                let mut child = token.first_child();
                while let Some(key) = child {
                    if key.is_parsed() {
                        self.write_key(key.as_string());
                    } else {
                        self.write_json_key(key.data());
                    }
                    let value = key.first_child().expect("jsontok: key token always has a value child");
                    self.write_json(value);
                    child = key.next();
                }
                self.end_object();
            }
            _ => self.write_leaf(token),
        }
        self
    }

    fn write_leaf(&mut self, token: Token) {
        match token.parsed_type() {
            ParsedType::Double => {
                self.write(token.as_double());
            }
            ParsedType::Float => {
                self.write(token.as_float());
            }
            ParsedType::UnsignedInt => {
                self.write(token.as_unsigned_int());
            }
            ParsedType::Int => {
                self.write(token.as_int());
            }
            ParsedType::UnsignedLong => {
                self.write(token.as_unsigned_long());
            }
            ParsedType::Long => {
                self.write(token.as_long());
            }
            ParsedType::Other => match token.ty() {
                Type::Null => {
                    self.write(Null);
                }
                Type::Bool => {
                    self.write(token.as_bool());
                }
                Type::String => {
                    self.write(token.as_string());
                }
                other => unreachable!("jsontok: parsed_type Other on a {other:?} token is a store defect"),
            },
            ParsedType::None => {
                self.enter_value();
                self.buf.extend_from_slice(token.data().as_bytes());
                self.exit_value();
            }
        }
    }

    /// Returns the document written so far. Requires the document to be
    /// complete (spec.md §6.3).
    pub fn to_string(&self) -> &str {
        assert_eq!(self.expecting(), Expecting::DocumentEnd, "jsontok writer: to_string requires a complete document");
        std::str::from_utf8(&self.buf).expect("jsontok writer: buffer is always valid UTF-8")
    }

    pub fn to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), WriterError> {
        std::fs::write(path, self.to_string())?;
        Ok(())
    }
}

/// A value [`Writer::write`] knows how to encode (spec.md §4.G "Value encoding").
pub trait WriteValue {
    fn write_value(&self, w: &mut Writer);
}

/// Marker type for `write(Null)`, since Rust has no JSON-null primitive.
#[derive(Debug, Clone, Copy)]
pub struct Null;

impl WriteValue for Null {
    fn write_value(&self, w: &mut Writer) {
        w.buf.extend_from_slice(b"null");
    }
}

impl WriteValue for bool {
    fn write_value(&self, w: &mut Writer) {
        w.buf.extend_from_slice(if *self { b"true" } else { b"false" });
    }
}

impl WriteValue for f64 {
    fn write_value(&self, w: &mut Writer) {
        assert!(self.is_finite(), "jsontok writer: cannot write NaN or infinite f64");
        let mut buf = ryu::Buffer::new();
        w.buf.extend_from_slice(buf.format(*self).as_bytes());
    }
}

impl WriteValue for f32 {
    fn write_value(&self, w: &mut Writer) {
        assert!(self.is_finite(), "jsontok writer: cannot write NaN or infinite f32");
        let mut buf = ryu::Buffer::new();
        w.buf.extend_from_slice(buf.format(*self).as_bytes());
    }
}

impl WriteValue for u32 {
    fn write_value(&self, w: &mut Writer) {
        let mut buf = itoa::Buffer::new();
        w.buf.extend_from_slice(buf.format(*self).as_bytes());
    }
}

impl WriteValue for i32 {
    fn write_value(&self, w: &mut Writer) {
        let mut buf = itoa::Buffer::new();
        w.buf.extend_from_slice(buf.format(*self).as_bytes());
    }
}

impl WriteValue for u64 {
    fn write_value(&self, w: &mut Writer) {
        assert!(*self <= LONG_MAGNITUDE_LIMIT, "jsontok writer: u64 must fit within 2^52");
        let mut buf = itoa::Buffer::new();
        w.buf.extend_from_slice(buf.format(*self).as_bytes());
    }
}

impl WriteValue for i64 {
    fn write_value(&self, w: &mut Writer) {
        assert!(self.unsigned_abs() < LONG_MAGNITUDE_LIMIT, "jsontok writer: i64 magnitude must be below 2^52");
        let mut buf = itoa::Buffer::new();
        w.buf.extend_from_slice(buf.format(*self).as_bytes());
    }
}

impl WriteValue for &str {
    fn write_value(&self, w: &mut Writer) {
        w.write_quoted_escaped(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner;
    use crate::store::TokenStore;
    use crate::value_parser;

    #[test]
    fn minimal_object_compact() {
        let mut w = Writer::new(WriterOptions::new(), 0, 0);
        w.begin_object();
        w.write_key("a").write(1u32);
        w.write_key("b").begin_array().write(true).write(Null).end_array();
        w.end_object();
        assert_eq!(w.to_string(), r#"{"a":1,"b":[true,null]}"#);
    }

    #[test]
    fn float_array_round_trip_matches_source() {
        let mut store = TokenStore::new_borrow("[1.5,-2.25,3.125,0]");
        scanner::scan(&mut store).unwrap();
        value_parser::parse_floats(&mut store, 0).unwrap();

        let mut w = Writer::new(WriterOptions::new(), 0, 0);
        w.write_array(&[1.5f32, -2.25, 3.125, 0.0], 0);
        assert_eq!(w.to_string(), "[1.5,-2.25,3.125,0]");
    }

    #[test]
    fn compact_array_wraps_after_n() {
        let mut w = Writer::new(WriterOptions::new().wrap(), 2, 0);
        w.begin_compact_array(3);
        for v in 1u32..=5 {
            w.write(v);
        }
        w.end_array();
        assert_eq!(w.to_string(), "[\n  1,2,3,\n  4,5\n]\n");
    }

    #[test]
    #[should_panic(expected = "expected an object")]
    fn end_object_asserts_in_array_state() {
        let mut w = Writer::new(WriterOptions::new(), 0, 0);
        w.begin_array();
        w.end_object();
    }

    #[test]
    #[should_panic]
    fn write_value_asserts_in_object_key_state() {
        let mut w = Writer::new(WriterOptions::new(), 0, 0);
        w.begin_object();
        w.write("x");
    }

    #[test]
    fn current_array_size_tracks_writes() {
        let mut w = Writer::new(WriterOptions::new(), 0, 0);
        w.begin_array();
        assert_eq!(w.current_array_size(), 0);
        w.write(1u32);
        w.write(2u32);
        assert_eq!(w.current_array_size(), 2);
        w.end_array();
    }

    #[test]
    fn write_json_reemits_parsed_token() {
        let mut store = TokenStore::new_borrow(r#"{"a":1,"b":[true,null]}"#);
        scanner::scan(&mut store).unwrap();
        value_parser::parse_literals(&mut store, 0).unwrap();
        value_parser::parse_unsigned_ints(&mut store, 0).unwrap();
        value_parser::parse_string_keys(&mut store, 0).unwrap();
        let root = Token::new(&store, 0);

        let mut w = Writer::new(WriterOptions::new(), 0, 0);
        w.write_json(root);
        assert_eq!(w.to_string(), r#"{"a":1,"b":[true,null]}"#);
    }
}
