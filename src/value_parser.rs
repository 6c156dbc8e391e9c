//! Deferred value parser: turns unparsed Number/literal/String token slices
//! into typed, cached values (spec.md §4.D).
//!
//! Parsing a token is always a full reparse of its source slice when the
//! token is not already parsed to the *target* form — a token cached as
//! `f32` and then asked for as `u64` re-reads the original text rather than
//! widening the cached float, preserving full precision (spec.md §4.D last
//! paragraph).

use lexical_parse_float::FromLexical as _;
use lexical_parse_integer::FromLexical as _;

use crate::error::{ParseError, ParseErrorKind, Span};
use crate::store::TokenStore;
use crate::token::{ParsedType, Type, WideKind, build};

const NUMBER_LITERAL_CAP: usize = 128;
const LONG_MAGNITUDE_LIMIT: u64 = 1 << 52;

fn span_of(store: &TokenStore, i: usize) -> Span {
    let os = store.offset_size(i);
    Span::new(os.offset(), os.size())
}

fn type_name(t: Type) -> &'static str {
    match t {
        Type::Object => "object",
        Type::Array => "array",
        Type::Null => "null",
        Type::Bool => "bool",
        Type::Number => "number",
        Type::String => "string",
    }
}

fn too_long(store: &TokenStore, i: usize) -> ParseError {
    ParseError::new(ParseErrorKind::LiteralTooLong, span_of(store, i))
}

// ---------------------------------------------------------------------
// Per-token parses
// ---------------------------------------------------------------------

/// Parses a Null token. Asserts the token's kind (spec.md §7: "programming
/// error" category — mismatched kind is caller error, not recoverable data).
pub fn parse_null(store: &mut TokenStore, i: usize) -> Result<(), ParseError> {
    debug_assert_eq!(store.type_of(i), Type::Null, "parse_null requires a Null token");
    if store.is_parsed(i) {
        return Ok(());
    }
    if store.data(i) != "null" {
        return Err(ParseError::new(ParseErrorKind::InvalidNullLiteral, span_of(store, i)));
    }
    store.set_payload(i, build::null_parsed());
    Ok(())
}

pub fn parse_bool(store: &mut TokenStore, i: usize) -> Result<bool, ParseError> {
    debug_assert_eq!(store.type_of(i), Type::Bool, "parse_bool requires a Bool token");
    if store.is_parsed(i) {
        return Ok(store.small_payload_bool(i));
    }
    let value = match store.data(i) {
        "true" => true,
        "false" => false,
        _ => return Err(ParseError::new(ParseErrorKind::InvalidBoolLiteral, span_of(store, i))),
    };
    store.set_payload(i, build::bool_parsed(value));
    Ok(value)
}

fn parse_float_text(store: &TokenStore, i: usize) -> Result<f64, ParseError> {
    let text = store.data(i);
    if text.len() > NUMBER_LITERAL_CAP {
        return Err(too_long(store, i));
    }
    match f64::from_lexical(text.as_bytes()) {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::new(
            ParseErrorKind::InvalidNumericLiteral { text: text.to_string() },
            span_of(store, i),
        )),
    }
}

pub fn parse_double(store: &mut TokenStore, i: usize) -> Result<f64, ParseError> {
    debug_assert_eq!(store.type_of(i), Type::Number, "parse_double requires a Number token");
    if store.parsed_type(i) == ParsedType::Double {
        return Ok(f64::from_bits(store.payload(i)));
    }
    let v = parse_float_text(store, i)?;
    store.set_wide(i, WideKind::F64);
    store.set_payload(i, v.to_bits());
    log::trace!("value_parser: token {i} parsed as f64");
    Ok(v)
}

pub fn parse_float(store: &mut TokenStore, i: usize) -> Result<f32, ParseError> {
    debug_assert_eq!(store.type_of(i), Type::Number, "parse_float requires a Number token");
    if store.parsed_type(i) == ParsedType::Float {
        return Ok(f32::from_bits(store.small_payload_u32(i)));
    }
    let text = store.data(i);
    if text.len() > NUMBER_LITERAL_CAP {
        return Err(too_long(store, i));
    }
    let v = match f32::from_lexical(text.as_bytes()) {
        Ok(v) if v.is_finite() => v,
        _ => {
            return Err(ParseError::new(
                ParseErrorKind::InvalidNumericLiteral { text: text.to_string() },
                span_of(store, i),
            ));
        }
    };
    store.set_wide(i, WideKind::Narrow);
    store.set_payload(i, build::number_f32(v.to_bits()));
    log::trace!("value_parser: token {i} parsed as f32");
    Ok(v)
}

fn reject_leading_minus<'s>(store: &'s TokenStore, i: usize, target: &'static str) -> Result<&'s str, ParseError> {
    let text = store.data(i);
    if text.as_bytes().first() == Some(&b'-') {
        return Err(ParseError::new(
            ParseErrorKind::OutOfRange { text: text.to_string(), target },
            span_of(store, i),
        ));
    }
    Ok(text)
}

pub fn parse_unsigned_int(store: &mut TokenStore, i: usize) -> Result<u32, ParseError> {
    debug_assert_eq!(store.type_of(i), Type::Number, "parse_unsigned_int requires a Number token");
    if store.parsed_type(i) == ParsedType::UnsignedInt {
        return Ok(store.small_payload_u32(i));
    }
    if store.data(i).len() > NUMBER_LITERAL_CAP {
        return Err(too_long(store, i));
    }
    let text = reject_leading_minus(store, i, "UnsignedInt")?;
    let v = u32::from_lexical(text.as_bytes()).map_err(|_| {
        ParseError::new(ParseErrorKind::OutOfRange { text: text.to_string(), target: "UnsignedInt" }, span_of(store, i))
    })?;
    store.set_wide(i, WideKind::Narrow);
    store.set_payload(i, build::number_u32(v));
    Ok(v)
}

pub fn parse_int(store: &mut TokenStore, i: usize) -> Result<i32, ParseError> {
    debug_assert_eq!(store.type_of(i), Type::Number, "parse_int requires a Number token");
    if store.parsed_type(i) == ParsedType::Int {
        return Ok(store.small_payload_u32(i) as i32);
    }
    let text = store.data(i);
    if text.len() > NUMBER_LITERAL_CAP {
        return Err(too_long(store, i));
    }
    let v = i32::from_lexical(text.as_bytes())
        .map_err(|_| ParseError::new(ParseErrorKind::OutOfRange { text: text.to_string(), target: "Int" }, span_of(store, i)))?;
    store.set_wide(i, WideKind::Narrow);
    store.set_payload(i, build::number_i32(v));
    Ok(v)
}

pub fn parse_unsigned_long(store: &mut TokenStore, i: usize) -> Result<u64, ParseError> {
    debug_assert_eq!(store.type_of(i), Type::Number, "parse_unsigned_long requires a Number token");
    if store.parsed_type(i) == ParsedType::UnsignedLong {
        return Ok(store.payload(i));
    }
    if store.data(i).len() > NUMBER_LITERAL_CAP {
        return Err(too_long(store, i));
    }
    let text = reject_leading_minus(store, i, "UnsignedLong")?;
    let v = u64::from_lexical(text.as_bytes()).map_err(|_| {
        ParseError::new(ParseErrorKind::OutOfRange { text: text.to_string(), target: "UnsignedLong" }, span_of(store, i))
    })?;
    if v > LONG_MAGNITUDE_LIMIT {
        return Err(ParseError::new(
            ParseErrorKind::OutOfRange { text: text.to_string(), target: "UnsignedLong" },
            span_of(store, i),
        ));
    }
    store.set_wide(i, WideKind::U64);
    store.set_payload(i, v);
    Ok(v)
}

pub fn parse_long(store: &mut TokenStore, i: usize) -> Result<i64, ParseError> {
    debug_assert_eq!(store.type_of(i), Type::Number, "parse_long requires a Number token");
    if store.parsed_type(i) == ParsedType::Long {
        return Ok(store.payload(i) as i64);
    }
    let text = store.data(i);
    if text.len() > NUMBER_LITERAL_CAP {
        return Err(too_long(store, i));
    }
    let v = i64::from_lexical(text.as_bytes())
        .map_err(|_| ParseError::new(ParseErrorKind::OutOfRange { text: text.to_string(), target: "Long" }, span_of(store, i)))?;
    if v.unsigned_abs() >= LONG_MAGNITUDE_LIMIT {
        return Err(ParseError::new(
            ParseErrorKind::OutOfRange { text: text.to_string(), target: "Long" },
            span_of(store, i),
        ));
    }
    store.set_wide(i, WideKind::I64);
    store.set_payload(i, v as u64);
    Ok(v)
}

/// Alias for `parse_unsigned_long` on this (64-bit-host-only) build (spec.md §4.A `asSize`).
pub fn parse_size(store: &mut TokenStore, i: usize) -> Result<u64, ParseError> {
    parse_unsigned_long(store, i)
}

fn decode_hex4(bytes: &[u8]) -> Option<u16> {
    if bytes.len() != 4 {
        return None;
    }
    let mut value = 0u16;
    for &b in bytes {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return None,
        };
        value = (value << 4) | digit as u16;
    }
    Some(value)
}

/// Parses a String token, populating `escaped_strings[]` for escaped strings
/// (spec.md §4.D "String parse"). Returns a reference borrowed either from
/// `source` (unescaped: zero-copy) or from the escape cache.
pub fn parse_string<'s>(store: &'s mut TokenStore, i: usize) -> Result<&'s str, ParseError> {
    debug_assert_eq!(store.type_of(i), Type::String, "parse_string requires a String token");

    if !store.is_escaped(i) {
        if !store.is_parsed(i) {
            let bits = build::string_unescaped(store.is_key(i));
            store.set_payload(i, bits);
        }
        let os = store.offset_size(i);
        let (off, size) = (os.offset(), os.size());
        return Ok(&store.source()[off + 1..off + size - 1]);
    }

    if store.is_parsed(i) {
        let idx = store.string_cache_index(i);
        return Ok(&store.escaped_strings()[idx]);
    }

    let raw = store.data(i);
    let body = &raw[1..raw.len() - 1];
    let bytes = body.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut j = 0;
    while j < bytes.len() {
        let b = bytes[j];
        if b != b'\\' {
            let start = j;
            j += 1;
            while j < bytes.len() && bytes[j] != b'\\' {
                j += 1;
            }
            out.push_str(&body[start..j]);
            continue;
        }
        let esc = bytes[j + 1];
        match esc {
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'b' => out.push('\u{0008}'),
            b'f' => out.push('\u{000C}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'u' => {
                let hex = bytes.get(j + 2..j + 6).ok_or_else(|| {
                    ParseError::new(ParseErrorKind::InvalidUnicodeEscape, span_of(store, i))
                })?;
                let code = decode_hex4(hex)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidUnicodeEscape, span_of(store, i)))?;
                let ch = char::from_u32(code as u32)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidUnicodeEscape, span_of(store, i)))?;
                out.push(ch);
                j += 4;
            }
            other => unreachable!("scanner rejects escape byte {other} before it reaches the value parser"),
        }
        j += 2;
    }

    let idx = store.push_escaped_string(out);
    let bits = build::string_escaped_parsed(store.is_key(i), idx as u64);
    store.set_payload(i, bits);
    log::trace!("value_parser: token {i} unescaped into cache slot {idx}");
    Ok(&store.escaped_strings()[idx])
}

// ---------------------------------------------------------------------
// Bulk (per-subtree) parses
// ---------------------------------------------------------------------

fn subtree_end(store: &TokenStore, root: usize) -> usize {
    root + 1 + store.child_count(root)
}

pub fn parse_literals(store: &mut TokenStore, root: usize) -> Result<(), ParseError> {
    let end = subtree_end(store, root);
    for i in root..end {
        match store.type_of(i) {
            Type::Null if !store.is_parsed(i) => parse_null(store, i)?,
            Type::Bool if !store.is_parsed(i) => {
                parse_bool(store, i)?;
            }
            _ => {}
        }
    }
    Ok(())
}

macro_rules! bulk_numeric {
    ($name:ident, $per_token:ident, $parsed_type:expr) => {
        pub fn $name(store: &mut TokenStore, root: usize) -> Result<(), ParseError> {
            let end = subtree_end(store, root);
            for i in root..end {
                if store.type_of(i) == Type::Number && store.parsed_type(i) != $parsed_type {
                    $per_token(store, i)?;
                }
            }
            Ok(())
        }
    };
}

bulk_numeric!(parse_doubles, parse_double, ParsedType::Double);
bulk_numeric!(parse_floats, parse_float, ParsedType::Float);
bulk_numeric!(parse_unsigned_ints, parse_unsigned_int, ParsedType::UnsignedInt);
bulk_numeric!(parse_ints, parse_int, ParsedType::Int);
bulk_numeric!(parse_unsigned_longs, parse_unsigned_long, ParsedType::UnsignedLong);
bulk_numeric!(parse_longs, parse_long, ParsedType::Long);

/// Alias for `parse_unsigned_longs` (spec.md §4.D "parse_sizes").
pub fn parse_sizes(store: &mut TokenStore, root: usize) -> Result<(), ParseError> {
    parse_unsigned_longs(store, root)
}

pub fn parse_string_keys(store: &mut TokenStore, root: usize) -> Result<(), ParseError> {
    let end = subtree_end(store, root);
    for i in root..end {
        if store.type_of(i) == Type::String && store.is_key(i) && !store.is_parsed(i) {
            parse_string(store, i)?;
        }
    }
    Ok(())
}

pub fn parse_strings(store: &mut TokenStore, root: usize) -> Result<(), ParseError> {
    let end = subtree_end(store, root);
    for i in root..end {
        if store.type_of(i) == Type::String && !store.is_parsed(i) {
            parse_string(store, i)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------
// Per-array entry points
// ---------------------------------------------------------------------

fn check_homogeneous_array(
    store: &TokenStore,
    i: usize,
    kind: Type,
    expected_name: &'static str,
    expected_size: usize,
) -> Result<(), ParseError> {
    if store.type_of(i) != Type::Array {
        return Err(ParseError::new(ParseErrorKind::ExpectedArray, span_of(store, i)));
    }
    let count = store.child_count(i);
    if expected_size != 0 && count != expected_size {
        return Err(ParseError::new(
            ParseErrorKind::ExpectedSize { expected: expected_size, got: count },
            span_of(store, i),
        ));
    }
    let mut child = i + 1;
    while child < i + 1 + count {
        let got = store.type_of(child);
        if got != kind {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedHomogeneousType { expected: expected_name, got: type_name(got) },
                span_of(store, child),
            ));
        }
        child += 1 + store.child_count(child);
    }
    Ok(())
}

macro_rules! array_entry_point {
    ($name:ident, $bulk:ident, $kind:expr, $name_str:expr) => {
        pub fn $name(store: &mut TokenStore, i: usize, expected_size: usize) -> Result<(), ParseError> {
            check_homogeneous_array(store, i, $kind, $name_str, expected_size)?;
            $bulk(store, i)
        }
    };
}

array_entry_point!(parse_double_array, parse_doubles, Type::Number, "number");
array_entry_point!(parse_float_array, parse_floats, Type::Number, "number");
array_entry_point!(parse_unsigned_int_array, parse_unsigned_ints, Type::Number, "number");
array_entry_point!(parse_int_array, parse_ints, Type::Number, "number");
array_entry_point!(parse_unsigned_long_array, parse_unsigned_longs, Type::Number, "number");
array_entry_point!(parse_long_array, parse_longs, Type::Number, "number");
array_entry_point!(parse_string_array, parse_strings, Type::String, "string");

/// Alias for `parse_unsigned_long_array` (spec.md §4.D `parse_size_array`).
pub fn parse_size_array(store: &mut TokenStore, i: usize, expected_size: usize) -> Result<(), ParseError> {
    parse_unsigned_long_array(store, i, expected_size)
}

/// Parses every immediate child of array `i` as a Bool (spec.md §4.D `parse_bit_array`).
pub fn parse_bit_array(store: &mut TokenStore, i: usize, expected_size: usize) -> Result<(), ParseError> {
    check_homogeneous_array(store, i, Type::Bool, "bool", expected_size)?;
    let end = subtree_end(store, i);
    for j in i..end {
        if store.type_of(j) == Type::Bool && !store.is_parsed(j) {
            parse_bool(store, j)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner;

    fn scanned(src: &'static str) -> TokenStore<'static> {
        let mut store = TokenStore::new_borrow(src);
        scanner::scan(&mut store).unwrap();
        store
    }

    #[test]
    fn parses_double_from_unparsed_number() {
        let mut store = scanned("3.5");
        assert_eq!(parse_double(&mut store, 0).unwrap(), 3.5);
        assert_eq!(store.parsed_type(0), ParsedType::Double);
    }

    #[test]
    fn reparse_reads_source_not_cached_value() {
        let mut store = scanned("9007199254740993");
        let as_f32 = parse_float(&mut store, 0).unwrap();
        assert_ne!(as_f32 as i64, 9007199254740993i64);
        let err = parse_long(&mut store, 0);
        assert!(err.is_err(), "2^53+1 exceeds the 2^52 Long magnitude limit");
    }

    #[test]
    fn rejects_leading_minus_for_unsigned() {
        let mut store = scanned("-5");
        assert!(parse_unsigned_int(&mut store, 0).is_err());
    }

    #[test]
    fn unescapes_string_into_cache() {
        let mut store = scanned(r#""a\nb""#);
        let v = parse_string(&mut store, 0).unwrap().to_string();
        assert_eq!(v, "a\nb");
        assert_eq!(store.escaped_strings(), &["a\nb".to_string()]);
    }

    #[test]
    fn unescaped_string_is_zero_copy() {
        let store_src = "\"hello\"";
        let mut store = TokenStore::new_borrow(store_src);
        scanner::scan(&mut store).unwrap();
        let s = parse_string(&mut store, 0).unwrap();
        assert_eq!(s, "hello");
        let ptr_in_range = s.as_ptr() as usize >= store_src.as_ptr() as usize
            && (s.as_ptr() as usize) < store_src.as_ptr() as usize + store_src.len();
        assert!(ptr_in_range);
    }

    #[test]
    fn invalid_double_literal_reports_text() {
        let mut store = scanned("-INF");
        let err = parse_double(&mut store, 0).unwrap_err();
        match err.kind {
            ParseErrorKind::InvalidNumericLiteral { text } => assert_eq!(text, "-INF"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn rejects_too_long_numeric_literal() {
        let long_digits = "1".repeat(129);
        let src: &'static str = Box::leak(long_digits.into_boxed_str());
        let mut store = scanned(src);
        assert!(matches!(parse_double(&mut store, 0).unwrap_err().kind, ParseErrorKind::LiteralTooLong));
    }

    #[test]
    fn bulk_parse_skips_already_parsed_to_target() {
        let mut store = scanned("[1,2,3]");
        parse_doubles(&mut store, 0).unwrap();
        assert!(store.type_of(1) == Type::Number && store.parsed_type(1) == ParsedType::Double);
        parse_doubles(&mut store, 0).unwrap();
    }

    #[test]
    fn array_entry_point_rejects_mixed_types() {
        let mut store = scanned(r#"[1, "a"]"#);
        let err = parse_double_array(&mut store, 0, 0);
        assert!(matches!(err.unwrap_err().kind, ParseErrorKind::ExpectedHomogeneousType { .. }));
    }

    #[test]
    fn array_entry_point_rejects_size_mismatch() {
        let mut store = scanned("[1,2,3]");
        let err = parse_double_array(&mut store, 0, 2);
        assert!(matches!(err.unwrap_err().kind, ParseErrorKind::ExpectedSize { .. }));
    }
}
