//! Deferred value parser properties (spec.md §8 V1-V4) plus E2 (deep nesting).

use jsontok::{Parser, ParserOptions};

#[test]
fn v1_long_double_long_round_trips_within_magnitude_limit() {
    // Plain integer literals (no decimal point/exponent): the one subset of
    // spec.md §8 V1's source grammar that both `parse_long` (integer lexer)
    // and `parse_double` (float lexer) accept.
    for text in ["0", "-1", "123456", "4503599627370495", "-4503599627370495"] {
        let mut parser = Parser::from_string(text, ParserOptions::new()).unwrap();
        let store = parser.store_mut();
        let as_long = jsontok::parse_long(store, 0).unwrap();
        let as_double = jsontok::parse_double(store, 0).unwrap();
        let as_long_again = jsontok::parse_long(store, 0).unwrap();
        assert_eq!(as_long, as_long_again, "reparse must reread source text: {text}");
        assert_eq!(as_double as i64, as_long, "value: {text}");
    }
}

#[test]
fn v2_unsigned_int_write_then_rescan_round_trips() {
    for v in [0u32, 1, 42, 4_294_967_295] {
        let mut w = jsontok::Writer::new(jsontok::WriterOptions::new(), 0, 0);
        w.write(v);
        let rendered = w.to_string().to_string();
        let mut parser = Parser::from_string(&rendered, ParserOptions::new()).unwrap();
        let parsed = jsontok::parse_unsigned_int(parser.store_mut(), 0).unwrap();
        assert_eq!(parsed, v);
    }
}

#[test]
fn v3_unescaped_string_is_zero_copy_from_source() {
    let src = r#""no escapes here""#;
    let mut parser = Parser::from_string(src, ParserOptions::new()).unwrap();
    let s = jsontok::parse_string(parser.store_mut(), 0).unwrap();
    let in_range =
        s.as_ptr() as usize >= src.as_ptr() as usize && (s.as_ptr() as usize) < src.as_ptr() as usize + src.len();
    assert!(in_range, "parsed string should borrow directly from the source buffer");
}

/// For strings containing only the seven two-character escapes, the
/// unescaped char count equals the raw body's char count minus the escape
/// count (each `\X` collapses two source chars into one, spec.md §8 V4).
#[test]
fn v4_escaped_length_equals_raw_minus_escape_count() {
    let cases: &[(&str, usize)] = &[(r#""a\nb""#, 1), (r#""\"\\\/\b\f\n\r\t""#, 8), (r#""tab\there""#, 1)];
    for (raw, escape_count) in cases {
        let body = &raw[1..raw.len() - 1];
        let raw_body_chars = body.chars().count();
        let mut parser = Parser::from_string(raw, ParserOptions::new()).unwrap();
        let parsed = jsontok::parse_string(parser.store_mut(), 0).unwrap();
        assert_eq!(parsed.chars().count(), raw_body_chars - escape_count, "raw: {raw}");
    }
}

/// Reparsing to a narrow target after a wide one must clear the wide-kind
/// tag, or `type_of`/`parsed_type` keep reporting the old wide form while
/// `tokens[i]` holds the new narrow bits (the wide tag wins in `store.rs`'s
/// `type_of`/`parsed_type`, checked before the NaN-boxed tag).
#[test]
fn reparse_from_wide_to_narrow_clears_the_wide_tag() {
    let mut parser = Parser::from_string("42", ParserOptions::new()).unwrap();
    let store = parser.store_mut();
    assert_eq!(jsontok::parse_double(store, 0).unwrap(), 42.0);
    assert_eq!(store.parsed_type(0), jsontok::ParsedType::Double);

    assert_eq!(jsontok::parse_unsigned_int(store, 0).unwrap(), 42u32);
    assert_eq!(store.parsed_type(0), jsontok::ParsedType::UnsignedInt);
    assert_eq!(parser.root().as_unsigned_int(), 42u32);
}

#[test]
fn reparse_from_wide_long_to_narrow_int_clears_the_wide_tag() {
    let mut parser = Parser::from_string("-7", ParserOptions::new()).unwrap();
    let store = parser.store_mut();
    assert_eq!(jsontok::parse_long(store, 0).unwrap(), -7i64);
    assert_eq!(jsontok::parse_int(store, 0).unwrap(), -7i32);
    assert_eq!(store.parsed_type(0), jsontok::ParsedType::Int);
    assert_eq!(parser.root().as_int(), -7i32);
}

#[test]
fn e2_deep_nesting_unwraps_to_leaf() {
    let mut parser = Parser::from_string("[[[[[[42]]]]]]", ParserOptions::new()).unwrap();
    assert_eq!(parser.store().len(), 7);
    jsontok::parse_unsigned_ints(parser.store_mut(), 0).unwrap();
    let root = parser.root();
    let leaf = root
        .at_index(0)
        .at_index(0)
        .at_index(0)
        .at_index(0)
        .at_index(0)
        .at_index(0);
    assert_eq!(leaf.as_unsigned_int(), 42);
}
