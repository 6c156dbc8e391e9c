//! Escape handling end-to-end (spec.md §8 E4): zero-copy for plain strings,
//! escape-cache population for escaped ones.

use jsontok::{ParsedType, Parser, ParserOptions, Type};

#[test]
fn e4_escaped_string_cache_populated_unescaped_strings_parsed_in_place() {
    let options = ParserOptions::new().parse_strings();
    let mut parser = Parser::from_string(r#"["hi","a\nb","ok"]"#, options).unwrap();
    let store = parser.store_mut();

    assert!(!store.is_escaped(1));
    assert!(store.is_escaped(2));
    assert!(!store.is_escaped(3));

    assert_eq!(store.parsed_str(2), "a\nb");
    assert_eq!(store.escaped_strings(), &["a\nb".to_string()]);

    // The two plain strings never touched the escape cache.
    assert_eq!(store.escaped_strings().len(), 1);
}

#[test]
fn escaped_and_plain_strings_both_report_parsed_type_other() {
    let options = ParserOptions::new().parse_strings();
    let parser = Parser::from_string(r#"["plain","esc\\aped"]"#, options).unwrap();
    let root = parser.root();
    for (_, v) in root.as_array() {
        assert_eq!(v.ty(), Type::String);
        assert_eq!(v.parsed_type(), ParsedType::Other);
    }
}

#[test]
fn all_mandatory_two_char_escapes_decode_correctly() {
    let options = ParserOptions::new().parse_strings();
    let parser = Parser::from_string(r#""\"\\\/\b\f\n\r\t""#, options).unwrap();
    let s = parser.root().as_string();
    assert_eq!(s, "\"\\/\u{0008}\u{000C}\n\r\t");
}

#[test]
fn unicode_escape_decodes_bmp_codepoint() {
    let options = ParserOptions::new().parse_strings();
    let src = "\"caf\\u00e9\"";
    let parser = Parser::from_string(src, options).unwrap();
    assert_eq!(parser.root().as_string(), "caf\u{e9}");
}

#[test]
fn lone_surrogate_unicode_escape_is_rejected() {
    let mut parser = Parser::from_string(r#""\ud800""#, ParserOptions::new()).unwrap();
    let err = jsontok::parse_string(parser.store_mut(), 0);
    assert!(err.is_err());
}

/// The scanner only checks that `\` is followed by `u`, never that four hex
/// digits follow it (scanner.rs only advances past the `u`), so a truncated
/// escape like this reaches `parse_string` as valid, already-scanned input.
#[test]
fn truncated_unicode_escape_is_reported_not_panicked() {
    let mut parser = Parser::from_string(r#""\u12""#, ParserOptions::new()).unwrap();
    let err = jsontok::parse_string(parser.store_mut(), 0).unwrap_err();
    assert!(matches!(err.kind, jsontok::ParseErrorKind::InvalidUnicodeEscape));
}

#[test]
fn unicode_escape_followed_by_non_hex_is_reported_not_panicked() {
    let mut parser = Parser::from_string(r#""\uzzzz""#, ParserOptions::new()).unwrap();
    let err = jsontok::parse_string(parser.store_mut(), 0).unwrap_err();
    assert!(matches!(err.kind, jsontok::ParseErrorKind::InvalidUnicodeEscape));
}
