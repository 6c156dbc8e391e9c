//! Round-trip invariants (spec.md §8 R1-R3): scan -> write_json -> rescan
//! preserves token-tree structure, and typed array views agree with
//! per-token parses.

use jsontok::{Parser, ParserOptions, Writer, WriterOptions};

fn kinds_and_counts(parser: &Parser) -> Vec<(jsontok::Type, usize)> {
    let store = parser.store();
    (0..store.len()).map(|i| (store.type_of(i), store.child_count(i))).collect()
}

fn structural_round_trip(src: &str) {
    let options = ParserOptions::new().parse_literals().parse_doubles().parse_strings();
    let original = Parser::from_string(src, options).unwrap();

    let mut w = Writer::new(WriterOptions::new(), 0, 0);
    w.write_json(original.root());
    let rendered = w.to_string().to_string();

    let rescanned = Parser::from_string(&rendered, options).unwrap();
    assert_eq!(kinds_and_counts(&original), kinds_and_counts(&rescanned), "source: {src}");
}

#[test]
fn r1_structural_identity_across_shapes() {
    for src in [
        r#"{"a":1,"b":[true,null]}"#,
        "[[[[[[42]]]]]]",
        r#"{"nested":{"x":[1,2,3],"y":"hi"}}"#,
        "[]",
        "{}",
        r#"["hi","a\nb","ok"]"#,
    ] {
        structural_round_trip(src);
    }
}

#[test]
fn r2_rescanned_values_are_bit_exact() {
    let options = ParserOptions::new().parse_doubles().parse_strings();
    let src = r#"{"pi":3.5,"name":"a\tb","list":[1.0,-2.5]}"#;
    let original = Parser::from_string(src, options).unwrap();

    let mut w = Writer::new(WriterOptions::new(), 0, 0);
    w.write_json(original.root());
    let rendered = w.to_string().to_string();

    let rescanned = Parser::from_string(&rendered, options).unwrap();
    assert_eq!(original.root().at("pi").as_double(), rescanned.root().at("pi").as_double());
    assert_eq!(original.root().at("name").as_string(), rescanned.root().at("name").as_string());
    let orig_list: Vec<f64> = original.root().at("list").as_array().map(|(_, v)| v.as_double()).collect();
    let new_list: Vec<f64> = rescanned.root().at("list").as_array().map(|(_, v)| v.as_double()).collect();
    assert_eq!(orig_list, new_list);
}

#[test]
fn r3_unsigned_int_array_view_matches_per_token_parse() {
    let mut parser = Parser::from_string("[10, 20, 30, 40]", ParserOptions::new()).unwrap();
    jsontok::parse_unsigned_ints(parser.store_mut(), 0).unwrap();
    let root = parser.root();
    assert_eq!(root.common_parsed_array_type(), Some(jsontok::ParsedType::UnsignedInt));
    let view = root.as_unsigned_int_array();
    assert_eq!(view.len(), root.child_count());
    for (i, (_, v)) in root.as_array().enumerate() {
        assert_eq!(view.get(i), v.as_unsigned_int());
    }
}
