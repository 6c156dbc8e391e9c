//! Writer state-machine assertions and formatting (spec.md §8 W1-W3, E1, E5).

use jsontok::{Parser, ParserOptions, Writer, WriterOptions};

#[test]
#[should_panic]
fn w1_end_object_while_expecting_array_value_asserts() {
    let mut w = Writer::new(WriterOptions::new(), 0, 0);
    w.begin_array();
    w.write(1u32);
    w.end_object();
}

#[test]
#[should_panic]
fn w2_bare_write_while_expecting_object_key_asserts() {
    let mut w = Writer::new(WriterOptions::new(), 0, 0);
    w.begin_object();
    w.write("x");
}

#[test]
fn w3_current_array_size_tracks_element_count() {
    let mut w = Writer::new(WriterOptions::new(), 0, 0);
    w.begin_array();
    assert_eq!(w.current_array_size(), 0);
    w.write(1u32);
    w.write(2u32);
    assert_eq!(w.current_array_size(), 2);
    w.end_array();
}

#[test]
fn e1_minimal_object_token_shape_and_null_lookup() {
    let options = ParserOptions::new().parse_literals().parse_floats().parse_string_keys();
    let parser = Parser::from_string(r#"{"a":1,"b":[true,null]}"#, options).unwrap();
    let store = parser.store();
    assert_eq!(store.len(), 7);
    assert_eq!(store.child_count(0), 6);

    let root = parser.root();
    assert!(root.at("b").at_index(1).is_null());
    assert_eq!(root.at("a").as_float(), 1.0f32);
    assert_eq!(root.at("b").at_index(0).as_bool(), true);
}

#[test]
fn e5_writer_compact_array_wraps_with_trailing_newline() {
    let mut w = Writer::new(WriterOptions::new().wrap(), 2, 0);
    w.begin_compact_array(3);
    for v in 1u32..=5 {
        w.write(v);
    }
    w.end_array();
    assert_eq!(w.to_string(), "[\n  1,2,3,\n  4,5\n]\n");
}

#[test]
fn writer_roundtrips_parsed_document_through_write_json() {
    let options = ParserOptions::new().parse_literals().parse_doubles().parse_strings();
    let parser = Parser::from_string(r#"{"k":[1.5,"x\ty"],"z":null}"#, options).unwrap();
    let mut w = Writer::new(WriterOptions::new(), 0, 0);
    w.write_json(parser.root());
    assert_eq!(w.to_string(), r#"{"k":[1.5,"x\ty"],"z":null}"#);
}
