//! Benchmarks for the scan / bulk-parse / write hot paths.
//!
//! No bundled corpus (unlike the teacher's brotli-compressed fixtures): a
//! synthetic array-of-objects document is generated in-process instead,
//! scaled by element count.

use divan::{Bencher, black_box};
use jsontok::{Parser, ParserOptions, Writer, WriterOptions};

fn main() {
    divan::main();
}

fn synthetic_document(elements: usize) -> String {
    let mut out = String::from("[");
    for i in 0..elements {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!(
            r#"{{"id":{i},"name":"item-{i}","score":{:.3},"active":{},"tags":["a","b","c"]}}"#,
            i as f64 * 0.5,
            i % 2 == 0,
        ));
    }
    out.push(']');
    out
}

#[divan::bench(args = [10, 1_000, 100_000])]
fn scan(bencher: Bencher, elements: usize) {
    let doc = synthetic_document(elements);
    bencher.bench(|| {
        let parser = Parser::from_string(black_box(&doc), ParserOptions::new()).unwrap();
        black_box(parser);
    });
}

#[divan::bench(args = [10, 1_000, 100_000])]
fn scan_and_bulk_parse(bencher: Bencher, elements: usize) {
    let doc = synthetic_document(elements);
    let options = ParserOptions::new().parse_literals().parse_doubles().parse_strings();
    bencher.bench(|| {
        let parser = Parser::from_string(black_box(&doc), options).unwrap();
        black_box(parser);
    });
}

#[divan::bench(args = [10, 1_000, 100_000])]
fn write_json_round_trip(bencher: Bencher, elements: usize) {
    let doc = synthetic_document(elements);
    let options = ParserOptions::new().parse_literals().parse_doubles().parse_strings();
    let parser = Parser::from_string(&doc, options).unwrap();
    bencher.bench(|| {
        let mut w = Writer::new(WriterOptions::new(), 0, 0);
        w.write_json(parser.root());
        black_box(w.to_string());
    });
}
