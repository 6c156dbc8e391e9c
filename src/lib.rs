#![forbid(unsafe_code)]

//! `jsontok`: a NaN-boxed, two-array JSON token store with a deferred value
//! parser and a streaming writer.
//!
//! Scanning produces a flat, depth-first array of tokens (`Parser::from_string`);
//! values are left unparsed until a caller asks for them, either one at a time
//! (`Token::as_double`, ...) or in bulk over a subtree (`value_parser::parse_doubles`,
//! ...). [`writer::Writer`] is the streaming counterpart: a state-machine
//! emitter that can re-serialize a parsed document via [`writer::Writer::write_json`].

mod error;
mod navigator;
mod parser;
mod scanner;
mod store;
mod token;
mod typed_array;
mod value_parser;
mod writer;

pub use error::{ParseError, ParseErrorKind, ScanError, ScanErrorKind, Span, StoreError, WriterError};
pub use navigator::{ArrayView, ObjectView, Token};
pub use parser::{Error, Parser, ParserOptions};
pub use store::TokenStore;
pub use token::{OffsetSize, ParsedType, Type};
pub use typed_array::{
    BitArrayView, DoubleArrayView, FloatArrayView, IntArrayView, LongArrayView, StringArrayView,
    UnsignedIntArrayView, UnsignedLongArrayView,
};
pub use value_parser::{
    parse_bit_array, parse_bool, parse_double, parse_double_array, parse_float, parse_float_array, parse_int,
    parse_int_array, parse_ints, parse_doubles, parse_floats, parse_literals, parse_long, parse_long_array,
    parse_longs, parse_null, parse_size, parse_size_array, parse_sizes, parse_string, parse_string_array,
    parse_string_keys, parse_strings, parse_unsigned_int, parse_unsigned_int_array, parse_unsigned_ints,
    parse_unsigned_long, parse_unsigned_long_array, parse_unsigned_longs,
};
pub use writer::{Expecting, Null, WriteValue, Writer, WriterOptions};
