//! The token record: a fixed-width, NaN-boxed tagged union (spec.md §3.2, §4.A).
//!
//! A token is two parallel machine words stored in two arrays of equal
//! length, [`TokenStore::offset_size`] and [`TokenStore::payload`]
//! (spec.md §3.2: split deliberately so the hot `child_count`/`is_parsed`/
//! `kind` path never touches the offset/size array, and so §4.F's typed
//! array view can stride over `payload` alone).
//!
//! `OffsetSize` carries the byte range in the source plus a 2-bit
//! "wide-kind" tag (spec.md §3.2.1); `payload` is either a wide kind's
//! plain 64-bit numeric value, or, for narrow kinds, a NaN-boxed tagged
//! value (spec.md §3.2.2).
//!
//! ## The NaN-boxing scheme
//!
//! Bits 63..52 of a narrow payload are fixed to the pattern `0x7FF` (sign
//! 0, exponent all-ones) marking it as a quiet NaN whose low 52 bits we
//! repurpose. Bit 51 then selects one of two tag groups:
//!
//! - **Small** (bit 51 = 0): bits 50..47 hold `[is_number][parsed][sub1][sub0]`;
//!   the low 32 bits (31..0) are the payload. Covers Null, Bool and Number
//!   in its unparsed/f32/u32/i32 parsed forms.
//! - **Large** (bit 51 = 1): bits 50..49 select Object/Array/String; bit 48
//!   is the parsed flag; for String, bits 47/46 are the is-key/is-escaped
//!   flags and the low 46 bits (45..0) hold the escaped-string cache index;
//!   for Object/Array the low 48 bits (47..0) hold the child count.
//!
//! This is a from-scratch bit assignment satisfying the externally visible
//! contract spec.md describes (kinds, payload semantics, accessors) rather
//! than a byte-for-byte port of any specific historical packing — see
//! DESIGN.md for the rationale. spec.md §9 explicitly allows a host to pick
//! its own NaN-boxing bit assignment as long as the contract holds.

use core::fmt;

/// The externally visible JSON type of a token (spec.md §3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Object,
    Array,
    Null,
    Bool,
    Number,
    String,
}

/// The most recently applied parse of a token (spec.md §3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParsedType {
    /// Not parsed: unparsed Number, or unparsed literal/string.
    None,
    Double,
    Float,
    UnsignedInt,
    Int,
    UnsignedLong,
    Long,
    /// Parsed, but the representation is intrinsic: Object, Array, Null,
    /// Bool, or a parsed String.
    Other,
}

/// Alias used by `as_size`/`parse_size` (spec.md §4.A): `UnsignedInt` on
/// 32-bit hosts, `UnsignedLong` on 64-bit hosts. This crate targets 64-bit
/// hosts, so the alias always resolves to `UnsignedLong`.
pub const SIZE_PARSED_TYPE: ParsedType = ParsedType::UnsignedLong;

// ---------------------------------------------------------------------
// OffsetSize: byte range + wide-kind tag
// ---------------------------------------------------------------------

const WIDE_KIND_SHIFT: u32 = 62;
const WIDE_KIND_MASK: u64 = 0b11 << WIDE_KIND_SHIFT;
const SIZE_MASK: u64 = !WIDE_KIND_MASK;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WideKind {
    Narrow,
    F64,
    U64,
    I64,
}

impl WideKind {
    fn from_bits(bits: u64) -> Self {
        match (bits & WIDE_KIND_MASK) >> WIDE_KIND_SHIFT {
            0b00 => WideKind::Narrow,
            0b01 => WideKind::F64,
            0b10 => WideKind::U64,
            0b11 => WideKind::I64,
            _ => unreachable!(),
        }
    }

    fn to_bits(self) -> u64 {
        let tag: u64 = match self {
            WideKind::Narrow => 0b00,
            WideKind::F64 => 0b01,
            WideKind::U64 => 0b10,
            WideKind::I64 => 0b11,
        };
        tag << WIDE_KIND_SHIFT
    }
}

/// Byte offset + size + wide-kind tag for one token (spec.md §3.2.1).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct OffsetSize {
    pub(crate) offset: u32,
    pub(crate) size_and_kind: u64,
}

impl fmt::Debug for OffsetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffsetSize")
            .field("offset", &self.offset)
            .field("size", &self.size())
            .field("wide_kind", &WideKind::from_bits(self.size_and_kind))
            .finish()
    }
}

impl OffsetSize {
    pub(crate) fn narrow(offset: usize, size: usize) -> Self {
        OffsetSize {
            offset: offset as u32,
            size_and_kind: (size as u64) & SIZE_MASK,
        }
    }

    pub(crate) fn wide(offset: usize, size: usize, kind: WideKind) -> Self {
        OffsetSize {
            offset: offset as u32,
            size_and_kind: ((size as u64) & SIZE_MASK) | kind.to_bits(),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    pub fn size(&self) -> usize {
        (self.size_and_kind & SIZE_MASK) as usize
    }

    pub(crate) fn wide_kind(&self) -> WideKind {
        WideKind::from_bits(self.size_and_kind)
    }

    pub(crate) fn set_size(&mut self, size: usize) {
        self.size_and_kind = (self.size_and_kind & WIDE_KIND_MASK) | ((size as u64) & SIZE_MASK);
    }
}

// ---------------------------------------------------------------------
// Payload: the NaN-boxed (or wide) 64-bit field
// ---------------------------------------------------------------------

const NAN_MASK: u64 = 0xFFFu64 << 52;
const NAN_PATTERN: u64 = 0x7FFu64 << 52;
const GROUP_BIT: u64 = 1 << 51;

// Small group (bit 51 == 0): bits 50..47 = [is_number][parsed][sub1][sub0]
const SMALL_IS_NUMBER: u64 = 1 << 50;
const SMALL_PARSED: u64 = 1 << 49;
const SMALL_SUB_SHIFT: u32 = 47;
const SMALL_SUB_MASK: u64 = 0b11 << SMALL_SUB_SHIFT;
const SMALL_PAYLOAD_MASK: u64 = 0xFFFF_FFFF;

const SMALL_SUB_BOOL: u64 = 0b01 << SMALL_SUB_SHIFT; // literal: Null=0, Bool=1 encoded via sub1 bit
pub(crate) const SMALL_SUB_F32: u64 = 0b00 << SMALL_SUB_SHIFT;
pub(crate) const SMALL_SUB_U32: u64 = 0b01 << SMALL_SUB_SHIFT;
pub(crate) const SMALL_SUB_I32: u64 = 0b10 << SMALL_SUB_SHIFT;

// Large group (bit 51 == 1): bits 50..49 = container kind, bit 48 = parsed
const LARGE_KIND_SHIFT: u32 = 49;
const LARGE_KIND_MASK: u64 = 0b11 << LARGE_KIND_SHIFT;
const LARGE_KIND_OBJECT: u64 = 0b00 << LARGE_KIND_SHIFT;
const LARGE_KIND_ARRAY: u64 = 0b01 << LARGE_KIND_SHIFT;
const LARGE_KIND_STRING: u64 = 0b10 << LARGE_KIND_SHIFT;
const LARGE_PARSED: u64 = 1 << 48;
const LARGE_IS_KEY: u64 = 1 << 47;
const LARGE_IS_ESCAPED: u64 = 1 << 46;

const CONTAINER_PAYLOAD_MASK: u64 = (1 << 48) - 1; // low 48 bits
const STRING_PAYLOAD_MASK: u64 = (1 << 46) - 1; // low 46 bits, below the key/escaped flags

/// Sentinel child-count/back-pointer value meaning "no parent" (spec.md §3.2.2).
pub const NO_PARENT: u64 = CONTAINER_PAYLOAD_MASK;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SmallKind {
    Null,
    Bool,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LargeKind {
    Object,
    Array,
    String,
}

/// Decoded view of a narrow token's tag bits, used internally by the
/// navigator and value parser. Never constructed for wide (parsed f64/u64/i64) tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag {
    Small { kind: SmallKind, parsed: bool, sub: u64 },
    Large { kind: LargeKind, parsed: bool, is_key: bool, is_escaped: bool },
}

pub(crate) fn decode_tag(bits: u64) -> Tag {
    debug_assert_eq!(
        bits & NAN_MASK,
        NAN_PATTERN,
        "narrow payload must be NaN-boxed; a non-NaN-boxed narrow token is a store defect"
    );
    if bits & GROUP_BIT == 0 {
        let is_number = bits & SMALL_IS_NUMBER != 0;
        let parsed = bits & SMALL_PARSED != 0;
        let sub = bits & SMALL_SUB_MASK;
        let kind = if is_number {
            SmallKind::Number
        } else if sub == SMALL_SUB_BOOL {
            SmallKind::Bool
        } else {
            SmallKind::Null
        };
        Tag::Small { kind, parsed, sub }
    } else {
        let kind = match bits & LARGE_KIND_MASK {
            LARGE_KIND_OBJECT => LargeKind::Object,
            LARGE_KIND_ARRAY => LargeKind::Array,
            LARGE_KIND_STRING => LargeKind::String,
            _ => unreachable!("reserved large container kind"),
        };
        Tag::Large {
            kind,
            parsed: bits & LARGE_PARSED != 0,
            is_key: bits & LARGE_IS_KEY != 0,
            is_escaped: bits & LARGE_IS_ESCAPED != 0,
        }
    }
}

/// Narrow-payload constructors. Each returns the raw `u64` to store in
/// `TokenStore::payload`.
pub(crate) mod build {
    use super::*;

    pub fn null_unparsed() -> u64 {
        NAN_PATTERN
    }
    pub fn null_parsed() -> u64 {
        NAN_PATTERN | SMALL_PARSED
    }
    pub fn bool_unparsed() -> u64 {
        NAN_PATTERN | SMALL_SUB_BOOL
    }
    pub fn bool_parsed(value: bool) -> u64 {
        NAN_PATTERN | SMALL_SUB_BOOL | SMALL_PARSED | (value as u64)
    }
    pub fn number_unparsed() -> u64 {
        NAN_PATTERN | SMALL_IS_NUMBER
    }
    pub fn number_f32(bits: u32) -> u64 {
        NAN_PATTERN | SMALL_IS_NUMBER | SMALL_PARSED | SMALL_SUB_F32 | (bits as u64 & SMALL_PAYLOAD_MASK)
    }
    pub fn number_u32(value: u32) -> u64 {
        NAN_PATTERN | SMALL_IS_NUMBER | SMALL_PARSED | SMALL_SUB_U32 | (value as u64 & SMALL_PAYLOAD_MASK)
    }
    pub fn number_i32(value: i32) -> u64 {
        NAN_PATTERN
            | SMALL_IS_NUMBER
            | SMALL_PARSED
            | SMALL_SUB_I32
            | (value as u32 as u64 & SMALL_PAYLOAD_MASK)
    }

    pub fn object_with_backpointer(parent: u64) -> u64 {
        NAN_PATTERN | LARGE_KIND_OBJECT | (parent & CONTAINER_PAYLOAD_MASK)
    }
    pub fn array_with_backpointer(parent: u64) -> u64 {
        NAN_PATTERN | LARGE_KIND_ARRAY | (parent & CONTAINER_PAYLOAD_MASK)
    }
    pub fn with_child_count(bits: u64, child_count: u64) -> u64 {
        (bits & !CONTAINER_PAYLOAD_MASK & !LARGE_PARSED) | LARGE_PARSED | (child_count & CONTAINER_PAYLOAD_MASK)
    }

    /// A plain (non-escaped) string straight off the scanner: not yet
    /// parsed. `parse_string` on one of these just flips the parsed bit.
    pub fn string_unparsed(is_key: bool) -> u64 {
        let mut bits = NAN_PATTERN | LARGE_KIND_STRING;
        if is_key {
            bits |= LARGE_IS_KEY;
        }
        bits
    }
    pub fn string_unescaped(is_key: bool) -> u64 {
        let mut bits = NAN_PATTERN | LARGE_KIND_STRING | LARGE_PARSED;
        if is_key {
            bits |= LARGE_IS_KEY;
        }
        bits
    }
    pub fn string_escaped_unparsed(is_key: bool) -> u64 {
        let mut bits = NAN_PATTERN | LARGE_KIND_STRING | LARGE_IS_ESCAPED;
        if is_key {
            bits |= LARGE_IS_KEY;
        }
        bits
    }
    pub fn string_escaped_parsed(is_key: bool, cache_index: u64) -> u64 {
        let mut bits =
            NAN_PATTERN | LARGE_KIND_STRING | LARGE_IS_ESCAPED | LARGE_PARSED | (cache_index & STRING_PAYLOAD_MASK);
        if is_key {
            bits |= LARGE_IS_KEY;
        }
        bits
    }
}

/// Raw accessors used by the navigator/value parser modules.
pub(crate) fn container_payload(bits: u64) -> u64 {
    bits & CONTAINER_PAYLOAD_MASK
}
pub(crate) fn string_cache_index(bits: u64) -> u64 {
    bits & STRING_PAYLOAD_MASK
}
pub(crate) fn small_payload_u32(bits: u64) -> u32 {
    (bits & SMALL_PAYLOAD_MASK) as u32
}
pub(crate) fn small_payload_bool(bits: u64) -> bool {
    (bits & 1) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_round_trips() {
        let bits = build::null_parsed();
        match decode_tag(bits) {
            Tag::Small { kind: SmallKind::Null, parsed: true, .. } => {}
            other => panic!("unexpected tag {other:?}"),
        }
    }

    #[test]
    fn bool_round_trips() {
        let bits = build::bool_parsed(true);
        match decode_tag(bits) {
            Tag::Small { kind: SmallKind::Bool, parsed: true, .. } => {
                assert!(small_payload_bool(bits));
            }
            other => panic!("unexpected tag {other:?}"),
        }
    }

    #[test]
    fn number_f32_round_trips() {
        let value = 3.5f32;
        let bits = build::number_f32(value.to_bits());
        match decode_tag(bits) {
            Tag::Small { kind: SmallKind::Number, parsed: true, sub } => {
                assert_eq!(sub, SMALL_SUB_F32);
                assert_eq!(f32::from_bits(small_payload_u32(bits)), value);
            }
            other => panic!("unexpected tag {other:?}"),
        }
    }

    #[test]
    fn number_i32_round_trips() {
        let bits = build::number_i32(-42);
        match decode_tag(bits) {
            Tag::Small { kind: SmallKind::Number, parsed: true, sub } => {
                assert_eq!(sub, SMALL_SUB_I32);
                assert_eq!(small_payload_u32(bits) as i32, -42);
            }
            other => panic!("unexpected tag {other:?}"),
        }
    }

    #[test]
    fn object_back_pointer_then_child_count() {
        let bits = build::object_with_backpointer(NO_PARENT);
        assert_eq!(container_payload(bits), NO_PARENT);
        let bits = build::with_child_count(bits, 7);
        match decode_tag(bits) {
            Tag::Large { kind: LargeKind::Object, parsed: true, .. } => {
                assert_eq!(container_payload(bits), 7);
            }
            other => panic!("unexpected tag {other:?}"),
        }
    }

    #[test]
    fn string_escaped_cache_index_round_trips() {
        let bits = build::string_escaped_parsed(true, 12345);
        match decode_tag(bits) {
            Tag::Large { kind: LargeKind::String, parsed: true, is_key: true, is_escaped: true } => {
                assert_eq!(string_cache_index(bits), 12345);
            }
            other => panic!("unexpected tag {other:?}"),
        }
    }

    #[test]
    fn wide_kind_round_trips() {
        let os = OffsetSize::wide(10, 20, WideKind::F64);
        assert_eq!(os.offset(), 10);
        assert_eq!(os.size(), 20);
        assert_eq!(os.wide_kind(), WideKind::F64);
    }

    #[test]
    fn narrow_size_preserves_kind_bits_zero() {
        let os = OffsetSize::narrow(5, 9);
        assert_eq!(os.wide_kind(), WideKind::Narrow);
        assert_eq!(os.size(), 9);
    }
}
