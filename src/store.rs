//! The token store: owned `tokens[]`/`offsetSize[]`/`escapedStrings[]`
//! arrays plus the source text and file-position metadata (spec.md §3.1,
//! §3.2, §4.B).

use std::borrow::Cow;

use crate::error::StoreError;
use crate::token::{self, LargeKind, OffsetSize, ParsedType, SmallKind, Tag, Type, WideKind};

/// A parsed (or parsing-in-progress) JSON document: the source text plus
/// the depth-first token array.
///
/// `'s` is the lifetime of a borrowed source; [`TokenStore::new_own`]
/// produces a `TokenStore<'static>` that owns its copy of the source.
pub struct TokenStore<'s> {
    pub(crate) source: Cow<'s, str>,
    pub(crate) filename: Option<String>,
    pub(crate) line_offset: u32,
    pub(crate) column_offset: u32,

    /// NaN-boxed (or wide) payload, one per token (spec.md §3.2.2).
    pub(crate) tokens: Vec<u64>,
    /// Offset + size + wide-kind tag, one per token (spec.md §3.2.1).
    pub(crate) offset_size: Vec<OffsetSize>,
    /// Unescape cache; only strings containing `\` populate it (spec.md §3.2.4).
    pub(crate) escaped_strings: Vec<String>,
}

impl<'s> TokenStore<'s> {
    /// Build an empty store over borrowed source text. The scanner (§4.C)
    /// populates `tokens`/`offset_size` by appending to this store.
    pub(crate) fn new_borrow(source: &'s str) -> Self {
        TokenStore {
            source: Cow::Borrowed(source),
            filename: None,
            line_offset: 0,
            column_offset: 0,
            tokens: Vec::new(),
            offset_size: Vec::new(),
            escaped_strings: Vec::new(),
        }
    }

    /// Build an empty store that owns a copy of `source`.
    pub(crate) fn new_own(source: String) -> TokenStore<'static> {
        TokenStore {
            source: Cow::Owned(source),
            filename: None,
            line_offset: 0,
            column_offset: 0,
            tokens: Vec::new(),
            offset_size: Vec::new(),
            escaped_strings: Vec::new(),
        }
    }

    pub(crate) fn with_position(mut self, filename: Option<String>, line_offset: u32, column_offset: u32) -> Self {
        self.filename = filename;
        self.line_offset = line_offset;
        self.column_offset = column_offset;
        self
    }

    /// Validate and accept an externally built store (spec.md §4.B). Used
    /// by tests and by [`crate::writer::Writer::write_json`] when the
    /// subtree being re-emitted came from another `TokenStore`.
    pub fn from_prebuilt(
        source: Cow<'s, str>,
        tokens: Vec<u64>,
        offset_size: Vec<OffsetSize>,
        escaped_strings: Vec<String>,
    ) -> Result<Self, StoreError> {
        if tokens.is_empty() {
            return Err(StoreError::Empty);
        }
        if tokens.len() != offset_size.len() {
            return Err(StoreError::LengthMismatch {
                tokens: tokens.len(),
                offset_size: offset_size.len(),
            });
        }

        let store = TokenStore {
            source,
            filename: None,
            line_offset: 0,
            column_offset: 0,
            tokens,
            offset_size,
            escaped_strings,
        };

        // Rule 3: a single depth-first walk verifying every subtree fits,
        // and that nothing trails the first complete root subtree.
        let first_end = 0 + store.child_count(0) + 1;
        if first_end > store.tokens.len() {
            return Err(StoreError::ChildCountOverflow { token: 0 });
        }
        let mut i = 0;
        while i < store.tokens.len() {
            let end = i + store.child_count(i) + 1;
            if end > store.tokens.len() {
                return Err(StoreError::ChildCountOverflow { token: i });
            }
            i += 1;
        }
        if first_end != store.tokens.len() {
            return Err(StoreError::ExtraneousRootTokens {
                first_complete_end: first_end,
                total: store.tokens.len(),
            });
        }

        // Rules 4/5: object children are keys, and keys are object children.
        for idx in 0..store.tokens.len() {
            if store.type_of(idx) == Type::Object {
                let mut child = idx + 1;
                let limit = idx + 1 + store.child_count(idx);
                while child < limit {
                    if !store.is_key(child) {
                        return Err(StoreError::ObjectChildNotKey { token: child });
                    }
                    child += 1 + store.child_count(child);
                }
            }
        }
        for idx in 0..store.tokens.len() {
            if store.is_key(idx) {
                let mut found_parent = false;
                let mut j = idx;
                loop {
                    if j == 0 {
                        break;
                    }
                    j -= 1;
                    if j + store.child_count(j) + 1 > idx {
                        found_parent = store.type_of(j) == Type::Object
                            && j + 1 <= idx
                            && idx < j + 1 + store.child_count(j);
                        break;
                    }
                }
                if !found_parent {
                    return Err(StoreError::KeyWithoutObjectParent { token: idx });
                }
            }
        }

        // Rule 6: escaped-string indices are in range.
        for idx in 0..store.tokens.len() {
            if store.type_of(idx) == Type::String && store.is_escaped(idx) && store.is_parsed(idx) {
                let index = token::string_cache_index(store.tokens[idx]) as usize;
                if index >= store.escaped_strings.len() {
                    return Err(StoreError::EscapedStringIndexOutOfRange {
                        token: idx,
                        index,
                        cache_len: store.escaped_strings.len(),
                    });
                }
            }
        }

        // Rule 7/8: spans lie within source, strings are at least 2 bytes.
        for idx in 0..store.tokens.len() {
            let os = &store.offset_size[idx];
            let end = os.offset() + os.size();
            if end > store.source.len() {
                return Err(StoreError::SpanOutOfRange { token: idx });
            }
            if store.type_of(idx) == Type::String && os.size() < 2 {
                return Err(StoreError::StringTooShort { token: idx });
            }
        }

        Ok(store)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn filename(&self) -> &str {
        self.filename.as_deref().unwrap_or("<in>")
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn escaped_strings(&self) -> &[String] {
        &self.escaped_strings
    }

    pub(crate) fn offset_size(&self, i: usize) -> &OffsetSize {
        &self.offset_size[i]
    }

    pub(crate) fn payload(&self, i: usize) -> u64 {
        self.tokens[i]
    }

    /// Raw source slice for token `i`, quotes included for strings
    /// (spec.md §4.E `data()`).
    pub fn data(&self, i: usize) -> &str {
        let os = &self.offset_size[i];
        &self.source[os.offset()..os.offset() + os.size()]
    }

    pub fn type_of(&self, i: usize) -> Type {
        match self.offset_size[i].wide_kind() {
            WideKind::F64 | WideKind::U64 | WideKind::I64 => Type::Number,
            WideKind::Narrow => match token::decode_tag(self.tokens[i]) {
                Tag::Small { kind: SmallKind::Null, .. } => Type::Null,
                Tag::Small { kind: SmallKind::Bool, .. } => Type::Bool,
                Tag::Small { kind: SmallKind::Number, .. } => Type::Number,
                Tag::Large { kind: LargeKind::Object, .. } => Type::Object,
                Tag::Large { kind: LargeKind::Array, .. } => Type::Array,
                Tag::Large { kind: LargeKind::String, .. } => Type::String,
            },
        }
    }

    pub fn is_parsed(&self, i: usize) -> bool {
        match self.offset_size[i].wide_kind() {
            WideKind::F64 | WideKind::U64 | WideKind::I64 => true,
            WideKind::Narrow => match token::decode_tag(self.tokens[i]) {
                Tag::Small { parsed, .. } => parsed,
                Tag::Large { parsed, .. } => parsed,
            },
        }
    }

    pub fn parsed_type(&self, i: usize) -> ParsedType {
        match self.offset_size[i].wide_kind() {
            WideKind::F64 => ParsedType::Double,
            WideKind::U64 => ParsedType::UnsignedLong,
            WideKind::I64 => ParsedType::Long,
            WideKind::Narrow => match token::decode_tag(self.tokens[i]) {
                Tag::Small { kind: SmallKind::Number, parsed: false, .. } => ParsedType::None,
                Tag::Small { kind: SmallKind::Number, parsed: true, sub } => {
                    if sub == token::SMALL_SUB_F32 {
                        ParsedType::Float
                    } else if sub == token::SMALL_SUB_U32 {
                        ParsedType::UnsignedInt
                    } else {
                        ParsedType::Int
                    }
                }
                Tag::Small { parsed: true, .. } => ParsedType::Other,
                Tag::Small { parsed: false, .. } => ParsedType::None,
                Tag::Large { parsed: true, .. } => ParsedType::Other,
                Tag::Large { parsed: false, .. } => ParsedType::None,
            },
        }
    }

    pub fn is_number(&self, i: usize) -> bool {
        self.type_of(i) == Type::Number
    }

    /// Whether token `i` is an object key (spec.md §3.2.2/§3.2.3: an
    /// immediate child of an Object whose sole child is the value).
    pub fn is_key(&self, i: usize) -> bool {
        matches!(
            (self.offset_size[i].wide_kind(), token::decode_tag(self.tokens[i])),
            (WideKind::Narrow, Tag::Large { kind: LargeKind::String, is_key: true, .. })
        )
    }

    pub fn is_escaped(&self, i: usize) -> bool {
        matches!(
            (self.offset_size[i].wide_kind(), token::decode_tag(self.tokens[i])),
            (WideKind::Narrow, Tag::Large { kind: LargeKind::String, is_escaped: true, .. })
        )
    }

    /// Total descendant count, defined for all tokens (spec.md §4.A).
    /// Objects/Arrays read their 48-bit payload; key Strings recurse into
    /// their single child; everything else is 0. Never recurses through a
    /// non-key token.
    pub fn child_count(&self, i: usize) -> usize {
        match self.type_of(i) {
            Type::Object | Type::Array => token::container_payload(self.tokens[i]) as usize,
            Type::String if self.is_key(i) => 1 + self.child_count(i + 1),
            _ => 0,
        }
    }

    /// Escaped-string cache index for a parsed, escaped string token.
    pub(crate) fn string_cache_index(&self, i: usize) -> usize {
        token::string_cache_index(self.tokens[i]) as usize
    }

    pub(crate) fn small_payload_u32(&self, i: usize) -> u32 {
        token::small_payload_u32(self.tokens[i])
    }

    pub(crate) fn small_payload_bool(&self, i: usize) -> bool {
        token::small_payload_bool(self.tokens[i])
    }

    pub(crate) fn set_payload(&mut self, i: usize, bits: u64) {
        self.tokens[i] = bits;
    }

    pub(crate) fn set_wide(&mut self, i: usize, kind: WideKind) {
        let os = &mut self.offset_size[i];
        let size = os.size();
        *os = OffsetSize::wide(os.offset(), size, kind);
    }

    /// The value of an already-parsed String token (spec.md §4.D/§4.E).
    /// Zero-copy when the string is unescaped; otherwise reads the
    /// `escapedStrings[]` cache. Asserts the token is a parsed String.
    pub fn parsed_str(&self, i: usize) -> &str {
        debug_assert_eq!(self.type_of(i), Type::String, "parsed_str requires a String token");
        debug_assert!(self.is_parsed(i), "parsed_str requires a parsed token; call parse_string first");
        if self.is_escaped(i) {
            &self.escaped_strings[self.string_cache_index(i)]
        } else {
            let os = &self.offset_size[i];
            &self.source[os.offset() + 1..os.offset() + os.size() - 1]
        }
    }

    pub(crate) fn push_escaped_string(&mut self, s: String) -> usize {
        let idx = self.escaped_strings.len();
        self.escaped_strings.push(s);
        idx
    }
}
