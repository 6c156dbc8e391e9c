//! Typed-array view: zero-allocation strided access over a homogeneous,
//! already-parsed array's payloads (spec.md §4.F).
//!
//! The source implementation realizes this with templates and a
//! friend-class web; the language-neutral shape the spec calls for (§9) is
//! one `TypedField<T>` trait ("read the T at the fixed offset for kind K")
//! plus a single view type parameterized over it — no runtime polymorphism,
//! monomorphic per `T` (spec.md §9, "Deep inheritance / virtual dispatch").
//!
//! Because `jsontok`'s token record splits kind/value (`tokens[]`) from
//! offset/size (`offsetSize[]`) rather than packing one C-style struct per
//! token, the view reads `tokens[]` through [`TypedField::read`] rather
//! than reinterpreting raw memory — no `unsafe`, same O(1)-per-element
//! cost, and portable regardless of host endianness.

use crate::store::TokenStore;
use crate::token::Type;

/// Reads one `T` out of a token's raw payload. Implemented once per numeric
/// kind below; never user-implementable (sealed via a private supertrait
/// would add ceremony this crate doesn't otherwise use, so it is simply
/// `pub(crate)`).
pub(crate) trait TypedField<T> {
    fn read(store: &TokenStore, index: usize) -> T;
}

pub struct DoubleField;
impl TypedField<f64> for DoubleField {
    fn read(store: &TokenStore, index: usize) -> f64 {
        f64::from_bits(store.payload(index))
    }
}

pub struct FloatField;
impl TypedField<f32> for FloatField {
    fn read(store: &TokenStore, index: usize) -> f32 {
        f32::from_bits(store.small_payload_u32(index))
    }
}

pub struct UnsignedIntField;
impl TypedField<u32> for UnsignedIntField {
    fn read(store: &TokenStore, index: usize) -> u32 {
        store.small_payload_u32(index)
    }
}

pub struct IntField;
impl TypedField<i32> for IntField {
    fn read(store: &TokenStore, index: usize) -> i32 {
        store.small_payload_u32(index) as i32
    }
}

pub struct UnsignedLongField;
impl TypedField<u64> for UnsignedLongField {
    fn read(store: &TokenStore, index: usize) -> u64 {
        store.payload(index)
    }
}

pub struct LongField;
impl TypedField<i64> for LongField {
    fn read(store: &TokenStore, index: usize) -> i64 {
        store.payload(index) as i64
    }
}

/// A strided view over one homogeneous array's already-parsed numeric
/// payloads. `&[T]`-like for the caller (`len`, `get`, `iter`, indexing
/// by `usize`) but not a literal contiguous slice — see module docs.
/// Borrowed from the store; cannot outlive it (spec.md §4.F last line).
pub struct TypedArrayView<'t, 's, T, F> {
    store: &'t TokenStore<'s>,
    base: usize,
    len: usize,
    _field: core::marker::PhantomData<(T, F)>,
}

impl<'t, 's, T, F: TypedField<T>> TypedArrayView<'t, 's, T, F> {
    pub(crate) fn new(store: &'t TokenStore<'s>, array_index: usize) -> Self {
        debug_assert_eq!(store.type_of(array_index), Type::Array, "typed array view requires an Array token");
        let len = store.child_count(array_index);
        TypedArrayView { store, base: array_index + 1, len, _field: core::marker::PhantomData }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, i: usize) -> T {
        debug_assert!(i < self.len, "typed array view index out of range");
        F::read(self.store, self.base + i)
    }

    pub fn iter(&self) -> TypedArrayIter<'_, 't, 's, T, F> {
        TypedArrayIter { view: self, i: 0 }
    }
}

pub struct TypedArrayIter<'v, 't, 's, T, F> {
    view: &'v TypedArrayView<'t, 's, T, F>,
    i: usize,
}

impl<'v, 't, 's, T, F: TypedField<T>> Iterator for TypedArrayIter<'v, 't, 's, T, F> {
    type Item = T;
    fn next(&mut self) -> Option<T> {
        if self.i >= self.view.len {
            return None;
        }
        let v = self.view.get(self.i);
        self.i += 1;
        Some(v)
    }
}

pub type DoubleArrayView<'t, 's> = TypedArrayView<'t, 's, f64, DoubleField>;
pub type FloatArrayView<'t, 's> = TypedArrayView<'t, 's, f32, FloatField>;
pub type UnsignedIntArrayView<'t, 's> = TypedArrayView<'t, 's, u32, UnsignedIntField>;
pub type IntArrayView<'t, 's> = TypedArrayView<'t, 's, i32, IntField>;
pub type UnsignedLongArrayView<'t, 's> = TypedArrayView<'t, 's, u64, UnsignedLongField>;
pub type LongArrayView<'t, 's> = TypedArrayView<'t, 's, i64, LongField>;

/// Strided *bit* view over a Bool array (spec.md §4.F "strided bit view"):
/// each element is the low bit of its token's parsed-bool field.
pub struct BitArrayView<'t, 's> {
    store: &'t TokenStore<'s>,
    base: usize,
    len: usize,
}

impl<'t, 's> BitArrayView<'t, 's> {
    pub(crate) fn new(store: &'t TokenStore<'s>, array_index: usize) -> Self {
        debug_assert_eq!(store.type_of(array_index), Type::Array, "bit array view requires an Array token");
        BitArrayView { store, base: array_index + 1, len: store.child_count(array_index) }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.len, "bit array view index out of range");
        self.store.small_payload_bool(self.base + i)
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}

/// Callback-based iterable over a parsed String array (spec.md §4.F): per
/// element, yields the already-parsed string value.
pub struct StringArrayView<'t, 's> {
    store: &'t TokenStore<'s>,
    base: usize,
    len: usize,
}

impl<'t, 's> StringArrayView<'t, 's> {
    pub(crate) fn new(store: &'t TokenStore<'s>, array_index: usize) -> Self {
        debug_assert_eq!(store.type_of(array_index), Type::Array, "string array view requires an Array token");
        StringArrayView { store, base: array_index + 1, len: store.child_count(array_index) }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, i: usize) -> &'t str {
        debug_assert!(i < self.len, "string array view index out of range");
        self.store.parsed_str(self.base + i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'t str> + '_ {
        let store = self.store;
        let base = self.base;
        (0..self.len).map(move |i| store.parsed_str(base + i))
    }
}
