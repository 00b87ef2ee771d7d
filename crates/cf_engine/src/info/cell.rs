//! Containers for static storage of type information.
//!
//! - [`NonGenericInfoCell`]: a [`OnceLock`], for non-generic types.
//! - [`GenericInfoCell`] and [`GenericPathCell`]: the `static` inside a
//!   generic function is shared by every instantiation, so these hold a
//!   [`TypeIdMap`] behind a [`RwLock`].
//!
//! Values are built outside the lock and leaked on insert, so building
//! one type's info may freely ask for another's.

use alloc::boxed::Box;
use alloc::string::String;
use core::any::{Any, TypeId};
use std::sync::{OnceLock, PoisonError, RwLock};

use cf_utils::TypeIdMap;

use crate::info::TypeInfo;

// -----------------------------------------------------------------------------
// NonGenericInfoCell

/// Storage of a non-generic type's [`TypeInfo`].
///
/// ```ignore
/// impl Typed for Foo {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: NonGenericInfoCell = NonGenericInfoCell::new();
///         CELL.get_or_init(|| TypeInfo::Object(ObjectInfo::new::<Foo>(/* .. */)))
///     }
/// }
/// ```
pub struct NonGenericInfoCell(OnceLock<TypeInfo>);

impl NonGenericInfoCell {
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    #[inline]
    pub fn get_or_init(&self, f: impl FnOnce() -> TypeInfo) -> &TypeInfo {
        self.0.get_or_init(f)
    }
}

// -----------------------------------------------------------------------------
// GenericCell

mod sealed {
    pub trait CellValue: Send + Sync + 'static {}

    impl CellValue for super::TypeInfo {}
    impl CellValue for str {}
}

/// Storage of per-instantiation values of a generic type.
pub struct GenericCell<T: sealed::CellValue + ?Sized>(RwLock<TypeIdMap<&'static T>>);

/// Storage of a generic type's [`TypeInfo`].
pub type GenericInfoCell = GenericCell<TypeInfo>;

/// Storage of a generic type's path or name.
pub type GenericPathCell = GenericCell<str>;

impl<T: sealed::CellValue + ?Sized> GenericCell<T> {
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(TypeIdMap::new()))
    }

    #[inline(never)]
    fn get_by_type_id(&self, type_id: TypeId) -> Option<&'static T> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied()
    }

    #[inline(never)]
    fn insert_by_type_id(&self, type_id: TypeId, value: &'static T) -> &'static T {
        *self
            .0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(type_id, || value)
    }
}

impl GenericInfoCell {
    /// Returns the [`TypeInfo`] of `G`, building it with `f` on first use.
    #[inline]
    pub fn get_or_insert<G: Any + ?Sized>(&self, f: impl FnOnce() -> TypeInfo) -> &'static TypeInfo {
        let type_id = TypeId::of::<G>();
        match self.get_by_type_id(type_id) {
            Some(info) => info,
            None => self.insert_by_type_id(type_id, Box::leak(Box::new(f()))),
        }
    }
}

impl GenericPathCell {
    /// Returns the string of `G`, building it with `f` on first use.
    #[inline]
    pub fn get_or_insert<G: Any + ?Sized>(&self, f: impl FnOnce() -> String) -> &'static str {
        let type_id = TypeId::of::<G>();
        match self.get_by_type_id(type_id) {
            Some(path) => path,
            None => self.insert_by_type_id(type_id, String::leak(f())),
        }
    }
}

/// Concatenate path fragments, used by generic [`TypePath`](crate::info::TypePath) impls.
pub fn concat(parts: &[&str]) -> String {
    let mut out = String::with_capacity(parts.iter().map(|s| s.len()).sum());
    parts.iter().for_each(|s| out.push_str(s));
    out
}

#[cfg(test)]
mod tests {
    use super::{GenericPathCell, concat};
    use alloc::string::String;

    #[test]
    fn generic_path_cell_is_per_type() {
        static CELL: GenericPathCell = GenericPathCell::new();

        let a = CELL.get_or_insert::<u8>(|| concat(&["Foo<", "u8", ">"]));
        let b = CELL.get_or_insert::<u16>(|| concat(&["Foo<", "u16", ">"]));
        let again = CELL.get_or_insert::<u8>(|| String::from("unused"));

        assert_eq!(a, "Foo<u8>");
        assert_eq!(b, "Foo<u16>");
        assert!(core::ptr::eq(a, again));
    }
}
