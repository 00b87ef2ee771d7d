use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::Ref;

use crate::scalar::Scalar;
use crate::{Classify, ClassifyError};

/// A borrowed view of a value, shaped by its [`TypeKind`](crate::info::TypeKind).
///
/// Returned by [`Classify::value_ref`]. The classifier only reads values
/// through this view.
pub enum ValueRef<'a> {
    Simple(Scalar),
    Opaque,
    Option(Option<&'a dyn Classify>),
    Tuple(Vec<&'a dyn Classify>),
    KeyValue(&'a dyn Classify, &'a dyn Classify),
    /// Lists and arrays, in iteration order.
    List(Vec<&'a dyn Classify>),
    Map(Vec<(&'a dyn Classify, &'a dyn Classify)>),
    Object(&'a dyn Object),
    Shared(&'a dyn SharedValue),
    Weak,
    Deferred(&'a dyn DeferredValue),
    /// The content of a `Box<dyn Classify>`.
    Dynamic(&'a dyn Classify),
}

impl ValueRef<'_> {
    /// `None`, an empty string, or an empty collection.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Simple(Scalar::Str(s)) => s.is_empty(),
            Self::Option(v) => v.is_none(),
            Self::List(items) => items.is_empty(),
            Self::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }
}

/// Named field access of a plain object.
///
/// Implemented by `#[derive(Classify)]`.
pub trait Object {
    fn field(&self, name: &str) -> Option<&dyn Classify>;

    /// Field by declaration index, matching [`ObjectInfo::fields`](crate::info::ObjectInfo::fields).
    fn field_at(&self, index: usize) -> Option<&dyn Classify>;

    /// Assign a materialized value to the field `name`.
    ///
    /// Fails with [`ClassifyError::TypeMismatch`] when `value` has the
    /// wrong type, and with [`ClassifyError::Malformed`] for an unknown name.
    fn set_field(&mut self, name: &str, value: Box<dyn Classify>) -> Result<(), ClassifyError>;
}

/// An identity-bearing handle.
pub trait SharedValue {
    /// Physical identity, stable while the handle is alive.
    fn identity(&self) -> usize;

    fn borrow_value(&self) -> Result<Ref<'_, dyn Classify>, ClassifyError>;
}

/// A lazily evaluated value.
pub trait DeferredValue {
    /// Unit id, set for values loaded by id or created with one.
    fn id(&self) -> Option<&str>;

    /// The value, only if it is already evaluated.
    fn evaluated(&self) -> Option<&dyn Classify>;

    /// The value, evaluating it first if needed.
    fn force(&self) -> Result<&dyn Classify, ClassifyError>;
}
