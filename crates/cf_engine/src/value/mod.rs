//! The object-side traits: how the engine reads and rebuilds values.

// -----------------------------------------------------------------------------
// Modules

mod classify;
mod value_ref;

// -----------------------------------------------------------------------------
// Exports

pub use classify::{Classify, ClassifyHooks, Typed};
pub use value_ref::{DeferredValue, Object, SharedValue, ValueRef};

pub(crate) use classify::impl_classify_cast;
