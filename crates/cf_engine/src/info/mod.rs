//! Static type metadata.
//!
//! Rust has no runtime reflection, so every classifiable type describes
//! itself once through [`Typed::type_info`](crate::Typed::type_info).
//! The description carries the names used in type tags, the nested
//! types, and the function pointers the declassifier builds values with.

// -----------------------------------------------------------------------------
// Modules

mod cell;
mod object_info;
mod type_info;
mod type_path;

// -----------------------------------------------------------------------------
// Exports

pub use cell::{GenericCell, GenericInfoCell, GenericPathCell, NonGenericInfoCell, concat};
pub use object_info::{FieldFlags, FieldInfo, ObjectInfo};
pub use type_info::{ArrayInfo, DeferredInfo, DynamicInfo, KeyValueInfo, ListInfo, MapInfo};
pub use type_info::{BuildFn, DefaultFn, EntriesFn, InfoFn, Loader, WrapFn};
pub use type_info::{OpaqueInfo, OptionInfo, SharedInfo, SimpleInfo, TupleInfo, WeakInfo};
pub use type_info::{TypeInfo, TypeKind};
pub use type_path::{Type, TypePath};
