//! Parsed form of the derive input.

// -----------------------------------------------------------------------------
// Modules

mod classify_derive;
mod classify_meta;
mod field_attributes;
mod type_attributes;

// -----------------------------------------------------------------------------
// Internal API

pub(crate) use classify_derive::{ClassifyDerive, ClassifyEnum, ClassifyStruct};
pub(crate) use classify_meta::ClassifyMeta;
pub(crate) use field_attributes::{FieldAttributes, parse_variant_rename};
pub(crate) use type_attributes::TypeAttributes;
