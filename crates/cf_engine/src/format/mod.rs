//! The wire-format contract.
//!
//! The classifier and declassifier never look inside an element, they go
//! through a [`FormatAdapter`]. An adapter only describes shapes; it holds
//! no graph state, so one adapter can serve any number of sessions.

use alloc::string::String;
use alloc::vec::Vec;
use std::io::{Read, Write};

use crate::scalar::Scalar;
use crate::{ClassifyError, Typed};

// -----------------------------------------------------------------------------
// Modules

#[cfg(feature = "json")]
mod json;

// -----------------------------------------------------------------------------
// Exports

#[cfg(feature = "json")]
pub use json::JsonFormat;

// -----------------------------------------------------------------------------
// TypeTag

/// The runtime type written next to a value whose type differs from the
/// declared one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeTag {
    pub name: String,
    /// `name` is a full type path rather than a short type name.
    pub fully_qualified: bool,
}

impl TypeTag {
    #[inline]
    pub fn short(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fully_qualified: false,
        }
    }

    #[inline]
    pub fn full(path: impl Into<String>) -> Self {
        Self {
            name: path.into(),
            fully_qualified: true,
        }
    }
}

// -----------------------------------------------------------------------------
// FormatAdapter

/// Encodes and decodes the shapes of a serialized tree.
///
/// An element is exactly one of: null, scalar, self value, list (or
/// tuple), key-value pair, dictionary, or labeled object. Three wrappers
/// compose on top of it: type tag, referable id, and the two id-only
/// placeholders, reference and follow-id.
///
/// Decoding methods report shape mismatches as [`ClassifyError::Malformed`].
pub trait FormatAdapter: Clone + 'static {
    /// A node of the serialized tree.
    ///
    /// Values of this type found in a graph are passed through untouched.
    type Element: Typed + Clone;

    /// File extension of stored units, without the dot.
    fn extension(&self) -> &str;

    fn read_element(&self, reader: &mut dyn Read) -> Result<Self::Element, ClassifyError>;

    fn write_element(
        &self,
        element: &Self::Element,
        writer: &mut dyn Write,
    ) -> Result<(), ClassifyError>;

    // -------------------------------------------------------------------------
    // Decode

    fn is_null(&self, element: &Self::Element) -> bool;

    fn get_simple_value(&self, element: &Self::Element) -> Result<Scalar, ClassifyError>;

    #[inline]
    fn get_self_value(&self, element: &Self::Element) -> Self::Element {
        element.clone()
    }

    /// Items of a list or tuple. `expected` is advisory.
    fn get_list<'e>(
        &self,
        element: &'e Self::Element,
        expected: Option<usize>,
    ) -> Result<Vec<&'e Self::Element>, ClassifyError>;

    fn get_key_value_pair<'e>(
        &self,
        element: &'e Self::Element,
    ) -> Result<(&'e Self::Element, &'e Self::Element), ClassifyError>;

    /// Entries of a dictionary, keys as written.
    fn get_dictionary<'e>(
        &self,
        element: &'e Self::Element,
    ) -> Result<Vec<(Scalar, &'e Self::Element)>, ClassifyError>;

    fn has_field(&self, element: &Self::Element, name: &str) -> bool;

    fn get_field<'e>(&self, element: &'e Self::Element, name: &str) -> Option<&'e Self::Element>;

    fn get_type_tag(&self, element: &Self::Element) -> Option<TypeTag>;

    fn is_reference(&self, element: &Self::Element) -> bool;

    fn is_referable(&self, element: &Self::Element) -> bool;

    fn is_follow_id(&self, element: &Self::Element) -> bool;

    /// The id of a reference, a follow-id placeholder or a referable element.
    fn get_reference_id(&self, element: &Self::Element) -> Result<String, ClassifyError>;

    /// Strip referable and type wrappers written around a payload that
    /// could not hold them inline.
    fn unwrap_value<'e>(&self, element: &'e Self::Element) -> &'e Self::Element;

    // -------------------------------------------------------------------------
    // Encode

    fn format_null(&self) -> Self::Element;

    fn format_simple_value(&self, value: &Scalar) -> Self::Element;

    #[inline]
    fn format_self_value(&self, value: Self::Element) -> Self::Element {
        value
    }

    fn format_list(&self, is_tuple: bool, items: Vec<Self::Element>) -> Self::Element;

    fn format_key_value_pair(&self, key: Self::Element, value: Self::Element) -> Self::Element;

    fn format_dictionary(&self, entries: Vec<(Scalar, Self::Element)>) -> Self::Element;

    fn format_object(&self, fields: Vec<(&str, Self::Element)>) -> Self::Element;

    fn format_follow_id(&self, id: &str) -> Self::Element;

    fn format_reference(&self, id: &str) -> Self::Element;

    fn format_referable(&self, inner: Self::Element, id: &str) -> Self::Element;

    fn format_with_type(&self, inner: Self::Element, tag: &TypeTag) -> Self::Element;
}
