//! Fully qualified paths of `core`/`alloc` items.
//!
//! Generated code must not depend on what the caller has in scope,
//! so every std item is spelled out with a leading `::`.

use proc_macro2::TokenStream;
use quote::quote;

/// `::core::option::Option`
#[inline]
pub fn option_() -> TokenStream {
    quote!(::core::option::Option)
}

/// `::core::result::Result`
#[inline]
pub fn result_() -> TokenStream {
    quote!(::core::result::Result)
}

/// `::std::boxed::Box`
#[inline]
pub fn box_() -> TokenStream {
    quote!(::std::boxed::Box)
}

/// `::core::any::Any`
#[inline]
pub fn any_() -> TokenStream {
    quote!(::core::any::Any)
}

/// `::core::default::Default`
#[inline]
pub fn default_() -> TokenStream {
    quote!(::core::default::Default)
}
