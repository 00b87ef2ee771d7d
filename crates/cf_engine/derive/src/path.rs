//! Paths of `cf_engine` items used by generated code.

use proc_macro2::TokenStream;
use quote::quote;

// -----------------------------------------------------------------------------
// Crate Path

/// Get the access path of `cf_engine` from the caller's `Cargo.toml`.
///
/// `::cf_engine` for direct dependents, `::classify::engine` for dependents
/// of the facade.
pub(crate) fn cf_engine() -> syn::Path {
    cf_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("cf_engine"))
}

// -----------------------------------------------------------------------------
// Items

#[inline(always)]
pub(crate) fn macro_exports_(cf_engine: &syn::Path) -> TokenStream {
    quote!(#cf_engine::__macro_exports)
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn auto_register_(cf_engine: &syn::Path) -> TokenStream {
    quote!(#cf_engine::__macro_exports::auto_register)
}

#[inline(always)]
pub(crate) fn classify_(cf_engine: &syn::Path) -> TokenStream {
    quote!(#cf_engine::Classify)
}

#[inline(always)]
pub(crate) fn typed_(cf_engine: &syn::Path) -> TokenStream {
    quote!(#cf_engine::Typed)
}

#[inline(always)]
pub(crate) fn hooks_(cf_engine: &syn::Path) -> TokenStream {
    quote!(#cf_engine::ClassifyHooks)
}

#[inline(always)]
pub(crate) fn error_(cf_engine: &syn::Path) -> TokenStream {
    quote!(#cf_engine::ClassifyError)
}

#[inline(always)]
pub(crate) fn type_path_(cf_engine: &syn::Path) -> TokenStream {
    quote!(#cf_engine::info::TypePath)
}

#[inline(always)]
pub(crate) fn type_info_(cf_engine: &syn::Path) -> TokenStream {
    quote!(#cf_engine::info::TypeInfo)
}

#[inline(always)]
pub(crate) fn info_(cf_engine: &syn::Path) -> TokenStream {
    quote!(#cf_engine::info)
}

#[inline(always)]
pub(crate) fn value_(cf_engine: &syn::Path) -> TokenStream {
    quote!(#cf_engine::value)
}

#[inline(always)]
pub(crate) fn scalar_(cf_engine: &syn::Path) -> TokenStream {
    quote!(#cf_engine::scalar::Scalar)
}
