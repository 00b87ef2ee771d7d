//! Derive macro of `cf_engine`.
//!
//! See [`Classify`].
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static CLASSIFY_ATTRIBUTE_NAME: &str = "classify";

// -----------------------------------------------------------------------------
// Modules

mod derive_data;
mod impls;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// # Classify Derivation
///
/// `#[derive(Classify)]` implements `TypePath`, `Typed` and `Classify`.
///
/// - Structs with named fields become plain objects and also implement
///   `Object`. Unit structs are objects without fields.
/// - Enums without fields become simple values, written as the variant
///   name. They may key a dictionary.
///
/// Every field type must implement `Typed`. Lifetime parameters are not
/// supported.
///
/// ## Type Attributes
///
/// ```rust, ignore
/// #[derive(Classify, Default)]
/// #[classify(default, hooks, ignore_if_empty)]
/// struct Foo { /* ... */ }
/// ```
///
/// - `default`: the type implements `Default`. Required to declassify
///   objects, and to compare with the default value.
/// - `hooks`: forward the classify hooks to the type's `ClassifyHooks` impl.
/// - `ignore_if_default`, `ignore_if_empty`: apply the policy to every field.
/// - `type_path = "..."`: override the path written in type tags. Generic
///   arguments are appended.
///
/// ## Field Attributes
///
/// ```rust, ignore
/// #[derive(Classify, Default)]
/// #[classify(default)]
/// struct Node {
///     #[classify(rename = "v")]
///     value: u32,
///     #[classify(parent)]
///     owner: Option<Weak<RefCell<Tree>>>,
///     #[classify(ignore_if_eq = 1.0)]
///     scale: f64,
/// }
/// ```
///
/// - `ignore`: never persisted, keeps its constructor value.
/// - `parent`: never persisted, receives the enclosing shared object.
/// - `follow_id`: a `Deferred` field stored in its own unit.
/// - `ignore_if_default`, `ignore_if_empty`, `ignore_if_eq = <expr>`:
///   skip the field when the value matches.
/// - `rename = "..."`: the persisted name. By default the field name,
///   without a leading `_` or `r#`.
///
/// Variants of a simple enum accept `rename` only.
///
/// ## Auto Registration
///
/// With the `auto_register` feature, every non-generic derived type is
/// collected into `TypeRegistry::new()`.
#[proc_macro_derive(Classify, attributes(classify))]
pub fn derive_classify(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match derive_data::ClassifyDerive::from_input(&ast) {
        Ok(derive) => impls::impl_classify(&derive).into(),
        Err(err) => err.into_compile_error().into(),
    }
}
