//! The name ↔ type table behind type tags.
//!
//! Rust has no way to look a type up by name at runtime, so every type
//! that may appear behind a type tag (a `Box<dyn Classify>` field, or a
//! runtime type differing from the declared one) must be registered.
//!
//! ## auto_register
//!
//! With the `auto_register` feature, [`TypeRegistry::new`] also collects
//! every non-generic `#[derive(Classify)]` type through [`inventory`].
//! Not every platform supports it; on those the registry silently stays
//! limited to explicit registrations.
//!
//! [`inventory`]: https://docs.rs/inventory

// -----------------------------------------------------------------------------
// Modules

mod type_registry;

// -----------------------------------------------------------------------------
// Exports

pub use type_registry::TypeRegistry;
