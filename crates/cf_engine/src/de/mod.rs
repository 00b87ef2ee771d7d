//! Element → object graph.
//!
//! Declassification runs in three phases:
//!
//! 1. **Plan**: walk the element. Scalars are converted at once; shared
//!    handles are allocated around a placeholder and registered under
//!    their referable id, so references to them resolve whatever their
//!    position.
//! 2. **Populate**: build the content of every allocated handle and swap
//!    it in, keeping the handle's identity.
//! 3. **Materialize**: build the root value.

// -----------------------------------------------------------------------------
// Modules

mod declassifier;
mod plan;

// -----------------------------------------------------------------------------
// Exports

pub use declassifier::Declassifier;
