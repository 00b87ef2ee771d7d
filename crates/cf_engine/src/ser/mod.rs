//! Object graph → element.
//!
//! Classification walks the graph once into a [`Draft`] tree, then a
//! finalization pass builds the element. Reference ids are only known once
//! the whole graph is walked, the draft keeps shared definitions and
//! references open until then.

// -----------------------------------------------------------------------------
// Modules

mod classifier;
mod draft;

// -----------------------------------------------------------------------------
// Exports

pub use classifier::Classifier;
