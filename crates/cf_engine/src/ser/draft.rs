use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::any::TypeId;

use cf_utils::hash::HashMap;

use crate::format::{FormatAdapter, TypeTag};
use crate::options::ClassifyOptions;
use crate::scalar::Scalar;
use crate::track::RefTracker;

// -----------------------------------------------------------------------------
// Draft

/// A partially built element.
pub(crate) enum Draft<E> {
    Done(E),
    List {
        is_tuple: bool,
        items: Vec<Draft<E>>,
    },
    KeyValue(Box<Draft<E>>, Box<Draft<E>>),
    Dictionary(Vec<(Scalar, Draft<E>)>),
    Object(Vec<(&'static str, Draft<E>)>),
    Typed {
        tag: TypeTag,
        inner: Box<Draft<E>>,
    },
    /// First occurrence of a shared handle.
    Shared {
        identity: usize,
        inner: Box<Draft<E>>,
    },
    /// Later occurrence of a shared handle.
    Reference(usize),
    /// Runs the type-options `after_classify` hook of `type_id`.
    Hooked {
        type_id: TypeId,
        inner: Box<Draft<E>>,
    },
}

// -----------------------------------------------------------------------------
// Finalizer

/// Builds the element of a draft, numbering referenced handles in output
/// order.
pub(crate) struct Finalizer<'a, F: FormatAdapter> {
    format: &'a F,
    options: &'a ClassifyOptions<F::Element>,
    tracker: &'a RefTracker,
    ids: HashMap<usize, String>,
}

impl<'a, F: FormatAdapter> Finalizer<'a, F> {
    pub fn new(
        format: &'a F,
        options: &'a ClassifyOptions<F::Element>,
        tracker: &'a RefTracker,
    ) -> Self {
        Self {
            format,
            options,
            tracker,
            ids: HashMap::default(),
        }
    }

    fn id_of(&mut self, identity: usize) -> &str {
        let next = self.ids.len() + 1;
        self.ids.entry(identity).or_insert_with(|| {
            log::trace!("reference id `{next}` assigned");
            next.to_string()
        })
    }

    pub fn finish(&mut self, draft: Draft<F::Element>) -> F::Element {
        let format = self.format;
        match draft {
            Draft::Done(element) => element,
            Draft::List { is_tuple, items } => {
                let items = items.into_iter().map(|item| self.finish(item)).collect();
                format.format_list(is_tuple, items)
            }
            Draft::KeyValue(key, value) => {
                let key = self.finish(*key);
                let value = self.finish(*value);
                format.format_key_value_pair(key, value)
            }
            Draft::Dictionary(entries) => {
                let entries = entries
                    .into_iter()
                    .map(|(key, value)| (key, self.finish(value)))
                    .collect();
                format.format_dictionary(entries)
            }
            Draft::Object(fields) => {
                let fields = fields
                    .into_iter()
                    .map(|(name, value)| (name, self.finish(value)))
                    .collect();
                format.format_object(fields)
            }
            Draft::Typed { tag, inner } => {
                let inner = self.finish(*inner);
                format.format_with_type(inner, &tag)
            }
            Draft::Shared { identity, inner } => {
                if self.tracker.is_referenced(identity) {
                    // The id is taken before the content, so nested
                    // references get later numbers.
                    let id = self.id_of(identity).to_string();
                    let inner = self.finish(*inner);
                    format.format_referable(inner, &id)
                } else {
                    self.finish(*inner)
                }
            }
            Draft::Reference(identity) => {
                let id = self.id_of(identity);
                format.format_reference(id)
            }
            Draft::Hooked { type_id, inner } => {
                let mut element = self.finish(*inner);
                if let Some(options) = self.options.type_options(type_id) {
                    options.run_after_classify(&mut element);
                }
                element
            }
        }
    }
}
