use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;

use crate::Classify;
use crate::info::{FieldInfo, MapInfo, ObjectInfo, TypeInfo};
use crate::track::SlotId;

/// A value waiting for materialization.
pub(crate) enum Plan<E> {
    Ready(Box<dyn Classify>),
    /// A handle allocated in this session.
    Slot(SlotId),
    Reference(String),
    /// `Option` or `Deferred` around one value.
    Wrap {
        info: &'static TypeInfo,
        inner: Box<Plan<E>>,
    },
    /// Positional parts of a tuple, key-value pair, list or array.
    Parts {
        info: &'static TypeInfo,
        parts: Vec<Plan<E>>,
    },
    Map {
        info: &'static MapInfo,
        entries: Vec<(Box<dyn Classify>, Plan<E>)>,
    },
    Object {
        info: &'static ObjectInfo,
        instance: Box<dyn Classify>,
        fields: Vec<(&'static FieldInfo, Plan<E>)>,
    },
    /// A substitute, mapped back to `source`.
    Substitute {
        source: TypeId,
        inner: Box<Plan<E>>,
    },
    /// Runs the type-options `after_declassify` hook of `type_id`.
    Hooked {
        type_id: TypeId,
        element: E,
        inner: Box<Plan<E>>,
    },
}
