//! Field behaviour and value predicates.
//!
//! [`field_behavior`] folds the type-level and field-level [`FieldFlags`]
//! into one decision. The predicates decide the ignore-if policies.

use crate::Classify;
use crate::info::{FieldFlags, FieldInfo, ObjectInfo};
use crate::value::ValueRef;

// -----------------------------------------------------------------------------
// FieldBehavior

/// What the engine does with one field of a plain object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldBehavior {
    /// Never persisted, keeps its constructor value on declassify.
    Ignore,
    /// Never persisted, receives the enclosing shared object on declassify.
    Parent,
    /// Written to its own unit, only the id is stored inline.
    FollowId,
    /// Persisted inline, unless one of the enabled policies skips it.
    Persist {
        if_default: bool,
        if_empty: bool,
        if_equal: bool,
    },
}

/// Resolve the behaviour of `field` within `object`.
///
/// `IGNORE` wins over `PARENT`, which wins over `FOLLOW_ID`. Ignore-if
/// policies of the type apply to every field on top of its own.
pub fn field_behavior(object: &ObjectInfo, field: &FieldInfo) -> FieldBehavior {
    let flags = field.flags();
    if flags.contains(FieldFlags::IGNORE) {
        return FieldBehavior::Ignore;
    }
    if flags.contains(FieldFlags::PARENT) {
        return FieldBehavior::Parent;
    }
    if flags.contains(FieldFlags::FOLLOW_ID) {
        return FieldBehavior::FollowId;
    }

    let all = flags | object.flags();
    FieldBehavior::Persist {
        if_default: all.contains(FieldFlags::IGNORE_IF_DEFAULT),
        if_empty: all.contains(FieldFlags::IGNORE_IF_EMPTY),
        if_equal: flags.contains(FieldFlags::IGNORE_IF_EQUAL),
    }
}

impl FieldBehavior {
    /// Whether `value` of `field` is left out of the output.
    pub fn skips(&self, field: &FieldInfo, value: &dyn Classify) -> bool {
        match *self {
            Self::Ignore | Self::Parent => true,
            Self::FollowId => false,
            Self::Persist {
                if_default,
                if_empty,
                if_equal,
            } => {
                (if_equal && field.is_ignored_value(value))
                    || (if_empty && is_empty(value))
                    || (if_default && is_default(value))
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Predicates

/// `None`, an empty string, or an empty collection.
pub fn is_empty(value: &dyn Classify) -> bool {
    match value.value_ref() {
        ValueRef::Dynamic(inner) => is_empty(inner),
        view => view.is_empty(),
    }
}

/// Whether `value` equals a fresh value of its own type.
///
/// Types without a parameterless value are never default.
pub fn is_default(value: &dyn Classify) -> bool {
    if let ValueRef::Dynamic(inner) = value.value_ref() {
        return is_default(inner);
    }
    match value.classify_info().default_value() {
        Some(default) => structurally_equal(value, &*default),
        None => false,
    }
}

/// Compare two values through their [`ValueRef`] views.
///
/// Shared handles compare by identity and opaque values never compare
/// equal.
pub fn structurally_equal(a: &dyn Classify, b: &dyn Classify) -> bool {
    if a.classify_info().type_id() != b.classify_info().type_id() {
        return false;
    }
    match (a.value_ref(), b.value_ref()) {
        (ValueRef::Simple(x), ValueRef::Simple(y)) => x == y,
        (ValueRef::Option(x), ValueRef::Option(y)) => match (x, y) {
            (None, None) => true,
            (Some(x), Some(y)) => structurally_equal(x, y),
            _ => false,
        },
        (ValueRef::Tuple(x), ValueRef::Tuple(y)) | (ValueRef::List(x), ValueRef::List(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(x, y)| structurally_equal(*x, *y))
        }
        (ValueRef::KeyValue(xk, xv), ValueRef::KeyValue(yk, yv)) => {
            structurally_equal(xk, yk) && structurally_equal(xv, yv)
        }
        (ValueRef::Map(x), ValueRef::Map(y)) => {
            x.len() == y.len()
                && x.iter().all(|(xk, xv)| {
                    y.iter()
                        .any(|(yk, yv)| structurally_equal(*xk, *yk) && structurally_equal(*xv, *yv))
                })
        }
        (ValueRef::Object(x), ValueRef::Object(y)) => {
            let Ok(info) = a.classify_info().as_object() else {
                return false;
            };
            (0..info.fields().len()).all(|index| match (x.field_at(index), y.field_at(index)) {
                (Some(x), Some(y)) => structurally_equal(x, y),
                _ => false,
            })
        }
        (ValueRef::Shared(x), ValueRef::Shared(y)) => x.identity() == y.identity(),
        (ValueRef::Weak, ValueRef::Weak) => true,
        (ValueRef::Deferred(x), ValueRef::Deferred(y)) => match (x.evaluated(), y.evaluated()) {
            (Some(x), Some(y)) => structurally_equal(x, y),
            (None, None) => x.id() == y.id(),
            _ => false,
        },
        (ValueRef::Dynamic(x), ValueRef::Dynamic(y)) => structurally_equal(x, y),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::{FieldBehavior, field_behavior, is_default, is_empty, structurally_equal};
    use crate::{Classify, Typed};

    #[derive(Classify, Default)]
    #[classify(default, ignore_if_empty)]
    struct Flagged {
        #[classify(ignore, parent)]
        both: u8,
        #[classify(parent)]
        parent: u8,
        #[classify(ignore_if_default)]
        count: u32,
        #[classify(ignore_if_eq = 7)]
        seven: u8,
        plain: String,
    }

    fn behavior_of(name: &str) -> FieldBehavior {
        let info = Flagged::type_info().as_object().unwrap();
        field_behavior(info, info.field(name).unwrap())
    }

    #[test]
    fn priority() {
        assert_eq!(behavior_of("both"), FieldBehavior::Ignore);
        assert_eq!(behavior_of("parent"), FieldBehavior::Parent);
        assert_eq!(
            behavior_of("count"),
            FieldBehavior::Persist {
                if_default: true,
                if_empty: true,
                if_equal: false
            }
        );
        assert_eq!(
            behavior_of("seven"),
            FieldBehavior::Persist {
                if_default: false,
                if_empty: true,
                if_equal: true
            }
        );
    }

    #[test]
    fn equal_check() {
        let info = Flagged::type_info().as_object().unwrap();
        let field = info.field("seven").unwrap();
        assert!(behavior_of("seven").skips(field, &7_u8));
        assert!(!behavior_of("seven").skips(field, &8_u8));
    }

    #[test]
    fn predicates() {
        assert!(is_empty(&String::new()));
        assert!(is_empty(&Vec::<u8>::new()));
        assert!(is_empty(&None::<u8>));
        assert!(!is_empty(&0_u8));

        assert!(is_default(&0_u32));
        assert!(!is_default(&1_u32));
        assert!(is_default(&Flagged::default()));

        let changed = Flagged {
            plain: String::from("x"),
            ..Flagged::default()
        };
        assert!(!is_default(&changed));
        assert!(structurally_equal(&Vec::from([1_u8, 2]), &Vec::from([1_u8, 2])));
        assert!(!structurally_equal(&Vec::from([1_u8, 2]), &Vec::from([2_u8, 1])));
    }
}
