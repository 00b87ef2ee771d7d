use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use core::any::TypeId;

use crate::format::FormatAdapter;
use crate::info::{ObjectInfo, TypeInfo, TypeKind};
use crate::introspect::{FieldBehavior, field_behavior};
use crate::options::ClassifyOptions;
use crate::ser::draft::{Draft, Finalizer};
use crate::track::RefTracker;
use crate::value::{Object, ValueRef};
use crate::{Classify, ClassifyError};

// -----------------------------------------------------------------------------
// Classifier

/// One classification session.
///
/// A session tracks shared handles; a handle met twice in the same
/// session is written once and referenced afterwards. Use a new session
/// per root value.
///
/// ```
/// use cf_engine::format::JsonFormat;
/// use cf_engine::options::ClassifyOptions;
/// use cf_engine::ser::Classifier;
/// use cf_engine::Typed;
/// use serde_json::json;
///
/// let format = JsonFormat::new();
/// let options = ClassifyOptions::default();
/// let value: Vec<Option<u8>> = vec![Some(1), None];
///
/// let element = Classifier::new(&format, &options)
///     .classify_dyn(&value, <Vec<Option<u8>>>::type_info())
///     .unwrap();
/// assert_eq!(element, json!([1, null]));
/// ```
pub struct Classifier<'a, F: FormatAdapter> {
    format: &'a F,
    options: &'a ClassifyOptions<F::Element>,
    tracker: RefTracker,
    // Substitutes stay alive for the session, so that the identity of a
    // handle they hold is never reused by another one.
    substitutes: Vec<Box<dyn Classify>>,
}

impl<'a, F: FormatAdapter> Classifier<'a, F> {
    pub fn new(format: &'a F, options: &'a ClassifyOptions<F::Element>) -> Self {
        Self {
            format,
            options,
            tracker: RefTracker::default(),
            substitutes: Vec::new(),
        }
    }

    /// Classify `value`, declared as `declared`.
    ///
    /// The runtime type of `value` is tagged when it differs from the
    /// declared one.
    pub fn classify_dyn(
        &mut self,
        value: &dyn Classify,
        declared: &'static TypeInfo,
    ) -> Result<F::Element, ClassifyError> {
        log::debug!("classifying `{}`", declared.type_path());
        let draft = self.draft(value, declared)?;
        let tracker = core::mem::take(&mut self.tracker);
        Ok(Finalizer::new(self.format, self.options, &tracker).finish(draft))
    }

    fn draft(
        &mut self,
        value: &dyn Classify,
        declared: &'static TypeInfo,
    ) -> Result<Draft<F::Element>, ClassifyError> {
        let view = value.value_ref();
        if let ValueRef::Dynamic(inner) = view {
            return self.draft(inner, declared);
        }
        if let ValueRef::Shared(handle) = &view
            && !self.tracker.visit(handle.identity())
        {
            return Ok(Draft::Reference(handle.identity()));
        }

        let options = self.options;
        let info = value.classify_info();
        let type_options = options.type_options(info.type_id());

        value.before_classify();
        if let Some(hooks) = type_options {
            hooks.run_before_classify(value);
        }

        let mut draft = match type_options.and_then(|hooks| hooks.substitution()) {
            Some(substitution) => {
                let substitute = substitution.to_wire(value)?;
                let draft = self.draft(&*substitute, substitution.target());
                self.substitutes.push(substitute);
                draft?
            }
            None => self.draft_body(value, view, info)?,
        };

        value.after_classify();
        if type_options.is_some_and(|hooks| hooks.has_after_classify()) {
            draft = Draft::Hooked {
                type_id: info.type_id(),
                inner: Box::new(draft),
            };
        }

        if info.type_id() != declared.type_id()
            && !matches!(declared.kind(), TypeKind::List | TypeKind::Array | TypeKind::Map)
        {
            let registry = options.registry();
            if !registry.contains(info.type_id()) {
                log::warn!(
                    "`{}` is written with a type tag but is not registered",
                    info.type_path()
                );
            }
            draft = Draft::Typed {
                tag: registry.tag_for(info),
                inner: Box::new(draft),
            };
        }

        Ok(draft)
    }

    fn draft_body(
        &mut self,
        value: &dyn Classify,
        view: ValueRef<'_>,
        info: &'static TypeInfo,
    ) -> Result<Draft<F::Element>, ClassifyError> {
        let format = self.format;

        if info.type_id() == TypeId::of::<F::Element>() {
            let element = value
                .downcast_ref::<F::Element>()
                .ok_or_else(|| ClassifyError::mismatch(info.type_path(), "element"))?;
            return Ok(Draft::Done(format.format_self_value(element.clone())));
        }

        match view {
            ValueRef::Simple(scalar) => Ok(Draft::Done(format.format_simple_value(&scalar))),
            ValueRef::Opaque => Err(ClassifyError::Configuration(format!(
                "`{}` is opaque and cannot be classified",
                info.type_path()
            ))),
            ValueRef::Option(None) => Ok(Draft::Done(format.format_null())),
            ValueRef::Option(Some(inner)) => self.draft(inner, info.as_option()?.inner()),
            ValueRef::Tuple(items) => {
                let tuple = info.as_tuple()?;
                let items = items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| {
                        let declared = tuple.element(index).unwrap_or_else(|| item.classify_info());
                        self.draft(item, declared)
                    })
                    .collect::<Result<_, _>>()?;
                Ok(Draft::List {
                    is_tuple: true,
                    items,
                })
            }
            ValueRef::KeyValue(key, value) => {
                let pair = info.as_key_value()?;
                let key = self.draft(key, pair.key())?;
                let value = self.draft(value, pair.value())?;
                Ok(Draft::KeyValue(Box::new(key), Box::new(value)))
            }
            ValueRef::List(items) => {
                let item_info = match info {
                    TypeInfo::Array(array) => array.item(),
                    _ => info.as_list()?.item(),
                };
                let items = items
                    .into_iter()
                    .map(|item| self.draft(item, item_info))
                    .collect::<Result<_, _>>()?;
                Ok(Draft::List {
                    is_tuple: false,
                    items,
                })
            }
            ValueRef::Map(entries) => {
                let map = info.as_map()?;
                map.checked_key_kind()?;
                let entries = entries
                    .into_iter()
                    .map(|(key, value)| match key.value_ref() {
                        ValueRef::Simple(key) => Ok((key, self.draft(value, map.value())?)),
                        _ => Err(ClassifyError::Configuration(format!(
                            "`{}` cannot key a dictionary",
                            key.classify_info().type_path()
                        ))),
                    })
                    .collect::<Result<_, _>>()?;
                Ok(Draft::Dictionary(entries))
            }
            ValueRef::Object(object) => self.draft_object(object, info.as_object()?),
            ValueRef::Shared(handle) => {
                let inner = handle.borrow_value()?;
                let content = self.draft(&*inner, info.as_shared()?.inner())?;
                Ok(Draft::Shared {
                    identity: handle.identity(),
                    inner: Box::new(content),
                })
            }
            ValueRef::Weak => Err(ClassifyError::Configuration(format!(
                "`{}` can only be used in a parent field",
                info.type_path()
            ))),
            ValueRef::Deferred(deferred) => {
                let inner = deferred.force()?;
                self.draft(inner, info.as_deferred()?.inner())
            }
            ValueRef::Dynamic(inner) => self.draft(inner, info),
        }
    }

    fn draft_object(
        &mut self,
        object: &dyn Object,
        info: &'static ObjectInfo,
    ) -> Result<Draft<F::Element>, ClassifyError> {
        let mut fields = Vec::with_capacity(info.fields().len());

        for (index, field) in info.fields().iter().enumerate() {
            let behavior = field_behavior(info, field);
            if matches!(behavior, FieldBehavior::Ignore | FieldBehavior::Parent) {
                continue;
            }

            let value = object.field_at(index).ok_or_else(|| {
                ClassifyError::malformed(format!("`{}` has no field #{index}", info.ty().path()))
            })?;

            let draft = match behavior {
                FieldBehavior::FollowId => self.follow_id(field.name(), value),
                _ if behavior.skips(field, value) => continue,
                _ => self.draft(value, field.type_info()),
            };
            let draft = draft.map_err(|err| err.in_field(info.ty().path(), field.name()))?;
            fields.push((field.name(), draft));
        }

        Ok(Draft::Object(fields))
    }

    /// Save an evaluated deferred value to its unit and draft its placeholder.
    fn follow_id(
        &mut self,
        field: &str,
        value: &dyn Classify,
    ) -> Result<Draft<F::Element>, ClassifyError> {
        let info = value.classify_info();
        let (TypeInfo::Deferred(deferred_info), ValueRef::Deferred(deferred)) =
            (info, value.value_ref())
        else {
            return Err(ClassifyError::Configuration(format!(
                "follow-id fields must be `Deferred`, found `{}`",
                info.type_path()
            )));
        };
        let options = self.options;
        let store = options.store().ok_or_else(|| ClassifyError::MissingBaseDirectory {
            field: field.into(),
        })?;
        let id = deferred
            .id()
            .ok_or_else(|| ClassifyError::configuration("a follow-id value needs an id"))?;

        if let Some(inner) = deferred.evaluated() {
            let inner_info = deferred_info.inner();
            let element = Classifier::new(self.format, options).classify_dyn(inner, inner_info)?;
            store.save_unit(inner_info.type_name(), id, &element)?;
        }

        Ok(Draft::Done(self.format.format_follow_id(id)))
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec::Vec;

    use serde_json::json;

    use super::Classifier;
    use crate::format::JsonFormat;
    use crate::impls::KeyValue;
    use crate::options::ClassifyOptions;
    use crate::{Classify, ClassifyError, Typed};

    fn classify<T: Typed>(value: &T) -> Result<serde_json::Value, ClassifyError> {
        let format = JsonFormat::new();
        let options = ClassifyOptions::default();
        Classifier::new(&format, &options).classify_dyn(value, T::type_info())
    }

    #[test]
    fn containers() {
        let map = BTreeMap::from([(String::from("b"), (1_u8, 'c')), (String::from("a"), (2, 'd'))]);
        assert_eq!(classify(&map).unwrap(), json!({ "a": [2, "d"], "b": [1, "c"] }));

        let pair = KeyValue::new(3_i8, Vec::from([true]));
        assert_eq!(classify(&pair).unwrap(), json!({ "key": 3, "value": [true] }));
    }

    #[derive(Classify, Default)]
    #[classify(default)]
    struct WithObjectKey {
        map: BTreeMap<(u8, u8), u8>,
    }

    #[test]
    fn object_keys_are_rejected() {
        let value = WithObjectKey {
            map: BTreeMap::from([((1, 2), 3)]),
        };
        let err = classify(&value).unwrap_err();
        assert!(matches!(err.root_cause(), ClassifyError::Configuration(_)));
        assert!(matches!(err, ClassifyError::Field { .. }));
    }
}
