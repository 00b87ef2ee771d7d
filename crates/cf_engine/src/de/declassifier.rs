use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};

use crate::de::plan::Plan;
use crate::format::FormatAdapter;
use crate::info::{FieldInfo, Loader, ObjectInfo, SharedInfo, TypeInfo, TypeKind};
use crate::introspect::{FieldBehavior, field_behavior};
use crate::options::{ClassifyOptions, TypeOptions};
use crate::track::{Slot, SlotId, SlotTable};
use crate::{Classify, ClassifyError};

// -----------------------------------------------------------------------------
// Helpers

fn set_field(
    instance: &mut dyn Classify,
    info: &ObjectInfo,
    field: &FieldInfo,
    value: Box<dyn Classify>,
) -> Result<(), ClassifyError> {
    instance
        .as_object_mut()
        .ok_or_else(|| ClassifyError::uninstantiable(info.ty().path(), "not a plain object"))?
        .set_field(field.name(), value)
}

/// The value a parent field of type `info` receives for `handle`.
fn parent_value(info: &TypeInfo, handle: &Rc<dyn Any>) -> Option<Box<dyn Classify>> {
    match info {
        TypeInfo::Weak(weak) => weak.from_handle(handle),
        TypeInfo::Shared(shared) => shared.to_value(Rc::clone(handle)).ok(),
        TypeInfo::Option(option) => {
            parent_value(option.inner(), handle).and_then(|value| option.some(value).ok())
        }
        _ => None,
    }
}

// -----------------------------------------------------------------------------
// Declassifier

/// One declassification session.
///
/// Referable ids are scoped to the session.
///
/// ```
/// use cf_engine::de::Declassifier;
/// use cf_engine::format::JsonFormat;
/// use cf_engine::options::ClassifyOptions;
/// use cf_engine::Typed;
/// use serde_json::json;
///
/// let format = JsonFormat::new();
/// let options = ClassifyOptions::default();
///
/// let value = Declassifier::new(&format, &options)
///     .declassify_dyn(<Vec<Option<u8>>>::type_info(), &json!([1, null]), None)
///     .unwrap();
/// assert_eq!(value.take::<Vec<Option<u8>>>().unwrap(), [Some(1), None]);
/// ```
pub struct Declassifier<'a, F: FormatAdapter> {
    format: &'a F,
    options: &'a ClassifyOptions<F::Element>,
    slots: SlotTable,
    /// Content of allocated handles, children before their owners.
    actions: Vec<(SlotId, Plan<F::Element>)>,
}

impl<'a, F: FormatAdapter> Declassifier<'a, F> {
    pub fn new(format: &'a F, options: &'a ClassifyOptions<F::Element>) -> Self {
        Self {
            format,
            options,
            slots: SlotTable::default(),
            actions: Vec::new(),
        }
    }

    /// Declassify `element` as `declared`.
    ///
    /// `parent` is the shared object handed to parent fields that have no
    /// closer enclosing shared object.
    pub fn declassify_dyn(
        &mut self,
        declared: &'static TypeInfo,
        element: &F::Element,
        parent: Option<&Rc<dyn Any>>,
    ) -> Result<Box<dyn Classify>, ClassifyError> {
        log::debug!("declassifying `{}`", declared.type_path());
        let root = self.plan(declared, element, parent)?;

        for (slot, content) in core::mem::take(&mut self.actions) {
            let content = self.materialize(content)?;
            let slot = self.slot(slot)?;
            slot.info.replace(&*slot.handle, content)?;
        }

        let value = self.materialize(root);
        self.slots = SlotTable::default();
        value
    }

    fn slot(&self, slot: SlotId) -> Result<&Slot, ClassifyError> {
        self.slots
            .get(slot)
            .ok_or_else(|| ClassifyError::malformed("slot of another session"))
    }

    // -------------------------------------------------------------------------
    // Plan

    fn plan(
        &mut self,
        declared: &'static TypeInfo,
        element: &F::Element,
        parent: Option<&Rc<dyn Any>>,
    ) -> Result<Plan<F::Element>, ClassifyError> {
        let format = self.format;

        // Element values and substituted types read the element as it is.
        if declared.type_id() == TypeId::of::<F::Element>()
            || self.options.substitution(declared.type_id()).is_some()
        {
            return self.plan_content(declared, element, parent, None);
        }

        if format.is_null(format.unwrap_value(element)) {
            match declared {
                TypeInfo::Option(option) => return Ok(Plan::Ready(option.none())),
                // The content may be nullable.
                TypeInfo::Shared(_) | TypeInfo::Deferred(_) => {}
                _ => {
                    return Err(ClassifyError::Malformed(format!(
                        "null for non-nullable `{}`",
                        declared.type_path()
                    )));
                }
            }
        }
        if let TypeInfo::Option(option) = declared {
            let inner = self.plan(option.inner(), element, parent)?;
            return Ok(Plan::Wrap {
                info: declared,
                inner: Box::new(inner),
            });
        }
        if format.is_reference(element) {
            return Ok(Plan::Reference(format.get_reference_id(element)?));
        }

        let registry = self.options.registry();
        let tag = format.get_type_tag(element);
        if let TypeInfo::Dynamic(_) = declared {
            let Some(tag) = tag else {
                return Err(ClassifyError::uninstantiable(
                    declared.type_path(),
                    "the element has no type tag",
                ));
            };
            return match registry.resolve_tag(&tag) {
                Some(actual) if actual.kind() != TypeKind::Dynamic => self.plan(actual, element, parent),
                Some(_) => Err(ClassifyError::uninstantiable(
                    declared.type_path(),
                    "a type tag must name a concrete type",
                )),
                None => {
                    log::warn!("unknown type tag `{}`", tag.name);
                    Err(ClassifyError::uninstantiable(
                        declared.type_path(),
                        format!("unknown type tag `{}`", tag.name),
                    ))
                }
            };
        }
        if let Some(tag) = tag {
            match registry.resolve_tag(&tag) {
                None => log::warn!(
                    "unknown type tag `{}`, using `{}`",
                    tag.name,
                    declared.type_path()
                ),
                Some(actual) if actual.type_id() != declared.type_id() => log::debug!(
                    "type tag `{}` does not fit `{}`, ignored",
                    tag.name,
                    declared.type_path()
                ),
                Some(_) => {}
            }
        }

        match declared {
            TypeInfo::Shared(shared) => self.plan_shared(shared, element, parent),
            TypeInfo::Deferred(deferred) => {
                let inner = self.plan(deferred.inner(), element, parent)?;
                Ok(Plan::Wrap {
                    info: declared,
                    inner: Box::new(inner),
                })
            }
            TypeInfo::Weak(_) => Err(ClassifyError::Configuration(format!(
                "`{}` can only be used in a parent field",
                declared.type_path()
            ))),
            _ => self.plan_content(declared, element, parent, None),
        }
    }

    /// Allocate a handle around a placeholder; its content is populated
    /// once the whole element is planned.
    fn plan_shared(
        &mut self,
        info: &'static SharedInfo,
        element: &F::Element,
        parent: Option<&Rc<dyn Any>>,
    ) -> Result<Plan<F::Element>, ClassifyError> {
        let format = self.format;
        let inner = info.inner();
        let placeholder: Box<dyn Classify> = match inner {
            // Any value fits a dynamic cell until its content is swapped in.
            TypeInfo::Dynamic(_) => Box::new(0_u8),
            _ => inner.default_value().ok_or_else(|| {
                ClassifyError::uninstantiable(
                    inner.type_path(),
                    "shared values need a parameterless constructor",
                )
            })?,
        };
        let handle = info.allocate(placeholder)?;

        let id = if format.is_referable(element) {
            Some(format.get_reference_id(element)?)
        } else {
            None
        };
        let slot = self.slots.insert(Rc::clone(&handle), info, id)?;

        let content = self.plan_content(inner, element, parent, Some(&handle))?;
        self.actions.push((slot, content));
        Ok(Plan::Slot(slot))
    }

    /// Plan a value of `info` itself, after wrappers are resolved.
    ///
    /// `owner` is the handle this value is the content of, if any. It is
    /// the parent of nested values, but not of this value's own parent
    /// fields.
    fn plan_content(
        &mut self,
        info: &'static TypeInfo,
        element: &F::Element,
        parent: Option<&Rc<dyn Any>>,
        owner: Option<&Rc<dyn Any>>,
    ) -> Result<Plan<F::Element>, ClassifyError> {
        let options = self.options;
        let type_options = options.type_options(info.type_id());
        if let Some(hooks) = type_options {
            hooks.run_before_declassify(element);
        }

        let mut plan = match type_options.and_then(TypeOptions::substitution) {
            Some(substitution) => {
                let inner = self.plan(substitution.target(), element, owner.or(parent))?;
                Plan::Substitute {
                    source: info.type_id(),
                    inner: Box::new(inner),
                }
            }
            None => self.plan_shape(info, element, parent, owner)?,
        };

        if type_options.is_some_and(|hooks| hooks.has_after_declassify()) {
            plan = Plan::Hooked {
                type_id: info.type_id(),
                element: element.clone(),
                inner: Box::new(plan),
            };
        }
        Ok(plan)
    }

    fn plan_shape(
        &mut self,
        info: &'static TypeInfo,
        element: &F::Element,
        parent: Option<&Rc<dyn Any>>,
        owner: Option<&Rc<dyn Any>>,
    ) -> Result<Plan<F::Element>, ClassifyError> {
        let format = self.format;
        let payload = format.unwrap_value(element);
        let children = owner.or(parent);

        if info.type_id() == TypeId::of::<F::Element>() {
            return Ok(Plan::Ready(Box::new(format.get_self_value(element))));
        }

        match info {
            TypeInfo::Simple(simple) => {
                let scalar = format.get_simple_value(payload)?;
                Ok(Plan::Ready(simple.convert(&scalar)?))
            }
            TypeInfo::Opaque(_) => Err(ClassifyError::uninstantiable(
                info.type_path(),
                "opaque types cannot be declassified",
            )),
            TypeInfo::Tuple(tuple) => {
                let items = format.get_list(payload, Some(tuple.len()))?;
                if items.len() != tuple.len() {
                    return Err(ClassifyError::Malformed(format!(
                        "`{}` needs {} elements, found {}",
                        info.type_path(),
                        tuple.len(),
                        items.len()
                    )));
                }
                let parts = items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| -> Result<_, ClassifyError> {
                        let declared = tuple.element(index).ok_or_else(|| {
                            ClassifyError::malformed(format!("no tuple element #{index}"))
                        })?;
                        self.plan(declared, item, children)
                    })
                    .collect::<Result<_, _>>()?;
                Ok(Plan::Parts { info, parts })
            }
            TypeInfo::KeyValue(pair) => {
                let (key, value) = format.get_key_value_pair(payload)?;
                let parts = Vec::from([
                    self.plan(pair.key(), key, children)?,
                    self.plan(pair.value(), value, children)?,
                ]);
                Ok(Plan::Parts { info, parts })
            }
            TypeInfo::List(list) => {
                let parts = format
                    .get_list(payload, None)?
                    .into_iter()
                    .map(|item| self.plan(list.item(), item, children))
                    .collect::<Result<_, _>>()?;
                Ok(Plan::Parts { info, parts })
            }
            TypeInfo::Array(array) => {
                let items = format.get_list(payload, array.len())?;
                if let Some(len) = array.len()
                    && items.len() != len
                {
                    return Err(ClassifyError::Malformed(format!(
                        "`{}` needs {len} items, found {}",
                        info.type_path(),
                        items.len()
                    )));
                }
                let parts = items
                    .into_iter()
                    .map(|item| self.plan(array.item(), item, children))
                    .collect::<Result<_, _>>()?;
                Ok(Plan::Parts { info, parts })
            }
            TypeInfo::Map(map) => {
                map.checked_key_kind()?;
                let key = map.key().as_simple()?;
                let entries = format
                    .get_dictionary(payload)?
                    .into_iter()
                    .map(|(scalar, value)| -> Result<_, ClassifyError> {
                        Ok((key.convert(&scalar)?, self.plan(map.value(), value, children)?))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Plan::Map { info: map, entries })
            }
            TypeInfo::Object(object) => self.plan_object(object, payload, parent, children),
            _ => self.plan(info, element, children),
        }
    }

    fn plan_object(
        &mut self,
        info: &'static ObjectInfo,
        element: &F::Element,
        parent: Option<&Rc<dyn Any>>,
        children: Option<&Rc<dyn Any>>,
    ) -> Result<Plan<F::Element>, ClassifyError> {
        let mut instance = info.construct().ok_or_else(|| {
            ClassifyError::uninstantiable(
                info.ty().path(),
                "no parameterless constructor, add `#[classify(default)]`",
            )
        })?;
        (*instance).before_declassify();

        let mut fields = Vec::with_capacity(info.fields().len());
        for field in info.fields() {
            let planned = match field_behavior(info, field) {
                FieldBehavior::Ignore => Ok(None),
                FieldBehavior::Parent => self.assign_parent(&mut *instance, info, field, parent).map(|()| None),
                FieldBehavior::FollowId => self.follow_id(&mut *instance, info, field, element).map(|()| None),
                FieldBehavior::Persist { .. } => match self.format.get_field(element, field.name()) {
                    Some(value) => self.plan(field.type_info(), value, children).map(Some),
                    // Missing fields keep their constructor value.
                    None => Ok(None),
                },
            };
            if let Some(plan) = planned.map_err(|err| err.in_field(info.ty().path(), field.name()))? {
                fields.push((field, plan));
            }
        }

        Ok(Plan::Object {
            info,
            instance,
            fields,
        })
    }

    fn assign_parent(
        &self,
        instance: &mut dyn Classify,
        info: &ObjectInfo,
        field: &FieldInfo,
        parent: Option<&Rc<dyn Any>>,
    ) -> Result<(), ClassifyError> {
        let Some(handle) = parent else {
            log::debug!("no enclosing shared value for parent field `{}`", field.name());
            return Ok(());
        };
        match parent_value(field.type_info(), handle) {
            Some(value) => set_field(instance, info, field, value),
            None => {
                log::debug!(
                    "enclosing shared value does not fit parent field `{}: {}`",
                    field.name(),
                    field.type_info().type_path()
                );
                Ok(())
            }
        }
    }

    /// Assign a lazy value loading the unit named by the placeholder.
    fn follow_id(
        &self,
        instance: &mut dyn Classify,
        info: &ObjectInfo,
        field: &FieldInfo,
        element: &F::Element,
    ) -> Result<(), ClassifyError> {
        let field_info = field.type_info();
        let TypeInfo::Deferred(deferred) = field_info else {
            return Err(ClassifyError::Configuration(format!(
                "follow-id fields must be `Deferred`, found `{}`",
                field_info.type_path()
            )));
        };
        let Some(placeholder) = self.format.get_field(element, field.name()) else {
            return Ok(());
        };
        if !self.format.is_follow_id(placeholder) {
            return Err(ClassifyError::malformed("expected a follow-id placeholder"));
        }
        let store = self.options.store().ok_or_else(|| ClassifyError::MissingBaseDirectory {
            field: field.name().into(),
        })?;
        let id = self.format.get_reference_id(placeholder)?;

        let store = Arc::clone(store);
        let format = self.format.clone();
        let options = self.options.clone();
        let inner = deferred.inner();
        let unit_id = id.clone();
        let loader: Loader = Box::new(move || {
            let element = store.load_unit(inner.type_name(), &unit_id)?;
            Declassifier::new(&format, &options).declassify_dyn(inner, &element, None)
        });

        set_field(instance, info, field, deferred.lazy(id, loader))
    }

    // -------------------------------------------------------------------------
    // Materialize

    fn materialize(&self, plan: Plan<F::Element>) -> Result<Box<dyn Classify>, ClassifyError> {
        match plan {
            Plan::Ready(value) => Ok(value),
            Plan::Slot(slot) => {
                let slot = self.slot(slot)?;
                slot.info.to_value(Rc::clone(&slot.handle))
            }
            Plan::Reference(id) => {
                let Some(slot) = self.slots.resolve(&id) else {
                    return Err(ClassifyError::UnresolvedReference { id });
                };
                let slot = self.slot(slot)?;
                slot.info.to_value(Rc::clone(&slot.handle))
            }
            Plan::Wrap { info, inner } => {
                let value = self.materialize(*inner)?;
                match info {
                    TypeInfo::Option(option) => option.some(value),
                    TypeInfo::Deferred(deferred) => deferred.ready(value),
                    _ => Err(ClassifyError::mismatch("Option or Deferred", info.type_path())),
                }
            }
            Plan::Parts { info, parts } => {
                let values = parts
                    .into_iter()
                    .map(|part| self.materialize(part))
                    .collect::<Result<Vec<_>, _>>()?;
                match info {
                    TypeInfo::Tuple(tuple) => tuple.build(values),
                    TypeInfo::List(list) => list.build(values),
                    TypeInfo::Array(array) => array.build(values),
                    TypeInfo::KeyValue(pair) => {
                        let mut values = values.into_iter();
                        match (values.next(), values.next()) {
                            (Some(key), Some(value)) => pair.build(key, value),
                            _ => Err(ClassifyError::malformed("incomplete key-value pair")),
                        }
                    }
                    _ => Err(ClassifyError::mismatch("a positional type", info.type_path())),
                }
            }
            Plan::Map { info, entries } => {
                let entries = entries
                    .into_iter()
                    .map(|(key, value)| -> Result<_, ClassifyError> {
                        Ok((key, self.materialize(value)?))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                info.build(entries)
            }
            Plan::Object {
                info,
                mut instance,
                fields,
            } => {
                for (field, plan) in fields {
                    self.materialize(plan)
                        .and_then(|value| set_field(&mut *instance, info, field, value))
                        .map_err(|err| err.in_field(info.ty().path(), field.name()))?;
                }
                (*instance).after_declassify();
                Ok(instance)
            }
            Plan::Substitute { source, inner } => {
                let value = self.materialize(*inner)?;
                let substitution = self.options.substitution(source).ok_or_else(|| {
                    ClassifyError::configuration("substitution removed during a session")
                })?;
                substitution.from_wire(value)
            }
            Plan::Hooked {
                type_id,
                element,
                inner,
            } => {
                let mut value = self.materialize(*inner)?;
                if let Some(hooks) = self.options.type_options(type_id) {
                    hooks.run_after_declassify(&mut *value, &element);
                }
                Ok(value)
            }
        }
    }
}
