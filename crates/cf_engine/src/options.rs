//! Per-call configuration.

use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;
use std::path::PathBuf;

use cf_utils::TypeIdMap;

use crate::format::FormatAdapter;
use crate::info::{Type, TypeInfo};
use crate::registry::TypeRegistry;
use crate::store::{DirectoryStore, UnitStore};
use crate::{Classify, ClassifyError, Typed};

type ToWire = Box<dyn Fn(&dyn Classify) -> Result<Box<dyn Classify>, ClassifyError> + Send + Sync>;
type FromWire = Box<dyn Fn(Box<dyn Classify>) -> Result<Box<dyn Classify>, ClassifyError> + Send + Sync>;

// -----------------------------------------------------------------------------
// Substitution

/// A conversion of a type to another type on the wire.
pub struct Substitution {
    source: Type,
    target: &'static TypeInfo,
    to: ToWire,
    from: FromWire,
}

impl Substitution {
    /// The type written in place of the source type.
    #[inline]
    pub fn target(&self) -> &'static TypeInfo {
        self.target
    }

    #[inline]
    pub fn source(&self) -> &Type {
        &self.source
    }

    /// Convert a source value to its substitute.
    #[inline]
    pub fn to_wire(&self, value: &dyn Classify) -> Result<Box<dyn Classify>, ClassifyError> {
        (self.to)(value)
    }

    /// Convert a substitute back to the source type.
    #[inline]
    pub fn from_wire(&self, value: Box<dyn Classify>) -> Result<Box<dyn Classify>, ClassifyError> {
        (self.from)(value)
    }
}

// -----------------------------------------------------------------------------
// TypeOptions

/// Substitution and hooks of one type, for elements of type `E`.
///
/// ```
/// use cf_engine::Classify;
/// use cf_engine::options::{ClassifyOptions, TypeOptions};
///
/// #[derive(Classify, Default)]
/// #[classify(default)]
/// struct Timeout {
///     millis: u64,
/// }
///
/// // Written as a bare number.
/// let options = ClassifyOptions::<serde_json::Value>::builder()
///     .type_options::<Timeout>(
///         TypeOptions::new()
///             .substitute(|t: &Timeout| t.millis, |millis: u64| Ok(Timeout { millis })),
///     )
///     .build();
/// assert!(options.is_ok());
/// ```
pub struct TypeOptions<E> {
    substitution: Option<Substitution>,
    before_classify: Option<Box<dyn Fn(&dyn Classify) + Send + Sync>>,
    after_classify: Option<Box<dyn Fn(&mut E) + Send + Sync>>,
    before_declassify: Option<Box<dyn Fn(&E) + Send + Sync>>,
    after_declassify: Option<Box<dyn Fn(&mut dyn Classify, &E) + Send + Sync>>,
}

impl<E> Default for TypeOptions<E> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TypeOptions<E> {
    pub const fn new() -> Self {
        Self {
            substitution: None,
            before_classify: None,
            after_classify: None,
            before_declassify: None,
            after_declassify: None,
        }
    }

    /// Write `T` as `S`, converting with `to` and back with `from`.
    pub fn substitute<T, S>(
        mut self,
        to: impl Fn(&T) -> S + Send + Sync + 'static,
        from: impl Fn(S) -> Result<T, ClassifyError> + Send + Sync + 'static,
    ) -> Self
    where
        T: Typed,
        S: Typed,
    {
        self.substitution = Some(Substitution {
            source: Type::of::<T>(),
            target: S::type_info(),
            to: Box::new(
                move |value: &dyn Classify| -> Result<Box<dyn Classify>, ClassifyError> {
                    let found = value.classify_info().type_path();
                    let value = value
                        .downcast_ref::<T>()
                        .ok_or_else(|| ClassifyError::mismatch(T::type_path(), found))?;
                    Ok(Box::new(to(value)))
                },
            ),
            from: Box::new(
                move |value: Box<dyn Classify>| -> Result<Box<dyn Classify>, ClassifyError> {
                    Ok(Box::new(from(S::from_boxed(value)?)?))
                },
            ),
        });
        self
    }

    /// Runs before a value of the type is classified.
    pub fn before_classify(mut self, hook: impl Fn(&dyn Classify) + Send + Sync + 'static) -> Self {
        self.before_classify = Some(Box::new(hook));
        self
    }

    /// Runs on the element written for a value of the type.
    pub fn after_classify(mut self, hook: impl Fn(&mut E) + Send + Sync + 'static) -> Self {
        self.after_classify = Some(Box::new(hook));
        self
    }

    /// Runs on an element before it is declassified as the type.
    pub fn before_declassify(mut self, hook: impl Fn(&E) + Send + Sync + 'static) -> Self {
        self.before_declassify = Some(Box::new(hook));
        self
    }

    /// Runs on a declassified value together with its element.
    pub fn after_declassify(
        mut self,
        hook: impl Fn(&mut dyn Classify, &E) + Send + Sync + 'static,
    ) -> Self {
        self.after_declassify = Some(Box::new(hook));
        self
    }

    #[inline]
    pub fn substitution(&self) -> Option<&Substitution> {
        self.substitution.as_ref()
    }

    #[inline]
    pub(crate) fn has_after_classify(&self) -> bool {
        self.after_classify.is_some()
    }

    #[inline]
    pub(crate) fn has_after_declassify(&self) -> bool {
        self.after_declassify.is_some()
    }

    pub(crate) fn run_before_classify(&self, value: &dyn Classify) {
        if let Some(hook) = &self.before_classify {
            hook(value);
        }
    }

    pub(crate) fn run_after_classify(&self, element: &mut E) {
        if let Some(hook) = &self.after_classify {
            hook(element);
        }
    }

    pub(crate) fn run_before_declassify(&self, element: &E) {
        if let Some(hook) = &self.before_declassify {
            hook(element);
        }
    }

    pub(crate) fn run_after_declassify(&self, value: &mut dyn Classify, element: &E) {
        if let Some(hook) = &self.after_declassify {
            hook(value, element);
        }
    }
}

impl<E> fmt::Debug for TypeOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeOptions")
            .field("substitution", &self.substitution.as_ref().map(|s| s.target.type_path()))
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ClassifyOptions

struct OptionsInner<E> {
    registry: TypeRegistry,
    types: TypeIdMap<TypeOptions<E>>,
    store: Option<Arc<dyn UnitStore<E>>>,
}

/// Everything a (de)classification call is configured with.
///
/// Cheap to clone. [`Default`] holds [`TypeRegistry::new`], no type
/// options and no unit store.
pub struct ClassifyOptions<E> {
    inner: Arc<OptionsInner<E>>,
}

impl<E> Clone for ClassifyOptions<E> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: 'static> Default for ClassifyOptions<E> {
    fn default() -> Self {
        Self {
            inner: Arc::new(OptionsInner {
                registry: TypeRegistry::new(),
                types: TypeIdMap::new(),
                store: None,
            }),
        }
    }
}

impl<E: 'static> ClassifyOptions<E> {
    #[inline]
    pub fn builder() -> ClassifyOptionsBuilder<E> {
        ClassifyOptionsBuilder::new()
    }

    #[inline]
    pub fn registry(&self) -> &TypeRegistry {
        &self.inner.registry
    }

    #[inline]
    pub fn type_options(&self, type_id: TypeId) -> Option<&TypeOptions<E>> {
        self.inner.types.get(&type_id)
    }

    #[inline]
    pub fn substitution(&self, type_id: TypeId) -> Option<&Substitution> {
        self.type_options(type_id).and_then(TypeOptions::substitution)
    }

    #[inline]
    pub fn store(&self) -> Option<&Arc<dyn UnitStore<E>>> {
        self.inner.store.as_ref()
    }
}

impl<E> fmt::Debug for ClassifyOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifyOptions")
            .field("registry", &self.inner.registry)
            .field("types", &self.inner.types.len())
            .field("store", &self.inner.store.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ClassifyOptionsBuilder

/// Builder of [`ClassifyOptions`], validated by [`build`](Self::build).
pub struct ClassifyOptionsBuilder<E> {
    registry: Option<TypeRegistry>,
    types: Vec<(&'static TypeInfo, TypeOptions<E>)>,
    store: Option<Arc<dyn UnitStore<E>>>,
}

impl<E: 'static> ClassifyOptionsBuilder<E> {
    pub fn new() -> Self {
        Self {
            registry: None,
            types: Vec::new(),
            store: None,
        }
    }

    /// The table type tags are resolved with. Defaults to [`TypeRegistry::new`].
    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Substitution and hooks for `T`.
    pub fn type_options<T: Typed>(mut self, options: TypeOptions<E>) -> Self {
        self.types.push((T::type_info(), options));
        self
    }

    /// Store follow-id units as `<path>/<TypeName>/<id>.<ext>`.
    pub fn base_directory<F>(mut self, path: impl Into<PathBuf>, format: F) -> Self
    where
        F: FormatAdapter<Element = E> + Send + Sync,
    {
        self.store = Some(Arc::new(DirectoryStore::new(path, format)));
        self
    }

    /// A custom store for follow-id units.
    pub fn unit_store(mut self, store: Arc<dyn UnitStore<E>>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validate and freeze the options.
    ///
    /// Fails with [`ClassifyError::Configuration`] for a type registered
    /// twice, a substitution declared for another type, or a type
    /// substituted by itself.
    pub fn build(self) -> Result<ClassifyOptions<E>, ClassifyError> {
        let mut registry = self.registry.unwrap_or_default();
        let mut types = TypeIdMap::with_capacity(self.types.len());

        for (info, options) in self.types {
            if let Some(substitution) = &options.substitution {
                if substitution.source.id() != info.type_id() {
                    return Err(ClassifyError::Configuration(format!(
                        "substitution for `{}` is declared on `{}`",
                        substitution.source.path(),
                        info.type_path(),
                    )));
                }
                if substitution.target.type_id() == info.type_id() {
                    return Err(ClassifyError::Configuration(format!(
                        "`{}` cannot be substituted by itself",
                        info.type_path(),
                    )));
                }
                registry.register_info(substitution.target);
            }

            registry.register_info(info);
            if types.insert(info.type_id(), options).is_some() {
                return Err(ClassifyError::Configuration(format!(
                    "type options for `{}` are registered twice",
                    info.type_path(),
                )));
            }
        }

        Ok(ClassifyOptions {
            inner: Arc::new(OptionsInner {
                registry,
                types,
                store: self.store,
            }),
        })
    }
}

impl<E: 'static> Default for ClassifyOptionsBuilder<E> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};

    use super::{ClassifyOptions, TypeOptions};
    use crate::ClassifyError;

    #[test]
    fn invalid_substitutions() {
        let wrong_type = ClassifyOptions::<u8>::builder()
            .type_options::<u32>(TypeOptions::new().substitute(|v: &u16| v.to_string(), |_: String| Ok(0_u16)))
            .build();
        assert!(matches!(wrong_type, Err(ClassifyError::Configuration(_))));

        let identity = ClassifyOptions::<u8>::builder()
            .type_options::<u32>(TypeOptions::new().substitute(|v: &u32| *v, |v: u32| Ok(v)))
            .build();
        assert!(matches!(identity, Err(ClassifyError::Configuration(_))));
    }

    #[test]
    fn duplicate_registration() {
        let duplicate = ClassifyOptions::<u8>::builder()
            .type_options::<u32>(TypeOptions::new())
            .type_options::<u32>(TypeOptions::new())
            .build();
        assert!(matches!(duplicate, Err(ClassifyError::Configuration(_))));
    }

    #[test]
    fn substitution_converts() {
        let options = ClassifyOptions::<u8>::builder()
            .type_options::<u32>(TypeOptions::new().substitute(
                |v: &u32| v.to_string(),
                |s: String| s.parse().map_err(|_| ClassifyError::malformed("not a number")),
            ))
            .build()
            .unwrap();

        let substitution = options.substitution(core::any::TypeId::of::<u32>()).unwrap();
        assert!(substitution.target().is::<String>());
        let wire = substitution.to_wire(&12_u32).unwrap();
        assert_eq!((*wire).downcast_ref::<String>().map(String::as_str), Some("12"));

        let back = substitution.from_wire(wire).unwrap();
        assert_eq!((*back).downcast_ref::<u32>(), Some(&12));
        assert!(options.registry().get_with_type_name("u32").is_some());
    }
}
