//! Lazily evaluated values.

use alloc::boxed::Box;
use alloc::string::String;
use core::cell::{OnceCell, RefCell};
use core::fmt;

use crate::info::{DeferredInfo, GenericInfoCell, Loader, TypeInfo, TypePath};
use crate::value::{DeferredValue, ValueRef, impl_classify_cast};
use crate::{Classify, ClassifyError, Typed};

type DeferredLoader<T> = Box<dyn FnOnce() -> Result<T, ClassifyError>>;

// -----------------------------------------------------------------------------
// Deferred

/// A value that is either present or produced on first access.
///
/// Evaluation happens at most once. A failed load is remembered, later
/// calls to [`get`](Deferred::get) return the same error.
///
/// Combined with `#[classify(follow_id)]`, the value is written to its own
/// unit and only its id is stored in the enclosing element.
///
/// ```
/// use cf_engine::Deferred;
///
/// let lazy = Deferred::lazy("a", || Ok(40 + 2));
/// assert!(!lazy.is_evaluated());
/// assert_eq!(lazy.get().ok(), Some(&42));
/// assert_eq!(lazy.id(), Some("a"));
/// ```
pub struct Deferred<T> {
    id: Option<String>,
    value: OnceCell<T>,
    loader: RefCell<Option<DeferredLoader<T>>>,
    failure: OnceCell<ClassifyError>,
}

impl<T> Deferred<T> {
    /// An evaluated value without id.
    pub fn new(value: T) -> Self {
        Self {
            id: None,
            value: OnceCell::from(value),
            loader: RefCell::new(None),
            failure: OnceCell::new(),
        }
    }

    /// An evaluated value stored under `id`.
    pub fn with_id(id: impl Into<String>, value: T) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::new(value)
        }
    }

    /// An unevaluated value, `loader` runs on first access.
    pub fn lazy<F>(id: impl Into<String>, loader: F) -> Self
    where
        F: FnOnce() -> Result<T, ClassifyError> + 'static,
    {
        Self {
            id: Some(id.into()),
            value: OnceCell::new(),
            loader: RefCell::new(Some(Box::new(loader))),
            failure: OnceCell::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[inline]
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.value.get().is_some()
    }

    /// The value, evaluating it first if needed.
    pub fn get(&self) -> Result<&T, ClassifyError> {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }
        if let Some(err) = self.failure.get() {
            return Err(err.clone());
        }

        let loader = self
            .loader
            .borrow_mut()
            .take()
            .ok_or_else(|| ClassifyError::malformed("deferred value is evaluated recursively"))?;

        match loader() {
            Ok(value) => Ok(self.value.get_or_init(|| value)),
            Err(err) => Err(self.failure.get_or_init(|| err).clone()),
        }
    }

    /// Mutable access, evaluating first if needed.
    pub fn get_mut(&mut self) -> Result<&mut T, ClassifyError> {
        self.get()?;
        self.value
            .get_mut()
            .ok_or_else(|| ClassifyError::malformed("deferred value is not evaluated"))
    }

    /// Replace the value, dropping any pending loader or failure.
    pub fn set(&mut self, value: T) {
        self.value = OnceCell::from(value);
        self.loader = RefCell::new(None);
        self.failure = OnceCell::new();
    }

    pub fn into_inner(self) -> Result<T, ClassifyError> {
        self.get()?;
        self.value
            .into_inner()
            .ok_or_else(|| ClassifyError::malformed("deferred value is not evaluated"))
    }
}

impl<T: Default> Default for Deferred<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("id", &self.id)
            .field("value", &self.value.get())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Classify

fn ready<T: Typed>(value: Box<dyn Classify>) -> Result<Box<dyn Classify>, ClassifyError> {
    Ok(Box::new(Deferred::new(T::from_boxed(value)?)))
}

fn lazy<T: Typed>(id: String, loader: Loader) -> Box<dyn Classify> {
    Box::new(Deferred::lazy(id, move || loader().and_then(T::from_boxed)))
}

impl<T: Typed> TypePath for Deferred<T> {
    crate::impls::generic_type_path!("cf_engine::Deferred", "Deferred"; T);
}

impl<T: Typed> Typed for Deferred<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericInfoCell = GenericInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Deferred(DeferredInfo::new::<Self>(T::type_info, ready::<T>, lazy::<T>))
        })
    }
}

impl<T: Typed> Classify for Deferred<T> {
    impl_classify_cast!();

    #[inline]
    fn value_ref(&self) -> ValueRef<'_> {
        ValueRef::Deferred(self)
    }
}

impl<T: Typed> DeferredValue for Deferred<T> {
    #[inline]
    fn id(&self) -> Option<&str> {
        Deferred::id(self)
    }

    fn evaluated(&self) -> Option<&dyn Classify> {
        self.value.get().map(|v| v as &dyn Classify)
    }

    fn force(&self) -> Result<&dyn Classify, ClassifyError> {
        self.get().map(|v| v as &dyn Classify)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::string::String;
    use core::cell::Cell;

    use super::Deferred;
    use crate::{Classify, ClassifyError, Typed};

    #[test]
    fn evaluates_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let lazy = Deferred::lazy("x", move || {
            counter.set(counter.get() + 1);
            Ok(String::from("loaded"))
        });

        assert_eq!(lazy.get().unwrap(), "loaded");
        assert_eq!(lazy.get().unwrap(), "loaded");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn failure_is_remembered() {
        let lazy = Deferred::<u8>::lazy("x", || Err(ClassifyError::malformed("broken")));
        assert!(matches!(lazy.get(), Err(ClassifyError::Malformed(_))));
        assert!(matches!(lazy.get(), Err(ClassifyError::Malformed(_))));
        assert!(!lazy.is_evaluated());
    }

    #[test]
    fn info_builds_values() {
        let info = <Deferred<u8>>::type_info().as_deferred().unwrap();
        assert_eq!(info.inner().type_path(), "u8");

        let ready = info.ready(Box::new(3_u8)).unwrap();
        let ready = (*ready).downcast_ref::<Deferred<u8>>().unwrap();
        assert_eq!(ready.get().ok(), Some(&3));

        let lazy = info.lazy(String::from("7"), Box::new(|| Ok(Box::new(7_u8) as Box<dyn Classify>)));
        let lazy = (*lazy).downcast_ref::<Deferred<u8>>().unwrap();
        assert_eq!(lazy.id(), Some("7"));
        assert_eq!(lazy.get().ok(), Some(&7));
    }
}
