use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

use crate::ClassifyError;
use crate::info::{TypeInfo, TypePath};
use crate::value::{Object, ValueRef};

// -----------------------------------------------------------------------------
// Classify

/// A value the engine can classify and rebuild.
///
/// This trait is object safe; graphs are walked as `&dyn Classify`.
/// Implement it with `#[derive(Classify)]` rather than by hand.
///
/// The four hook methods run around (de)classification of the value
/// itself. They do nothing by default; `#[classify(hooks)]` forwards them
/// to the type's [`ClassifyHooks`] impl.
pub trait Classify: Any {
    /// The [`TypeInfo`] of the runtime type.
    fn classify_info(&self) -> &'static TypeInfo;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// A view of this value shaped by its kind.
    fn value_ref(&self) -> ValueRef<'_>;

    /// Field access, for plain objects.
    #[inline]
    fn as_object_mut(&mut self) -> Option<&mut dyn Object> {
        None
    }

    #[inline]
    fn before_classify(&self) {}

    #[inline]
    fn after_classify(&self) {}

    /// Runs on a freshly constructed instance, before any field is set.
    #[inline]
    fn before_declassify(&mut self) {}

    /// Runs once every field is assigned.
    #[inline]
    fn after_declassify(&mut self) {}
}

/// Expand the type-erasure methods of [`Classify`].
macro_rules! impl_classify_cast {
    () => {
        #[inline]
        fn classify_info(&self) -> &'static $crate::info::TypeInfo {
            <Self as $crate::Typed>::type_info()
        }

        #[inline]
        fn as_any(&self) -> &dyn ::core::any::Any {
            self
        }

        #[inline]
        fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
            self
        }

        #[inline]
        fn into_any(self: ::alloc::boxed::Box<Self>) -> ::alloc::boxed::Box<dyn ::core::any::Any> {
            self
        }
    };
}

pub(crate) use impl_classify_cast;

impl dyn Classify {
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }

    /// Take the concrete value out of the box.
    #[inline]
    pub fn take<T: Typed>(self: Box<Self>) -> Result<T, ClassifyError> {
        T::from_boxed(self)
    }
}

impl fmt::Debug for dyn Classify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dyn Classify<{}>", self.classify_info().type_path())
    }
}

// -----------------------------------------------------------------------------
// Typed

/// Static access to a type's [`TypeInfo`].
pub trait Typed: Classify + TypePath + Sized {
    fn type_info() -> &'static TypeInfo;

    /// Unbox a materialized value of this type.
    fn from_boxed(value: Box<dyn Classify>) -> Result<Self, ClassifyError> {
        let found = (*value).classify_info().type_path();
        value
            .into_any()
            .downcast::<Self>()
            .map(|v| *v)
            .map_err(|_| ClassifyError::mismatch(Self::type_path(), found))
    }
}

// -----------------------------------------------------------------------------
// ClassifyHooks

/// Object-level hooks, enabled with `#[classify(hooks)]`.
///
/// ```
/// use cf_engine::{Classify, ClassifyHooks};
///
/// #[derive(Classify, Default)]
/// #[classify(default, hooks)]
/// struct Counter {
///     value: u32,
///     #[classify(ignore)]
///     loaded: bool,
/// }
///
/// impl ClassifyHooks for Counter {
///     fn after_declassify(&mut self) {
///         self.loaded = true;
///     }
/// }
/// ```
pub trait ClassifyHooks {
    fn before_classify(&self) {}

    fn after_classify(&self) {}

    fn before_declassify(&mut self) {}

    fn after_declassify(&mut self) {}
}
