//! Built-in implementations for std types.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::{IntoIter, Vec};

use crate::{Classify, ClassifyError, Typed};

// -----------------------------------------------------------------------------
// Modules

mod dynamic;
mod list;
mod map;
mod option;
mod shared;
mod simple;
mod tuple;

// -----------------------------------------------------------------------------
// Exports

pub use shared::Shared;
pub use tuple::KeyValue;

// -----------------------------------------------------------------------------
// Helpers

/// `prefix<a, b, ..>`, used by generic [`TypePath`](crate::info::TypePath) impls.
pub fn generic_path(prefix: &str, params: &[&str]) -> String {
    let mut out = String::from(prefix);
    out.push('<');
    for (index, param) in params.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        out.push_str(param);
    }
    out.push('>');
    out
}

/// Expand `type_path` and `type_name` of a generic type.
macro_rules! generic_type_path {
    ($path:literal, $name:literal; $($param:ty),+) => {
        fn type_path() -> &'static str {
            static CELL: $crate::info::GenericPathCell = $crate::info::GenericPathCell::new();
            CELL.get_or_insert::<Self>(|| {
                $crate::impls::generic_path(
                    $path,
                    &[$(<$param as $crate::info::TypePath>::type_path()),+],
                )
            })
        }

        fn type_name() -> &'static str {
            static CELL: $crate::info::GenericPathCell = $crate::info::GenericPathCell::new();
            CELL.get_or_insert::<Self>(|| {
                $crate::impls::generic_path(
                    $name,
                    &[$(<$param as $crate::info::TypePath>::type_name()),+],
                )
            })
        }
    };
}

pub(crate) use generic_type_path;

/// A boxed `T::default()`.
pub(crate) fn boxed_default<T: Typed + Default>() -> Box<dyn Classify> {
    Box::new(T::default())
}

/// Collect materialized items into `C`.
pub(crate) fn collect_items<C, T>(items: Vec<Box<dyn Classify>>) -> Result<Box<dyn Classify>, ClassifyError>
where
    C: Typed + FromIterator<T>,
    T: Typed,
{
    items
        .into_iter()
        .map(T::from_boxed)
        .collect::<Result<C, _>>()
        .map(|c| Box::new(c) as Box<dyn Classify>)
}

/// The next positional part, or a malformed error.
pub(crate) fn next_part(
    parts: &mut IntoIter<Box<dyn Classify>>,
) -> Result<Box<dyn Classify>, ClassifyError> {
    parts
        .next()
        .ok_or_else(|| ClassifyError::malformed("too few elements for a tuple"))
}

/// Implement [`Classify`] for a type converted through
/// [`ExactConvert`](crate::scalar::ExactConvert), making it a simple type.
///
/// The type is written as one scalar and may key a dictionary when a key
/// kind is given.
///
/// ```
/// use cf_engine::impl_simple_type;
/// use cf_engine::scalar::{ExactConvert, Scalar};
///
/// #[derive(Debug, PartialEq)]
/// struct Celsius(i32);
///
/// impl ExactConvert for Celsius {
///     fn to_scalar(&self) -> Scalar {
///         Scalar::Signed(self.0 as i128)
///     }
///     fn from_scalar(scalar: &Scalar) -> Option<Self> {
///         i32::from_scalar(scalar).map(Celsius)
///     }
/// }
///
/// impl_simple_type!(Celsius, "demo::Celsius", key = Integer);
/// ```
#[macro_export]
macro_rules! impl_simple_type {
    (@impl $ty:ty, $path:literal, $key:expr) => {
        impl $crate::info::TypePath for $ty {
            fn type_path() -> &'static str {
                $path
            }

            fn type_name() -> &'static str {
                match $path.rsplit_once("::") {
                    ::core::option::Option::Some((_, name)) => name,
                    ::core::option::Option::None => $path,
                }
            }
        }

        impl $crate::Typed for $ty {
            fn type_info() -> &'static $crate::info::TypeInfo {
                static CELL: $crate::info::NonGenericInfoCell = $crate::info::NonGenericInfoCell::new();
                CELL.get_or_init(|| {
                    let info = $crate::info::SimpleInfo::new::<$ty>();
                    let key: ::core::option::Option<$crate::scalar::KeyKind> = $key;
                    $crate::info::TypeInfo::Simple(match key {
                        ::core::option::Option::Some(kind) => info.with_key_kind(kind),
                        ::core::option::Option::None => info,
                    })
                })
            }
        }

        impl $crate::Classify for $ty {
            fn classify_info(&self) -> &'static $crate::info::TypeInfo {
                <Self as $crate::Typed>::type_info()
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            fn into_any(
                self: $crate::__macro_exports::Box<Self>,
            ) -> $crate::__macro_exports::Box<dyn ::core::any::Any> {
                self
            }

            fn value_ref(&self) -> $crate::value::ValueRef<'_> {
                $crate::value::ValueRef::Simple($crate::scalar::ExactConvert::to_scalar(self))
            }
        }
    };
    ($ty:ty, $path:literal) => {
        $crate::impl_simple_type!(@impl $ty, $path, ::core::option::Option::None);
    };
    ($ty:ty, $path:literal, key = $key:ident) => {
        $crate::impl_simple_type!(
            @impl $ty, $path,
            ::core::option::Option::Some($crate::scalar::KeyKind::$key)
        );
    };
}

#[cfg(test)]
mod tests {
    use super::generic_path;

    #[test]
    fn generic_path_format() {
        assert_eq!(generic_path("Vec", &["u8"]), "Vec<u8>");
        assert_eq!(generic_path("Map", &["String", "i32"]), "Map<String, i32>");
    }
}
