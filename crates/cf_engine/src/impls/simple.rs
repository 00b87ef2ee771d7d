use alloc::string::String;

use crate::info::{NonGenericInfoCell, SimpleInfo, TypeInfo, TypePath};
use crate::scalar::{ExactConvert, KeyKind};
use crate::value::{ValueRef, impl_classify_cast};
use crate::{Classify, Typed};

macro_rules! impl_primitive {
    ($ty:ty, $path:literal, $name:literal $(, $key:ident)?) => {
        impl TypePath for $ty {
            #[inline]
            fn type_path() -> &'static str {
                $path
            }

            #[inline]
            fn type_name() -> &'static str {
                $name
            }
        }

        impl Typed for $ty {
            fn type_info() -> &'static TypeInfo {
                static CELL: NonGenericInfoCell = NonGenericInfoCell::new();
                CELL.get_or_init(|| {
                    let info = SimpleInfo::new::<$ty>()
                        .with_default(super::boxed_default::<$ty>);
                    $(let info = info.with_key_kind(KeyKind::$key);)?
                    TypeInfo::Simple(info)
                })
            }
        }

        impl Classify for $ty {
            impl_classify_cast!();

            #[inline]
            fn value_ref(&self) -> ValueRef<'_> {
                ValueRef::Simple(ExactConvert::to_scalar(self))
            }
        }
    };
}

impl_primitive!(bool, "bool", "bool");
impl_primitive!(char, "char", "char", String);
impl_primitive!(String, "alloc::string::String", "String", String);
impl_primitive!(f32, "f32", "f32");
impl_primitive!(f64, "f64", "f64");

impl_primitive!(i8, "i8", "i8", Integer);
impl_primitive!(i16, "i16", "i16", Integer);
impl_primitive!(i32, "i32", "i32", Integer);
impl_primitive!(i64, "i64", "i64", Integer);
impl_primitive!(i128, "i128", "i128", Integer);
impl_primitive!(isize, "isize", "isize", Integer);
impl_primitive!(u8, "u8", "u8", Integer);
impl_primitive!(u16, "u16", "u16", Integer);
impl_primitive!(u32, "u32", "u32", Integer);
impl_primitive!(u64, "u64", "u64", Integer);
impl_primitive!(u128, "u128", "u128", Integer);
impl_primitive!(usize, "usize", "usize", Integer);

#[cfg(test)]
mod tests {
    use crate::info::TypeInfo;
    use crate::scalar::{KeyKind, Scalar};
    use crate::value::ValueRef;
    use crate::{Classify, Typed};
    use alloc::string::String;

    #[test]
    fn simple_infos() {
        let TypeInfo::Simple(info) = u16::type_info() else {
            panic!("u16 should be simple");
        };
        assert_eq!(info.key_kind(), Some(KeyKind::Integer));
        assert_eq!(String::type_info().key_kind(), Some(KeyKind::String));
        assert_eq!(f64::type_info().key_kind(), None);

        let value = info.convert(&Scalar::Unsigned(7)).unwrap();
        assert_eq!((*value).downcast_ref::<u16>(), Some(&7));
        assert!(info.convert(&Scalar::Signed(-7)).is_err());
    }

    #[test]
    fn simple_value_ref() {
        let value: &dyn Classify = &String::from("x");
        assert!(matches!(value.value_ref(), ValueRef::Simple(Scalar::Str(s)) if s == "x"));
        assert_eq!(value.classify_info().type_name(), "String");
    }
}
