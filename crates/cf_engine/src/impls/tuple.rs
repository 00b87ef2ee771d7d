use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;

use crate::info::{GenericInfoCell, GenericPathCell, InfoFn, KeyValueInfo, TupleInfo};
use crate::info::{TypeInfo, TypePath};
use crate::value::{ValueRef, impl_classify_cast};
use crate::{Classify, ClassifyError, Typed};

// -----------------------------------------------------------------------------
// Tuples

macro_rules! impl_tuple {
    ($($T:ident : $index:tt),+) => {
        impl<$($T: Typed),+> TypePath for ($($T,)+) {
            fn type_path() -> &'static str {
                static CELL: GenericPathCell = GenericPathCell::new();
                CELL.get_or_insert::<Self>(|| {
                    let parts: &[&str] = &[$($T::type_path()),+];
                    format!("({})", parts.join(", "))
                })
            }

            fn type_name() -> &'static str {
                static CELL: GenericPathCell = GenericPathCell::new();
                CELL.get_or_insert::<Self>(|| {
                    let parts: &[&str] = &[$($T::type_name()),+];
                    format!("({})", parts.join(", "))
                })
            }
        }

        impl<$($T: Typed),+> Typed for ($($T,)+) {
            fn type_info() -> &'static TypeInfo {
                static CELL: GenericInfoCell = GenericInfoCell::new();
                CELL.get_or_insert::<Self>(|| {
                    let elements: &[InfoFn] = &[$($T::type_info),+];
                    TypeInfo::Tuple(TupleInfo::new::<Self>(elements, |parts| {
                        let mut parts = parts.into_iter();
                        let value = ($($T::from_boxed(super::next_part(&mut parts)?)?,)+);
                        Ok(Box::new(value) as Box<dyn Classify>)
                    }))
                })
            }
        }

        impl<$($T: Typed),+> Classify for ($($T,)+) {
            impl_classify_cast!();

            fn value_ref(&self) -> ValueRef<'_> {
                ValueRef::Tuple(Vec::from([$(&self.$index as &dyn Classify),+]))
            }
        }
    };
}

impl_tuple!(A: 0);
impl_tuple!(A: 0, B: 1);
impl_tuple!(A: 0, B: 1, C: 2);
impl_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

// -----------------------------------------------------------------------------
// KeyValue

/// A key and a value, written as a key-value pair.
///
/// Unlike a 2-tuple, formats may give the two parts names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyValue<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> KeyValue<K, V> {
    #[inline]
    pub const fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

fn key_value_from_parts<K: Typed, V: Typed>(
    parts: Vec<Box<dyn Classify>>,
) -> Result<Box<dyn Classify>, ClassifyError> {
    let mut parts = parts.into_iter();
    let key = K::from_boxed(super::next_part(&mut parts)?)?;
    let value = V::from_boxed(super::next_part(&mut parts)?)?;
    Ok(Box::new(KeyValue { key, value }))
}

impl<K: Typed, V: Typed> TypePath for KeyValue<K, V> {
    super::generic_type_path!("cf_engine::impls::KeyValue", "KeyValue"; K, V);
}

impl<K: Typed, V: Typed> Typed for KeyValue<K, V> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericInfoCell = GenericInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::KeyValue(KeyValueInfo::new::<Self>(
                K::type_info,
                V::type_info,
                key_value_from_parts::<K, V>,
            ))
        })
    }
}

impl<K: Typed, V: Typed> Classify for KeyValue<K, V> {
    impl_classify_cast!();

    #[inline]
    fn value_ref(&self) -> ValueRef<'_> {
        ValueRef::KeyValue(&self.key, &self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::KeyValue;
    use crate::info::TypePath;
    use crate::{Classify, Typed};
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec::Vec;

    #[test]
    fn tuple_build() {
        assert_eq!(<(u8, String)>::type_name(), "(u8, String)");
        let info = <(u8, String)>::type_info().as_tuple().unwrap();
        assert_eq!(info.len(), 2);

        let parts: Vec<Box<dyn Classify>> = Vec::from([
            Box::new(1_u8) as Box<dyn Classify>,
            Box::new(String::from("a")),
        ]);
        let value = info.build(parts).unwrap();
        assert_eq!(
            (*value).downcast_ref::<(u8, String)>(),
            Some(&(1, String::from("a")))
        );

        let short: Vec<Box<dyn Classify>> = Vec::from([Box::new(1_u8) as Box<dyn Classify>]);
        assert!(info.build(short).is_err());
    }

    #[test]
    fn key_value_build() {
        let info = <KeyValue<String, i32>>::type_info().as_key_value().unwrap();
        let value = info
            .build(Box::new(String::from("k")), Box::new(3_i32))
            .unwrap();
        assert_eq!(
            (*value).downcast_ref::<KeyValue<String, i32>>(),
            Some(&KeyValue::new(String::from("k"), 3))
        );
    }
}
