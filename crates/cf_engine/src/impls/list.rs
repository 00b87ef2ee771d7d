use alloc::boxed::Box;
use alloc::collections::{BTreeSet, VecDeque};
use alloc::format;
use alloc::vec::Vec;
use core::hash::Hash;
use std::collections::HashSet;

use crate::info::{ArrayInfo, GenericInfoCell, GenericPathCell, ListInfo, TypeInfo, TypePath};
use crate::value::{ValueRef, impl_classify_cast};
use crate::{Classify, ClassifyError, Typed};

use super::{boxed_default, collect_items};

// -----------------------------------------------------------------------------
// Lists

macro_rules! impl_list {
    ($list:ident <T $(: $bound:path)*>, $path:literal, $name:literal) => {
        impl<T: Typed $(+ $bound)*> TypePath for $list<T> {
            super::generic_type_path!($path, $name; T);
        }

        impl<T: Typed $(+ $bound)*> Typed for $list<T> {
            fn type_info() -> &'static TypeInfo {
                static CELL: GenericInfoCell = GenericInfoCell::new();
                CELL.get_or_insert::<Self>(|| {
                    TypeInfo::List(ListInfo::new::<Self>(
                        T::type_info,
                        collect_items::<Self, T>,
                        boxed_default::<Self>,
                    ))
                })
            }
        }

        impl<T: Typed $(+ $bound)*> Classify for $list<T> {
            impl_classify_cast!();

            fn value_ref(&self) -> ValueRef<'_> {
                ValueRef::List(self.iter().map(|v| v as &dyn Classify).collect())
            }
        }
    };
}

impl_list!(Vec<T>, "alloc::vec::Vec", "Vec");
impl_list!(VecDeque<T>, "alloc::collections::VecDeque", "VecDeque");
impl_list!(BTreeSet<T: Ord>, "alloc::collections::BTreeSet", "BTreeSet");
impl_list!(HashSet<T: Eq: Hash>, "std::collections::HashSet", "HashSet");

// -----------------------------------------------------------------------------
// Arrays

fn boxed_slice_from_items<T: Typed>(
    items: Vec<Box<dyn Classify>>,
) -> Result<Box<dyn Classify>, ClassifyError> {
    let items = items.into_iter().map(T::from_boxed).collect::<Result<Vec<T>, _>>()?;
    Ok(Box::new(items.into_boxed_slice()))
}

fn array_from_items<T: Typed, const N: usize>(
    items: Vec<Box<dyn Classify>>,
) -> Result<Box<dyn Classify>, ClassifyError> {
    let items = items.into_iter().map(T::from_boxed).collect::<Result<Vec<T>, _>>()?;
    match <[T; N]>::try_from(items) {
        Ok(array) => Ok(Box::new(array)),
        Err(items) => Err(ClassifyError::Malformed(format!(
            "expected {N} items, found {}",
            items.len()
        ))),
    }
}

impl<T: Typed> TypePath for Box<[T]> {
    fn type_path() -> &'static str {
        static CELL: GenericPathCell = GenericPathCell::new();
        CELL.get_or_insert::<Self>(|| format!("alloc::boxed::Box<[{}]>", T::type_path()))
    }

    fn type_name() -> &'static str {
        static CELL: GenericPathCell = GenericPathCell::new();
        CELL.get_or_insert::<Self>(|| format!("Box<[{}]>", T::type_name()))
    }
}

impl<T: Typed> Typed for Box<[T]> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericInfoCell = GenericInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Array(ArrayInfo::new::<Self>(
                T::type_info,
                None,
                boxed_slice_from_items::<T>,
            ))
        })
    }
}

impl<T: Typed> Classify for Box<[T]> {
    impl_classify_cast!();

    fn value_ref(&self) -> ValueRef<'_> {
        ValueRef::List(self.iter().map(|v| v as &dyn Classify).collect())
    }
}

impl<T: Typed, const N: usize> TypePath for [T; N] {
    fn type_path() -> &'static str {
        static CELL: GenericPathCell = GenericPathCell::new();
        CELL.get_or_insert::<Self>(|| format!("[{}; {N}]", T::type_path()))
    }

    fn type_name() -> &'static str {
        static CELL: GenericPathCell = GenericPathCell::new();
        CELL.get_or_insert::<Self>(|| format!("[{}; {N}]", T::type_name()))
    }
}

impl<T: Typed, const N: usize> Typed for [T; N] {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericInfoCell = GenericInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Array(ArrayInfo::new::<Self>(
                T::type_info,
                Some(N),
                array_from_items::<T, N>,
            ))
        })
    }
}

impl<T: Typed, const N: usize> Classify for [T; N] {
    impl_classify_cast!();

    fn value_ref(&self) -> ValueRef<'_> {
        ValueRef::List(self.iter().map(|v| v as &dyn Classify).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::info::{TypeInfo, TypePath};
    use crate::{Classify, Typed};
    use alloc::boxed::Box;
    use alloc::collections::BTreeSet;
    use alloc::vec::Vec;

    fn boxed(values: &[u8]) -> Vec<Box<dyn Classify>> {
        values.iter().map(|v| Box::new(*v) as Box<dyn Classify>).collect()
    }

    #[test]
    fn list_build() {
        let info = <Vec<u8>>::type_info().as_list().unwrap();
        let value = info.build(boxed(&[3, 1, 2])).unwrap();
        assert_eq!((*value).downcast_ref::<Vec<u8>>(), Some(&Vec::from([3, 1, 2])));

        let info = <BTreeSet<u8>>::type_info().as_list().unwrap();
        let value = info.build(boxed(&[3, 1, 3])).unwrap();
        assert_eq!((*value).downcast_ref::<BTreeSet<u8>>().map(BTreeSet::len), Some(2));
        assert_eq!(<BTreeSet<u8>>::type_path(), "alloc::collections::BTreeSet<u8>");
    }

    #[test]
    fn array_length() {
        let TypeInfo::Array(info) = <[u8; 2]>::type_info() else {
            panic!("[u8; 2] should be an array");
        };
        assert_eq!(info.len(), Some(2));
        assert!(info.build(boxed(&[1, 2])).is_ok());
        assert!(info.build(boxed(&[1, 2, 3])).is_err());

        let info = <Box<[u8]>>::type_info().as_array().unwrap();
        assert_eq!(info.len(), None);
        let value = info.build(boxed(&[1, 2, 3])).unwrap();
        assert_eq!((*value).downcast_ref::<Box<[u8]>>().map(|v| v.len()), Some(3));
        assert_eq!(<[u8; 2]>::type_name(), "[u8; 2]");
    }
}
