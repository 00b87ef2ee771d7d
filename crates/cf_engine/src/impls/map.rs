use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::hash::Hash;
use std::collections::HashMap;

use crate::info::{GenericInfoCell, MapInfo, TypeInfo, TypePath};
use crate::value::{ValueRef, impl_classify_cast};
use crate::{Classify, ClassifyError, Typed};

use super::boxed_default;

fn collect_entries<C, K, V>(
    entries: Vec<(Box<dyn Classify>, Box<dyn Classify>)>,
) -> Result<Box<dyn Classify>, ClassifyError>
where
    C: Typed + FromIterator<(K, V)>,
    K: Typed,
    V: Typed,
{
    entries
        .into_iter()
        .map(|(k, v)| Ok((K::from_boxed(k)?, V::from_boxed(v)?)))
        .collect::<Result<C, ClassifyError>>()
        .map(|c| Box::new(c) as Box<dyn Classify>)
}

macro_rules! impl_map {
    ($map:ident <K $(: $bound:path)*>, $path:literal, $name:literal) => {
        impl<K: Typed $(+ $bound)*, V: Typed> TypePath for $map<K, V> {
            super::generic_type_path!($path, $name; K, V);
        }

        impl<K: Typed $(+ $bound)*, V: Typed> Typed for $map<K, V> {
            fn type_info() -> &'static TypeInfo {
                static CELL: GenericInfoCell = GenericInfoCell::new();
                CELL.get_or_insert::<Self>(|| {
                    TypeInfo::Map(MapInfo::new::<Self>(
                        K::type_info,
                        V::type_info,
                        collect_entries::<Self, K, V>,
                        boxed_default::<Self>,
                    ))
                })
            }
        }

        impl<K: Typed $(+ $bound)*, V: Typed> Classify for $map<K, V> {
            impl_classify_cast!();

            fn value_ref(&self) -> ValueRef<'_> {
                ValueRef::Map(
                    self.iter()
                        .map(|(k, v)| (k as &dyn Classify, v as &dyn Classify))
                        .collect(),
                )
            }
        }
    };
}

impl_map!(BTreeMap<K: Ord>, "alloc::collections::BTreeMap", "BTreeMap");
impl_map!(HashMap<K: Eq: Hash>, "std::collections::HashMap", "HashMap");

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec::Vec;
    use std::collections::HashMap;

    use crate::scalar::KeyKind;
    use crate::value::ValueRef;
    use crate::{Classify, ClassifyError, Typed};

    #[test]
    fn map_build() {
        let info = <BTreeMap<String, i32>>::type_info().as_map().unwrap();
        assert_eq!(info.checked_key_kind().unwrap(), KeyKind::String);

        let entries = Vec::from([(
            Box::new(String::from("a")) as Box<dyn Classify>,
            Box::new(7_i32) as Box<dyn Classify>,
        )]);
        let value = info.build(entries).unwrap();
        let map = (*value).downcast_ref::<BTreeMap<String, i32>>().unwrap();
        assert_eq!(map.get("a"), Some(&7));

        let ValueRef::Map(entries) = (*value).value_ref() else {
            panic!("a map should be viewed as a map");
        };
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn unsupported_key() {
        let info = <HashMap<(u8, u8), i32>>::type_info().as_map().unwrap();
        assert!(matches!(
            info.checked_key_kind(),
            Err(ClassifyError::Configuration(_))
        ));
    }
}
