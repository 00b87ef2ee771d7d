use alloc::boxed::Box;

use crate::info::{GenericInfoCell, OptionInfo, TypeInfo, TypePath};
use crate::value::{ValueRef, impl_classify_cast};
use crate::{Classify, ClassifyError, Typed};

fn boxed_none<T: Typed>() -> Box<dyn Classify> {
    Box::new(None::<T>)
}

fn boxed_some<T: Typed>(value: Box<dyn Classify>) -> Result<Box<dyn Classify>, ClassifyError> {
    Ok(Box::new(Some(T::from_boxed(value)?)))
}

impl<T: Typed> TypePath for Option<T> {
    super::generic_type_path!("core::option::Option", "Option"; T);
}

impl<T: Typed> Typed for Option<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericInfoCell = GenericInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Option(OptionInfo::new::<Self>(
                T::type_info,
                boxed_none::<T>,
                boxed_some::<T>,
            ))
        })
    }
}

impl<T: Typed> Classify for Option<T> {
    impl_classify_cast!();

    #[inline]
    fn value_ref(&self) -> ValueRef<'_> {
        ValueRef::Option(self.as_ref().map(|v| v as &dyn Classify))
    }
}

#[cfg(test)]
mod tests {
    use crate::Typed;
    use crate::info::TypePath;

    #[test]
    fn option_info() {
        let info = <Option<u8>>::type_info().as_option().unwrap();
        assert_eq!(info.inner().type_path(), "u8");
        assert_eq!(<Option<u8>>::type_name(), "Option<u8>");

        let some = info.some(info.inner().default_value().unwrap()).unwrap();
        assert_eq!((*some).downcast_ref::<Option<u8>>(), Some(&Some(0)));
        assert_eq!((*info.none()).downcast_ref::<Option<u8>>(), Some(&None));
    }
}
