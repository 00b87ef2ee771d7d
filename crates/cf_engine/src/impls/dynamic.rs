use alloc::boxed::Box;
use core::any::Any;

use crate::info::{DynamicInfo, NonGenericInfoCell, TypeInfo, TypePath};
use crate::value::{Object, ValueRef};
use crate::{Classify, ClassifyError, Typed};

impl TypePath for Box<dyn Classify> {
    #[inline]
    fn type_path() -> &'static str {
        "alloc::boxed::Box<dyn cf_engine::Classify>"
    }

    #[inline]
    fn type_name() -> &'static str {
        "Box<dyn Classify>"
    }
}

impl Typed for Box<dyn Classify> {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericInfoCell = NonGenericInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Dynamic(DynamicInfo::new::<Self>()))
    }

    /// Any materialized value is already a valid `Box<dyn Classify>`.
    #[inline]
    fn from_boxed(value: Box<dyn Classify>) -> Result<Self, ClassifyError> {
        Ok(value)
    }
}

impl Classify for Box<dyn Classify> {
    #[inline]
    fn classify_info(&self) -> &'static TypeInfo {
        <Self as Typed>::type_info()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    #[inline]
    fn value_ref(&self) -> ValueRef<'_> {
        ValueRef::Dynamic(&**self)
    }

    #[inline]
    fn as_object_mut(&mut self) -> Option<&mut dyn Object> {
        (**self).as_object_mut()
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use crate::info::TypeKind;
    use crate::value::ValueRef;
    use crate::{Classify, Typed};

    #[test]
    fn dynamic_passes_content_through() {
        assert_eq!(<Box<dyn Classify>>::type_info().kind(), TypeKind::Dynamic);

        let inner: Box<dyn Classify> = Box::new(5_u8);
        let boxed = <Box<dyn Classify>>::from_boxed(inner).unwrap();
        assert!((*boxed).is::<u8>());

        let outer: Box<Box<dyn Classify>> = Box::new(boxed);
        let ValueRef::Dynamic(content) = outer.value_ref() else {
            panic!("a boxed value should be viewed as dynamic");
        };
        assert_eq!(content.downcast_ref::<u8>(), Some(&5));
    }
}
