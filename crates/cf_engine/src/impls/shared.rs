use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::any::Any;
use core::cell::{Ref, RefCell};

use crate::info::{GenericInfoCell, GenericPathCell, SharedInfo, TypeInfo, TypePath, WeakInfo, concat};
use crate::value::{SharedValue, ValueRef, impl_classify_cast};
use crate::{Classify, ClassifyError, Typed};

/// A shared, mutable handle.
///
/// The only values with identity: a handle reachable along several paths
/// is written once and referenced elsewhere, and cycles through handles
/// are restored.
pub type Shared<T> = Rc<RefCell<T>>;

// -----------------------------------------------------------------------------
// Handle operations

fn allocate<T: Typed>(value: Box<dyn Classify>) -> Result<Rc<dyn Any>, ClassifyError> {
    Ok(Rc::new(RefCell::new(T::from_boxed(value)?)))
}

fn cell_of<T: Typed>(handle: &dyn Any) -> Result<&RefCell<T>, ClassifyError> {
    handle
        .downcast_ref::<RefCell<T>>()
        .ok_or_else(|| ClassifyError::mismatch(<Shared<T>>::type_path(), "unknown handle"))
}

fn replace<T: Typed>(handle: &dyn Any, value: Box<dyn Classify>) -> Result<(), ClassifyError> {
    let value = T::from_boxed(value)?;
    let mut slot = cell_of::<T>(handle)?
        .try_borrow_mut()
        .map_err(|_| ClassifyError::AlreadyBorrowed)?;
    *slot = value;
    Ok(())
}

fn to_value<T: Typed>(handle: Rc<dyn Any>) -> Result<Box<dyn Classify>, ClassifyError> {
    handle
        .downcast::<RefCell<T>>()
        .map(|rc| Box::new(rc) as Box<dyn Classify>)
        .map_err(|_| ClassifyError::mismatch(<Shared<T>>::type_path(), "unknown handle"))
}

fn downgrade<T: Typed>(handle: &Rc<dyn Any>) -> Option<Box<dyn Classify>> {
    let rc = Rc::clone(handle).downcast::<RefCell<T>>().ok()?;
    Some(Box::new(Rc::downgrade(&rc)))
}

fn dangling<T: Typed>() -> Box<dyn Classify> {
    Box::new(Weak::<RefCell<T>>::new())
}

// -----------------------------------------------------------------------------
// Rc<RefCell<T>>

macro_rules! handle_type_path {
    ($path:literal, $name:literal) => {
        fn type_path() -> &'static str {
            static CELL: GenericPathCell = GenericPathCell::new();
            CELL.get_or_insert::<Self>(|| concat(&[$path, "<core::cell::RefCell<", T::type_path(), ">>"]))
        }

        fn type_name() -> &'static str {
            static CELL: GenericPathCell = GenericPathCell::new();
            CELL.get_or_insert::<Self>(|| concat(&[$name, "<RefCell<", T::type_name(), ">>"]))
        }
    };
}

impl<T: Typed> TypePath for Rc<RefCell<T>> {
    handle_type_path!("alloc::rc::Rc", "Rc");
}

impl<T: Typed> Typed for Rc<RefCell<T>> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericInfoCell = GenericInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Shared(SharedInfo::new::<Self>(
                T::type_info,
                allocate::<T>,
                replace::<T>,
                to_value::<T>,
            ))
        })
    }
}

impl<T: Typed> Classify for Rc<RefCell<T>> {
    impl_classify_cast!();

    #[inline]
    fn value_ref(&self) -> ValueRef<'_> {
        ValueRef::Shared(self)
    }
}

impl<T: Typed> SharedValue for Rc<RefCell<T>> {
    #[inline]
    fn identity(&self) -> usize {
        Rc::as_ptr(self).addr()
    }

    fn borrow_value(&self) -> Result<Ref<'_, dyn Classify>, ClassifyError> {
        let value = self.try_borrow().map_err(|_| ClassifyError::AlreadyBorrowed)?;
        Ok(Ref::map(value, |v| v as &dyn Classify))
    }
}

// -----------------------------------------------------------------------------
// Weak<RefCell<T>>

impl<T: Typed> TypePath for Weak<RefCell<T>> {
    handle_type_path!("alloc::rc::Weak", "Weak");
}

impl<T: Typed> Typed for Weak<RefCell<T>> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericInfoCell = GenericInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Weak(WeakInfo::new::<Self>(T::type_info, downgrade::<T>, dangling::<T>))
        })
    }
}

impl<T: Typed> Classify for Weak<RefCell<T>> {
    impl_classify_cast!();

    #[inline]
    fn value_ref(&self) -> ValueRef<'_> {
        ValueRef::Weak
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::{Rc, Weak};
    use core::cell::RefCell;

    use super::Shared;
    use crate::info::{TypeInfo, TypePath};
    use crate::value::ValueRef;
    use crate::{Classify, Typed};

    #[test]
    fn shared_paths() {
        assert_eq!(<Shared<u8>>::type_name(), "Rc<RefCell<u8>>");
        assert_eq!(
            <Weak<RefCell<u8>>>::type_path(),
            "alloc::rc::Weak<core::cell::RefCell<u8>>"
        );
    }

    #[test]
    fn replace_keeps_identity() {
        let info = <Shared<u8>>::type_info().as_shared().unwrap();
        let handle = info.allocate(Box::new(1_u8)).unwrap();
        info.replace(&*handle, Box::new(9_u8)).unwrap();

        let value = info.to_value(Rc::clone(&handle)).unwrap();
        let typed = (*value).downcast_ref::<Shared<u8>>().unwrap();
        assert_eq!(*typed.borrow(), 9);

        let ValueRef::Shared(shared) = typed.value_ref() else {
            panic!("a handle should be viewed as shared");
        };
        assert_eq!(shared.identity(), Rc::as_ptr(typed).addr());
    }

    #[test]
    fn replace_while_borrowed() {
        let info = <Shared<u8>>::type_info().as_shared().unwrap();
        let handle = info.allocate(Box::new(1_u8)).unwrap();
        let cell = handle.downcast_ref::<RefCell<u8>>().unwrap();
        let _guard = cell.borrow();
        assert!(info.replace(&*handle, Box::new(2_u8)).is_err());
    }

    #[test]
    fn weak_from_handle() {
        let TypeInfo::Weak(info) = <Weak<RefCell<u8>>>::type_info() else {
            panic!("Weak should have weak info");
        };
        let handle: Rc<dyn core::any::Any> = Rc::new(RefCell::new(3_u8));
        let weak = info.from_handle(&handle).unwrap();
        let weak = (*weak).downcast_ref::<Weak<RefCell<u8>>>().unwrap();
        assert_eq!(weak.upgrade().map(|rc| *rc.borrow()), Some(3));

        let other: Rc<dyn core::any::Any> = Rc::new(RefCell::new(3_u16));
        assert!(info.from_handle(&other).is_none());
    }
}
