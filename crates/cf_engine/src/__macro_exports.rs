//! Items used by `#[derive(Classify)]` and the declarative macros.
//!
//! Not public API.

pub use alloc::boxed::Box;
pub use alloc::format;
pub use alloc::string::String;

pub use crate::impls::generic_path;

#[cfg(feature = "auto_register")]
pub mod auto_register {
    pub use inventory;

    use crate::Typed;
    use crate::registry::TypeRegistry;

    /// A registration function submitted by a derived type.
    pub struct __AutoRegisterFunc(pub fn(&mut TypeRegistry));

    inventory::collect!(__AutoRegisterFunc);

    pub trait __RegisterType {
        fn __register(registry: &mut TypeRegistry);
    }

    impl<T: Typed> __RegisterType for T {
        #[inline]
        fn __register(registry: &mut TypeRegistry) {
            registry.register::<T>();
        }
    }

    /// Run every collected registration function.
    pub fn __register_types(registry: &mut TypeRegistry) {
        let mut count = 0_usize;
        for func in inventory::iter::<__AutoRegisterFunc> {
            (func.0)(registry);
            count += 1;
        }
        log::trace!("auto registered {count} types");
    }
}
