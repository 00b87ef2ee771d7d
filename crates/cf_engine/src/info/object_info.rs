use alloc::boxed::Box;
use core::fmt;

use bitflags::bitflags;

use crate::Classify;
use crate::info::{DefaultFn, InfoFn, Type, TypeInfo, TypePath};

// -----------------------------------------------------------------------------
// FieldFlags

bitflags! {
    /// Persistence annotations of a field, or of every field of a type.
    ///
    /// See [`FieldBehavior`](crate::introspect::FieldBehavior) for how they
    /// combine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FieldFlags: u8 {
        /// Never persisted.
        const IGNORE            = 1 << 0;
        /// Receives the enclosing shared object on declassify, never persisted.
        const PARENT            = 1 << 1;
        /// Stored in its own unit and referenced by id.
        const FOLLOW_ID         = 1 << 2;
        /// Skipped when equal to the type's default value.
        const IGNORE_IF_DEFAULT = 1 << 3;
        /// Skipped when an empty string, collection or `None`.
        const IGNORE_IF_EMPTY   = 1 << 4;
        /// Skipped when equal to a declared value.
        const IGNORE_IF_EQUAL   = 1 << 5;
    }
}

// -----------------------------------------------------------------------------
// FieldInfo

/// A persistable field of an [`ObjectInfo`].
#[derive(Clone)]
pub struct FieldInfo {
    name: &'static str,
    type_info: InfoFn,
    flags: FieldFlags,
    equal_check: Option<fn(&dyn Classify) -> bool>,
}

impl FieldInfo {
    #[inline]
    pub const fn new(name: &'static str, type_info: InfoFn) -> Self {
        Self {
            name,
            type_info,
            flags: FieldFlags::empty(),
            equal_check: None,
        }
    }

    #[inline]
    pub const fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the predicate behind [`FieldFlags::IGNORE_IF_EQUAL`].
    #[inline]
    pub fn with_equal_check(mut self, check: fn(&dyn Classify) -> bool) -> Self {
        self.flags |= FieldFlags::IGNORE_IF_EQUAL;
        self.equal_check = Some(check);
        self
    }

    /// Persisted name, used for matching on declassify.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared type of the field.
    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.type_info)()
    }

    #[inline]
    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    /// Whether `value` equals the field's declared ignore value.
    #[inline]
    pub fn is_ignored_value(&self, value: &dyn Classify) -> bool {
        self.equal_check.is_some_and(|check| check(value))
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ObjectInfo

/// A plain object with named fields.
///
/// Usually generated by `#[derive(Classify)]`.
#[derive(Debug)]
pub struct ObjectInfo {
    ty: Type,
    fields: Box<[FieldInfo]>,
    flags: FieldFlags,
    constructor: Option<DefaultFn>,
}

impl ObjectInfo {
    pub fn new<T: TypePath>(fields: &[FieldInfo]) -> Self {
        Self {
            ty: Type::of::<T>(),
            fields: fields.into(),
            flags: FieldFlags::empty(),
            constructor: None,
        }
    }

    /// Type-level flags, applied to every field.
    ///
    /// Only [`FieldFlags::IGNORE_IF_DEFAULT`] and
    /// [`FieldFlags::IGNORE_IF_EMPTY`] have a meaning here.
    #[inline]
    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Register the parameterless constructor.
    #[inline]
    pub fn with_constructor(mut self, constructor: DefaultFn) -> Self {
        self.constructor = Some(constructor);
        self
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Fields in declaration order.
    #[inline]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[inline]
    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    #[inline]
    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// A new instance from the parameterless constructor.
    #[inline]
    pub fn construct(&self) -> Option<Box<dyn Classify>> {
        self.constructor.map(|f| f())
    }
}
