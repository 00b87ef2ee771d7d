use core::any::{Any, TypeId};
use core::fmt;

// -----------------------------------------------------------------------------
// TypePath

/// A static accessor to type paths and names.
///
/// - [`type_path`](TypePath::type_path): the unique, fully qualified path.
///   Written into type tags when the short name is ambiguous.
/// - [`type_name`](TypePath::type_name): the path without module prefix,
///   may be duplicated across crates.
///
/// Names never start with `::`. Generic types include their arguments,
/// e.g. `alloc::vec::Vec<u8>` and `Vec<u8>`.
///
/// Paths are kept separate from [`Typed`](crate::Typed) so a recursive type
/// can name itself while its [`TypeInfo`](crate::info::TypeInfo) is still
/// being built.
pub trait TypePath: 'static {
    fn type_path() -> &'static str;

    fn type_name() -> &'static str;
}

// -----------------------------------------------------------------------------
// Type

/// Identity and names of a type.
#[derive(Clone, Copy)]
pub struct Type {
    id: TypeId,
    path: fn() -> &'static str,
    name: fn() -> &'static str,
}

impl Type {
    #[inline]
    pub fn of<T: TypePath + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: T::type_path,
            name: T::type_name,
        }
    }

    #[inline(always)]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline(always)]
    pub fn path(&self) -> &'static str {
        (self.path)()
    }

    #[inline(always)]
    pub fn name(&self) -> &'static str {
        (self.name)()
    }

    /// Check if this is the type `T`.
    #[inline]
    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for Type {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Type {}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
