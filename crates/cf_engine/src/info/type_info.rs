use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;

use crate::info::{ObjectInfo, Type, TypePath};
use crate::scalar::{ExactConvert, KeyKind, Scalar};
use crate::{Classify, ClassifyError, Typed};

// -----------------------------------------------------------------------------
// Function pointer aliases

/// Lazily obtained [`TypeInfo`] of a nested type.
///
/// Infos are built on first visit, a pointer delays it so recursive
/// types do not recurse while building.
pub type InfoFn = fn() -> &'static TypeInfo;

/// Builds a value from materialized parts.
pub type BuildFn = fn(Vec<Box<dyn Classify>>) -> Result<Box<dyn Classify>, ClassifyError>;

/// Produces a fresh value.
pub type DefaultFn = fn() -> Box<dyn Classify>;

/// Wraps a materialized value into another one.
pub type WrapFn = fn(Box<dyn Classify>) -> Result<Box<dyn Classify>, ClassifyError>;

/// Builds a dictionary from materialized keys and values.
pub type EntriesFn =
    fn(Vec<(Box<dyn Classify>, Box<dyn Classify>)>) -> Result<Box<dyn Classify>, ClassifyError>;

/// The generator of a lazily loaded value.
pub type Loader = Box<dyn FnOnce() -> Result<Box<dyn Classify>, ClassifyError>>;

// -----------------------------------------------------------------------------
// TypeKind

/// A fast discriminator of [`TypeInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Simple,
    Opaque,
    Option,
    Tuple,
    KeyValue,
    List,
    Array,
    Map,
    Object,
    Shared,
    Weak,
    Deferred,
    Dynamic,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

/// Static description of how a type is classified and rebuilt.
///
/// Obtained through [`Typed::type_info`] or a
/// [`TypeRegistry`](crate::registry::TypeRegistry). Every value is built
/// once and lives for the rest of the program.
#[derive(Debug)]
pub enum TypeInfo {
    Simple(SimpleInfo),
    Opaque(OpaqueInfo),
    Option(OptionInfo),
    Tuple(TupleInfo),
    KeyValue(KeyValueInfo),
    List(ListInfo),
    Array(ArrayInfo),
    Map(MapInfo),
    Object(ObjectInfo),
    Shared(SharedInfo),
    Weak(WeakInfo),
    Deferred(DeferredInfo),
    Dynamic(DynamicInfo),
}

macro_rules! impl_cast_method {
    ($name:ident : $kind:ident => $info:ident) => {
        /// Convert to the specific info, or fail with a type mismatch.
        pub fn $name(&self) -> Result<&$info, ClassifyError> {
            match self {
                Self::$kind(info) => Ok(info),
                _ => Err(ClassifyError::mismatch(
                    concat!(stringify!($kind), " type"),
                    self.type_path(),
                )),
            }
        }
    };
}

impl TypeInfo {
    impl_cast_method!(as_simple: Simple => SimpleInfo);
    impl_cast_method!(as_option: Option => OptionInfo);
    impl_cast_method!(as_tuple: Tuple => TupleInfo);
    impl_cast_method!(as_key_value: KeyValue => KeyValueInfo);
    impl_cast_method!(as_list: List => ListInfo);
    impl_cast_method!(as_array: Array => ArrayInfo);
    impl_cast_method!(as_map: Map => MapInfo);
    impl_cast_method!(as_object: Object => ObjectInfo);
    impl_cast_method!(as_shared: Shared => SharedInfo);
    impl_cast_method!(as_deferred: Deferred => DeferredInfo);

    pub fn ty(&self) -> &Type {
        match self {
            Self::Simple(info) => &info.ty,
            Self::Opaque(info) => &info.ty,
            Self::Option(info) => &info.ty,
            Self::Tuple(info) => &info.ty,
            Self::KeyValue(info) => &info.ty,
            Self::List(info) => &info.ty,
            Self::Array(info) => &info.ty,
            Self::Map(info) => &info.ty,
            Self::Object(info) => info.ty(),
            Self::Shared(info) => &info.ty,
            Self::Weak(info) => &info.ty,
            Self::Deferred(info) => &info.ty,
            Self::Dynamic(info) => &info.ty,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Simple(_) => TypeKind::Simple,
            Self::Opaque(_) => TypeKind::Opaque,
            Self::Option(_) => TypeKind::Option,
            Self::Tuple(_) => TypeKind::Tuple,
            Self::KeyValue(_) => TypeKind::KeyValue,
            Self::List(_) => TypeKind::List,
            Self::Array(_) => TypeKind::Array,
            Self::Map(_) => TypeKind::Map,
            Self::Object(_) => TypeKind::Object,
            Self::Shared(_) => TypeKind::Shared,
            Self::Weak(_) => TypeKind::Weak,
            Self::Deferred(_) => TypeKind::Deferred,
            Self::Dynamic(_) => TypeKind::Dynamic,
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.ty().id()
    }

    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.ty().path()
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.ty().name()
    }

    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.ty().is::<T>()
    }

    /// Key kind when this type may key a dictionary.
    pub fn key_kind(&self) -> Option<KeyKind> {
        match self {
            Self::Simple(info) => info.key_kind,
            _ => None,
        }
    }

    /// A fresh value of this type, when one can be made without data.
    ///
    /// Composites are built from the defaults of their parts; a boxed
    /// slice starts empty.
    pub fn default_value(&self) -> Option<Box<dyn Classify>> {
        match self {
            Self::Simple(info) => info.default.map(|f| f()),
            Self::Opaque(info) => info.default.map(|f| f()),
            Self::Option(info) => Some((info.none)()),
            Self::Tuple(info) => {
                let items = info
                    .elements
                    .iter()
                    .map(|f| f().default_value())
                    .collect::<Option<Vec<_>>>()?;
                info.build(items).ok()
            }
            Self::KeyValue(info) => {
                let key = info.key().default_value()?;
                let value = info.value().default_value()?;
                info.build(key, value).ok()
            }
            Self::List(info) => Some((info.default)()),
            Self::Array(info) => {
                let items = match info.len {
                    Some(len) => (0..len)
                        .map(|_| info.item().default_value())
                        .collect::<Option<Vec<_>>>()?,
                    None => Vec::new(),
                };
                info.build(items).ok()
            }
            Self::Map(info) => Some((info.default)()),
            Self::Object(info) => info.construct(),
            Self::Shared(info) => {
                let handle = info.allocate(info.inner().default_value()?).ok()?;
                info.to_value(handle).ok()
            }
            Self::Weak(info) => Some((info.default)()),
            Self::Deferred(info) => info.ready(info.inner().default_value()?).ok(),
            Self::Dynamic(_) => None,
        }
    }

    /// Infos of every type this one is built from.
    pub fn dependencies(&self) -> Vec<&'static TypeInfo> {
        match self {
            Self::Simple(_) | Self::Opaque(_) | Self::Dynamic(_) => Vec::new(),
            Self::Option(info) => Vec::from([info.inner()]),
            Self::Tuple(info) => info.elements.iter().map(|f| f()).collect(),
            Self::KeyValue(info) => Vec::from([info.key(), info.value()]),
            Self::List(info) => Vec::from([info.item()]),
            Self::Array(info) => Vec::from([info.item()]),
            Self::Map(info) => Vec::from([info.key(), info.value()]),
            Self::Object(info) => info.fields().iter().map(|f| f.type_info()).collect(),
            Self::Shared(info) => Vec::from([info.inner()]),
            Self::Weak(info) => Vec::from([info.inner()]),
            Self::Deferred(info) => Vec::from([info.inner()]),
        }
    }
}

// -----------------------------------------------------------------------------
// SimpleInfo

/// A type stored as one [`Scalar`].
pub struct SimpleInfo {
    ty: Type,
    key_kind: Option<KeyKind>,
    from_scalar: fn(&Scalar) -> Option<Box<dyn Classify>>,
    default: Option<DefaultFn>,
}

impl SimpleInfo {
    pub fn new<T: Typed + ExactConvert>() -> Self {
        Self {
            ty: Type::of::<T>(),
            key_kind: None,
            from_scalar: |scalar| T::from_scalar(scalar).map(|v| Box::new(v) as Box<dyn Classify>),
            default: None,
        }
    }

    /// Create info for a fieldless enum, converted by variant name.
    pub fn with_converter(ty: Type, from_scalar: fn(&Scalar) -> Option<Box<dyn Classify>>) -> Self {
        Self {
            ty,
            key_kind: Some(KeyKind::Enum),
            from_scalar,
            default: None,
        }
    }

    pub fn with_key_kind(mut self, kind: KeyKind) -> Self {
        self.key_kind = Some(kind);
        self
    }

    pub fn with_default(mut self, default: DefaultFn) -> Self {
        self.default = Some(default);
        self
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn key_kind(&self) -> Option<KeyKind> {
        self.key_kind
    }

    /// Convert exactly, or fail with [`ClassifyError::Conversion`].
    pub fn convert(&self, scalar: &Scalar) -> Result<Box<dyn Classify>, ClassifyError> {
        (self.from_scalar)(scalar).ok_or_else(|| ClassifyError::Conversion {
            value: scalar.to_key_string(),
            type_path: self.ty.path().into(),
        })
    }
}

// -----------------------------------------------------------------------------
// OpaqueInfo

/// A type with no structure the engine can see.
///
/// Only classified when it is the format's own element type.
pub struct OpaqueInfo {
    ty: Type,
    default: Option<DefaultFn>,
}

impl OpaqueInfo {
    pub fn new<T: TypePath>(default: Option<DefaultFn>) -> Self {
        Self {
            ty: Type::of::<T>(),
            default,
        }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }
}

// -----------------------------------------------------------------------------
// OptionInfo

/// A nullable wrapper.
pub struct OptionInfo {
    ty: Type,
    inner: InfoFn,
    none: DefaultFn,
    some: WrapFn,
}

impl OptionInfo {
    pub fn new<T: TypePath>(inner: InfoFn, none: DefaultFn, some: WrapFn) -> Self {
        Self {
            ty: Type::of::<T>(),
            inner,
            none,
            some,
        }
    }

    #[inline]
    pub fn inner(&self) -> &'static TypeInfo {
        (self.inner)()
    }

    #[inline]
    pub fn none(&self) -> Box<dyn Classify> {
        (self.none)()
    }

    #[inline]
    pub fn some(&self, value: Box<dyn Classify>) -> Result<Box<dyn Classify>, ClassifyError> {
        (self.some)(value)
    }
}

// -----------------------------------------------------------------------------
// TupleInfo

/// A fixed sequence of heterogeneous elements.
pub struct TupleInfo {
    ty: Type,
    elements: Box<[InfoFn]>,
    from_elements: BuildFn,
}

impl TupleInfo {
    pub fn new<T: TypePath>(elements: &[InfoFn], from_elements: BuildFn) -> Self {
        Self {
            ty: Type::of::<T>(),
            elements: elements.into(),
            from_elements,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn element(&self, index: usize) -> Option<&'static TypeInfo> {
        self.elements.get(index).map(|f| f())
    }

    #[inline]
    pub fn build(&self, items: Vec<Box<dyn Classify>>) -> Result<Box<dyn Classify>, ClassifyError> {
        (self.from_elements)(items)
    }
}

// -----------------------------------------------------------------------------
// KeyValueInfo

/// A key and a value, see [`KeyValue`](crate::impls::KeyValue).
pub struct KeyValueInfo {
    ty: Type,
    key: InfoFn,
    value: InfoFn,
    from_parts: BuildFn,
}

impl KeyValueInfo {
    pub fn new<T: TypePath>(key: InfoFn, value: InfoFn, from_parts: BuildFn) -> Self {
        Self {
            ty: Type::of::<T>(),
            key,
            value,
            from_parts,
        }
    }

    #[inline]
    pub fn key(&self) -> &'static TypeInfo {
        (self.key)()
    }

    #[inline]
    pub fn value(&self) -> &'static TypeInfo {
        (self.value)()
    }

    #[inline]
    pub fn build(
        &self,
        key: Box<dyn Classify>,
        value: Box<dyn Classify>,
    ) -> Result<Box<dyn Classify>, ClassifyError> {
        (self.from_parts)(Vec::from([key, value]))
    }
}

// -----------------------------------------------------------------------------
// ListInfo

/// A growable collection, rebuilt in element order.
pub struct ListInfo {
    ty: Type,
    item: InfoFn,
    from_items: BuildFn,
    default: DefaultFn,
}

impl ListInfo {
    pub fn new<T: TypePath>(item: InfoFn, from_items: BuildFn, default: DefaultFn) -> Self {
        Self {
            ty: Type::of::<T>(),
            item,
            from_items,
            default,
        }
    }

    #[inline]
    pub fn item(&self) -> &'static TypeInfo {
        (self.item)()
    }

    #[inline]
    pub fn build(&self, items: Vec<Box<dyn Classify>>) -> Result<Box<dyn Classify>, ClassifyError> {
        (self.from_items)(items)
    }
}

// -----------------------------------------------------------------------------
// ArrayInfo

/// A collection whose length is fixed at construction.
///
/// `len` is `Some(N)` for `[T; N]` and `None` for boxed slices, which
/// take the element's length.
pub struct ArrayInfo {
    ty: Type,
    item: InfoFn,
    len: Option<usize>,
    from_items: BuildFn,
}

impl ArrayInfo {
    pub fn new<T: TypePath>(item: InfoFn, len: Option<usize>, from_items: BuildFn) -> Self {
        Self {
            ty: Type::of::<T>(),
            item,
            len,
            from_items,
        }
    }

    #[inline]
    pub fn item(&self) -> &'static TypeInfo {
        (self.item)()
    }

    #[inline]
    pub fn len(&self) -> Option<usize> {
        self.len
    }

    #[inline]
    pub fn build(&self, items: Vec<Box<dyn Classify>>) -> Result<Box<dyn Classify>, ClassifyError> {
        (self.from_items)(items)
    }
}

// -----------------------------------------------------------------------------
// MapInfo

/// A dictionary with simple keys.
pub struct MapInfo {
    ty: Type,
    key: InfoFn,
    value: InfoFn,
    from_entries: EntriesFn,
    default: DefaultFn,
}

impl MapInfo {
    pub fn new<T: TypePath>(
        key: InfoFn,
        value: InfoFn,
        from_entries: EntriesFn,
        default: DefaultFn,
    ) -> Self {
        Self {
            ty: Type::of::<T>(),
            key,
            value,
            from_entries,
            default,
        }
    }

    #[inline]
    pub fn key(&self) -> &'static TypeInfo {
        (self.key)()
    }

    #[inline]
    pub fn value(&self) -> &'static TypeInfo {
        (self.value)()
    }

    /// The key kind, or a configuration error for unsupported key types.
    pub fn checked_key_kind(&self) -> Result<KeyKind, ClassifyError> {
        let key = self.key();
        key.key_kind().ok_or_else(|| {
            ClassifyError::Configuration(alloc::format!(
                "`{}` cannot key a dictionary, keys must be strings, integers or enums",
                key.type_path(),
            ))
        })
    }

    #[inline]
    pub fn build(
        &self,
        entries: Vec<(Box<dyn Classify>, Box<dyn Classify>)>,
    ) -> Result<Box<dyn Classify>, ClassifyError> {
        (self.from_entries)(entries)
    }
}

// -----------------------------------------------------------------------------
// SharedInfo

/// An identity-bearing handle, `Rc<RefCell<T>>`.
///
/// Handles are type-erased as `Rc<dyn Any>` holding a `RefCell<T>`.
pub struct SharedInfo {
    ty: Type,
    inner: InfoFn,
    allocate: fn(Box<dyn Classify>) -> Result<Rc<dyn Any>, ClassifyError>,
    replace: fn(&dyn Any, Box<dyn Classify>) -> Result<(), ClassifyError>,
    to_value: fn(Rc<dyn Any>) -> Result<Box<dyn Classify>, ClassifyError>,
}

impl SharedInfo {
    pub fn new<T: TypePath>(
        inner: InfoFn,
        allocate: fn(Box<dyn Classify>) -> Result<Rc<dyn Any>, ClassifyError>,
        replace: fn(&dyn Any, Box<dyn Classify>) -> Result<(), ClassifyError>,
        to_value: fn(Rc<dyn Any>) -> Result<Box<dyn Classify>, ClassifyError>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(),
            inner,
            allocate,
            replace,
            to_value,
        }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn inner(&self) -> &'static TypeInfo {
        (self.inner)()
    }

    /// Allocate a new handle holding `value`.
    #[inline]
    pub fn allocate(&self, value: Box<dyn Classify>) -> Result<Rc<dyn Any>, ClassifyError> {
        (self.allocate)(value)
    }

    /// Overwrite the content of `handle`, keeping its identity.
    #[inline]
    pub fn replace(&self, handle: &dyn Any, value: Box<dyn Classify>) -> Result<(), ClassifyError> {
        (self.replace)(handle, value)
    }

    /// Turn a type-erased handle back into a typed `Rc<RefCell<T>>` value.
    #[inline]
    pub fn to_value(&self, handle: Rc<dyn Any>) -> Result<Box<dyn Classify>, ClassifyError> {
        (self.to_value)(handle)
    }
}

// -----------------------------------------------------------------------------
// WeakInfo

/// A non-owning back reference, `Weak<RefCell<T>>`.
///
/// Never written out; only filled in as a parent field.
pub struct WeakInfo {
    ty: Type,
    inner: InfoFn,
    from_handle: fn(&Rc<dyn Any>) -> Option<Box<dyn Classify>>,
    default: DefaultFn,
}

impl WeakInfo {
    pub fn new<T: TypePath>(
        inner: InfoFn,
        from_handle: fn(&Rc<dyn Any>) -> Option<Box<dyn Classify>>,
        default: DefaultFn,
    ) -> Self {
        Self {
            ty: Type::of::<T>(),
            inner,
            from_handle,
            default,
        }
    }

    #[inline]
    pub fn inner(&self) -> &'static TypeInfo {
        (self.inner)()
    }

    /// Downgrade `handle`, if it holds the expected type.
    #[inline]
    pub fn from_handle(&self, handle: &Rc<dyn Any>) -> Option<Box<dyn Classify>> {
        (self.from_handle)(handle)
    }
}

// -----------------------------------------------------------------------------
// DeferredInfo

/// A lazily evaluated value, see [`Deferred`](crate::Deferred).
pub struct DeferredInfo {
    ty: Type,
    inner: InfoFn,
    ready: WrapFn,
    lazy: fn(String, Loader) -> Box<dyn Classify>,
}

impl DeferredInfo {
    pub fn new<T: TypePath>(
        inner: InfoFn,
        ready: WrapFn,
        lazy: fn(String, Loader) -> Box<dyn Classify>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(),
            inner,
            ready,
            lazy,
        }
    }

    #[inline]
    pub fn inner(&self) -> &'static TypeInfo {
        (self.inner)()
    }

    /// Wrap an already materialized value.
    #[inline]
    pub fn ready(&self, value: Box<dyn Classify>) -> Result<Box<dyn Classify>, ClassifyError> {
        (self.ready)(value)
    }

    /// Create an unevaluated value that runs `loader` on first access.
    #[inline]
    pub fn lazy(&self, id: String, loader: Loader) -> Box<dyn Classify> {
        (self.lazy)(id, loader)
    }
}

// -----------------------------------------------------------------------------
// DynamicInfo

/// `Box<dyn Classify>`: any registered type, resolved by type tag.
pub struct DynamicInfo {
    ty: Type,
}

impl DynamicInfo {
    pub fn new<T: TypePath + ?Sized>() -> Self {
        Self { ty: Type::of::<T>() }
    }
}

// -----------------------------------------------------------------------------
// Debug

macro_rules! impl_debug {
    ($($info:ident),*) => {$(
        impl fmt::Debug for $info {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($info))
                    .field("ty", &self.ty)
                    .finish_non_exhaustive()
            }
        }
    )*};
}

impl_debug!(
    SimpleInfo,
    OpaqueInfo,
    OptionInfo,
    TupleInfo,
    KeyValueInfo,
    ListInfo,
    ArrayInfo,
    MapInfo,
    SharedInfo,
    WeakInfo,
    DeferredInfo,
    DynamicInfo
);

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;

    use crate::{Classify, Deferred, Shared, Typed};

    fn default_of<T: Typed>() -> Option<T> {
        let value = T::type_info().default_value()?;
        T::from_boxed(value).ok()
    }

    #[test]
    fn composite_defaults() {
        assert_eq!(default_of::<(u8, String)>(), Some((0, String::new())));
        assert_eq!(default_of::<[u16; 3]>(), Some([0; 3]));
        assert_eq!(default_of::<Box<[u8]>>().as_deref(), Some(&[][..]));
        assert_eq!(default_of::<Option<u8>>(), Some(None));

        let shared = default_of::<Shared<(bool, i32)>>().unwrap();
        assert_eq!(*shared.borrow(), (false, 0));

        let deferred = default_of::<Deferred<u8>>().unwrap();
        assert!(deferred.is_evaluated());
        assert_eq!(deferred.get().ok(), Some(&0));
    }

    #[test]
    fn no_default_for_dynamic() {
        assert!(<Box<dyn Classify>>::type_info().default_value().is_none());
    }
}
