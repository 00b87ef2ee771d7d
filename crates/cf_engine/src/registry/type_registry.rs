use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;

use cf_utils::TypeIdMap;
use cf_utils::hash::{HashMap, HashSet};

use crate::Typed;
use crate::format::TypeTag;
use crate::info::TypeInfo;

// -----------------------------------------------------------------------------
// TypeRegistry

/// A table of registered types, searchable by [`TypeId`], full type path
/// and short type name.
///
/// Short names shared by several registered types are ambiguous: they
/// resolve to nothing and the classifier writes full paths for them.
///
/// # Example
///
/// ```
/// use cf_engine::registry::TypeRegistry;
///
/// let mut registry = TypeRegistry::empty();
/// registry.register::<Vec<Option<u8>>>();
///
/// // Dependencies are registered too.
/// assert!(registry.get_with_type_name("Option<u8>").is_some());
/// assert!(registry.get_with_type_path("u8").is_some());
/// ```
pub struct TypeRegistry {
    type_info_table: TypeIdMap<&'static TypeInfo>,
    type_path_to_id: HashMap<&'static str, TypeId>,
    type_name_to_id: HashMap<&'static str, TypeId>,
    ambiguous_names: HashSet<&'static str>,
}

impl Default for TypeRegistry {
    /// See [`TypeRegistry::new`] .
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create an empty [`TypeRegistry`].
    pub fn empty() -> Self {
        Self {
            type_info_table: TypeIdMap::new(),
            type_path_to_id: HashMap::default(),
            type_name_to_id: HashMap::default(),
            ambiguous_names: HashSet::default(),
        }
    }

    /// Create a registry holding the primitive types, `String`, and with the
    /// `auto_register` feature, every non-generic derived type.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<bool>();
        registry.register::<char>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<u128>();
        registry.register::<usize>();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<i128>();
        registry.register::<isize>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<String>();
        registry.auto_register();
        registry
    }

    // The type must not already exist.
    fn add_new_type_indices(&mut self, info: &'static TypeInfo) {
        let ty = info.ty();
        let type_name = ty.name();

        if !self.ambiguous_names.contains(type_name) {
            if self.type_name_to_id.contains_key(type_name) {
                self.type_name_to_id.remove(type_name);
                self.ambiguous_names.insert(type_name);
            } else {
                self.type_name_to_id.insert(type_name, ty.id());
            }
        }

        self.type_path_to_id.insert(ty.path(), ty.id());
    }

    /// Register `T` and, recursively, every type it is built from.
    #[inline]
    pub fn register<T: Typed>(&mut self) {
        self.register_info(T::type_info());
    }

    /// Register a type by its info, with its dependencies.
    ///
    /// Returns `false` if the type was already registered, in which case
    /// its dependencies are not visited again.
    pub fn register_info(&mut self, info: &'static TypeInfo) -> bool {
        if self.type_info_table.contains(&info.type_id()) {
            return false;
        }
        self.type_info_table.insert(info.type_id(), info);
        self.add_new_type_indices(info);

        // Recursive types stop at the first repeated id.
        for dependency in info.dependencies() {
            self.register_info(dependency);
        }
        true
    }

    /// Register every type collected by `#[derive(Classify)]` through
    /// `inventory`.
    ///
    /// Returns `false` when the `auto_register` feature is disabled.
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            crate::__macro_exports::auto_register::__register_types(self);
            true
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.type_info_table.contains(&type_id)
    }

    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&'static TypeInfo> {
        self.type_info_table.get(&type_id).copied()
    }

    /// Lookup by [full type path](crate::info::TypePath::type_path).
    pub fn get_with_type_path(&self, type_path: &str) -> Option<&'static TypeInfo> {
        match self.type_path_to_id.get(type_path) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    /// Lookup by [short type name](crate::info::TypePath::type_name).
    ///
    /// Ambiguous names return `None`.
    pub fn get_with_type_name(&self, type_name: &str) -> Option<&'static TypeInfo> {
        match self.type_name_to_id.get(type_name) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    /// Whether `type_name` matches several registered types.
    #[inline]
    pub fn is_ambiguous(&self, type_name: &str) -> bool {
        self.ambiguous_names.contains(type_name)
    }

    /// The type named by a decoded type tag.
    ///
    /// A short name that is unknown as such is also tried as a full path,
    /// since full paths of non-generic types often look like names.
    pub fn resolve_tag(&self, tag: &TypeTag) -> Option<&'static TypeInfo> {
        if tag.fully_qualified {
            self.get_with_type_path(&tag.name)
        } else {
            self.get_with_type_name(&tag.name)
                .or_else(|| self.get_with_type_path(&tag.name))
        }
    }

    /// The tag to write for `info`: the short name when it resolves back to
    /// this very type, the full path otherwise.
    pub fn tag_for(&self, info: &TypeInfo) -> TypeTag {
        let ty = info.ty();
        match self.type_name_to_id.get(ty.name()) {
            Some(id) if *id == ty.id() => TypeTag::short(ty.name()),
            _ => TypeTag::full(ty.path()),
        }
    }

    /// Every registered type, in no particular order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'static TypeInfo> + '_ {
        self.type_info_table.values().copied()
    }

    /// Registered full paths, sorted. Used in diagnostics.
    pub fn type_paths(&self) -> Vec<&'static str> {
        let mut paths: Vec<_> = self.type_path_to_id.keys().copied().collect();
        paths.sort_unstable();
        paths
    }
}

impl core::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.type_paths()).finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::TypeRegistry;
    use crate::format::TypeTag;
    use crate::info::TypePath;
    use crate::{Classify, Typed};

    mod a {
        #[derive(crate::Classify, Default)]
        #[classify(default)]
        pub struct Item {
            pub id: u32,
        }
    }

    mod b {
        #[derive(crate::Classify, Default)]
        #[classify(default)]
        pub struct Item {
            pub name: String,
        }
    }

    #[derive(Classify, Default)]
    #[classify(default)]
    struct Link {
        next: Option<crate::Shared<Link>>,
    }

    #[test]
    fn primitives() {
        let registry = TypeRegistry::new();
        assert!(registry.get_with_type_name("u8").is_some());
        assert!(registry.get_with_type_path("alloc::string::String").is_some());
        assert!(registry.get_with_type_name("String").is_some());
    }

    #[test]
    fn recursive_registration() {
        let mut registry = TypeRegistry::empty();
        registry.register::<Link>();
        assert!(registry.contains(core::any::TypeId::of::<Option<crate::Shared<Link>>>()));
        assert!(registry.get_with_type_name("Link").is_some());
    }

    #[test]
    fn ambiguous_names() {
        let mut registry = TypeRegistry::empty();
        registry.register::<a::Item>();
        registry.register::<b::Item>();
        assert!(registry.is_ambiguous("Item"));
        assert!(registry.get_with_type_name("Item").is_none());

        let tag = registry.tag_for(a::Item::type_info());
        assert!(tag.fully_qualified);
        assert_eq!(tag.name, a::Item::type_path());
        assert!(registry.resolve_tag(&tag).is_some_and(|info| info.is::<a::Item>()));

        registry.register::<Vec<u8>>();
        let tag = registry.tag_for(<Vec<u8>>::type_info());
        assert!(!tag.fully_qualified);
        assert_eq!(tag.name, "Vec<u8>");

        let missing = TypeTag::short("Nothing");
        assert!(registry.resolve_tag(&missing).is_none());
    }
}
