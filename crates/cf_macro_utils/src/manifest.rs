use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

/// Locate an accessible [`syn::Path`] for a workspace crate as seen from
/// the caller's `Cargo.toml`.
///
/// # Resolution rules
///
/// 1. If the requested crate is listed in `dependencies`, return `::crate_name`.
/// 2. If the requested crate name begins with `cf_` and the caller depends
///    on the facade crate `classify`, return `::classify::short_name`
///    (e.g. `cf_engine` -> `::classify::engine`).
/// 3. Repeat step 1-2 in `dev-dependencies`.
/// 4. Otherwise, fall back to the absolute path `::crate_name`.
///
/// A crate that derives on its own types should add
/// `extern crate self as crate_name;` to its root, so that the fallback
/// resolves inside the crate too.
///
/// # Example
///
/// ```rust
/// # use cf_macro_utils::Manifest;
/// let p: syn::Path = Manifest::shared(|m| m.get_crate_path("cf_engine"));
/// ```
#[derive(Debug)]
pub struct Manifest {
    pub manifest: Document<Box<str>>,
    pub modified_time: SystemTime,
}

const FACADE_NAME: &str = "classify";
const WORKSPACE_PREFIX: &str = "cf_";

impl Manifest {
    #[inline(never)]
    fn manifest_path() -> PathBuf {
        let dir = env::var_os("CARGO_MANIFEST_DIR")
            .expect("CARGO_MANIFEST_DIR should be auto-defined by cargo.");
        let mut path = PathBuf::from(dir);
        path.push("Cargo.toml");
        assert!(
            path.exists(),
            "Cargo manifest does not exist at path {}",
            path.display(),
        );
        path
    }

    #[inline(never)]
    fn modified_time(path: &Path) -> Result<SystemTime, std::io::Error> {
        std::fs::metadata(path).and_then(|metadata| metadata.modified())
    }

    #[inline(never)]
    fn read(path: &Path) -> Document<Box<str>> {
        let text = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("Unable to read cargo manifest: {}", path.display()))
            .into_boxed_str();
        Document::parse(text)
            .unwrap_or_else(|_| panic!("Failed to parse cargo manifest: {}", path.display()))
    }

    fn absolute(name: &str) -> syn::Path {
        let ident = syn::Ident::new(name, proc_macro2::Span::call_site());
        syn::parse_quote!(::#ident)
    }

    fn find_in_deps(deps: &Table, name: &str) -> Option<syn::Path> {
        if deps.contains_key(name) {
            return Some(Self::absolute(name));
        }
        let module = name.strip_prefix(WORKSPACE_PREFIX)?;
        if deps.contains_key(FACADE_NAME) {
            let mut path = Self::absolute(FACADE_NAME);
            path.segments
                .push(syn::Ident::new(module, proc_macro2::Span::call_site()).into());
            return Some(path);
        }
        None
    }

    /// Return a [`syn::Path`] for the package named `name` as resolved from
    /// the caller's `Cargo.toml`. See the type documentation for the rules.
    #[inline(never)]
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        for section in ["dependencies", "dev-dependencies"] {
            if let Some(Item::Table(deps)) = self.manifest.get(section)
                && let Some(path) = Self::find_in_deps(deps, name)
            {
                return path;
            }
        }
        Self::absolute(name)
    }

    /// Run `func` against the caller's parsed `Cargo.toml`.
    ///
    /// Manifests are cached per path and re-read only when the file's
    /// modification time changes.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let path = Self::manifest_path();
        let modified_time =
            Self::modified_time(&path).expect("The Cargo.toml should have a modified time.");

        let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(manifest) = manifests.get(&path)
            && manifest.modified_time == modified_time
        {
            return func(manifest);
        }
        drop(manifests);

        let manifest = Manifest {
            manifest: Self::read(&path),
            modified_time,
        };
        let result = func(&manifest);

        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, manifest);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::Manifest;
    use quote::ToTokens;
    use std::time::SystemTime;
    use toml_edit::Document;

    fn manifest(text: &str) -> Manifest {
        Manifest {
            manifest: Document::parse(Box::<str>::from(text)).unwrap(),
            modified_time: SystemTime::UNIX_EPOCH,
        }
    }

    fn resolve(m: &Manifest, name: &str) -> String {
        m.get_crate_path(name).to_token_stream().to_string().replace(' ', "")
    }

    #[test]
    fn direct_dependency() {
        let m = manifest("[dependencies]\ncf_engine = \"0.0.1\"\n");
        assert_eq!(resolve(&m, "cf_engine"), "::cf_engine");
    }

    #[test]
    fn through_facade() {
        let m = manifest("[dependencies]\nclassify = \"0.0.1\"\n");
        assert_eq!(resolve(&m, "cf_engine"), "::classify::engine");
    }

    #[test]
    fn dev_dependency_and_fallback() {
        let m = manifest("[dev-dependencies]\nclassify = \"0.0.1\"\n");
        assert_eq!(resolve(&m, "cf_engine"), "::classify::engine");

        let m = manifest("[dependencies]\nserde = \"1\"\n");
        assert_eq!(resolve(&m, "cf_engine"), "::cf_engine");
    }
}
