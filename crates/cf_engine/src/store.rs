//! Storage of follow-id units.
//!
//! A unit is one element saved under a `(type name, id)` key. Fields marked
//! `#[classify(follow_id)]` are written to their own unit and loaded back
//! lazily through a [`Deferred`](crate::Deferred).

use alloc::format;
use alloc::string::{String, ToString};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::ClassifyError;
use crate::format::FormatAdapter;

// -----------------------------------------------------------------------------
// UnitStore

/// Where follow-id units live.
pub trait UnitStore<E>: Send + Sync {
    fn load_unit(&self, type_name: &str, id: &str) -> Result<E, ClassifyError>;

    fn save_unit(&self, type_name: &str, id: &str, element: &E) -> Result<(), ClassifyError>;
}

// -----------------------------------------------------------------------------
// DirectoryStore

/// Units as files, `<base>/<TypeName>/<id>.<ext>`.
///
/// Characters that are not safe in file names are percent-encoded, so
/// distinct ids never share a file.
#[derive(Debug, Clone)]
pub struct DirectoryStore<F> {
    base: PathBuf,
    format: F,
}

/// Everything but `[A-Za-z0-9._-]`, `%` included.
const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn encode(part: &str) -> String {
    utf8_percent_encode(part, FILE_NAME).to_string()
}

impl<F: FormatAdapter> DirectoryStore<F> {
    pub fn new(base: impl Into<PathBuf>, format: F) -> Self {
        Self {
            base: base.into(),
            format,
        }
    }

    #[inline]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// File holding the unit `(type_name, id)`.
    pub fn unit_path(&self, type_name: &str, id: &str) -> PathBuf {
        let file = format!("{}.{}", encode(id), self.format.extension());
        self.base.join(encode(type_name)).join(file)
    }
}

impl<F: FormatAdapter + Send + Sync> UnitStore<F::Element> for DirectoryStore<F> {
    fn load_unit(&self, type_name: &str, id: &str) -> Result<F::Element, ClassifyError> {
        let path = self.unit_path(type_name, id);
        log::debug!("loading unit `{}`", path.display());
        let mut reader = BufReader::new(File::open(&path)?);
        self.format.read_element(&mut reader)
    }

    fn save_unit(&self, type_name: &str, id: &str, element: &F::Element) -> Result<(), ClassifyError> {
        let path = self.unit_path(type_name, id);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        log::debug!("saving unit `{}`", path.display());
        let mut writer = BufWriter::new(File::create(&path)?);
        self.format.write_element(element, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// MemoryStore

/// Units kept in memory, mostly for tests.
#[derive(Debug)]
pub struct MemoryStore<E> {
    units: Mutex<HashMap<(String, String), E>>,
}

impl<E: Clone> Default for MemoryStore<E> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> MemoryStore<E> {
    pub fn new() -> Self {
        Self {
            units: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.units.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy of the stored unit, if any.
    pub fn get(&self, type_name: &str, id: &str) -> Option<E> {
        self.units
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(type_name.into(), id.into()))
            .cloned()
    }
}

impl<E: Clone + Send> UnitStore<E> for MemoryStore<E> {
    fn load_unit(&self, type_name: &str, id: &str) -> Result<E, ClassifyError> {
        self.get(type_name, id).ok_or_else(|| {
            ClassifyError::from(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no unit `{type_name}/{id}`"),
            ))
        })
    }

    fn save_unit(&self, type_name: &str, id: &str, element: &E) -> Result<(), ClassifyError> {
        self.units
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((type_name.into(), id.into()), element.clone());
        Ok(())
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use serde_json::json;

    use super::{DirectoryStore, MemoryStore, UnitStore};
    use crate::ClassifyError;
    use crate::format::JsonFormat;

    #[test]
    fn directory_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path(), JsonFormat::new());

        let path = store.unit_path("Vec<Item>", "a/b");
        assert_eq!(path, dir.path().join("Vec%3CItem%3E").join("a%2Fb.json"));

        store.save_unit("Item", "1", &json!({ "x": 1 })).unwrap();
        assert!(dir.path().join("Item").join("1.json").is_file());
        assert_eq!(store.load_unit("Item", "1").unwrap(), json!({ "x": 1 }));
        assert!(matches!(store.load_unit("Item", "2"), Err(ClassifyError::Io(_))));
    }

    #[test]
    fn distinct_ids_keep_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path(), JsonFormat::compact());

        store.save_unit("Item", "a/b", &json!(1)).unwrap();
        store.save_unit("Item", "a_b", &json!(2)).unwrap();
        store.save_unit("Item", "a%2Fb", &json!(3)).unwrap();

        assert_eq!(store.load_unit("Item", "a/b").unwrap(), json!(1));
        assert_eq!(store.load_unit("Item", "a_b").unwrap(), json!(2));
        assert_eq!(store.load_unit("Item", "a%2Fb").unwrap(), json!(3));
    }

    #[test]
    fn memory() {
        let store = MemoryStore::new();
        store.save_unit("Item", "1", &json!(1)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load_unit("Item", "1").unwrap(), json!(1));
        assert!(store.load_unit("Item", "2").is_err());
    }
}
