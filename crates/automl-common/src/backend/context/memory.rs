use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use super::Context;
use crate::backend::error::{StoreError, StoreResult};

type Files = Arc<RwLock<BTreeMap<PathBuf, Vec<u8>>>>;

/// In-memory context for testing.
///
/// Directories are implied by the paths of the files stored below them.
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryContext {
    files: Files,
}

impl MemoryContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Write handle that commits its buffer on `flush`. Dropping an unflushed
/// writer leaves the previous content in place.
struct MemoryWriter {
    files: Files,
    path: PathBuf,
    buf: Vec<u8>,
}

impl MemoryWriter {
    fn commit(&self) {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        files.insert(self.path.clone(), self.buf.clone());
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit();
        Ok(())
    }
}

impl Context for MemoryContext {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn as_path(&self, path: &str) -> StoreResult<PathBuf> {
        Ok(PathBuf::from(path))
    }

    fn open_read(&self, path: &Path) -> StoreResult<Box<dyn Read + '_>> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        let bytes = files.get(path).cloned().ok_or_else(|| StoreError::NotFound {
            path: path.to_path_buf(),
        })?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn open_write(&self, path: &Path) -> StoreResult<Box<dyn Write + '_>> {
        Ok(Box::new(MemoryWriter {
            files: Arc::clone(&self.files),
            path: path.to_path_buf(),
            buf: Vec::new(),
        }))
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files.keys().any(|key| key.starts_with(path))
    }

    fn listdir(&self, path: &Path) -> StoreResult<Vec<String>> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);

        let mut found = false;
        let mut names = BTreeSet::new();
        for key in files.keys() {
            let Ok(rest) = key.strip_prefix(path) else {
                continue;
            };
            // `path` itself is a file, not a directory
            if let Some(first) = rest.components().next() {
                found = true;
                names.insert(first.as_os_str().to_string_lossy().to_string());
            }
        }

        if !found {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Ok(names.into_iter().collect())
    }

    fn remove(&self, path: &Path) -> StoreResult<()> {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        let before = files.len();
        files.retain(|key, _| !key.starts_with(path));
        if files.len() == before {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }
}
