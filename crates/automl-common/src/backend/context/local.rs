use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::Context;
use crate::backend::error::{StoreError, StoreResult};

/// Context over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalContext;

impl LocalContext {
    pub fn new() -> Self {
        Self
    }
}

impl Context for LocalContext {
    fn name(&self) -> &'static str {
        "local"
    }

    fn as_path(&self, path: &str) -> StoreResult<PathBuf> {
        if path.is_empty() {
            return Err(StoreError::InvalidPath {
                path: path.to_string(),
                reason: "empty path".to_string(),
            });
        }
        Ok(PathBuf::from(path))
    }

    fn open_read(&self, path: &Path) -> StoreResult<Box<dyn Read + '_>> {
        let file = fs::File::open(path).map_err(|e| StoreError::from_io(e, path))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn open_write(&self, path: &Path) -> StoreResult<Box<dyn Write + '_>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::from_io(e, parent))?;
            }
        }
        let file = fs::File::create(path).map_err(|e| StoreError::from_io(e, path))?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn listdir(&self, path: &Path) -> StoreResult<Vec<String>> {
        let entries = fs::read_dir(path).map_err(|e| StoreError::from_io(e, path))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::from_io(e, path))?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        Ok(names)
    }

    fn remove(&self, path: &Path) -> StoreResult<()> {
        let meta = fs::metadata(path).map_err(|e| StoreError::from_io(e, path))?;
        if meta.is_dir() {
            fs::remove_dir_all(path).map_err(|e| StoreError::from_io(e, path))?;
        } else {
            fs::remove_file(path).map_err(|e| StoreError::from_io(e, path))?;
        }
        debug!(path = %path.display(), "removed");
        Ok(())
    }
}
