//! Filesystem access abstraction.
//!
//! Every store reaches the filesystem through a [`Context`], never through
//! `std::fs` directly, so the same store code runs over local disk, memory, or
//! an object store.
//!
//! # Backends
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`LocalContext`] | Local disk via `std::fs` |
//! | [`MemoryContext`] | In-memory map (tests) |
//! | [`AwsContext`] | Placeholder; every operation fails with `Unimplemented` |

mod aws;
mod local;
mod memory;

use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::error::{StoreError, StoreResult};

pub use aws::AwsContext;
pub use local::LocalContext;
pub use memory::MemoryContext;

/// A filesystem access capability.
///
/// Implementations are stateless with respect to paths: `join` is a pure
/// function of its arguments. Handles returned by `open_read`/`open_write`
/// are closed when dropped, on every exit path.
pub trait Context: Send + Sync + fmt::Debug {
    /// Short backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Convert a string into a path value for this backend.
    fn as_path(&self, path: &str) -> StoreResult<PathBuf>;

    /// Join a relative component onto `base`.
    fn join(&self, base: &Path, part: &str) -> PathBuf {
        base.join(part)
    }

    /// Open `path` for binary reading ("rb").
    ///
    /// Fails with [`StoreError::NotFound`] if the path does not exist.
    fn open_read(&self, path: &Path) -> StoreResult<Box<dyn Read + '_>>;

    /// Open `path` for binary writing ("wb").
    ///
    /// Missing parent directories are created. Content is only guaranteed to
    /// be stored once the handle is flushed.
    fn open_write(&self, path: &Path) -> StoreResult<Box<dyn Write + '_>>;

    /// Whether a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Names of the entries directly under `path`, in no guaranteed order.
    ///
    /// Fails with [`StoreError::NotFound`] if the directory does not exist.
    fn listdir(&self, path: &Path) -> StoreResult<Vec<String>>;

    /// Remove the file or directory tree at `path`.
    fn remove(&self, path: &Path) -> StoreResult<()>;

    /// Read the whole file at `path`.
    fn read_bytes(&self, path: &Path) -> StoreResult<Vec<u8>> {
        let mut reader = self.open_read(path)?;
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| StoreError::from_io(e, path))?;
        Ok(buf)
    }

    /// Replace the file at `path` with `bytes`.
    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
        let mut writer = self.open_write(path)?;
        writer
            .write_all(bytes)
            .map_err(|e| StoreError::from_io(e, path))?;
        writer.flush().map_err(|e| StoreError::from_io(e, path))
    }
}

/// Directory listing where a missing directory counts as empty.
pub(crate) fn listdir_or_empty(context: &dyn Context, dir: &Path) -> StoreResult<Vec<String>> {
    match context.listdir(dir) {
        Ok(entries) => Ok(entries),
        Err(StoreError::NotFound { .. }) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}
