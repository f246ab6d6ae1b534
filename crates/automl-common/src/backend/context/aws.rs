use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use super::Context;
use crate::backend::error::{StoreError, StoreResult};

/// Placeholder context for S3.
///
/// Shows where an object-store backend plugs in. Construction fails with
/// [`StoreError::Unimplemented`], so no store can be built on it and report
/// data as missing.
#[derive(Debug, Clone)]
pub struct AwsContext {
    bucket: String,
}

impl AwsContext {
    pub fn new(bucket: impl Into<String>) -> StoreResult<Self> {
        let bucket = bucket.into();
        warn!(bucket = %bucket, "aws context is not implemented");
        Self::unimplemented("new")
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn unimplemented<T>(operation: &'static str) -> StoreResult<T> {
        Err(StoreError::Unimplemented {
            backend: "aws",
            operation,
        })
    }
}

impl Context for AwsContext {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn as_path(&self, _path: &str) -> StoreResult<PathBuf> {
        Self::unimplemented("as_path")
    }

    fn open_read(&self, _path: &Path) -> StoreResult<Box<dyn Read + '_>> {
        Self::unimplemented("open_read")
    }

    fn open_write(&self, _path: &Path) -> StoreResult<Box<dyn Write + '_>> {
        Self::unimplemented("open_write")
    }

    fn exists(&self, path: &Path) -> bool {
        warn!(bucket = %self.bucket, path = %path.display(), "aws context has no exists implementation");
        false
    }

    fn listdir(&self, _path: &Path) -> StoreResult<Vec<String>> {
        Self::unimplemented("listdir")
    }

    fn remove(&self, _path: &Path) -> StoreResult<()> {
        Self::unimplemented("remove")
    }
}
