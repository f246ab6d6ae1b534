//! Index over the runs directory.
//!
//! ```text
//! {dir}/
//!   {run_id}/
//!     model
//!     predictions_{split}.npy
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::accessors::ModelAccessor;
use super::context::{listdir_or_empty, Context};
use super::error::StoreResult;
use super::stores::{check_key, PredictionsStore, StoreView};

/// Read-only view of every run under a directory.
///
/// Lookups are lazy: `get` never touches the filesystem.
#[derive(Clone)]
pub struct Runs {
    dir: PathBuf,
    context: Arc<dyn Context>,
}

impl Runs {
    pub fn new(dir: impl Into<PathBuf>, context: Arc<dyn Context>) -> Self {
        Self {
            dir: dir.into(),
            context,
        }
    }
}

impl StoreView for Runs {
    type Value = Run;
    type Output = Run;

    fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.context.join(&self.dir, key)
    }

    fn get(&self, key: &str) -> StoreResult<Run> {
        check_key(key)?;
        Ok(Run {
            id: key.to_string(),
            dir: self.path(key),
            context: Arc::clone(&self.context),
        })
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut entries = listdir_or_empty(self.context.as_ref(), &self.dir)?;
        entries.retain(|entry| check_key(entry).is_ok());
        Ok(entries)
    }

    fn contains(&self, key: &str) -> bool {
        check_key(key).is_ok() && self.context.exists(&self.path(key))
    }
}

impl fmt::Debug for Runs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runs")
            .field("dir", &self.dir)
            .field("context", &self.context.name())
            .finish()
    }
}

/// One training run: a model and its predictions.
#[derive(Clone)]
pub struct Run {
    id: String,
    dir: PathBuf,
    context: Arc<dyn Context>,
}

impl Run {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Accessor for this run's model.
    pub fn model<M>(&self) -> ModelAccessor<M>
    where
        M: Serialize + DeserializeOwned,
    {
        ModelAccessor::new(self.dir.clone(), Arc::clone(&self.context))
    }

    pub fn predictions(&self) -> PredictionsStore {
        PredictionsStore::new(self.dir.clone(), Arc::clone(&self.context))
    }

    pub fn save_model<M>(&self, model: &M) -> StoreResult<()>
    where
        M: Serialize + DeserializeOwned,
    {
        self.model::<M>().save(model)
    }

    pub fn load_model<M>(&self) -> StoreResult<M>
    where
        M: Serialize + DeserializeOwned,
    {
        self.model::<M>().load()
    }
}

impl fmt::Debug for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Run")
            .field("id", &self.id)
            .field("dir", &self.dir)
            .finish()
    }
}
