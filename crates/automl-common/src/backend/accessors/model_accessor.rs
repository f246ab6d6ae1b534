//! Access to one model's directory.
//!
//! ```text
//! {dir}/
//!   model                    # serialized model
//!   predictions_train.npy    # per-split predictions
//!   predictions_test.npy
//!   predictions_val.npy
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::context::Context;
use crate::backend::error::StoreResult;
use crate::backend::stores::naming::MODEL_FILE;
use crate::backend::stores::{PickleStore, PredictionsStore, Store, StoreView};

/// Loads and saves one model and its predictions.
///
/// The model is the `model` entry of a [`PickleStore`] rooted at `dir`.
pub struct ModelAccessor<M> {
    dir: PathBuf,
    model: PickleStore<M>,
    predictions: PredictionsStore,
}

impl<M> ModelAccessor<M>
where
    M: Serialize + DeserializeOwned,
{
    pub fn new(dir: impl Into<PathBuf>, context: Arc<dyn Context>) -> Self {
        let dir = dir.into();
        Self {
            model: PickleStore::new(dir.clone(), Arc::clone(&context)),
            predictions: PredictionsStore::new(dir.clone(), context),
            dir,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the serialized model: `{dir}/model`.
    pub fn path(&self) -> PathBuf {
        self.model.path(MODEL_FILE)
    }

    /// Predictions of this model, keyed by split.
    pub fn predictions(&self) -> &PredictionsStore {
        &self.predictions
    }

    /// Whether a model has been saved.
    pub fn exists(&self) -> bool {
        self.model.contains(MODEL_FILE)
    }

    /// Load the model. Fails with `NotFound` if none was saved.
    pub fn load(&self) -> StoreResult<M> {
        self.model.get(MODEL_FILE)
    }

    /// Save the model, replacing any previous one.
    pub fn save(&self, model: &M) -> StoreResult<()> {
        self.model.insert(MODEL_FILE, model)
    }
}

impl<M> fmt::Debug for ModelAccessor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAccessor")
            .field("dir", &self.dir)
            .field("model", &self.model)
            .finish()
    }
}
