//! Persistence layer: contexts, stores and the directory indexes built on them.
//!
//! ```text
//! {root}/
//!   runs/{run_id}/model
//!   runs/{run_id}/predictions_{split}.npy
//!   models/{model_id}/model
//!   ensembles/targets.npy
//!   ensembles/{ensemble_id}/ensemble
//! ```

pub mod accessors;
pub mod context;
pub mod ensembles;
pub mod error;
pub mod runs;
pub mod stores;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::BackendConfig;
use crate::ensemble::Ensemble;

pub use accessors::ModelAccessor;
pub use context::{AwsContext, Context, LocalContext, MemoryContext};
pub use ensembles::{EnsembleHandle, Ensembles};
pub use error::{CodecError, StoreError, StoreResult};
pub use runs::{Run, Runs};
pub use stores::{
    BoundEnsemble, EnsembleStore, FilteredModelStore, ModelStore, NumpyStore, PickleStore,
    PredictionsStore, Store, StoreView,
};

/// Entry point to everything persisted under one root directory.
#[derive(Clone)]
pub struct Backend {
    config: BackendConfig,
    root: PathBuf,
    context: Arc<dyn Context>,
}

impl Backend {
    /// Resolve the configured root through `context`.
    pub fn new(config: BackendConfig, context: Arc<dyn Context>) -> StoreResult<Self> {
        let root = context.as_path(&config.root)?;
        debug!(root = %root.display(), context = context.name(), "opened backend");
        Ok(Self {
            config,
            root,
            context,
        })
    }

    /// Backend on the local filesystem.
    pub fn local(config: BackendConfig) -> StoreResult<Self> {
        Self::new(config, Arc::new(LocalContext::new()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<dyn Context> {
        &self.context
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.context.join(&self.root, &self.config.runs_dir)
    }

    pub fn models_dir(&self) -> PathBuf {
        self.context.join(&self.root, &self.config.models_dir)
    }

    pub fn ensembles_dir(&self) -> PathBuf {
        self.context.join(&self.root, &self.config.ensembles_dir)
    }

    pub fn runs(&self) -> Runs {
        Runs::new(self.runs_dir(), Arc::clone(&self.context))
    }

    pub fn models<M>(&self) -> ModelStore<M>
    where
        M: Serialize + DeserializeOwned,
    {
        ModelStore::new(self.models_dir(), Arc::clone(&self.context))
    }

    pub fn ensembles(&self) -> Ensembles {
        Ensembles::new(self.ensembles_dir(), Arc::clone(&self.context))
    }

    /// Ensembles bound to the models directory.
    pub fn ensemble_store<E, M>(&self) -> EnsembleStore<E, M>
    where
        E: Ensemble,
        M: Serialize + DeserializeOwned,
    {
        EnsembleStore::new(
            self.ensembles_dir(),
            self.models_dir(),
            Arc::clone(&self.context),
        )
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("root", &self.root)
            .field("context", &self.context.name())
            .finish()
    }
}
