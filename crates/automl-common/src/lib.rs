//! Persistence and indexing for AutoML runs, models and ensembles.
//!
//! Everything lives under one root directory and is reached through a
//! [`Context`](backend::Context), so the same code runs over local disk or
//! memory:
//!
//! - Keyed stores over a directory (`.npy` arrays, predictions, serde objects, models)
//! - A filtered model view restricted to an ensemble's members
//! - Ensembles persisted without their backend and re-bound on load
//! - Indexes over runs and ensembles
//! - Single-best ensemble selection
//!
//! # Quick Start
//!
//! ```no_run
//! use automl_common::{Backend, BackendConfig, SingleEnsemble, Store, StoreView};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Backend::local(BackendConfig::from_env()?)?;
//!
//! let models = backend.models::<Vec<f64>>();
//! models.insert("a", &vec![0.5, 1.5])?;
//!
//! let ensembles = backend.ensemble_store::<SingleEnsemble, Vec<f64>>();
//! ensembles.insert("0", &SingleEnsemble::new("a"))?;
//! if let Some(bound) = ensembles.get("0")? {
//!     let member = bound.get("a")?.load()?;
//!     println!("member weights: {member:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `AUTOML_BACKEND_DIR` | Backend root (required) |
//! | `AUTOML_RUNS_DIR` | Runs subdirectory (default: `runs`) |
//! | `AUTOML_MODELS_DIR` | Models subdirectory (default: `models`) |
//! | `AUTOML_ENSEMBLES_DIR` | Ensembles subdirectory (default: `ensembles`) |

pub mod array;
pub mod backend;
pub mod config;
pub mod ensemble;
pub mod model;
pub mod util;

pub use array::{DType, NdArray};
pub use backend::{
    Backend, BoundEnsemble, Context, EnsembleStore, Ensembles, FilteredModelStore, LocalContext,
    MemoryContext, ModelAccessor, ModelStore, NumpyStore, PickleStore, PredictionsStore, Runs,
    Store, StoreError, StoreResult, StoreView,
};
pub use config::{BackendConfig, ConfigError};
pub use ensemble::{Ensemble, EnsembleError, SingleBest, SingleEnsemble};
pub use model::{Model, ModelError};
