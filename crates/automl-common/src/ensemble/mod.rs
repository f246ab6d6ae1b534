//! Ensembles: named combinations of persisted models.
//!
//! An [`Ensemble`] value only holds member identifiers and its own
//! parameters, so it can be persisted as-is. The handle to the model store is
//! attached on load (see [`BoundEnsemble`](crate::backend::stores::BoundEnsemble)).

mod builders;
mod metrics;
mod single;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::array::NdArray;
use crate::backend::error::StoreError;
use crate::backend::stores::{FilteredModelStore, StoreView};
use crate::model::{Model, ModelError};

pub use builders::{collect_predictions, select_best, Best, SingleBest};
pub use metrics::{accuracy, l2_distance};
pub use single::SingleEnsemble;

/// Result type for ensemble operations.
pub type EnsembleResult<T> = Result<T, EnsembleError>;

/// Errors from building or evaluating ensembles.
#[derive(Debug, Error)]
pub enum EnsembleError {
    /// There were no candidate models to choose from.
    #[error("no candidate models to choose from")]
    NoCandidates,

    /// Predictions and targets have different lengths.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A custom selection returned an index outside the candidates.
    #[error("selection index {index} out of range for {len} candidates")]
    InvalidSelection { index: usize, len: usize },

    /// A member is declared but its model was never saved.
    #[error("member model '{id}' has not been saved")]
    MissingMember { id: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A combination of models producing a joint prediction.
///
/// Implementors decide the combination rule in `predict`.
pub trait Ensemble: Serialize + DeserializeOwned {
    /// Member model identifiers, in order.
    fn identifiers(&self) -> &[String];

    /// Predict on `x` using the member models in `members`.
    fn predict<M: Model>(
        &self,
        members: &FilteredModelStore<M>,
        x: &NdArray,
    ) -> EnsembleResult<NdArray>;
}

/// Load member `id`, treating an unsaved model as an error.
pub fn load_member<M: Model>(members: &FilteredModelStore<M>, id: &str) -> EnsembleResult<M> {
    members
        .get(id)?
        .ok_or_else(|| EnsembleError::MissingMember { id: id.to_string() })
}
