//! The capability a persisted model must provide.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::array::NdArray;

/// A fitted model that can be persisted and asked for predictions.
///
/// Fitting happens elsewhere; stores only need serde support, and ensembles
/// only need `predict`.
pub trait Model: Serialize + DeserializeOwned {
    fn predict(&self, x: &NdArray) -> Result<NdArray, ModelError>;
}

/// A model could not produce a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("prediction failed: {0}")]
pub struct ModelError(pub String);
