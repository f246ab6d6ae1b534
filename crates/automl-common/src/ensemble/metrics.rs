//! Scalar metrics comparing predictions with targets.

use super::{EnsembleError, EnsembleResult};
use crate::array::NdArray;

fn paired(preds: &NdArray, targets: &NdArray) -> EnsembleResult<(Vec<f64>, Vec<f64>)> {
    if preds.len() != targets.len() {
        return Err(EnsembleError::ShapeMismatch {
            expected: targets.len(),
            actual: preds.len(),
        });
    }
    Ok((preds.to_f64_vec(), targets.to_f64_vec()))
}

/// Fraction of elements where the prediction equals the target.
///
/// Empty inputs score 0.0.
pub fn accuracy(preds: &NdArray, targets: &NdArray) -> EnsembleResult<f64> {
    let (p, t) = paired(preds, targets)?;
    if p.is_empty() {
        return Ok(0.0);
    }
    let hits = p.iter().zip(&t).filter(|(a, b)| a == b).count();
    Ok(hits as f64 / p.len() as f64)
}

/// Euclidean norm of `preds - targets`.
pub fn l2_distance(preds: &NdArray, targets: &NdArray) -> EnsembleResult<f64> {
    let (p, t) = paired(preds, targets)?;
    Ok(p.iter()
        .zip(&t)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt())
}
