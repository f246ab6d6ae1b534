//! Picking the single best model by a metric.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use super::{EnsembleError, EnsembleResult, SingleEnsemble};
use crate::array::NdArray;
use crate::backend::error::{StoreError, StoreResult};
use crate::backend::runs::Runs;
use crate::backend::stores::StoreView;

/// How to reduce candidate scores to a winner.
pub enum Best<T> {
    /// Lowest score wins.
    Min,
    /// Highest score wins.
    Max,
    /// Returns the index of the winning score. Scores are in candidate id order.
    Custom(Box<dyn Fn(&[T]) -> usize>),
}

impl<T> fmt::Debug for Best<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Best::Min => f.write_str("Min"),
            Best::Max => f.write_str("Max"),
            Best::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn pick<T>(scores: &[T], better: impl Fn(&T, &T) -> bool) -> usize {
    let mut winner = 0;
    for (i, score) in scores.iter().enumerate().skip(1) {
        if better(score, &scores[winner]) {
            winner = i;
        }
    }
    winner
}

/// Score every candidate against `targets` and return the winning id.
///
/// Candidates are visited in id order; on ties the smallest id wins.
pub fn select_best<T, F>(
    predictions: &BTreeMap<String, NdArray>,
    targets: &NdArray,
    metric: F,
    best: &Best<T>,
) -> EnsembleResult<String>
where
    T: PartialOrd,
    F: Fn(&NdArray, &NdArray) -> EnsembleResult<T>,
{
    if predictions.is_empty() {
        return Err(EnsembleError::NoCandidates);
    }

    let mut ids = Vec::with_capacity(predictions.len());
    let mut scores = Vec::with_capacity(predictions.len());
    for (id, preds) in predictions {
        scores.push(metric(preds, targets)?);
        ids.push(id);
    }

    let index = match best {
        Best::Min => pick(&scores, |a, b| a < b),
        Best::Max => pick(&scores, |a, b| a > b),
        Best::Custom(choose) => choose(&scores),
    };

    ids.get(index)
        .map(|id| id.to_string())
        .ok_or(EnsembleError::InvalidSelection {
            index,
            len: ids.len(),
        })
}

/// Predictions for `split` of every run that has them, keyed by run id.
pub fn collect_predictions(runs: &Runs, split: &str) -> StoreResult<BTreeMap<String, NdArray>> {
    let mut collected = BTreeMap::new();
    for id in runs.keys()? {
        let run = runs.get(&id)?;
        match run.predictions().get(split) {
            Ok(preds) => {
                collected.insert(id, preds);
            }
            Err(StoreError::NotFound { .. }) => {
                debug!(run = %id, split, "run has no predictions for split");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(collected)
}

/// Builds a [`SingleEnsemble`] from the best-scoring candidate.
pub struct SingleBest<T, F> {
    metric: F,
    best: Best<T>,
}

impl<T, F> SingleBest<T, F>
where
    T: PartialOrd,
    F: Fn(&NdArray, &NdArray) -> EnsembleResult<T>,
{
    pub fn new(metric: F, best: Best<T>) -> Self {
        Self { metric, best }
    }

    pub fn build(
        &self,
        predictions: &BTreeMap<String, NdArray>,
        targets: &NdArray,
    ) -> EnsembleResult<SingleEnsemble> {
        let id = select_best(predictions, targets, &self.metric, &self.best)?;
        debug!(model = %id, candidates = predictions.len(), "selected single best model");
        Ok(SingleEnsemble::new(id))
    }

    /// Choose among the runs' predictions for `split`.
    pub fn build_from_runs(
        &self,
        runs: &Runs,
        split: &str,
        targets: &NdArray,
    ) -> EnsembleResult<SingleEnsemble> {
        let predictions = collect_predictions(runs, split)?;
        self.build(&predictions, targets)
    }
}
