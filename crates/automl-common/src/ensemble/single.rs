use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{load_member, Ensemble, EnsembleResult};
use crate::array::NdArray;
use crate::backend::stores::FilteredModelStore;
use crate::model::Model;

/// An ensemble of exactly one model, carrying the full weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleEnsemble {
    model_id: String,
}

impl SingleEnsemble {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// `{model_id: 1.0}`
    pub fn weights(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([(self.model_id.clone(), 1.0)])
    }
}

impl Ensemble for SingleEnsemble {
    fn identifiers(&self) -> &[String] {
        std::slice::from_ref(&self.model_id)
    }

    fn predict<M: Model>(
        &self,
        members: &FilteredModelStore<M>,
        x: &NdArray,
    ) -> EnsembleResult<NdArray> {
        let model = load_member(members, &self.model_id)?;
        Ok(model.predict(x)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_member_full_weight() {
        let ensemble = SingleEnsemble::new("a");
        assert_eq!(ensemble.identifiers(), &["a".to_string()]);
        assert_eq!(ensemble.weights(), BTreeMap::from([("a".to_string(), 1.0)]));
    }

    #[test]
    fn test_snapshot_holds_only_the_member_id() {
        let json = serde_json::to_string(&SingleEnsemble::new("7")).unwrap();
        assert_eq!(json, r#"{"model_id":"7"}"#);
    }
}
