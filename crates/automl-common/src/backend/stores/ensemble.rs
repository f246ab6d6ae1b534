//! Ensembles persisted next to the models they combine.
//!
//! ```text
//! {ensemble_dir}/{id}/ensemble   # the ensemble, without any backend handle
//! {model_dir}/{model_id}/model   # its members
//! ```
//!
//! A stored ensemble only carries its member identifiers and parameters. On
//! load it is bound to the model store again, giving a [`BoundEnsemble`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{
    DirStore, EnsembleDir, FilteredModelStore, ModelStore, ObjectCodec, Store, StoreView,
    Unstrict,
};
use crate::array::NdArray;
use crate::backend::accessors::ModelAccessor;
use crate::backend::context::Context;
use crate::backend::error::StoreResult;
use crate::ensemble::{Ensemble, EnsembleResult};
use crate::model::Model;

/// An ensemble paired with the models it refers to.
///
/// Never persisted itself; persist the inner ensemble instead.
pub struct BoundEnsemble<E, M> {
    ensemble: E,
    members: FilteredModelStore<M>,
}

impl<E, M> BoundEnsemble<E, M>
where
    E: Ensemble,
    M: Serialize + DeserializeOwned,
{
    /// Attach `ensemble` to the store holding its members.
    pub fn bind(ensemble: E, models: &ModelStore<M>) -> Self {
        let members = models.filtered(ensemble.identifiers().iter().cloned());
        Self { ensemble, members }
    }

    pub fn ensemble(&self) -> &E {
        &self.ensemble
    }

    /// Drop the model store and keep the persistable ensemble.
    pub fn into_inner(self) -> E {
        self.ensemble
    }

    /// Member identifiers, in the ensemble's order.
    pub fn identifiers(&self) -> &[String] {
        self.ensemble.identifiers()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.identifiers().iter().any(|m| m == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.identifiers().iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.identifiers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers().is_empty()
    }

    /// Accessor for member `id`.
    ///
    /// Fails with `InvalidKey`, listing every member, if `id` is not a member.
    pub fn get(&self, id: &str) -> StoreResult<ModelAccessor<M>> {
        self.members.accessor(id)
    }

    /// The member models as a store restricted to this ensemble.
    pub fn members(&self) -> &FilteredModelStore<M> {
        &self.members
    }
}

impl<E, M> BoundEnsemble<E, M>
where
    E: Ensemble,
    M: Model,
{
    pub fn predict(&self, x: &NdArray) -> EnsembleResult<NdArray> {
        self.ensemble.predict(&self.members, x)
    }
}

impl<E: fmt::Debug, M> fmt::Debug for BoundEnsemble<E, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundEnsemble")
            .field("ensemble", &self.ensemble)
            .field("members", &self.members)
            .finish()
    }
}

/// Ensembles at `{ensemble_dir}/{id}/ensemble` over models at `{model_dir}`.
///
/// Lookups are unstrict: a missing ensemble reads as `None`.
pub struct EnsembleStore<E, M> {
    ensembles: DirStore<EnsembleDir, ObjectCodec<E>, Unstrict>,
    models: ModelStore<M>,
}

impl<E, M> EnsembleStore<E, M>
where
    E: Ensemble,
    M: Serialize + DeserializeOwned,
{
    pub fn new(
        ensemble_dir: impl Into<PathBuf>,
        model_dir: impl Into<PathBuf>,
        context: Arc<dyn Context>,
    ) -> Self {
        Self {
            ensembles: DirStore::new(ensemble_dir, Arc::clone(&context)),
            models: ModelStore::new(model_dir, context),
        }
    }

    /// The store holding every member model.
    pub fn models(&self) -> &ModelStore<M> {
        &self.models
    }
}

impl<E, M> StoreView for EnsembleStore<E, M>
where
    E: Ensemble,
    M: Serialize + DeserializeOwned,
{
    type Value = E;
    type Output = Option<BoundEnsemble<E, M>>;

    fn dir(&self) -> &Path {
        self.ensembles.dir()
    }

    fn path(&self, key: &str) -> PathBuf {
        self.ensembles.path(key)
    }

    fn get(&self, key: &str) -> StoreResult<Self::Output> {
        let found = self.ensembles.get(key)?;
        Ok(found.map(|ensemble| BoundEnsemble::bind(ensemble, &self.models)))
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        self.ensembles.keys()
    }

    fn contains(&self, key: &str) -> bool {
        self.ensembles.contains(key)
    }
}

impl<E, M> Store for EnsembleStore<E, M>
where
    E: Ensemble,
    M: Serialize + DeserializeOwned,
{
    fn insert(&self, key: &str, value: &E) -> StoreResult<()> {
        self.ensembles.insert(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.ensembles.remove(key)
    }
}

impl<E, M> fmt::Debug for EnsembleStore<E, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnsembleStore")
            .field("ensembles", &self.ensembles)
            .field("models", &self.models)
            .finish()
    }
}
