use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{check_key, ModelStore, Store, StoreView};
use crate::backend::accessors::ModelAccessor;
use crate::backend::error::{StoreError, StoreResult};

impl<M> ModelStore<M>
where
    M: Serialize + DeserializeOwned,
{
    /// Accessor for the directory of model `key`. The model does not need to exist.
    pub fn accessor(&self, key: &str) -> StoreResult<ModelAccessor<M>> {
        check_key(key)?;
        let dir = self.context().join(self.dir(), key);
        Ok(ModelAccessor::new(dir, self.context().clone()))
    }

    /// Restrict this store to the given identifiers.
    pub fn filtered<I, S>(&self, identifiers: I) -> FilteredModelStore<M>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilteredModelStore::new(self.clone(), identifiers)
    }
}

/// A [`ModelStore`] that only exposes a declared set of identifiers.
///
/// Models outside the set are invisible to listing and containment even if
/// they exist on disk; reading or writing them fails with `InvalidKey`.
pub struct FilteredModelStore<M> {
    inner: ModelStore<M>,
    identifiers: Vec<String>,
}

impl<M> Clone for FilteredModelStore<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            identifiers: self.identifiers.clone(),
        }
    }
}

impl<M> fmt::Debug for FilteredModelStore<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteredModelStore")
            .field("inner", &self.inner)
            .field("identifiers", &self.identifiers)
            .finish()
    }
}

impl<M> FilteredModelStore<M>
where
    M: Serialize + DeserializeOwned,
{
    pub fn new<I, S>(inner: ModelStore<M>, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = Vec::new();
        for id in identifiers {
            let id = id.into();
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
        Self {
            inner,
            identifiers: seen,
        }
    }

    /// The allowed identifiers, in declaration order.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn allows(&self, key: &str) -> bool {
        self.identifiers.iter().any(|id| id == key)
    }

    fn check_allowed(&self, key: &str) -> StoreResult<()> {
        if self.allows(key) {
            Ok(())
        } else {
            Err(StoreError::invalid_key(key, self.identifiers.iter().cloned()))
        }
    }

    /// Accessor for an allowed model's directory.
    pub fn accessor(&self, key: &str) -> StoreResult<ModelAccessor<M>> {
        self.check_allowed(key)?;
        self.inner.accessor(key)
    }

    pub fn inner(&self) -> &ModelStore<M> {
        &self.inner
    }
}

impl<M> StoreView for FilteredModelStore<M>
where
    M: Serialize + DeserializeOwned,
{
    type Value = M;
    type Output = Option<M>;

    fn dir(&self) -> &Path {
        self.inner.dir()
    }

    fn path(&self, key: &str) -> PathBuf {
        self.inner.path(key)
    }

    fn get(&self, key: &str) -> StoreResult<Option<M>> {
        self.check_allowed(key)?;
        self.inner.get(key)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let keys = self
            .inner
            .keys()?
            .into_iter()
            .filter(|key| self.allows(key))
            .collect();
        Ok(keys)
    }

    fn contains(&self, key: &str) -> bool {
        self.allows(key) && self.inner.contains(key)
    }
}

impl<M> Store for FilteredModelStore<M>
where
    M: Serialize + DeserializeOwned,
{
    fn insert(&self, key: &str, value: &M) -> StoreResult<()> {
        self.check_allowed(key)?;
        self.inner.insert(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.check_allowed(key)?;
        self.inner.remove(key)
    }
}
