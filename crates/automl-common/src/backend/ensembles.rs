//! Index over the ensembles directory.
//!
//! ```text
//! {dir}/
//!   targets.npy          # targets every ensemble is scored against
//!   {ensemble_id}/
//!     ensemble
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::context::{listdir_or_empty, Context};
use super::error::StoreResult;
use super::stores::naming::ENSEMBLE_FILE;
use super::stores::{
    check_key, BoundEnsemble, ModelStore, NumpyStore, PickleStore, Store, StoreView,
};
use crate::array::NdArray;
use crate::ensemble::Ensemble;

/// File name of the shared targets array.
pub const TARGETS_FILE: &str = "targets.npy";

const TARGETS_KEY: &str = "targets";

/// Read-only view of every ensemble under a directory, plus shared targets.
///
/// `get` is lazy and returns a handle whether or not the ensemble exists.
#[derive(Clone)]
pub struct Ensembles {
    dir: PathBuf,
    context: Arc<dyn Context>,
    targets: NumpyStore,
}

impl Ensembles {
    pub fn new(dir: impl Into<PathBuf>, context: Arc<dyn Context>) -> Self {
        let dir = dir.into();
        Self {
            targets: NumpyStore::new(dir.clone(), Arc::clone(&context)),
            dir,
            context,
        }
    }

    pub fn targets_path(&self) -> PathBuf {
        self.targets.path(TARGETS_KEY)
    }

    pub fn save_targets(&self, targets: &NdArray) -> StoreResult<()> {
        self.targets.insert(TARGETS_KEY, targets)
    }

    /// Fails with `NotFound` if no targets were saved.
    pub fn targets(&self) -> StoreResult<NdArray> {
        self.targets.get(TARGETS_KEY)
    }
}

impl StoreView for Ensembles {
    type Value = EnsembleHandle;
    type Output = EnsembleHandle;

    fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.context.join(&self.dir, key)
    }

    fn get(&self, key: &str) -> StoreResult<EnsembleHandle> {
        check_key(key)?;
        Ok(EnsembleHandle {
            id: key.to_string(),
            dir: self.path(key),
            context: Arc::clone(&self.context),
        })
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut entries = listdir_or_empty(self.context.as_ref(), &self.dir)?;
        entries.retain(|entry| entry != TARGETS_FILE && check_key(entry).is_ok());
        Ok(entries)
    }

    fn contains(&self, key: &str) -> bool {
        key != TARGETS_FILE && check_key(key).is_ok() && self.context.exists(&self.path(key))
    }
}

impl fmt::Debug for Ensembles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ensembles")
            .field("dir", &self.dir)
            .field("context", &self.context.name())
            .finish()
    }
}

/// One persisted ensemble at `{dir}/ensemble`.
#[derive(Clone)]
pub struct EnsembleHandle {
    id: String,
    dir: PathBuf,
    context: Arc<dyn Context>,
}

impl EnsembleHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The ensemble is the `ensemble` entry of a store rooted at `dir`.
    fn store<E>(&self) -> PickleStore<E>
    where
        E: Serialize + DeserializeOwned,
    {
        PickleStore::new(self.dir.clone(), Arc::clone(&self.context))
    }

    pub fn ensemble_path(&self) -> PathBuf {
        self.context.join(&self.dir, ENSEMBLE_FILE)
    }

    pub fn exists(&self) -> bool {
        self.context.exists(&self.ensemble_path())
    }

    pub fn save<E>(&self, ensemble: &E) -> StoreResult<()>
    where
        E: Serialize + DeserializeOwned,
    {
        self.store::<E>().insert(ENSEMBLE_FILE, ensemble)
    }

    /// Fails with `NotFound` if the ensemble was never saved.
    pub fn load<E>(&self) -> StoreResult<E>
    where
        E: Serialize + DeserializeOwned,
    {
        self.store::<E>().get(ENSEMBLE_FILE)
    }

    /// Load the ensemble and attach it to the store of its members.
    pub fn bind<E, M>(&self, models: &ModelStore<M>) -> StoreResult<BoundEnsemble<E, M>>
    where
        E: Ensemble,
        M: Serialize + DeserializeOwned,
    {
        Ok(BoundEnsemble::bind(self.load::<E>()?, models))
    }
}

impl fmt::Debug for EnsembleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnsembleHandle")
            .field("id", &self.id)
            .field("dir", &self.dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::context::MemoryContext;
    use crate::ensemble::SingleEnsemble;

    fn ensembles() -> Ensembles {
        Ensembles::new("ensembles", Arc::new(MemoryContext::new()))
    }

    #[test]
    fn test_targets_roundtrip() {
        let ens = ensembles();
        assert!(ens.targets().unwrap_err().is_not_found());

        let targets = NdArray::new(vec![3], vec![0i64, 1, 0]).unwrap();
        ens.save_targets(&targets).unwrap();
        assert_eq!(ens.targets().unwrap(), targets);
    }

    #[test]
    fn test_targets_path_and_corruption() {
        let ctx: Arc<dyn Context> = Arc::new(MemoryContext::new());
        let ens = Ensembles::new("ensembles", Arc::clone(&ctx));
        assert_eq!(ens.targets_path(), Path::new("ensembles/targets.npy"));

        ctx.write_bytes(&ens.targets_path(), b"garbage").unwrap();
        assert!(ens.targets().unwrap_err().is_codec());
    }

    #[test]
    fn test_targets_are_not_an_ensemble() {
        let ens = ensembles();
        ens.save_targets(&NdArray::from_vec(vec![1i64])).unwrap();
        ens.get("0")
            .unwrap()
            .save(&SingleEnsemble::new("a"))
            .unwrap();

        assert_eq!(ens.keys().unwrap(), vec!["0"]);
        assert_eq!(ens.len().unwrap(), 1);
        assert!(!ens.contains(TARGETS_FILE));
        assert!(ens.contains("0"));
    }

    #[test]
    fn test_handle_is_lazy() {
        let ens = ensembles();
        let handle = ens.get("missing").unwrap();
        assert!(!handle.exists());
        assert_eq!(handle.ensemble_path(), Path::new("ensembles/missing/ensemble"));
        assert!(handle.load::<SingleEnsemble>().unwrap_err().is_not_found());
    }

    #[test]
    fn test_save_then_load() {
        let ens = ensembles();
        let handle = ens.get("1").unwrap();
        handle.save(&SingleEnsemble::new("b")).unwrap();
        assert_eq!(
            handle.load::<SingleEnsemble>().unwrap(),
            SingleEnsemble::new("b")
        );
    }
}
