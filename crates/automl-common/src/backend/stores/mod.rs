//! Directory-backed keyed stores.
//!
//! Every store presents one directory as a string-keyed mapping. Stores differ
//! only in how a key maps to a path ([`Naming`]) and how bytes map to a value
//! ([`Codec`]); lookup, listing and existence checks are shared by [`DirStore`].
//!
//! # Store types
//!
//! | Store | Layout | Value | Missing key |
//! |-------|--------|-------|-------------|
//! | [`NumpyStore`] | `{dir}/{key}.npy` | [`NdArray`](crate::array::NdArray) | `NotFound` |
//! | [`PredictionsStore`] | `{dir}/predictions_{key}.npy` | [`NdArray`](crate::array::NdArray) | `NotFound` |
//! | [`PickleStore`] | `{dir}/{key}` | any serde type | `NotFound` |
//! | [`ModelStore`] | `{dir}/{key}/model` | any serde type | `None` |
//! | [`FilteredModelStore`] | `{dir}/{key}/model` | any serde type | `None`, `InvalidKey` outside the allow-set |
//! | [`EnsembleStore`] | `{ensemble_dir}/{id}/ensemble` | [`BoundEnsemble`] | `None` |
//!
//! Listing order is whatever the context returns; no order is guaranteed.

mod codec;
mod dir;
mod ensemble;
mod model;
pub mod naming;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::backend::error::{StoreError, StoreResult};

pub use codec::{Codec, NpyCodec, ObjectCodec};
pub use dir::DirStore;
pub use ensemble::{BoundEnsemble, EnsembleStore};
pub use model::FilteredModelStore;
pub use naming::{EnsembleDir, ModelDir, Naming, NpyFile, PlainFile, PredictionsFile};

/// Arrays stored as `{dir}/{key}.npy`.
pub type NumpyStore = DirStore<NpyFile, NpyCodec>;

/// Arrays stored per split as `{dir}/predictions_{split}.npy`.
pub type PredictionsStore = DirStore<PredictionsFile, NpyCodec>;

/// Serde objects stored as `{dir}/{key}`.
pub type PickleStore<T> = DirStore<PlainFile, ObjectCodec<T>>;

/// Models stored as `{dir}/{key}/model`; a missing model reads as `None`.
pub type ModelStore<M> = DirStore<ModelDir, ObjectCodec<M>, Unstrict>;

/// Read-only keyed view over a directory.
pub trait StoreView {
    /// The value type the store persists.
    type Value;

    /// What a lookup yields: the value for strict stores, `Option` for unstrict ones.
    type Output;

    /// Root directory of the store.
    fn dir(&self) -> &Path;

    /// Path backing `key`.
    fn path(&self, key: &str) -> PathBuf;

    /// Look up `key`.
    fn get(&self, key: &str) -> StoreResult<Self::Output>;

    /// Keys currently present, in no guaranteed order.
    ///
    /// A missing directory has no keys.
    fn keys(&self) -> StoreResult<Vec<String>>;

    /// Whether `key` is present. Checks the derived path directly, without listing.
    fn contains(&self, key: &str) -> bool;

    fn len(&self) -> StoreResult<usize> {
        Ok(self.keys()?.len())
    }

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// A [`StoreView`] that can also be written to.
pub trait Store: StoreView {
    /// Write `value` under `key`, creating directories as needed and
    /// overwriting any previous value.
    fn insert(&self, key: &str, value: &Self::Value) -> StoreResult<()>;

    /// Remove the file(s) backing `key`. Fails with `NotFound` if absent.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Failure mode of a lookup on a missing key.
pub trait Lookup: Send + Sync + 'static {
    type Output<V>;

    fn resolve<V>(found: StoreResult<V>, key: &str) -> StoreResult<Self::Output<V>>;
}

/// A missing key is an error ([`StoreError::NotFound`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct Strict;

impl Lookup for Strict {
    type Output<V> = V;

    fn resolve<V>(found: StoreResult<V>, _key: &str) -> StoreResult<V> {
        found
    }
}

/// A missing key reads as `None`. Other failures still propagate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unstrict;

impl Lookup for Unstrict {
    type Output<V> = Option<V>;

    fn resolve<V>(found: StoreResult<V>, key: &str) -> StoreResult<Option<V>> {
        match found {
            Ok(value) => Ok(Some(value)),
            Err(StoreError::NotFound { path }) => {
                debug!(key, path = %path.display(), "no value stored");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Reject keys that would escape or alias the store directory.
pub(crate) fn check_key(key: &str) -> StoreResult<()> {
    let reason = if key.is_empty() {
        "empty key"
    } else if key == "." || key == ".." {
        "relative path component"
    } else if key.contains('/') || key.contains('\\') {
        "path separator in key"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidPath {
        path: key.to_string(),
        reason: reason.to_string(),
    })
}
