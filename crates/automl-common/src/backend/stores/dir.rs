use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::{check_key, Codec, Lookup, Naming, Store, StoreView, Strict};
use crate::backend::context::{listdir_or_empty, Context};
use crate::backend::error::{StoreError, StoreResult};

/// A store over one directory, parameterized by naming, codec and lookup policy.
///
/// Nothing is cached: every lookup goes back to the context. The directory
/// does not need to exist until the first write.
pub struct DirStore<N, C, L = Strict> {
    dir: PathBuf,
    context: Arc<dyn Context>,
    naming: N,
    codec: C,
    _lookup: PhantomData<L>,
}

impl<N: Naming, C: Codec, L: Lookup> DirStore<N, C, L> {
    pub fn new(dir: impl Into<PathBuf>, context: Arc<dyn Context>) -> Self {
        Self {
            dir: dir.into(),
            context,
            naming: N::default(),
            codec: C::default(),
            _lookup: PhantomData,
        }
    }

    pub fn context(&self) -> &Arc<dyn Context> {
        &self.context
    }

    /// Read and decode `key`, failing with `NotFound` when it is missing.
    pub fn load(&self, key: &str) -> StoreResult<C::Value> {
        check_key(key)?;
        let path = self.path(key);
        let bytes = self.context.read_bytes(&path)?;
        self.codec.decode(&bytes).map_err(|e| {
            warn!(key, path = %path.display(), error = %e, "stored value could not be decoded");
            e.at(&path)
        })
    }
}

impl<N: Naming, C: Codec, L: Lookup> StoreView for DirStore<N, C, L> {
    type Value = C::Value;
    type Output = L::Output<C::Value>;

    fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.naming.locate(self.context.as_ref(), &self.dir, key)
    }

    fn get(&self, key: &str) -> StoreResult<Self::Output> {
        L::resolve(self.load(key), key)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let entries = listdir_or_empty(self.context.as_ref(), &self.dir)?;
        let keys = entries
            .iter()
            .filter_map(|entry| self.naming.parse(entry))
            .filter(|key| check_key(key).is_ok())
            .filter(|key| !N::NESTED || self.contains(key))
            .collect();
        Ok(keys)
    }

    fn contains(&self, key: &str) -> bool {
        check_key(key).is_ok() && self.context.exists(&self.path(key))
    }
}

impl<N: Naming, C: Codec, L: Lookup> Store for DirStore<N, C, L> {
    fn insert(&self, key: &str, value: &C::Value) -> StoreResult<()> {
        check_key(key)?;
        let path = self.path(key);
        let bytes = self.codec.encode(value).map_err(|e| e.at(&path))?;
        self.context.write_bytes(&path, &bytes)?;
        debug!(key, path = %path.display(), bytes = bytes.len(), "stored value");
        Ok(())
    }

    /// Removes only the file backing `key`. For nested layouts the key's
    /// directory is pruned once nothing else is left in it.
    fn remove(&self, key: &str) -> StoreResult<()> {
        check_key(key)?;
        let path = self.path(key);
        if !self.context.exists(&path) {
            return Err(StoreError::NotFound { path });
        }
        self.context.remove(&path)?;
        debug!(key, path = %path.display(), "removed value");

        if N::NESTED {
            let key_dir = self.context.join(&self.dir, key);
            if self.context.exists(&key_dir)
                && listdir_or_empty(self.context.as_ref(), &key_dir)?.is_empty()
            {
                self.context.remove(&key_dir)?;
            }
        }
        Ok(())
    }
}

impl<N: Clone, C: Clone, L> Clone for DirStore<N, C, L> {
    fn clone(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            context: Arc::clone(&self.context),
            naming: self.naming.clone(),
            codec: self.codec.clone(),
            _lookup: PhantomData,
        }
    }
}

impl<N: fmt::Debug, C: fmt::Debug, L> fmt::Debug for DirStore<N, C, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirStore")
            .field("dir", &self.dir)
            .field("context", &self.context.name())
            .field("naming", &self.naming)
            .field("codec", &self.codec)
            .field("lookup", &std::any::type_name::<L>())
            .finish()
    }
}
