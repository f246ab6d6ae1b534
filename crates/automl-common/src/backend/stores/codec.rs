//! Value codecs for stores.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::array::{decode_npy, encode_npy, NdArray};
use crate::backend::error::CodecError;

/// Converts between stored bytes and a typed value.
pub trait Codec: Default + Clone + fmt::Debug + Send + Sync {
    type Value;

    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Value, CodecError>;
}

/// Numeric arrays in `.npy` format.
#[derive(Debug, Clone, Copy, Default)]
pub struct NpyCodec;

impl Codec for NpyCodec {
    type Value = NdArray;

    fn encode(&self, value: &NdArray) -> Result<Vec<u8>, CodecError> {
        Ok(encode_npy(value))
    }

    fn decode(&self, bytes: &[u8]) -> Result<NdArray, CodecError> {
        decode_npy(bytes)
    }
}

/// Arbitrary serde objects (models, ensembles) as JSON.
pub struct ObjectCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for ObjectCodec<T> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for ObjectCodec<T> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<T> fmt::Debug for ObjectCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectCodec<{}>", std::any::type_name::<T>())
    }
}

impl<T> Codec for ObjectCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Value = T;

    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
