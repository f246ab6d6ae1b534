//! Facades over the directory of a single persisted object.

mod model_accessor;

pub use model_accessor::ModelAccessor;
