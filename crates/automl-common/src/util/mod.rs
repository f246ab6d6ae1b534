//! Small helpers shared across modules.

pub mod functional;

pub use functional::{intersection, union};
