//! Key naming conventions for directory-backed stores.
//!
//! # Layouts
//!
//! ```text
//! {dir}/{key}.npy                 # NpyFile
//! {dir}/predictions_{key}.npy     # PredictionsFile
//! {dir}/{key}                     # PlainFile
//! {dir}/{key}/model               # ModelDir
//! {dir}/{key}/ensemble            # EnsembleDir
//! ```
//!
//! A naming maps a key to the path holding its value and, in reverse, a
//! directory entry back to a key. Entries that don't match are ignored.

use std::fmt;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::backend::context::Context;

lazy_static! {
    static ref PREDICTIONS: Regex = Regex::new(r"^predictions_(.+)\.npy$").unwrap();
}

/// Mapping between keys and paths under a store directory.
pub trait Naming: Default + Clone + fmt::Debug + Send + Sync {
    /// Keys are directories holding one file each. A listed directory only
    /// counts as a key once that file exists.
    const NESTED: bool = false;

    /// Path holding the value for `key`.
    fn locate(&self, context: &dyn Context, dir: &Path, key: &str) -> PathBuf;

    /// Recover a key from a directory entry name.
    fn parse(&self, entry: &str) -> Option<String>;
}

/// `{dir}/{key}.npy`
#[derive(Debug, Clone, Copy, Default)]
pub struct NpyFile;

impl Naming for NpyFile {
    fn locate(&self, context: &dyn Context, dir: &Path, key: &str) -> PathBuf {
        context.join(dir, &format!("{}.npy", key))
    }

    fn parse(&self, entry: &str) -> Option<String> {
        entry
            .strip_suffix(".npy")
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}

/// `{dir}/predictions_{split}.npy`
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionsFile;

impl Naming for PredictionsFile {
    fn locate(&self, context: &dyn Context, dir: &Path, key: &str) -> PathBuf {
        context.join(dir, &format!("predictions_{}.npy", key))
    }

    fn parse(&self, entry: &str) -> Option<String> {
        PREDICTIONS.captures(entry).map(|c| c[1].to_string())
    }
}

/// `{dir}/{key}`
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFile;

impl Naming for PlainFile {
    fn locate(&self, context: &dyn Context, dir: &Path, key: &str) -> PathBuf {
        context.join(dir, key)
    }

    fn parse(&self, entry: &str) -> Option<String> {
        Some(entry.to_string())
    }
}

/// `{dir}/{key}/model`
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelDir;

/// File name of a persisted model inside its directory.
pub const MODEL_FILE: &str = "model";

impl Naming for ModelDir {
    const NESTED: bool = true;

    fn locate(&self, context: &dyn Context, dir: &Path, key: &str) -> PathBuf {
        context.join(&context.join(dir, key), MODEL_FILE)
    }

    fn parse(&self, entry: &str) -> Option<String> {
        Some(entry.to_string())
    }
}

/// `{dir}/{key}/ensemble`
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsembleDir;

/// File name of a persisted ensemble inside its directory.
pub const ENSEMBLE_FILE: &str = "ensemble";

impl Naming for EnsembleDir {
    const NESTED: bool = true;

    fn locate(&self, context: &dyn Context, dir: &Path, key: &str) -> PathBuf {
        context.join(&context.join(dir, key), ENSEMBLE_FILE)
    }

    fn parse(&self, entry: &str) -> Option<String> {
        Some(entry.to_string())
    }
}
