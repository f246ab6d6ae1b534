//! Backend configuration.
//!
//! Loaded from YAML or from the environment:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `AUTOML_BACKEND_DIR` | `root` | required |
//! | `AUTOML_RUNS_DIR` | `runs_dir` | `runs` |
//! | `AUTOML_MODELS_DIR` | `models_dir` | `models` |
//! | `AUTOML_ENSEMBLES_DIR` | `ensembles_dir` | `ensembles` |

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ROOT_ENV: &str = "AUTOML_BACKEND_DIR";
pub const RUNS_DIR_ENV: &str = "AUTOML_RUNS_DIR";
pub const MODELS_DIR_ENV: &str = "AUTOML_MODELS_DIR";
pub const ENSEMBLES_DIR_ENV: &str = "AUTOML_ENSEMBLES_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {name} is not set")]
    MissingEnv { name: &'static str },

    #[error("invalid backend config: {message}")]
    Parse { message: String },

    #[error("failed to read config {path}: {message}")]
    Io { path: String, message: String },
}

/// Where a backend lives and how its root is laid out.
///
/// Subdirectory names are relative to `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    pub root: String,

    #[serde(default = "default_runs_dir")]
    pub runs_dir: String,

    #[serde(default = "default_models_dir")]
    pub models_dir: String,

    #[serde(default = "default_ensembles_dir")]
    pub ensembles_dir: String,
}

fn default_runs_dir() -> String {
    "runs".to_string()
}

fn default_models_dir() -> String {
    "models".to_string()
}

fn default_ensembles_dir() -> String {
    "ensembles".to_string()
}

impl BackendConfig {
    /// Default layout under `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            runs_dir: default_runs_dir(),
            models_dir: default_models_dir(),
            ensembles_dir: default_ensembles_dir(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let root =
            std::env::var(ROOT_ENV).map_err(|_| ConfigError::MissingEnv { name: ROOT_ENV })?;
        let mut config = Self::new(root);
        if let Ok(dir) = std::env::var(RUNS_DIR_ENV) {
            config.runs_dir = dir;
        }
        if let Ok(dir) = std::env::var(MODELS_DIR_ENV) {
            config.models_dir = dir;
        }
        if let Ok(dir) = std::env::var(ENSEMBLES_DIR_ENV) {
            config.ensembles_dir = dir;
        }
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        for name in [ROOT_ENV, RUNS_DIR_ENV, MODELS_DIR_ENV, ENSEMBLES_DIR_ENV] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_yaml_defaults() {
        let config = BackendConfig::from_yaml_str("root: /tmp/automl\n").unwrap();
        assert_eq!(config, BackendConfig::new("/tmp/automl"));
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = "root: r\nruns_dir: trials\nmodels_dir: fitted\n";
        let config = BackendConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.runs_dir, "trials");
        assert_eq!(config.models_dir, "fitted");
        assert_eq!(config.ensembles_dir, "ensembles");
    }

    #[test]
    fn test_yaml_rejects_unknown_fields() {
        let err = BackendConfig::from_yaml_str("root: r\nbucket: b\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_yaml_requires_root() {
        assert!(BackendConfig::from_yaml_str("runs_dir: x\n").is_err());
    }

    #[test]
    fn test_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backend.yaml");
        std::fs::write(&path, "root: data\nensembles_dir: ens\n").unwrap();

        let config = BackendConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.root, "data");
        assert_eq!(config.ensembles_dir, "ens");

        let missing = BackendConfig::from_yaml_file(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    #[serial]
    fn test_from_env_requires_root() {
        clear_env();
        let err = BackendConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv { name } if name == ROOT_ENV));
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var(ROOT_ENV, "/srv/automl");
        std::env::set_var(MODELS_DIR_ENV, "fitted");

        let config = BackendConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.root, "/srv/automl");
        assert_eq!(config.models_dir, "fitted");
        assert_eq!(config.runs_dir, "runs");
    }
}
