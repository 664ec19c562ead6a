//! Directory of named model artifacts

use super::{load, save, PersistedBundle};
use crate::config::PredictorConfig;
use crate::error::{PredictorError, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of every stored artifact
pub const MODEL_EXTENSION: &str = "json";

/// Named artifacts under one root directory
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    /// Open a store rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the store configured in `model_dir`
    pub fn from_config(config: &PredictorConfig) -> Self {
        Self::new(config.model_dir.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the artifact called `name`; the extension is appended when missing
    pub fn artifact_path(&self, name: &str) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PredictorError::invalid_parameter(
                "name",
                name,
                "model name must not be empty",
            ));
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(PredictorError::invalid_parameter(
                "name",
                name,
                "model name must not contain path separators",
            ));
        }

        let suffix = format!(".{}", MODEL_EXTENSION);
        let file_name = if name.ends_with(&suffix) {
            name.to_string()
        } else {
            format!("{}{}", name, suffix)
        };
        Ok(self.root.join(file_name))
    }

    /// Save `bundle` as `name`, returning the written path
    pub fn save_named(&self, bundle: &PersistedBundle, name: &str) -> Result<PathBuf> {
        let path = self.artifact_path(name)?;
        save(bundle, &path)?;
        Ok(path)
    }

    /// Load the artifact called `name`
    pub fn load_named(&self, name: &str) -> Result<PersistedBundle> {
        load(self.artifact_path(name)?)
    }

    /// Names of stored artifacts, without extension, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(MODEL_EXTENSION)
            })
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }

    /// Default artifact name for a model trained at `timestamp`
    pub fn default_model_name(timestamp: DateTime<Utc>) -> String {
        format!("poultry_model_{}", timestamp.format("%Y%m%d_%H%M%S"))
    }
}
