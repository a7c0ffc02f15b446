//! Gradebook configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::store::DataStore;

/// File looked up in the current directory when no path is given.
pub const CONFIG_FILE: &str = "gradebook.toml";

/// Extension of outline files.
pub const OUTLINE_EXTENSION: &str = "txt";

const OUTLINES_ENV: &str = "GRADEBOOK_OUTLINES_DIR";
const DATA_ENV: &str = "GRADEBOOK_DATA_DIR";

/// Top-level gradebook configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradebookConfig {
    /// Directory holding outline text files.
    pub outlines_dir: PathBuf,
    /// Directory holding datasets, with `backup/` and `corrupt/` below it.
    pub data_dir: PathBuf,
}

impl Default for GradebookConfig {
    fn default() -> Self {
        Self {
            outlines_dir: PathBuf::from("outlines"),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl GradebookConfig {
    pub fn store(&self) -> DataStore {
        DataStore::new(&self.data_dir)
    }

    /// Resolve an outline argument.
    ///
    /// An existing path is used as given. Otherwise the name is looked up in
    /// the outlines directory, with `.txt` appended when it has no extension.
    pub fn outline_path(&self, name: &str) -> PathBuf {
        let given = Path::new(name);
        if given.is_file() {
            return given.to_path_buf();
        }
        let mut path = self.outlines_dir.join(name);
        if path.extension().is_none() {
            path.set_extension(OUTLINE_EXTENSION);
        }
        path
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(OUTLINES_ENV).filter(|v| !v.is_empty()) {
            self.outlines_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(DATA_ENV).filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
    }
}

/// Load config from an explicit path, or search the default location.
///
/// Environment variable overrides: `GRADEBOOK_OUTLINES_DIR`,
/// `GRADEBOOK_DATA_DIR`.
pub fn load_config_from(path: Option<&Path>) -> Result<GradebookConfig, ConfigError> {
    match path {
        Some(p) if !p.exists() => Err(ConfigError::NotFound(p.to_path_buf())),
        Some(p) => load_config_at(p),
        None => load_config_at(Path::new(CONFIG_FILE)),
    }
}

/// Load config from `path` if it exists, or defaults. Overrides apply either
/// way.
pub fn load_config_at(path: &Path) -> Result<GradebookConfig, ConfigError> {
    let mut config = if path.exists() {
        read_config(path)?
    } else {
        GradebookConfig::default()
    };
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

fn read_config(path: &Path) -> Result<GradebookConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
