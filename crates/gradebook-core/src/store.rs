//! On-disk dataset store with backup and quarantine.
//!
//! Layout under the data directory:
//!
//! ```text
//! data/
//!   <name>.json                    primary
//!   backup/<name>(backup).json     last known-good primary
//!   corrupt/<name>(corrupt).json   bad primary found on load
//!   corrupt/<name>(corrupted).json invalid model rejected on save
//! ```
//!
//! Nothing invalid is ever written to a primary path, and every whole-file
//! write goes through a temp file in the target directory followed by a
//! rename.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{StoreError, ValidationError};
use crate::model::Dataset;
use crate::validation;

const BACKUP_DIR: &str = "backup";
const CORRUPT_DIR: &str = "corrupt";
const EXTENSION: &str = "json";

/// Asked whether to continue with a restored backup after the primary file
/// was found unusable.
pub trait RecoveryPrompt {
    /// `error` describes what was wrong with the primary. The backup has
    /// already been copied over it when this is called.
    fn confirm_restore(&self, name: &str, error: &StoreError) -> bool;
}

/// A prompt with a fixed answer, for non-interactive use.
#[derive(Debug, Clone, Copy)]
pub struct AutoRecover(pub bool);

impl RecoveryPrompt for AutoRecover {
    fn confirm_restore(&self, name: &str, error: &StoreError) -> bool {
        debug!(dataset = name, %error, accept = self.0, "auto-answering recovery prompt");
        self.0
    }
}

/// Where a save ended up.
#[derive(Debug)]
pub enum SaveOutcome {
    /// Written to the primary path.
    Saved { path: PathBuf },
    /// Rejected by validation and written aside; the primary is untouched.
    Quarantined {
        path: PathBuf,
        reason: ValidationError,
    },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// Datasets stored as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn primary_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{EXTENSION}"))
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(BACKUP_DIR)
    }

    pub fn backup_path(&self, name: &str) -> PathBuf {
        self.backup_dir().join(format!("{name}(backup).{EXTENSION}"))
    }

    pub fn corrupt_dir(&self) -> PathBuf {
        self.root.join(CORRUPT_DIR)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.primary_path(name).is_file()
    }

    /// Names of the stored datasets, sorted. A missing data directory holds
    /// no datasets.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.root, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.root, e))?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Load and validate a dataset, recovering from the backup if the
    /// primary is corrupt.
    ///
    /// A corrupt primary is moved to `corrupt/` and the backup copied in its
    /// place before `prompt` is asked. If the restored copy is also unusable
    /// it is quarantined too and [`StoreError::BackupInvalid`] is returned.
    pub fn load(&self, name: &str, prompt: &dyn RecoveryPrompt) -> Result<Dataset, StoreError> {
        check_name(name)?;
        let primary = self.primary_path(name);

        let error = match read_dataset(&primary) {
            Ok(dataset) => return Ok(dataset),
            Err(e) if e.is_corrupt() => e,
            Err(e) => return Err(e),
        };

        let quarantined = self.quarantine(&primary, name, "corrupt")?;
        warn!(dataset = name, %error, path = %quarantined.display(), "quarantined corrupt dataset");

        let backup = self.backup_path(name);
        if !backup.is_file() {
            return Err(StoreError::NoBackup {
                name: name.to_string(),
                quarantined,
            });
        }
        let bytes = fs::read(&backup).map_err(|e| StoreError::io(&backup, e))?;
        write_atomic(&primary, &bytes)?;
        info!(dataset = name, "restored backup onto primary");

        if !prompt.confirm_restore(name, &error) {
            return Err(StoreError::RecoveryDeclined {
                name: name.to_string(),
            });
        }

        match read_dataset(&primary) {
            Ok(dataset) => Ok(dataset),
            Err(e) if e.is_corrupt() => {
                let path = self.quarantine(&primary, name, "corrupt")?;
                warn!(dataset = name, path = %path.display(), "restored backup is also corrupt");
                Err(StoreError::BackupInvalid {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Validate and persist a dataset.
    ///
    /// An existing primary that is itself valid is copied to the backup slot
    /// first. An invalid model goes to `corrupt/` instead of the primary.
    pub fn save(&self, dataset: &Dataset, name: &str) -> Result<SaveOutcome, StoreError> {
        check_name(name)?;
        let primary = self.primary_path(name);

        if primary.is_file() {
            match read_dataset(&primary) {
                Ok(_) => {
                    let bytes = fs::read(&primary).map_err(|e| StoreError::io(&primary, e))?;
                    write_atomic(&self.backup_path(name), &bytes)?;
                    debug!(dataset = name, "backed up previous primary");
                }
                Err(e) if e.is_corrupt() => {
                    warn!(dataset = name, error = %e, "existing primary is invalid; not backing it up");
                }
                Err(e) => return Err(e),
            }
        }

        let mut candidate = dataset.clone();
        let validated = validation::validate(&mut candidate);
        let json = serde_json::to_string_pretty(&candidate).map_err(|source| {
            StoreError::Serialize {
                name: name.to_string(),
                source,
            }
        })?;

        match validated {
            Ok(_) => {
                write_atomic(&primary, json.as_bytes())?;
                info!(dataset = name, path = %primary.display(), "saved dataset");
                Ok(SaveOutcome::Saved { path: primary })
            }
            Err(reason) => {
                let path = unique_path(&self.corrupt_dir(), &format!("{name}(corrupted)"));
                write_atomic(&path, json.as_bytes())?;
                warn!(dataset = name, %reason, path = %path.display(), "quarantined invalid dataset");
                Ok(SaveOutcome::Quarantined { path, reason })
            }
        }
    }

    /// Move `path` into `corrupt/` under a fresh name.
    fn quarantine(&self, path: &Path, name: &str, tag: &str) -> Result<PathBuf, StoreError> {
        let dir = self.corrupt_dir();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let target = unique_path(&dir, &format!("{name}({tag})"));
        fs::rename(path, &target).map_err(|e| StoreError::io(path, e))?;
        Ok(target)
    }
}

fn check_name(name: &str) -> Result<(), StoreError> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if bad {
        Err(StoreError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

fn read_dataset(path: &Path) -> Result<Dataset, StoreError> {
    let text = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let document = serde_json::from_str(&text).map_err(|source| StoreError::Syntax {
        path: path.to_path_buf(),
        source,
    })?;
    let (dataset, _) =
        validation::validate_document(document).map_err(|source| StoreError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(dataset)
}

/// `<dir>/<stem>.json`, or `<stem>(n).json` with the first free `n`.
fn unique_path(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{stem}.{EXTENSION}"));
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| dir.join(format!("{stem}({n}).{EXTENSION}")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

/// Write `bytes` to `path` through a synced temp file in the same directory.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    temp.write_all(bytes)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| StoreError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}
