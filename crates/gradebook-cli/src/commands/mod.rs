//! One module per subcommand, plus the state they share.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context as _, Result};

use gradebook_core::config::{load_config_at, load_config_from, CONFIG_FILE};
use gradebook_core::{
    AutoRecover, Course, DataStore, Dataset, GradebookConfig, RecoveryPrompt, SaveOutcome,
    StoreError,
};

pub mod create;
pub mod grade;
pub mod init;
pub mod list;
pub mod max;
pub mod needed;
pub mod overview;
pub mod scale;
pub mod summary;
pub mod validate;

/// Resolved configuration and global flags.
pub struct Context {
    pub config: GradebookConfig,
    /// Where the config was (or would be) read from.
    pub config_path: PathBuf,
    yes: bool,
}

impl Context {
    /// Resolve config for the data commands; an explicit path must exist.
    pub fn load(config_path: Option<&Path>, yes: bool) -> Result<Self> {
        let config = load_config_from(config_path)?;
        Ok(Self::new(config, config_path, yes))
    }

    /// Resolve config for `init`, which may be the one creating the file.
    pub fn for_init(config_path: Option<&Path>, yes: bool) -> Result<Self> {
        let path = config_path.unwrap_or(Path::new(CONFIG_FILE));
        let config = load_config_at(path)?;
        Ok(Self::new(config, config_path, yes))
    }

    fn new(config: GradebookConfig, config_path: Option<&Path>, yes: bool) -> Self {
        let config_path = config_path.map_or_else(|| PathBuf::from(CONFIG_FILE), Path::to_path_buf);
        tracing::debug!(?config, path = %config_path.display(), "resolved config");
        Self {
            config,
            config_path,
            yes,
        }
    }

    pub fn store(&self) -> DataStore {
        self.config.store()
    }

    pub fn load_dataset(&self, name: &str) -> Result<Dataset> {
        let store = self.store();
        let result = if self.yes {
            store.load(name, &AutoRecover(true))
        } else {
            store.load(name, &ConsolePrompt)
        };
        match result {
            Err(StoreError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                bail!("dataset '{name}' not found in {}", store.root().display())
            }
            other => other.with_context(|| format!("failed to load dataset '{name}'")),
        }
    }

    /// Save, treating a quarantined write as an error.
    pub fn save(&self, dataset: &Dataset, name: &str) -> Result<()> {
        match self.store().save(dataset, name)? {
            SaveOutcome::Saved { .. } => Ok(()),
            SaveOutcome::Quarantined { path, reason } => Err(anyhow!(reason).context(format!(
                "dataset '{name}' was not saved; invalid data written to {}",
                path.display()
            ))),
        }
    }
}

/// Asks on stdin whether to continue with a restored backup.
struct ConsolePrompt;

impl RecoveryPrompt for ConsolePrompt {
    fn confirm_restore(&self, name: &str, error: &StoreError) -> bool {
        eprintln!("Dataset '{name}' is corrupt: {error}");
        eprintln!("The damaged file was moved aside and the last backup restored.");
        eprint!("Continue with the backup? [y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

pub fn find_course<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Course> {
    dataset.course(name).ok_or_else(|| {
        let known: Vec<&str> = dataset.courses().map(|(n, _)| n).collect();
        anyhow!("unknown course '{name}' (courses: {})", known.join(", "))
    })
}

/// `76.67%`, or `n/a` when there is nothing to show.
pub fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}%"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_formats_two_decimals() {
        assert_eq!(percent(Some(76.666)), "76.67%");
        assert_eq!(percent(Some(100.0)), "100.00%");
        assert_eq!(percent(None), "n/a");
    }
}
