//! `review.toml` settings.

use crate::error::{Result, SchedulerError};
use crate::models::ScheduleParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "review.toml";
pub const CONFIG_ENV_VAR: &str = "REVIEW_CONFIG";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SQLite file holding the cards.
    pub database: PathBuf,
    /// Learner used when `--owner` is not given.
    pub owner: Option<String>,
    pub schedule: ScheduleParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("db.sqlite3"),
            owner: None,
            schedule: ScheduleParams::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| SchedulerError::Config(e.to_string()))?;
        config.schedule.validate().map_err(SchedulerError::Config)?;
        Ok(config)
    }

    /// Reads the file at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                log::debug!("loading configuration from {}", path.display());
                Self::from_toml_str(&content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolves the config path from the explicit flag, then `REVIEW_CONFIG`,
    /// then `review.toml` in the working directory.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load(&path)
    }
}
