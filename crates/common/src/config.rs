//! Per-test-case configuration.

use crate::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Directory holding the `migrations/` and `seeds/` sources for tests.
pub const DEFAULT_BASE_PATH: &str = "tests/_support/_database";

/// Connection group used when a test case does not name one.
pub const DEFAULT_GROUP: &str = "tests";

/// Settings that drive how a test case prepares its database.
///
/// # Example
/// ```
/// use common::Config;
///
/// let config = Config::builder()
///     .seed("DatabaseSeeder")
///     .group("tests_worker_2")
///     .build();
///
/// assert!(config.refresh);
/// assert_eq!(config.seed_name(), Some("DatabaseSeeder"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(default)]
pub struct Config {
    /// Roll the schema back to empty and re-migrate before each test.
    #[builder(default = true)]
    pub refresh: bool,
    /// Seed routine run after the refresh. Empty means no seeding.
    #[builder(into)]
    pub seed: Option<String>,
    /// Where the `migrations` and `seeds` sources live. An empty path keeps
    /// the backend's own default sources.
    #[builder(into, default = PathBuf::from(DEFAULT_BASE_PATH))]
    pub base_path: PathBuf,
    /// Database group the test case connects to.
    #[builder(into, default = DEFAULT_GROUP.to_string())]
    pub group: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh: true,
            seed: None,
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            group: DEFAULT_GROUP.to_string(),
        }
    }
}

impl Config {
    /// Parse a JSON config, filling omitted fields with defaults.
    pub fn from_json_str(json: &str) -> DbResult<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|err| DbError::Configuration(format!("invalid config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> DbResult<Self> {
        let data = fs::read_to_string(path).map_err(|err| {
            DbError::Configuration(format!("cannot read config '{}': {err}", path.display()))
        })?;
        Self::from_json_str(&data)
    }

    pub fn validate(&self) -> DbResult<()> {
        if self.group.trim().is_empty() {
            return Err(DbError::Configuration(
                "database group must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The seed to run, if one is configured and non-empty.
    pub fn seed_name(&self) -> Option<&str> {
        self.seed.as_deref().filter(|name| !name.trim().is_empty())
    }

    /// Base path with trailing separators removed, or `None` when unset.
    ///
    /// Only an empty path counts as unset. `/` keeps the filesystem root, so
    /// its sources are `/migrations` and `/seeds`.
    pub fn base(&self) -> Option<PathBuf> {
        if self.base_path.as_os_str().is_empty() {
            return None;
        }
        let raw = self.base_path.to_string_lossy();
        Some(PathBuf::from(raw.trim_end_matches('/')))
    }

    pub fn migrations_path(&self) -> Option<PathBuf> {
        self.base().map(|base| base.join("migrations"))
    }

    pub fn seeds_path(&self) -> Option<PathBuf> {
        self.base().map(|base| base.join("seeds"))
    }
}
