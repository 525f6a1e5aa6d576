//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::settings::SETTINGS_FILE;
use crate::core::store::DB_FILE;

/// Default request timeout for the remote case service
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

/// qtl configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the database, settings and managed images
    pub data_dir: Option<PathBuf>,

    /// Default executor name stamped on new records
    pub executor: Option<String>,

    /// Base URL of the remote case service
    pub remote_url: Option<String>,

    pub remote_timeout_secs: Option<u64>,

    /// Where screenshots are kept (defaults to `<data_dir>/images`)
    pub images_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order.
    ///
    /// `data_dir_override` (the `--data-dir` flag) beats every other layer.
    pub fn load(data_dir_override: Option<&Path>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/qtl/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Data directory config (<data_dir>/config.yaml)
        let data_dir = data_dir_override
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("QTL_DATA_DIR").map(PathBuf::from))
            .or_else(|| config.data_dir.clone())
            .unwrap_or_else(Self::default_data_dir);
        if let Some(local) = Self::read_file(&data_dir.join("config.yaml")) {
            config.merge(local);
        }

        // 4. Environment variables
        if let Some(dir) = std::env::var_os("QTL_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Ok(executor) = std::env::var("QTL_EXECUTOR") {
            config.executor = Some(executor);
        }
        if let Ok(url) = std::env::var("QTL_REMOTE_URL") {
            config.remote_url = Some(url);
        }

        // 5. Command line
        if let Some(dir) = data_dir_override {
            config.data_dir = Some(dir.to_path_buf());
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "qtl")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn default_data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "qtl")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
        if other.executor.is_some() {
            self.executor = other.executor;
        }
        if other.remote_url.is_some() {
            self.remote_url = other.remote_url;
        }
        if other.remote_timeout_secs.is_some() {
            self.remote_timeout_secs = other.remote_timeout_secs;
        }
        if other.images_dir.is_some() {
            self.images_dir = other.images_dir;
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(Self::default_data_dir)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join(DB_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir().join(SETTINGS_FILE)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.images_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("images"))
    }

    pub fn remote_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(
            self.remote_timeout_secs
                .unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECS),
        )
    }

    /// Executor name, falling back to the login name
    pub fn executor(&self) -> Option<String> {
        self.executor
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .filter(|name| !name.is_empty())
    }
}
