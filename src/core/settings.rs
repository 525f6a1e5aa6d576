//! Persisted session settings (`settings.json` in the data directory)

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// File name inside the data directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Small key-value document remembered between sessions.
///
/// Keys this version doesn't know are kept and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_collection_name: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Settings {
    /// Read settings, falling back to defaults if the file is missing or
    /// unreadable
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read settings");
                return Self::default();
            }
        };

        match serde_json::from_str::<Option<Settings>>(&contents) {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings");
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON, creating the parent directory
    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }

    /// Remember a collection name. Empty or absent names leave the
    /// previous value in place.
    pub fn set_last_collection_name(&mut self, name: Option<&str>) {
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            self.last_collection_name = Some(name.to_string());
        }
    }
}
