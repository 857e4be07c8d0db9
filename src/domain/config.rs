use std::{num::NonZeroUsize, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

/// Configuration for a batch import.
///
/// This struct holds settings that bound how hard an import leans on the
/// store, and how failures are reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct ImportConfig {
    /// Number of courses parsed and persisted per batch.
    batch_size: NonZeroUsize,

    /// Upper bound on the number of courses imported.
    ///
    /// If this is `None`, every course in the catalog is imported.
    pub max_courses: Option<usize>,

    /// Pause after each batch (except the last), in milliseconds.
    batch_pause_ms: u64,

    /// Whether to discard all stored trees before importing.
    pub clear: bool,

    /// Whether per-course failure messages are replaced with a generic
    /// message in the import report.
    pub suppress_error_details: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_courses: None,
            batch_pause_ms: default_batch_pause_ms(),
            clear: false,
            suppress_error_details: false,
        }
    }
}

impl ImportConfig {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the number of courses per batch.
    #[must_use]
    pub const fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    /// Sets the number of courses per batch.
    pub const fn set_batch_size(&mut self, batch_size: NonZeroUsize) {
        self.batch_size = batch_size;
    }

    /// Returns the pause inserted between batches.
    #[must_use]
    pub const fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    /// Sets the pause inserted between batches.
    ///
    /// Sub-millisecond precision is dropped.
    pub fn set_batch_pause(&mut self, pause: Duration) {
        self.batch_pause_ms = u64::try_from(pause.as_millis()).unwrap_or(u64::MAX);
    }
}

const fn default_batch_size() -> NonZeroUsize {
    NonZeroUsize::new(10).expect("10 is non-zero")
}

const fn default_batch_pause_ms() -> u64 {
    100
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_batch_size")]
        batch_size: NonZeroUsize,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_courses: Option<usize>,

        #[serde(default = "default_batch_pause_ms")]
        batch_pause_ms: u64,

        #[serde(default)]
        clear: bool,

        #[serde(default)]
        suppress_error_details: bool,
    },
}

impl From<Versions> for ImportConfig {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                batch_size,
                max_courses,
                batch_pause_ms,
                clear,
                suppress_error_details,
            } => Self {
                batch_size,
                max_courses,
                batch_pause_ms,
                clear,
                suppress_error_details,
            },
        }
    }
}

impl From<ImportConfig> for Versions {
    fn from(config: ImportConfig) -> Self {
        Self::V1 {
            batch_size: config.batch_size,
            max_courses: config.max_courses,
            batch_pause_ms: config.batch_pause_ms,
            clear: config.clear,
            suppress_error_details: config.suppress_error_details,
        }
    }
}
