//! Project configuration for the mirror
//!
//! Read from `mirror.toml` in the working directory unless another file is
//! named explicitly. JSON and YAML files are accepted as well.

use std::path::Path;
use std::time::Duration;

use mirror_fs::ConfigStore;
use serde::{Deserialize, Serialize};

use crate::diff::CompareMode;
use crate::{Error, Result};

/// Config file looked up when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "mirror.toml";

/// Seconds between passes when no interval is given.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Settings read from the project config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Ignore the requested interval and use `debug_interval_secs` instead.
    #[serde(alias = "debugMode")]
    pub debug_mode: bool,

    #[serde(alias = "debugIntervalSecs")]
    pub debug_interval_secs: u64,

    /// How files present on both sides are compared.
    pub compare: CompareMode,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            debug_interval_secs: DEFAULT_INTERVAL_SECS,
            compare: CompareMode::default(),
        }
    }
}

impl MirrorConfig {
    /// Load from `path`.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigNotFound`] if the file does not exist, otherwise any
    /// parse or format error from [`ConfigStore`].
    pub fn load(path: &Path) -> Result<Self> {
        ConfigStore::new().load(path).map_err(|e| {
            if e.is_not_found() {
                Error::ConfigNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                Error::Fs(e)
            }
        })
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(Error::ConfigNotFound { .. }) => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// The wait between passes: the debug interval in debug mode, otherwise
    /// `requested`.
    pub fn effective_interval(&self, requested: Duration) -> Duration {
        if self.debug_mode {
            Duration::from_secs(self.debug_interval_secs)
        } else {
            requested
        }
    }
}
