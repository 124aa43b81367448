//! Server settings via TOML.
//!
//! Settings are read from `stash.toml` (or the path in `STASH_CONFIG`).
//! Missing or corrupted config files fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Operator-configurable settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// Directory where uploaded bytes are persisted.
    pub upload_dir: PathBuf,
    /// Seconds between background sweeps of expired entries.
    pub sweep_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            upload_dir: PathBuf::from("./uploads"),
            sweep_interval_secs: 300,
        }
    }
}

impl Settings {
    /// Load settings from the default config path.
    ///
    /// Returns defaults if the file doesn't exist or is corrupted.
    pub fn load() -> Self {
        let path = std::env::var("STASH_CONFIG").unwrap_or_else(|_| "stash.toml".to_string());
        Self::load_from_path(Path::new(&path))
    }

    /// Load settings from a specific file path.
    pub fn load_from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(settings) => {
                    tracing::info!(path = %path.display(), "settings loaded");
                    settings
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "corrupted settings file, using defaults"
                    );
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %path.display(),
                    "settings file not found, using defaults"
                );
                Self::default()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read settings file, using defaults"
                );
                Self::default()
            }
        }
    }
}
