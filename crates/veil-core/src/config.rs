//! Protector configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use veil_config::{ProtectionConfig, ProtectionFlag};
use veil_policy::PolicyTimings;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the settings database
    pub database_path: PathBuf,
    /// Warning, penalty and restore durations
    pub timings: PolicyTimings,
    /// Default tier of the protection merge
    pub base_protection: ProtectionConfig,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("veil.db"),
            timings: PolicyTimings::default(),
            // Visual watermark ships on unless a deployment replaces the default tier
            base_protection: ProtectionConfig::default().with(ProtectionFlag::VisualWatermark),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Veil"))
            .unwrap_or_else(|| PathBuf::from(".veil"))
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;

        serde_json::from_str(&raw)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
