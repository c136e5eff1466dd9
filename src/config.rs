//! Engine configuration, read from a TOML file.
//!
//! Every field has a default, so a missing file or a partial file is fine:
//!
//! ```toml
//! custom_mappings = ["03000000...,My Pad,a:b0,b:b1,platform:Linux"]
//! warned_capacity = 256
//!
//! [database]
//! structured = ["db.json"]
//! delimited = ["gamecontrollerdb.txt"]
//! platform = "Linux"
//!
//! [backend]
//! poll_interval_ms = 16
//! ```
//!
//! Relative database paths are taken relative to the config file.

use crate::mapping::definition::Platform;
use crate::mapping::fallback::DEFAULT_WARNED_CAPACITY;
use crate::mapping::MappingError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_DIR: &str = "padnorm";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// JSON databases, in load order
    pub structured: Vec<PathBuf>,
    /// Delimited-line databases, in load order
    pub delimited: Vec<PathBuf>,
    /// Platform whose delimited lines are kept; the host platform when unset
    pub platform: Option<Platform>,
}

impl DatabaseConfig {
    pub fn platform(&self) -> Option<Platform> {
        self.platform.or_else(Platform::host)
    }

    fn rebase(&mut self, base: &Path) {
        for path in self.structured.iter_mut().chain(self.delimited.iter_mut()) {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Settings for the device backend host
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BackendSettings {
    pub poll_interval_ms: u64,
    pub joystick_deadzone: f32,
}

// Keeps the deadzone rescale finite
const MAX_DEADZONE: f32 = 0.95;

impl BackendSettings {
    /// Configured deadzone limited to `0.0..=0.95`; unusable values mean none.
    pub fn deadzone(&self) -> f32 {
        if self.joystick_deadzone.is_finite() {
            self.joystick_deadzone.clamp(0.0, MAX_DEADZONE)
        } else {
            0.0
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 16,
            joystick_deadzone: 0.0,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub database: DatabaseConfig,
    /// Extra delimited mapping lines, loaded after the database files
    pub custom_mappings: Vec<String>,
    /// How many unmapped devices are remembered for the once-only warning
    pub warned_capacity: usize,
    pub backend: BackendSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            custom_mappings: Vec::new(),
            warned_capacity: DEFAULT_WARNED_CAPACITY,
            backend: BackendSettings::default(),
        }
    }
}

impl EngineConfig {
    /// `<config dir>/padnorm/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn from_toml(text: &str) -> Result<Self, MappingError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        if let Some(base) = path.parent() {
            config.database.rebase(base);
        }

        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.warned_capacity, DEFAULT_WARNED_CAPACITY);
        assert_eq!(config.backend.poll_interval_ms, 16);
    }

    #[test]
    fn parses_platform_names() {
        let config = EngineConfig::from_toml(
            r#"
            warned_capacity = 8

            [database]
            delimited = ["gamecontrollerdb.txt"]
            platform = "Mac OS X"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.platform(), Some(Platform::MacOs));
        assert_eq!(config.warned_capacity, 8);
    }

    #[test]
    fn rejects_invalid_toml() {
        assert!(matches!(
            EngineConfig::from_toml("warned_capacity = \"many\""),
            Err(MappingError::Config(_))
        ));
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[database]\nstructured = [\"db.json\"]\ndelimited = [\"/abs/db.txt\"]\n",
        )
        .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.database.structured, vec![dir.path().join("db.json")]);
        assert_eq!(config.database.delimited, vec![PathBuf::from("/abs/db.txt")]);
    }

    #[test]
    fn deadzone_is_kept_below_one() {
        let config = EngineConfig::from_toml("[backend]\njoystick_deadzone = 1.5\n").unwrap();
        assert_eq!(config.backend.deadzone(), 0.95);

        let negative = BackendSettings {
            joystick_deadzone: -0.2,
            ..BackendSettings::default()
        };
        assert_eq!(negative.deadzone(), 0.0);

        let nan = BackendSettings {
            joystick_deadzone: f32::NAN,
            ..BackendSettings::default()
        };
        assert_eq!(nan.deadzone(), 0.0);
        assert_eq!(BackendSettings::default().deadzone(), 0.0);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
