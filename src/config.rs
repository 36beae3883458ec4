//! Robot configuration stored as TOML in the user's config directory.
//!
//! A missing or broken file never stops the robot from starting: [`RobotConfig::load`]
//! falls back to defaults and logs what went wrong.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::controller::ControllerSettings;

pub const CONFIG_DIR: &str = "shooter-control";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Length of one control cycle
    pub period_ms: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { period_ms: 20 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub controller: ControllerSettings,
    pub scheduler: SchedulerSettings,
}

/// `<config_dir>/shooter-control/config.toml`, or relative to the working
/// directory when the platform has no config directory
pub fn default_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| {
        warn!("Could not determine config directory, using current directory");
        PathBuf::from(".")
    });
    base.join(CONFIG_DIR).join(CONFIG_FILE)
}

impl RobotConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.scheduler.period_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.period_ms == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.period_ms must be greater than zero".to_string(),
            ));
        }
        self.controller
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("controller: {}", e)))
    }

    /// Writes the default config if nothing exists at `path`. Returns whether
    /// a file was written.
    pub async fn ensure_default(path: &Path) -> Result<bool, ConfigError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| io_error(path, source))?;
        if exists {
            debug!("Config found at {}", path.display());
            return Ok(false);
        }

        info!("No config at {}, writing defaults", path.display());
        RobotConfig::default().save(path).await?;
        Ok(true)
    }

    pub async fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| io_error(path, source))?;
        let config: RobotConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`read`](Self::read), but any failure yields the defaults
    pub async fn load(path: &Path) -> Self {
        match Self::read(path).await {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| io_error(path, source))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("shooter-control-{}-{}", name, std::process::id()))
            .join(CONFIG_FILE)
    }

    async fn cleanup(path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = tokio::fs::remove_dir_all(parent).await;
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = RobotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.period(), Duration::from_millis(20));
    }

    #[test]
    fn zero_period_is_rejected() {
        let mut config = RobotConfig::default();
        config.scheduler.period_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn deadzone_must_stay_below_one() {
        let mut config = RobotConfig::default();
        config.controller.joystick_deadzone = 1.0;
        assert!(config.validate().is_err());
        config.controller.joystick_deadzone = -0.1;
        assert!(config.validate().is_err());
        config.controller.joystick_deadzone = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let config: RobotConfig = toml::from_str("[scheduler]\nperiod_ms = 10\n").unwrap();
        assert_eq!(config.scheduler.period_ms, 10);
        assert_eq!(config.controller, ControllerSettings::default());
    }

    #[tokio::test]
    async fn ensure_default_writes_once() {
        let path = scratch("ensure");
        cleanup(&path).await;

        assert!(RobotConfig::ensure_default(&path).await.unwrap());
        assert!(!RobotConfig::ensure_default(&path).await.unwrap());
        assert_eq!(RobotConfig::read(&path).await.unwrap(), RobotConfig::default());

        cleanup(&path).await;
    }

    #[tokio::test]
    async fn saved_settings_are_read_back() {
        let path = scratch("save");
        let mut config = RobotConfig::default();
        config.scheduler.period_ms = 10;
        config.controller.gamepad_index = 1;

        config.save(&path).await.unwrap();
        assert_eq!(RobotConfig::load(&path).await, config);

        cleanup(&path).await;
    }

    #[tokio::test]
    async fn broken_file_falls_back_to_defaults() {
        let path = scratch("broken");
        cleanup(&path).await;
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "scheduler = [").await.unwrap();

        assert!(matches!(
            RobotConfig::read(&path).await,
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(RobotConfig::load(&path).await, RobotConfig::default());

        cleanup(&path).await;
    }

    #[tokio::test]
    async fn invalid_values_fall_back_to_defaults() {
        let path = scratch("invalid");
        cleanup(&path).await;
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "[scheduler]\nperiod_ms = 0\n").await.unwrap();

        assert_eq!(RobotConfig::load(&path).await, RobotConfig::default());

        cleanup(&path).await;
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let path = scratch("missing");
        cleanup(&path).await;
        assert!(matches!(
            RobotConfig::read(&path).await,
            Err(ConfigError::Io { .. })
        ));
    }
}
