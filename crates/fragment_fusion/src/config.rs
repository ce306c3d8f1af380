//! Application configuration loaded from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use fragment_puzzle::{AspectRatio, GridSize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::session::SessionConfig;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "fragment_fusion.toml";

/// Upper bound on the elapsed-time update period.
pub const MAX_TICK_RESOLUTION_MS: u64 = 100;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file (`:memory:` allowed).
    #[setters(into)]
    db_path: String,

    /// Directory holding level images.
    #[setters(into)]
    assets_dir: PathBuf,

    /// Image used when a level image fails to load.
    #[setters(into)]
    fallback_image: String,

    /// Crop ratio for levels; unset keeps each image's own ratio.
    level_aspect_ratio: Option<f64>,

    /// Crop ratio for custom-image puzzles.
    custom_aspect_ratio: f64,

    /// Default grid side for custom puzzles.
    custom_grid_size: u32,

    /// Elapsed-time update period in milliseconds.
    tick_resolution_ms: u64,

    /// Tracing filter used when `RUST_LOG` is unset.
    #[setters(into)]
    log_filter: String,

    /// Stored profile picture removed on account deletion.
    profile_image_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "fragment_fusion.db".to_string(),
            assets_dir: PathBuf::from("assets"),
            fallback_image: "userButton".to_string(),
            level_aspect_ratio: None,
            custom_aspect_ratio: 0.8,
            custom_grid_size: 3,
            tick_resolution_ms: MAX_TICK_RESOLUTION_MS,
            log_filter: "info".to_string(),
            profile_image_path: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or a
    /// value is out of range.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        info!(db_path = %config.db_path, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file is invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            debug!("No config file; using defaults");
            Ok(Self::default())
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first invalid value.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_TICK_RESOLUTION_MS).contains(&self.tick_resolution_ms) {
            return Err(ConfigError::new(format!(
                "tick_resolution_ms must be between 1 and {}, got {}",
                MAX_TICK_RESOLUTION_MS, self.tick_resolution_ms
            )));
        }
        self.custom_grid()?;
        self.custom_ratio()?;
        self.level_ratio()?;
        Ok(())
    }

    /// Returns the default custom grid.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `custom_grid_size` is below two.
    pub fn custom_grid(&self) -> Result<GridSize, ConfigError> {
        GridSize::new(self.custom_grid_size)
            .map_err(|e| ConfigError::new(format!("custom_grid_size: {}", e)))
    }

    fn custom_ratio(&self) -> Result<AspectRatio, ConfigError> {
        AspectRatio::new(self.custom_aspect_ratio)
            .map_err(|e| ConfigError::new(format!("custom_aspect_ratio: {}", e)))
    }

    fn level_ratio(&self) -> Result<Option<AspectRatio>, ConfigError> {
        self.level_aspect_ratio
            .map(|ratio| {
                AspectRatio::new(ratio)
                    .map_err(|e| ConfigError::new(format!("level_aspect_ratio: {}", e)))
            })
            .transpose()
    }

    /// Returns the elapsed-time update period.
    pub fn tick_resolution(&self) -> Duration {
        Duration::from_millis(self.tick_resolution_ms)
    }

    /// Builds the settings a play session needs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a ratio is invalid.
    #[instrument(skip(self))]
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        Ok(SessionConfig::new(
            self.fallback_image.clone(),
            self.level_ratio()?,
            self.custom_ratio()?,
            self.tick_resolution(),
        ))
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(*config.custom_grid_size(), 3);
        assert_eq!(config.fallback_image(), "userButton");
        assert_eq!(config.tick_resolution(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            db_path = "progress.db"
            level_aspect_ratio = 0.75
            "#,
        )
        .expect("parse");
        assert_eq!(config.db_path(), "progress.db");
        assert_eq!(*config.level_aspect_ratio(), Some(0.75));
        assert_eq!(*config.custom_aspect_ratio(), 0.8);
    }

    #[test]
    fn test_tick_resolution_out_of_range() {
        let config = AppConfig::default().with_tick_resolution_ms(250);
        assert!(config.validate().is_err());
        let config = AppConfig::default().with_tick_resolution_ms(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let config = AppConfig::default().with_custom_aspect_ratio(-1.0);
        assert!(config.session_config().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_or_default("/nonexistent/fragment_fusion.toml").expect("defaults");
        assert_eq!(config, AppConfig::default());
    }
}
