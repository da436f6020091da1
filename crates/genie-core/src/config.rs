//! Configuration loading and typed config structures for Mood Genie.
//!
//! The canonical configuration lives in `genie-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure and a
//! loader that reads it. Every field has a default, so a missing file or an
//! empty section is valid.

use std::path::Path;
use std::time::Duration;

use genie_oracle::OracleConfig;
use genie_types::Position;
use serde::Deserialize;

use crate::detector::Thresholds;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but makes no sense.
    #[error("invalid config: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenieConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Surface geometry and interaction radii.
    #[serde(default)]
    pub surface: SurfaceConfig,

    /// Ephemeral message settings.
    #[serde(default)]
    pub notices: NoticeConfig,

    /// Oracle backend settings.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GenieConfig {
    /// Load configuration from a YAML file, then apply environment overrides.
    ///
    /// A missing file yields the defaults. Environment variables:
    /// - `GENIE_PORT` overrides `server.port`
    /// - `GENIE_ORACLE_*` and `GEMINI_API_KEY`, see
    ///   [`OracleConfig::apply_env_overrides`]
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, and
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::parse_yaml(&contents)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string, without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML and
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config = Self::parse_yaml(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("GENIE_PORT") {
            self.server.port = val.parse().map_err(|e| ConfigError::Invalid {
                message: format!("GENIE_PORT is not a port number: {e}"),
            })?;
        }
        self.oracle.apply_env_overrides();
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.surface;
        let all_positive = [s.width, s.height, s.center_radius, s.fuse_radius]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0);
        if !all_positive || !s.spawn_offset.is_finite() {
            return Err(ConfigError::Invalid {
                message: "surface dimensions and radii must be positive numbers".to_owned(),
            });
        }
        self.oracle
            .backend_type()
            .map_err(|e| ConfigError::Invalid {
                message: e.to_string(),
            })?;
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Geometry of the surface tokens live on.
///
/// The center zone sits in the middle of the surface; new tokens spawn
/// horizontally centered, `spawn_offset` units above the bottom edge.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SurfaceConfig {
    /// Surface width in surface units.
    #[serde(default = "default_width")]
    pub width: f64,

    /// Surface height in surface units.
    #[serde(default = "default_height")]
    pub height: f64,

    /// Distance of the spawn point above the bottom edge.
    #[serde(default = "default_spawn_offset")]
    pub spawn_offset: f64,

    /// Drops closer than this to the center materialize the token.
    #[serde(default = "default_center_radius")]
    pub center_radius: f64,

    /// Drops closer than this to another token fuse the two.
    #[serde(default = "default_fuse_radius")]
    pub fuse_radius: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            spawn_offset: default_spawn_offset(),
            center_radius: default_center_radius(),
            fuse_radius: default_fuse_radius(),
        }
    }
}

impl SurfaceConfig {
    /// Center of the materialize zone.
    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }

    /// Where classified words appear.
    pub fn spawn_point(&self) -> Position {
        Position::new(self.width / 2.0, self.height - self.spawn_offset)
    }

    /// Detector radii.
    pub const fn thresholds(&self) -> Thresholds {
        Thresholds {
            center_radius: self.center_radius,
            fuse_radius: self.fuse_radius,
        }
    }
}

/// Ephemeral message settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NoticeConfig {
    /// How long a notice stays visible, in milliseconds.
    #[serde(default = "default_notice_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_notice_ttl_ms(),
        }
    }
}

impl NoticeConfig {
    /// Notice lifetime as a [`Duration`].
    pub const fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Whether structured JSON output was requested.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

const fn default_width() -> f64 {
    1280.0
}

const fn default_height() -> f64 {
    800.0
}

const fn default_spawn_offset() -> f64 {
    150.0
}

const fn default_center_radius() -> f64 {
    crate::detector::DEFAULT_CENTER_RADIUS
}

const fn default_fuse_radius() -> f64 {
    crate::detector::DEFAULT_FUSE_RADIUS
}

const fn default_notice_ttl_ms() -> u64 {
    4000
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_format() -> String {
    "pretty".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GenieConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.notices.ttl(), Duration::from_secs(4));
        assert_eq!(config.surface.center(), Position::new(640.0, 400.0));
        assert_eq!(config.surface.spawn_point(), Position::new(640.0, 650.0));
    }

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = GenieConfig::parse("");
        assert!(config.is_ok_and(|c| c == GenieConfig::default()));
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 3000

surface:
  width: 1920
  height: 1080
  spawn_offset: 200
  center_radius: 160
  fuse_radius: 60

notices:
  ttl_ms: 2500

oracle:
  backend: "anthropic"
  model: "claude-3-5-haiku-latest"
  request_timeout_ms: 10000
  locale: "English"

logging:
  level: "debug"
  format: "json"
"#;
        let config = GenieConfig::parse(yaml);
        assert!(config.is_ok());
        let Ok(config) = config else {
            return;
        };
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.surface.spawn_point(), Position::new(960.0, 880.0));
        assert_eq!(config.surface.thresholds().fuse_radius.to_bits(), 60.0_f64.to_bits());
        assert_eq!(config.notices.ttl_ms, 2500);
        assert_eq!(config.oracle.locale, "English");
        assert!(config.logging.is_json());
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config = GenieConfig::parse(include_str!("../../../genie-config.yaml"));
        assert!(config.is_ok_and(|c| c == GenieConfig::default()));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = GenieConfig::parse("surface:\n  fuse_radius: 100\n");
        assert!(config.is_ok_and(|c| c.surface.center_radius.to_bits()
            == crate::detector::DEFAULT_CENTER_RADIUS.to_bits()
            && c.notices.ttl_ms == 4000));
    }

    #[test]
    fn non_positive_radius_is_invalid() {
        let result = GenieConfig::parse("surface:\n  center_radius: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn unknown_backend_is_invalid() {
        let result = GenieConfig::parse("oracle:\n  backend: \"crystal-ball\"\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join(format!(
            "genie_missing_config_{}.yaml",
            std::process::id()
        ));
        let config = GenieConfig::from_file(&path);
        assert!(config.is_ok_and(|c| c.surface == SurfaceConfig::default()));
    }
}
