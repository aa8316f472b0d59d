//! Configuration file support for panelshot.
//!
//! This module handles loading and validating user settings from the configuration file
//! located at `~/.config/panelshot/config.toml`. Settings include readiness timings,
//! the primary and degraded capture profiles, output location and notifications.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod enums;
pub mod types;

pub use enums::CrossOriginMode;
pub use types::{
    ExportConfig, NotificationConfig, OutputConfig, ProfileConfig, ReadinessConfig, ViewerConfig,
};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure containing all user settings.
///
/// # Example TOML
/// ```toml
/// [readiness]
/// animation_settle_ms = 4000
///
/// [export]
/// retry_delay_ms = 1000
///
/// [output]
/// save_directory = "~/Pictures/Panelshot"
/// filename = "result.png"
///
/// [notifications]
/// enabled = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Readiness gate timings
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Attempt profiles and retry policy
    #[serde(default)]
    pub export: ExportConfig,

    /// Saved file location and name
    #[serde(default)]
    pub output: OutputConfig,

    /// Manual-save fallback viewer
    #[serde(default)]
    pub viewer: ViewerConfig,

    /// Desktop notifications
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Config {
    /// Validates and clamps all configuration values to acceptable ranges.
    ///
    /// Invalid values are clamped to the nearest valid value and a warning is logged.
    /// The degraded profile is additionally capped by the primary profile so that a
    /// retry never asks for a finer scale or a longer timeout than the first attempt.
    pub(crate) fn validate_and_clamp(&mut self) {
        clamp_u64("readiness.font_timeout_ms", &mut self.readiness.font_timeout_ms, 0, 30_000);
        clamp_u64("readiness.font_settle_ms", &mut self.readiness.font_settle_ms, 0, 30_000);
        clamp_u64(
            "readiness.animation_settle_ms",
            &mut self.readiness.animation_settle_ms,
            0,
            30_000,
        );
        clamp_u64("readiness.frame_interval_ms", &mut self.readiness.frame_interval_ms, 1, 1000);
        clamp_u64("export.retry_delay_ms", &mut self.export.retry_delay_ms, 0, 10_000);
        clamp_u64("output.cleanup_delay_ms", &mut self.output.cleanup_delay_ms, 0, 60_000);
        clamp_u64("viewer.cleanup_delay_ms", &mut self.viewer.cleanup_delay_ms, 0, 600_000);

        for (name, profile) in [
            ("primary", &mut self.export.primary),
            ("degraded", &mut self.export.degraded),
        ] {
            if !profile.scale.is_finite() || !(0.5..=4.0).contains(&profile.scale) {
                warn!(
                    "Invalid {} scale {:.2}, clamping to 0.5-4.0 range",
                    name, profile.scale
                );
                profile.scale = if profile.scale.is_finite() {
                    profile.scale.clamp(0.5, 4.0)
                } else {
                    1.0
                };
            }
            clamp_u64(name, &mut profile.timeout_ms, 1000, 120_000);
        }

        if self.export.degraded.scale > self.export.primary.scale {
            warn!(
                "Degraded scale {:.2} exceeds primary scale {:.2}, lowering it",
                self.export.degraded.scale, self.export.primary.scale
            );
            self.export.degraded.scale = self.export.primary.scale;
        }

        if self.export.degraded.timeout_ms > self.export.primary.timeout_ms {
            warn!(
                "Degraded timeout {}ms exceeds primary timeout {}ms, lowering it",
                self.export.degraded.timeout_ms, self.export.primary.timeout_ms
            );
            self.export.degraded.timeout_ms = self.export.primary.timeout_ms;
        }

        if self.output.filename.trim().is_empty() {
            warn!("Empty output filename, falling back to 'result.png'");
            self.output.filename = types::default_filename();
        }

        if self.output.save_directory.trim().is_empty() {
            warn!("Empty save_directory, falling back to the default");
            self.output.save_directory = types::default_save_directory();
        }

        if self.viewer.command.trim().is_empty() {
            warn!("Empty viewer command, falling back to 'xdg-open'");
            self.viewer = ViewerConfig {
                cleanup_delay_ms: self.viewer.cleanup_delay_ms,
                ..ViewerConfig::default()
            };
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("panelshot");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from the default location, or returns defaults if not found.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Loads configuration from `config_path`, or returns defaults if the file is missing.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or contains invalid TOML.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// JSON schema of the configuration file, for editors and tooling.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}

impl OutputConfig {
    /// Save directory with `~/` expanded.
    pub fn save_path(&self) -> PathBuf {
        expand_tilde(&self.save_directory)
    }
}

fn clamp_u64(name: &str, value: &mut u64, min: u64, max: u64) {
    if !(min..=max).contains(value) {
        warn!(
            "Invalid {} {}, clamping to {}-{} range",
            name, value, min, max
        );
        *value = (*value).clamp(min, max);
    }
}

/// Expand tilde (~) in path strings.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}
