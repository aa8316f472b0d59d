//! Configuration type definitions.

use super::enums::CrossOriginMode;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Readiness gate timings.
///
/// Controls how long the exporter waits for fonts and animations before it
/// rasterizes the target region.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReadinessConfig {
    /// Upper bound for waiting on typeface loading, in milliseconds (0 - 30000)
    #[serde(default = "default_font_timeout_ms")]
    pub font_timeout_ms: u64,

    /// Pause after fonts resolved, in milliseconds (0 - 30000)
    #[serde(default = "default_font_settle_ms")]
    pub font_settle_ms: u64,

    /// Fixed wait that lets in-progress animations reach their final frame,
    /// in milliseconds (0 - 30000)
    #[serde(default = "default_animation_settle_ms")]
    pub animation_settle_ms: u64,

    /// Frame clock period used for the double frame barrier, in milliseconds (1 - 1000)
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            font_timeout_ms: default_font_timeout_ms(),
            font_settle_ms: default_font_settle_ms(),
            animation_settle_ms: default_animation_settle_ms(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

/// Capture settings for a single attempt.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProfileConfig {
    /// Pixel density multiplier (valid range: 0.5 - 4.0)
    pub scale: f64,

    /// Resource fetching policy (strict or permissive)
    pub cross_origin: CrossOriginMode,

    /// Time budget for loading each resource, in milliseconds (1000 - 120000)
    pub timeout_ms: u64,
}

impl ProfileConfig {
    /// High-fidelity settings used for the first attempt.
    pub fn primary() -> Self {
        Self {
            scale: 2.0,
            cross_origin: CrossOriginMode::Strict,
            timeout_ms: 20_000,
        }
    }

    /// Reduced-fidelity settings used for the single retry.
    pub fn degraded() -> Self {
        Self {
            scale: 1.0,
            cross_origin: CrossOriginMode::Permissive,
            timeout_ms: 10_000,
        }
    }
}

/// Profile table as written in the config file; missing keys keep the
/// profile's own defaults.
#[derive(Debug, Default, Deserialize, JsonSchema)]
struct ProfileOverrides {
    /// Pixel density multiplier (valid range: 0.5 - 4.0)
    scale: Option<f64>,
    /// Resource fetching policy (strict or permissive)
    cross_origin: Option<CrossOriginMode>,
    /// Time budget for loading each resource, in milliseconds (1000 - 120000)
    timeout_ms: Option<u64>,
}

impl ProfileOverrides {
    fn apply_to(self, base: ProfileConfig) -> ProfileConfig {
        ProfileConfig {
            scale: self.scale.unwrap_or(base.scale),
            cross_origin: self.cross_origin.unwrap_or(base.cross_origin),
            timeout_ms: self.timeout_ms.unwrap_or(base.timeout_ms),
        }
    }
}

fn primary_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProfileConfig, D::Error> {
    ProfileOverrides::deserialize(deserializer).map(|o| o.apply_to(ProfileConfig::primary()))
}

fn degraded_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProfileConfig, D::Error> {
    ProfileOverrides::deserialize(deserializer).map(|o| o.apply_to(ProfileConfig::degraded()))
}

/// Export attempt policy.
///
/// # Example TOML
/// ```toml
/// [export]
/// retry_delay_ms = 1000
///
/// [export.primary]
/// scale = 2.0
/// cross_origin = "strict"
/// timeout_ms = 20000
///
/// [export.degraded]
/// scale = 1.0
/// cross_origin = "permissive"
/// timeout_ms = 10000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportConfig {
    /// Short fixed delay before the retry, in milliseconds (0 - 10000)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Profile for the first attempt
    #[serde(default = "ProfileConfig::primary", deserialize_with = "primary_profile")]
    #[schemars(with = "ProfileOverrides")]
    pub primary: ProfileConfig,

    /// Profile for the retry; never finer than the primary profile
    #[serde(default = "ProfileConfig::degraded", deserialize_with = "degraded_profile")]
    #[schemars(with = "ProfileOverrides")]
    pub degraded: ProfileConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            primary: ProfileConfig::primary(),
            degraded: ProfileConfig::degraded(),
        }
    }
}

/// Where saved images go.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OutputConfig {
    /// Directory for saved images (supports `~/`)
    #[serde(default = "default_save_directory")]
    pub save_directory: String,

    /// File name; chrono format specifiers such as `%Y-%m-%d` are expanded
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Delay before the transient staging file is released, in milliseconds (0 - 60000)
    #[serde(default = "default_cleanup_delay_ms")]
    pub cleanup_delay_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_directory: default_save_directory(),
            filename: default_filename(),
            cleanup_delay_ms: default_cleanup_delay_ms(),
        }
    }
}

/// Manual-save viewer used when saving is not possible.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewerConfig {
    /// Command that opens the generated viewer page
    #[serde(default = "default_viewer_command")]
    pub command: String,

    /// Delay before the viewer page is removed, in milliseconds (0 - 600000)
    #[serde(default = "default_viewer_cleanup_delay_ms")]
    pub cleanup_delay_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            command: default_viewer_command(),
            cleanup_delay_ms: default_viewer_cleanup_delay_ms(),
        }
    }
}

/// Desktop notification preferences.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationConfig {
    /// Send desktop notifications for export outcomes
    #[serde(default = "default_notifications_enabled")]
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_notifications_enabled(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_font_timeout_ms() -> u64 {
    3000
}

fn default_font_settle_ms() -> u64 {
    500
}

fn default_animation_settle_ms() -> u64 {
    4000
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_retry_delay_ms() -> u64 {
    1000
}

pub(crate) fn default_save_directory() -> String {
    "~/Pictures/Panelshot".to_string()
}

pub(crate) fn default_filename() -> String {
    "result.png".to_string()
}

fn default_cleanup_delay_ms() -> u64 {
    1000
}

fn default_viewer_command() -> String {
    "xdg-open".to_string()
}

fn default_viewer_cleanup_delay_ms() -> u64 {
    60_000
}

fn default_notifications_enabled() -> bool {
    true
}
