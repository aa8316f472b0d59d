//! Configuration enum types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How image resources referenced by the scene are fetched during capture.
///
/// # Examples
/// ```toml
/// [export.primary]
/// cross_origin = "strict"
///
/// [export.degraded]
/// cross_origin = "permissive"
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CrossOriginMode {
    /// Only same-origin resources are accepted and every one of them must load;
    /// a resource that cannot be loaded fails the capture.
    Strict,
    /// Resources are embedded best-effort; anything that cannot be loaded
    /// (including remote URLs) is skipped with a warning.
    Permissive,
}

impl CrossOriginMode {
    /// Whether resource failures abort the capture.
    pub fn is_strict(self) -> bool {
        matches!(self, CrossOriginMode::Strict)
    }
}

impl std::fmt::Display for CrossOriginMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrossOriginMode::Strict => write!(f, "strict"),
            CrossOriginMode::Permissive => write!(f, "permissive"),
        }
    }
}
