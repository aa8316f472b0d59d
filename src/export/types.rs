//! Data types for the export pipeline.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::{CrossOriginMode, ProfileConfig};

pub use super::state::{ExportEvent, ExportState, Transition};

/// MIME type of every artifact the exporter produces.
pub const PNG_MIME_TYPE: &str = "image/png";

/// Errors that can occur during a single export attempt.
///
/// None of these reach the code that triggered the export; the controller
/// turns each of them into a state transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("Capture target not found: {0}")]
    MissingTarget(String),

    #[error("Rasterization failed: {0}")]
    Capture(String),

    #[error("Image encoding failed: {0}")]
    Encoding(String),

    #[error("Saving is not supported: {0}")]
    SaveUnsupported(String),
}

impl ExportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExportError::MissingTarget(_) => FailureKind::MissingTarget,
            ExportError::Capture(_) => FailureKind::Capture,
            ExportError::Encoding(_) => FailureKind::Encoding,
            ExportError::SaveUnsupported(_) => FailureKind::SaveUnsupported,
        }
    }
}

/// Category of an attempt failure, carried by state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MissingTarget,
    Capture,
    Encoding,
    SaveUnsupported,
}

/// Capture settings of one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityProfile {
    /// Pixel density multiplier.
    pub scale: f64,
    pub cross_origin: CrossOriginMode,
    /// Budget for loading each referenced resource.
    pub timeout: Duration,
}

impl From<&ProfileConfig> for QualityProfile {
    fn from(config: &ProfileConfig) -> Self {
        Self {
            scale: config.scale,
            cross_origin: config.cross_origin,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

impl QualityProfile {
    pub fn primary() -> Self {
        Self::from(&ProfileConfig::primary())
    }

    pub fn degraded() -> Self {
        Self::from(&ProfileConfig::degraded())
    }
}

/// One attempt's input: what to capture and how.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub target_id: String,
    pub profile: QualityProfile,
}

impl ExportRequest {
    pub fn new(target_id: impl Into<String>, profile: QualityProfile) -> Self {
        Self {
            target_id: target_id.into(),
            profile,
        }
    }
}

/// Pixels of a rasterized region in Cairo's ARGB32 layout.
pub struct CapturedBitmap {
    pub width: u32,
    pub height: u32,
    /// Bytes per row.
    pub stride: u32,
    pub data: Vec<u8>,
    /// Scale the bitmap was rendered at.
    pub scale: f64,
}

impl std::fmt::Debug for CapturedBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.data.len())
            .field("scale", &self.scale)
            .finish()
    }
}

/// Encoded image payload.
#[derive(Debug, Clone)]
pub struct EncodedArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub byte_length: usize,
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

impl EncodedArtifact {
    /// Summary kept after the payload itself is dropped.
    pub fn info(&self) -> ArtifactInfo {
        ArtifactInfo {
            mime_type: self.mime_type,
            byte_length: self.byte_length,
            width: self.width,
            height: self.height,
            scale: self.scale,
        }
    }
}

/// Metadata of a delivered artifact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtifactInfo {
    pub mime_type: &'static str,
    pub byte_length: usize,
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

/// How the artifact reached the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryChannel {
    /// Written to the save directory.
    Saved,
    /// Opened in a viewer for the user to save manually.
    ShownForManualSave,
}

/// Result of a delivery step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub channel: DeliveryChannel,
    pub succeeded: bool,
    /// Saved file or viewer page, when one was produced.
    pub location: Option<PathBuf>,
}

impl DeliveryOutcome {
    pub fn saved(path: PathBuf) -> Self {
        Self {
            channel: DeliveryChannel::Saved,
            succeeded: true,
            location: Some(path),
        }
    }

    pub fn save_failed() -> Self {
        Self {
            channel: DeliveryChannel::Saved,
            succeeded: false,
            location: None,
        }
    }

    pub fn shown(page: PathBuf) -> Self {
        Self {
            channel: DeliveryChannel::ShownForManualSave,
            succeeded: true,
            location: Some(page),
        }
    }

    pub fn show_failed() -> Self {
        Self {
            channel: DeliveryChannel::ShownForManualSave,
            succeeded: false,
            location: None,
        }
    }
}

/// Display-only context of the result being exported.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QualityContext {
    pub percentage: f64,
}

/// Trigger event sent by the widget that owns the capture target.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTrigger {
    pub target_id: String,
    pub quality_context: QualityContext,
    pub label: Option<String>,
    /// Styling hint of the triggering control; not used by the pipeline.
    pub style_class: Option<String>,
}

impl ExportTrigger {
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            quality_context: QualityContext::default(),
            label: None,
            style_class: None,
        }
    }

    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.quality_context.percentage = percentage;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Everything that happened during one export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub target_id: String,
    /// Terminal state reached before returning to idle.
    pub final_state: ExportState,
    pub transitions: Vec<Transition>,
    /// Failures in attempt order; at most two.
    pub errors: Vec<ExportError>,
    pub artifact: Option<ArtifactInfo>,
    pub delivery: Option<DeliveryOutcome>,
}

impl ExportReport {
    pub fn succeeded(&self) -> bool {
        self.final_state == ExportState::Succeeded
    }

    /// Number of retries performed (0 or 1).
    pub fn retries(&self) -> usize {
        self.transitions
            .iter()
            .filter(|t| t.to == ExportState::Retrying)
            .count()
    }
}

/// Answer to a trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerAck {
    /// The trigger was accepted and the run finished.
    Completed(ExportReport),
    /// Another export was in flight; the trigger was dropped.
    Ignored(ExportState),
}

impl TriggerAck {
    pub fn report(&self) -> Option<&ExportReport> {
        match self {
            TriggerAck::Completed(report) => Some(report),
            TriggerAck::Ignored(_) => None,
        }
    }
}
