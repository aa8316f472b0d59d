//! Export state machine: states, events and the transition table.

use super::types::{DeliveryChannel, FailureKind};

/// Where the controller currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    /// No attempt in flight; triggers are accepted.
    Idle,
    /// First attempt with the primary profile.
    Generating,
    /// Single retry with the degraded profile.
    Retrying,
    Succeeded,
    Failed,
}

impl ExportState {
    /// Whether an export is in flight.
    pub fn is_busy(self) -> bool {
        matches!(self, ExportState::Generating | ExportState::Retrying)
    }

    /// Transition table. Returns `None` for events that do not apply to this state.
    pub fn on(self, event: &ExportEvent) -> Option<ExportState> {
        use ExportEvent::*;
        use ExportState::*;

        match (self, event) {
            (Idle, Trigger) => Some(Generating),
            (Generating, AttemptFailed(_)) => Some(Retrying),
            (Retrying, AttemptFailed(_)) => Some(Failed),
            (Generating | Retrying, Delivered(_)) => Some(Succeeded),
            (Succeeded | Failed, Reset) => Some(Idle),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExportState::Idle => "idle",
            ExportState::Generating => "generating",
            ExportState::Retrying => "retrying",
            ExportState::Succeeded => "succeeded",
            ExportState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Input that moves the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportEvent {
    Trigger,
    AttemptFailed(FailureKind),
    Delivered(DeliveryChannel),
    /// Terminal outcome surfaced; back to idle.
    Reset,
}

/// One applied step of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ExportState,
    pub to: ExportState,
    pub event: ExportEvent,
}
