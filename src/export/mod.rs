//! Image export of a scene region.
//!
//! This module turns a target subtree of the scene into a PNG and hands it to
//! the user:
//! - Readiness gate (fonts, animations, frames) before the first attempt
//! - Rasterization with capture-only adjustments on a copy of the tree
//! - PNG encoding
//! - Saving to disk, with a viewer page as manual-save fallback
//! - One retry with degraded settings, guarded against re-entrant triggers

pub mod delivery;
pub mod dependencies;
pub mod encode;
pub mod raster;
pub mod readiness;
pub mod state;
pub mod types;
pub mod viewer;

mod controller;
mod pipeline;

pub use controller::{ExportController, ExportManager, ExportSettings, describe_errors};
pub use dependencies::ExportDependencies;
pub use types::{DeliveryChannel, ExportTrigger, TriggerAck};
