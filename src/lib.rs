//! Library exports for the panelshot exporter.
//!
//! Exposes the scene model, the export pipeline and its configuration so that
//! host applications can embed the controller and external tools can share
//! validation and serialization code with the main binary.

pub mod config;
pub mod draw;
pub mod export;
pub mod notification;
pub mod scene;

pub use config::Config;
