//! Rendering primitives (Cairo-based).
//!
//! This module defines the drawing types used when rasterizing a scene:
//! - [`Color`]: RGBA color representation
//! - [`FontDescriptor`]: font family/weight/style for text nodes
//! - Rendering functions that paint scene nodes onto a Cairo context

pub mod color;
pub mod font;
pub mod render;

pub use color::Color;
pub use font::FontDescriptor;
pub use render::{ImageSet, render_background, render_node, render_text};
