//! RGBA color type and the colors the exporter paints with.

use serde::{Deserialize, Serialize};

/// Represents an RGBA color with floating-point components.
///
/// All components are in the range 0.0 (minimum) to 1.0 (maximum).
///
/// # Examples
///
/// ```
/// use panelshot::draw::Color;
/// let red = Color { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
/// let semi_transparent_blue = Color { r: 0.0, g: 0.0, b: 1.0, a: 0.5 };
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red component (0.0 = no red, 1.0 = full red)
    pub r: f64,
    /// Green component (0.0 = no green, 1.0 = full green)
    pub g: f64,
    /// Blue component (0.0 = no blue, 1.0 = full blue)
    pub b: f64,
    /// Alpha/transparency (0.0 = fully transparent, 1.0 = fully opaque)
    #[serde(default = "opaque")]
    pub a: f64,
}

impl Color {
    /// Creates a new color from RGBA components.
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Applies this color as the Cairo source.
    pub fn apply(&self, ctx: &cairo::Context) {
        ctx.set_source_rgba(self.r, self.g, self.b, self.a);
    }
}

fn opaque() -> f64 {
    1.0
}

/// Capture background (white).
pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

/// Default text color.
pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

/// Track color used behind bars when none is given.
pub const LIGHT_GRAY: Color = Color::new(0.9, 0.9, 0.9, 1.0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_defaults_to_opaque() {
        let color: Color = serde_json::from_str(r#"{"r":0.2,"g":0.4,"b":0.6}"#).unwrap();
        assert_eq!(color.a, 1.0);
    }
}
