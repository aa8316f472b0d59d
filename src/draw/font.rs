//! Font descriptor for text rendering.

use serde::{Deserialize, Serialize};

/// Font configuration for a text node.
///
/// Describes which font to use, including family name, weight, and style.
/// The readiness gate resolves the families of every descriptor in the scene
/// before capture, and the renderer turns the descriptor into a Pango description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescriptor {
    /// Font family name (e.g., "Sans", "Monospace", "Noto Sans KR")
    #[serde(default = "default_family")]
    pub family: String,

    /// Font weight (e.g., "normal", "bold", "light")
    #[serde(default = "default_weight")]
    pub weight: String,

    /// Font style (e.g., "normal", "italic", "oblique")
    #[serde(default = "default_style")]
    pub style: String,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            family: default_family(),
            weight: default_weight(),
            style: default_style(),
        }
    }
}

impl FontDescriptor {
    pub fn new(family: impl Into<String>, weight: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            weight: weight.into(),
            style: style.into(),
        }
    }

    /// Converts this descriptor to a Pango font description string.
    ///
    /// Format: "Family Style Weight Size", e.g. "Sans Bold 32".
    pub fn to_pango_string(&self, size: f64) -> String {
        let mut parts = vec![self.family.clone()];

        for attribute in [&self.style, &self.weight] {
            if !attribute.eq_ignore_ascii_case("normal") {
                parts.push(capitalize_first(attribute));
            }
        }

        parts.push(format!("{}", size.round() as i32));
        parts.join(" ")
    }
}

fn default_family() -> String {
    "Sans".to_string()
}

fn default_weight() -> String {
    "normal".to_string()
}

fn default_style() -> String {
    "normal".to_string()
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}
