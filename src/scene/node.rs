//! Visual node definitions.

use crate::draw::{Color, FontDescriptor, color::BLACK};
use serde::{Deserialize, Serialize};

/// Position and size of a node, relative to its parent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Markings a host attaches to nodes to steer export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMarks {
    /// Node (and its subtree) is removed from every capture.
    #[serde(default)]
    pub exclude_from_export: bool,
    /// Node is actively animating and gets frozen before capture.
    #[serde(default)]
    pub animated: bool,
}

/// Animation state of a node; `progress` is the current frame in 0.0..=1.0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub progress: f64,
    #[serde(default)]
    pub running: bool,
}

/// What an interactive control does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlRole {
    /// The button that starts an export; never part of the captured image.
    ExportTrigger,
    Other,
}

/// Drawable content of a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeKind {
    /// Box that groups children, optionally filled and rounded.
    Container {
        #[serde(default)]
        background: Option<Color>,
        #[serde(default)]
        corner_radius: f64,
        #[serde(default)]
        border: Option<Border>,
    },
    /// Text laid out with Pango from the node's top-left corner.
    Text {
        text: String,
        #[serde(default = "default_text_color")]
        color: Color,
        #[serde(default = "default_text_size")]
        size: f64,
        #[serde(default)]
        font: FontDescriptor,
    },
    /// Horizontal chart bar filled to `value` (0.0..=1.0) of its width.
    Bar {
        value: f64,
        fill: Color,
        #[serde(default)]
        track: Option<Color>,
        #[serde(default)]
        corner_radius: f64,
    },
    /// PNG image loaded from a path or URL.
    Image { source: String },
    /// Interactive control such as a button.
    Control {
        role: ControlRole,
        #[serde(default)]
        label: String,
    },
}

/// Stroke around a container.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub color: Color,
    pub width: f64,
}

/// A node of the rendered scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable key used to address the node as a capture target.
    #[serde(default)]
    pub key: Option<String>,
    pub bounds: Bounds,
    pub kind: NodeKind,
    #[serde(default)]
    pub marks: ExportMarks,
    #[serde(default)]
    pub animation: Option<Animation>,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(bounds: Bounds, kind: NodeKind) -> Self {
        Self {
            key: None,
            bounds,
            kind,
            marks: ExportMarks::default(),
            animation: None,
            children: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_marks(mut self, marks: ExportMarks) -> Self {
        self.marks = marks;
        self
    }

    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Depth-first search for the node carrying `key`.
    pub fn find(&self, key: &str) -> Option<&Node> {
        if self.key.as_deref() == Some(key) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(key))
    }

    /// Mutable variant of [`Node::find`].
    pub fn find_mut(&mut self, key: &str) -> Option<&mut Node> {
        if self.key.as_deref() == Some(key) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(key))
    }

    /// Calls `f` for this node and every descendant, parents first.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    /// Whether the capture must drop this node together with its subtree.
    pub fn hidden_in_export(&self) -> bool {
        self.marks.exclude_from_export
            || matches!(
                self.kind,
                NodeKind::Control {
                    role: ControlRole::ExportTrigger,
                    ..
                }
            )
    }

    /// Image sources referenced anywhere in this subtree.
    pub fn image_sources(&self) -> Vec<String> {
        let mut sources = Vec::new();
        self.visit(&mut |node| {
            if let NodeKind::Image { source } = &node.kind
                && !sources.contains(source)
            {
                sources.push(source.clone());
            }
        });
        sources
    }
}

fn default_text_color() -> Color {
    BLACK
}

fn default_text_size() -> f64 {
    16.0
}
