//! The rendered visual tree a host application hands to the exporter.
//!
//! A [`Scene`] is a tree of [`Node`]s. Nodes carrying a `key` can be captured;
//! marks on nodes tell the exporter what to hide and what to freeze. The live
//! scene is shared through a [`SceneHandle`] and is never modified by export.

pub mod node;
pub mod prepare;

pub use node::{Animation, Border, Bounds, ControlRole, ExportMarks, Node, NodeKind};
pub use prepare::{PreparedTree, natural_size, prepare_for_capture};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Errors raised while loading a scene description.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Failed to read scene: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scene description: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A complete visual tree plus where its relative resources live.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Base directory for relative image sources.
    #[serde(default)]
    pub resource_root: Option<PathBuf>,
    pub root: Node,
}

impl Scene {
    pub fn new(root: Node) -> Self {
        Self {
            resource_root: None,
            root,
        }
    }

    /// Parses a JSON scene description.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a JSON scene; relative resources resolve against the file's directory
    /// unless the description names its own `resource_root`.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let json = fs::read_to_string(path)?;
        let mut scene = Self::from_json(&json)?;
        if scene.resource_root.is_none() {
            scene.resource_root = path.parent().map(Path::to_path_buf);
        }
        log::info!("Loaded scene from {}", path.display());
        Ok(scene)
    }

    pub fn find(&self, key: &str) -> Option<&Node> {
        self.root.find(key)
    }

    /// Font families used by text anywhere in the scene.
    pub fn font_families(&self) -> BTreeSet<String> {
        let mut families = BTreeSet::new();
        self.root.visit(&mut |node| {
            if let NodeKind::Text { font, .. } = &node.kind {
                families.insert(font.family.clone());
            }
        });
        families
    }
}

/// Shared, read-mostly access to the live scene.
///
/// The host keeps updating the scene (e.g. advancing animations) through
/// [`SceneHandle::update`]; the exporter only ever takes snapshots.
#[derive(Clone, Debug)]
pub struct SceneHandle {
    inner: Arc<RwLock<Scene>>,
}

impl SceneHandle {
    pub fn new(scene: Scene) -> Self {
        Self {
            inner: Arc::new(RwLock::new(scene)),
        }
    }

    /// Clone of the subtree keyed `key`, if present.
    pub fn snapshot_target(&self, key: &str) -> Option<Node> {
        let scene = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        scene.find(key).cloned()
    }

    /// Clone of the whole scene.
    pub fn snapshot(&self) -> Scene {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn resource_root(&self) -> Option<PathBuf> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resource_root
            .clone()
    }

    pub fn font_families(&self) -> BTreeSet<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .font_families()
    }

    /// Applies a host-side change to the live scene.
    pub fn update<R>(&self, f: impl FnOnce(&mut Scene) -> R) -> R {
        let mut scene = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCENE: &str = r##"{
        "root": {
            "bounds": { "width": 800, "height": 600 },
            "kind": { "type": "container" },
            "children": [
                {
                    "key": "result-panel",
                    "bounds": { "x": 20, "y": 40, "width": 400, "height": 240 },
                    "kind": { "type": "container", "background": { "r": 1, "g": 1, "b": 1 }, "corner_radius": 12 },
                    "children": [
                        {
                            "bounds": { "x": 16, "y": 16, "width": 300, "height": 32 },
                            "kind": { "type": "text", "text": "72%", "size": 24, "font": { "family": "Monospace", "weight": "bold" } }
                        },
                        {
                            "key": "logo",
                            "bounds": { "x": 300, "y": 16, "width": 64, "height": 64 },
                            "kind": { "type": "image", "source": "logo.png" }
                        },
                        {
                            "bounds": { "x": 16, "y": 190, "width": 120, "height": 32 },
                            "kind": { "type": "control", "role": "export-trigger", "label": "Download" }
                        }
                    ]
                }
            ]
        }
    }"##;

    #[test]
    fn parses_scene_description() {
        let scene = Scene::from_json(SCENE).unwrap();
        let panel = scene.find("result-panel").unwrap();
        assert_eq!(panel.children.len(), 3);
        assert!(panel.children[2].hidden_in_export());
        assert_eq!(panel.image_sources(), vec!["logo.png".to_string()]);
        assert!(scene.find("missing").is_none());
    }

    #[test]
    fn collects_font_families() {
        let scene = Scene::from_json(SCENE).unwrap();
        let families: Vec<_> = scene.font_families().into_iter().collect();
        assert_eq!(families, vec!["Monospace".to_string()]);
    }

    #[test]
    fn load_defaults_resource_root_to_scene_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scene.json");
        std::fs::write(&path, SCENE).unwrap();

        let scene = Scene::load(&path).unwrap();
        assert_eq!(scene.resource_root.as_deref(), Some(temp.path()));
    }

    #[test]
    fn load_reports_parse_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scene.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Scene::load(&path), Err(SceneError::Parse(_))));
    }

    #[test]
    fn handle_snapshots_are_detached() {
        let handle = SceneHandle::new(Scene::from_json(SCENE).unwrap());
        let mut snapshot = handle.snapshot_target("result-panel").unwrap();
        snapshot.children.clear();

        assert_eq!(handle.snapshot_target("result-panel").unwrap().children.len(), 3);

        handle.update(|scene| {
            if let Some(panel) = scene.root.find_mut("result-panel") {
                panel.key = None;
            }
        });
        assert!(handle.snapshot_target("result-panel").is_none());
    }
}
