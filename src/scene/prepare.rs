//! Capture-only adjustments applied to a disposable copy of the target subtree.

use super::node::Node;

/// Target subtree ready for rasterization.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedTree {
    /// Copy of the target, positioned at the origin.
    pub root: Node,
    /// Natural scrollable width of the target in logical pixels.
    pub width: f64,
    /// Natural scrollable height of the target in logical pixels.
    pub height: f64,
    /// Number of subtrees removed because they are hidden during export.
    pub hidden: usize,
    /// Number of animated nodes frozen at their current frame.
    pub frozen: usize,
}

/// Produces the tree that gets rasterized from the live `target`.
///
/// The live node is only read: hidden subtrees are dropped from the copy and
/// animated nodes in the copy stop at their current frame. Rendering reads
/// only `Animation::progress`, so the frozen frame is the progress value the
/// snapshot was taken at; clearing `running` and the `animated` mark records
/// that the copy no longer advances. The returned size
/// is measured after removal, like the scroll size of a laid-out element whose
/// hidden children no longer take space.
pub fn prepare_for_capture(target: &Node) -> PreparedTree {
    let mut root = target.clone();
    root.bounds.x = 0.0;
    root.bounds.y = 0.0;

    let mut hidden = 0;
    let mut frozen = 0;
    strip(&mut root, &mut hidden, &mut frozen);

    let (width, height) = natural_size(&root);
    log::debug!(
        "Prepared capture tree: {:.0}x{:.0}, {} hidden, {} frozen",
        width,
        height,
        hidden,
        frozen
    );

    PreparedTree {
        root,
        width,
        height,
        hidden,
        frozen,
    }
}

fn strip(node: &mut Node, hidden: &mut usize, frozen: &mut usize) {
    if node.marks.animated {
        if let Some(animation) = node.animation.as_mut() {
            animation.running = false;
        }
        node.marks.animated = false;
        *frozen += 1;
    }

    let before = node.children.len();
    node.children.retain(|child| !child.hidden_in_export());
    *hidden += before - node.children.len();

    for child in &mut node.children {
        strip(child, hidden, frozen);
    }
}

/// Size of a node including everything its descendants paint to the right
/// of and below its origin.
pub fn natural_size(node: &Node) -> (f64, f64) {
    node.children
        .iter()
        .fold((node.bounds.width, node.bounds.height), |(w, h), child| {
            let (cw, ch) = natural_size(child);
            (w.max(child.bounds.x + cw), h.max(child.bounds.y + ch))
        })
}
