//! Collapse/expand handling for a live mindmap.
//!
//! A session owns one [`DiagramModel`] and the layout of its current collapsed state. Every
//! mutation takes `&mut self` and re-lays the tree out before returning, so two toggles on the
//! same model can never overlap.

use crate::LayoutOptions;
use crate::layout::layout_mindmap;
use crate::model::{LayoutNode, MindmapLayout};
use crate::Result;
use rustc_hash::FxHashMap;
use studymap_core::{DiagramModel, Error as CoreError, NodeId};

pub struct MindmapSession {
    model: DiagramModel,
    options: LayoutOptions,
    layout: MindmapLayout,
    by_id: FxHashMap<NodeId, usize>,
    revision: u64,
}

impl std::fmt::Debug for MindmapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MindmapSession")
            .field("root", &self.model.root().id)
            .field("visible", &self.layout.nodes.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl MindmapSession {
    pub fn new(model: DiagramModel, options: LayoutOptions) -> Self {
        let layout = layout_mindmap(&model, &options.tree, options.text_measurer.as_ref());
        let by_id = index(&layout);
        Self {
            model,
            options,
            layout,
            by_id,
            revision: 0,
        }
    }

    pub fn model(&self) -> &DiagramModel {
        &self.model
    }

    pub fn layout(&self) -> &MindmapLayout {
        &self.layout
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Bumped on every re-layout; unchanged by no-op interactions.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Flips a node between expanded and collapsed. Leaves have nothing to hide, so toggling one
    /// returns `Ok(false)` and keeps the current layout.
    pub fn toggle(&mut self, id: NodeId) -> Result<bool> {
        let node = self.model.find(id).ok_or(CoreError::UnknownNode(id))?;
        if !node.has_children() {
            tracing::debug!(%id, "toggle on a leaf ignored");
            return Ok(false);
        }
        let collapsed = self.model.toggle(id)?;
        self.relayout("toggle");
        Ok(collapsed)
    }

    pub fn collapse(&mut self, id: NodeId) -> Result<bool> {
        self.set_collapsed(id, true)
    }

    pub fn expand(&mut self, id: NodeId) -> Result<bool> {
        self.set_collapsed(id, false)
    }

    fn set_collapsed(&mut self, id: NodeId, collapsed: bool) -> Result<bool> {
        let node = self.model.find(id).ok_or(CoreError::UnknownNode(id))?;
        if collapsed && !node.has_children() {
            return Ok(false);
        }
        let changed = self.model.set_collapsed(id, collapsed)?;
        if changed {
            self.relayout(if collapsed { "collapse" } else { "expand" });
        }
        Ok(changed)
    }

    pub fn expand_all(&mut self) -> usize {
        let changed = self.model.expand_all();
        if changed > 0 {
            self.relayout("expand_all");
        }
        changed
    }

    /// Collapses every node at `depth` and expands everything above it.
    pub fn collapse_below(&mut self, depth: usize) -> usize {
        let changed = self.model.collapse_below(depth);
        if changed > 0 {
            self.relayout("collapse_below");
        }
        changed
    }

    /// Laid-out node under a canvas point, for hit testing clicks.
    pub fn node_at(&self, x: f64, y: f64) -> Option<&LayoutNode> {
        self.layout.node_at(x, y)
    }

    /// Current position of a visible node; `None` while an ancestor is collapsed.
    pub fn node_layout(&self, id: NodeId) -> Option<&LayoutNode> {
        self.by_id.get(&id).and_then(|i| self.layout.nodes.get(*i))
    }

    pub fn into_model(self) -> DiagramModel {
        self.model
    }

    fn relayout(&mut self, cause: &'static str) {
        self.layout = layout_mindmap(
            &self.model,
            &self.options.tree,
            self.options.text_measurer.as_ref(),
        );
        self.by_id = index(&self.layout);
        self.revision += 1;
        tracing::debug!(
            cause,
            revision = self.revision,
            visible = self.layout.nodes.len(),
            "mindmap re-laid out"
        );
    }
}

fn index(layout: &MindmapLayout) -> FxHashMap<NodeId, usize> {
    layout
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id, i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use studymap_core::{DiagramBounds, Outline};

    fn session() -> MindmapSession {
        let model = DiagramModel::from_outline(
            &Outline::with_children(
                "Cells",
                vec![
                    Outline::leaf("Nucleus"),
                    Outline::with_children("Membrane", vec![Outline::leaf("Lipids")]),
                ],
            ),
            DiagramBounds::default(),
        );
        MindmapSession::new(model, LayoutOptions::default())
    }

    #[test]
    fn collapse_then_expand_restores_layout() {
        let mut s = session();
        let before = s.layout().clone();
        let membrane: NodeId = "n2".parse().unwrap();

        assert!(s.toggle(membrane).unwrap());
        assert_eq!(s.layout().nodes.len(), 3);
        assert!(s.node_layout("n3".parse().unwrap()).is_none());

        assert!(!s.toggle(membrane).unwrap());
        assert_eq!(s.layout(), &before);
        assert_eq!(s.revision(), 2);
    }

    #[test]
    fn leaf_toggle_keeps_cached_layout() {
        let mut s = session();
        assert!(!s.toggle("n1".parse().unwrap()).unwrap());
        assert_eq!(s.revision(), 0);
        assert!(!s.model().is_collapsed("n1".parse().unwrap()).unwrap());
    }

    #[test]
    fn unknown_node_is_an_error() {
        let mut s = session();
        let err = s.toggle("n99".parse().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Core(CoreError::UnknownNode(_))
        ));
    }

    #[test]
    fn repeated_collapse_is_a_no_op() {
        let mut s = session();
        let membrane: NodeId = "n2".parse().unwrap();
        assert!(s.collapse(membrane).unwrap());
        assert!(!s.collapse(membrane).unwrap());
        assert_eq!(s.revision(), 1);
        assert!(s.expand(membrane).unwrap());
        assert_eq!(s.revision(), 2);
    }

    #[test]
    fn collapse_below_hides_grandchildren() {
        let mut s = session();
        assert_eq!(s.collapse_below(1), 1);
        assert_eq!(s.layout().nodes.len(), 3);
        assert_eq!(s.expand_all(), 1);
        assert_eq!(s.layout().nodes.len(), 4);
    }

    #[test]
    fn hit_testing_finds_the_node_box() {
        let s = session();
        let root = s.layout().nodes[0].clone();
        let hit = s.node_at(root.x, root.y).unwrap();
        assert_eq!(hit.id, root.id);
        assert!(s.node_at(-100.0, -100.0).is_none());
    }
}
