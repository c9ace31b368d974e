//! Left-to-right tidy-tree layout for mindmaps.
//!
//! Visible leaves take consecutive vertical slots in depth-first order; the pitch between two
//! leaves is the sibling spacing when they share a parent and the (larger) cousin spacing
//! otherwise. A parent sits at the midpoint of its first and last visible child, and x grows by
//! a fixed step per depth. Collapsed nodes are laid out as leaves.
//!
//! The result is a pure function of the tree and its collapsed flags, so toggling a node and
//! toggling it back reproduces the previous layout exactly.

use crate::model::{Bounds, LayoutEdge, LayoutNode, LayoutPoint, MindmapLayout};
use crate::text::{TextMeasurer, TextStyle, wrap_lines};
use studymap_core::{DiagramModel, DiagramNode, NodeId, StudyConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct TreeLayoutConfig {
    /// Horizontal distance between node centers of adjacent depths.
    pub level_spacing: f64,
    /// Center-to-center pitch between single-line leaves sharing a parent.
    pub sibling_spacing: f64,
    /// Pitch between adjacent leaves with different parents.
    pub cousin_spacing: f64,
    pub margin: f64,
    /// Vertical fit target; `None` leaves the height unbounded.
    pub canvas_height: Option<f64>,
    pub max_node_width: f64,
    pub font_size: f64,
    pub node_padding: f64,
}

impl Default for TreeLayoutConfig {
    fn default() -> Self {
        Self {
            level_spacing: 260.0,
            sibling_spacing: 44.0,
            cousin_spacing: 68.0,
            margin: 20.0,
            canvas_height: None,
            max_node_width: 200.0,
            font_size: 14.0,
            node_padding: 10.0,
        }
    }
}

impl TreeLayoutConfig {
    pub fn from_config(config: &StudyConfig) -> Self {
        let d = Self::default();
        let get = |key: &str, default: f64| {
            config
                .get_f64(key)
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(default)
        };
        Self {
            level_spacing: get("layout.levelSpacing", d.level_spacing),
            sibling_spacing: get("layout.siblingSpacing", d.sibling_spacing),
            cousin_spacing: get("layout.cousinSpacing", d.cousin_spacing),
            margin: get("layout.margin", d.margin),
            canvas_height: config
                .get_f64("layout.canvasHeight")
                .filter(|h| h.is_finite() && *h > 0.0),
            max_node_width: get("layout.maxNodeWidth", d.max_node_width).max(1.0),
            font_size: get("layout.fontSize", d.font_size).max(1.0),
            node_padding: get("layout.nodePadding", d.node_padding),
        }
    }

    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            font_size: self.font_size,
            ..TextStyle::default()
        }
    }
}

struct LeafCursor {
    parent: Option<NodeId>,
    y: f64,
    height: f64,
}

struct TreePlacer<'a> {
    config: &'a TreeLayoutConfig,
    measurer: &'a dyn TextMeasurer,
    style: TextStyle,
    base_height: f64,
    nodes: Vec<LayoutNode>,
    parents: Vec<Option<usize>>,
    last_leaf: Option<LeafCursor>,
}

impl<'a> TreePlacer<'a> {
    fn new(config: &'a TreeLayoutConfig, measurer: &'a dyn TextMeasurer) -> Self {
        let style = config.text_style();
        let base_height = measurer.line_height(&style) + 2.0 * config.node_padding;
        Self {
            config,
            measurer,
            style,
            base_height,
            nodes: Vec::new(),
            parents: Vec::new(),
            last_leaf: None,
        }
    }

    fn sized_node(&self, node: &DiagramNode, depth: usize) -> LayoutNode {
        let lines = wrap_lines(
            &node.label,
            &self.style,
            self.config.max_node_width,
            self.measurer,
        );
        let text_width = lines
            .iter()
            .map(|l| self.measurer.measure(l, &self.style).width)
            .fold(0.0, f64::max);
        let line_height = self.measurer.line_height(&self.style);
        let pad = self.config.node_padding;
        LayoutNode {
            id: node.id,
            label: node.label.clone(),
            depth,
            x: depth as f64 * self.config.level_spacing,
            y: 0.0,
            width: (text_width + 2.0 * pad).max(self.config.font_size + 2.0 * pad),
            height: lines.len().max(1) as f64 * line_height + 2.0 * pad,
            lines,
            collapsed: node.collapsed,
            hidden_children: if node.collapsed {
                node.children.len()
            } else {
                0
            },
        }
    }

    /// Places `node` and its visible subtree; returns the node's y.
    fn place(&mut self, node: &DiagramNode, depth: usize, parent: Option<usize>) -> f64 {
        let idx = self.nodes.len();
        let sized = self.sized_node(node, depth);
        self.nodes.push(sized);
        self.parents.push(parent);

        let visible = node.visible_children();
        let y = if visible.is_empty() {
            self.next_leaf_y(parent.map(|p| self.nodes[p].id), self.nodes[idx].height)
        } else {
            let mut first: Option<f64> = None;
            let mut last = 0.0;
            for child in visible {
                let cy = self.place(child, depth + 1, Some(idx));
                first.get_or_insert(cy);
                last = cy;
            }
            (first.unwrap_or(last) + last) / 2.0
        };
        self.nodes[idx].y = y;
        y
    }

    fn next_leaf_y(&mut self, parent: Option<NodeId>, height: f64) -> f64 {
        let y = match &self.last_leaf {
            None => 0.0,
            Some(prev) => {
                let spacing = if prev.parent == parent {
                    self.config.sibling_spacing
                } else {
                    self.config.cousin_spacing
                };
                let extra = ((prev.height + height) / 2.0 - self.base_height).max(0.0);
                prev.y + spacing + extra
            }
        };
        self.last_leaf = Some(LeafCursor { parent, y, height });
        y
    }
}

fn shift_to_margin(nodes: &mut [LayoutNode], margin: f64) {
    let Some(b) = content_bounds(nodes) else {
        return;
    };
    let dx = margin - b.min_x;
    let dy = margin - b.min_y;
    for n in nodes.iter_mut() {
        n.x += dx;
        n.y += dy;
    }
}

fn content_bounds(nodes: &[LayoutNode]) -> Option<Bounds> {
    Bounds::from_points(nodes.iter().flat_map(|n| {
        let b = n.bounds();
        [(b.min_x, b.min_y), (b.max_x, b.max_y)]
    }))
}

/// Compresses vertical spread so the content fits `canvas_height`. Never stretches, never
/// reorders.
fn fit_height(nodes: &mut [LayoutNode], canvas_height: f64, margin: f64) {
    let Some(b) = content_bounds(nodes) else {
        return;
    };
    let available = canvas_height - 2.0 * margin;
    if b.height() <= available {
        return;
    }
    let min_cy = nodes.iter().map(|n| n.y).fold(f64::INFINITY, f64::min);
    let max_cy = nodes.iter().map(|n| n.y).fold(f64::NEG_INFINITY, f64::max);
    let tallest = nodes.iter().map(|n| n.height).fold(0.0, f64::max);
    let spread = max_cy - min_cy;
    if spread <= 0.0 {
        return;
    }
    let factor = ((available - tallest).max(0.0) / spread).min(1.0);
    tracing::debug!(factor, canvas_height, "compressing mindmap to canvas height");
    for n in nodes.iter_mut() {
        n.y = min_cy + (n.y - min_cy) * factor;
    }
    shift_to_margin(nodes, margin);
}

fn edge_between(parent: &LayoutNode, child: &LayoutNode) -> LayoutEdge {
    let start = LayoutPoint {
        x: parent.x + parent.width / 2.0,
        y: parent.y,
    };
    let end = LayoutPoint {
        x: child.x - child.width / 2.0,
        y: child.y,
    };
    let mid_x = (start.x + end.x) / 2.0;
    LayoutEdge {
        from: parent.id,
        to: child.id,
        start,
        control1: LayoutPoint {
            x: mid_x,
            y: start.y,
        },
        control2: LayoutPoint { x: mid_x, y: end.y },
        end,
    }
}

pub fn layout_mindmap(
    model: &DiagramModel,
    config: &TreeLayoutConfig,
    measurer: &dyn TextMeasurer,
) -> MindmapLayout {
    let mut placer = TreePlacer::new(config, measurer);
    placer.place(model.root(), 0, None);
    let TreePlacer {
        mut nodes, parents, ..
    } = placer;

    shift_to_margin(&mut nodes, config.margin);
    if let Some(h) = config.canvas_height {
        fit_height(&mut nodes, h, config.margin);
    }

    let edges = parents
        .iter()
        .enumerate()
        .filter_map(|(child, parent)| parent.map(|p| edge_between(&nodes[p], &nodes[child])))
        .collect::<Vec<_>>();

    let bounds = content_bounds(&nodes);
    let (width, height) = bounds.map_or((2.0 * config.margin, 2.0 * config.margin), |b| {
        (b.max_x + config.margin, b.max_y + config.margin)
    });

    tracing::debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        width,
        height,
        "mindmap laid out"
    );

    MindmapLayout {
        nodes,
        edges,
        bounds,
        width,
        height,
    }
}
