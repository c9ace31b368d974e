//! Canonical mindmap tree.
//!
//! The tree shape is fixed once built; the only mutation is flipping a node's `collapsed` flag.
//! Collapsed nodes keep their children in place, so expanding again restores the exact same
//! subtree with the same ids.

use crate::{Error, Result, StudyConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = Error;

    /// Accepts both the display form (`n12`) and the bare index (`12`).
    fn from_str(s: &str) -> Result<Self> {
        let t = s.trim();
        let digits = t.strip_prefix('n').unwrap_or(t);
        digits
            .parse::<u32>()
            .map(NodeId)
            .map_err(|_| Error::Config {
                message: format!("not a node id: {s:?}"),
            })
    }
}

/// An id-less label tree: the shape the structured-output extractor recovers before ids and
/// bounds are applied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Outline {
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Outline>,
}

impl Outline {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(label: impl Into<String>, children: Vec<Outline>) -> Self {
        Self {
            label: label.into(),
            children,
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Outline::node_count).sum::<usize>()
    }

    /// Canonical JSON: `{"title", "nodes": [{"label", "children"}]}`.
    pub fn to_json(&self) -> Value {
        fn node(o: &Outline) -> Value {
            let mut map = Map::new();
            map.insert("label".to_string(), json!(o.label));
            if !o.children.is_empty() {
                map.insert(
                    "children".to_string(),
                    Value::Array(o.children.iter().map(node).collect()),
                );
            }
            Value::Object(map)
        }
        json!({
            "title": self.label,
            "nodes": self.children.iter().map(node).collect::<Vec<_>>(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramNode {
    pub id: NodeId,
    pub label: String,
    pub children: Vec<DiagramNode>,
    pub collapsed: bool,
}

impl DiagramNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Children that take part in layout: none while collapsed.
    pub fn visible_children(&self) -> &[DiagramNode] {
        if self.collapsed { &[] } else { &self.children }
    }

    fn find(&self, id: NodeId) -> Option<&DiagramNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    fn find_mut(&mut self, id: NodeId) -> Option<&mut DiagramNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    fn to_outline(&self) -> Outline {
        Outline {
            label: self.label.clone(),
            children: self.children.iter().map(DiagramNode::to_outline).collect(),
        }
    }
}

/// Defensive caps applied while building a model from untrusted structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagramBounds {
    /// Deepest kept level; the root is depth 0.
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for DiagramBounds {
    fn default() -> Self {
        Self {
            max_depth: 12,
            max_nodes: 2000,
        }
    }
}

impl DiagramBounds {
    pub fn from_config(config: &StudyConfig) -> Self {
        let d = Self::default();
        Self {
            max_depth: config
                .get_u64("diagram.maxDepth")
                .map_or(d.max_depth, |v| v as usize),
            max_nodes: config
                .get_u64("diagram.maxNodes")
                .map_or(d.max_nodes, |v| v as usize)
                .max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramModel {
    root: DiagramNode,
    node_count: usize,
    truncated: bool,
}

impl DiagramModel {
    /// Builds a model, assigning ids in preorder.
    ///
    /// When the outline exceeds `bounds`, whole upper levels are kept before deeper ones: levels
    /// past `max_depth` are dropped, and the node budget is spent level by level, left to right.
    /// The result is then marked truncated.
    pub fn from_outline(outline: &Outline, bounds: DiagramBounds) -> Self {
        let mut level_sizes: Vec<usize> = Vec::new();
        count_levels(outline, 0, &mut level_sizes);
        let total: usize = level_sizes.iter().sum();

        let mut remaining = bounds.max_nodes.max(1);
        let mut quota: Vec<usize> = Vec::with_capacity(level_sizes.len());
        for (depth, size) in level_sizes.iter().enumerate() {
            if depth > bounds.max_depth {
                break;
            }
            let q = (*size).min(remaining);
            quota.push(q);
            remaining -= q;
        }
        let kept: usize = quota.iter().sum();

        let mut next_id = 0u32;
        // The root always fits: max_nodes >= 1 and depth 0 is always within bounds.
        let root = build_node(outline, 0, &mut quota, &mut next_id).unwrap_or(DiagramNode {
            id: NodeId(0),
            label: outline.label.clone(),
            children: Vec::new(),
            collapsed: false,
        });

        let truncated = kept < total;
        if truncated {
            tracing::warn!(
                total,
                kept,
                max_depth = bounds.max_depth,
                max_nodes = bounds.max_nodes,
                "diagram truncated to bounds"
            );
        }

        Self {
            root,
            node_count: kept.max(1),
            truncated,
        }
    }

    pub fn root(&self) -> &DiagramNode {
        &self.root
    }

    pub fn title(&self) -> &str {
        &self.root.label
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// True when building hit the depth or node cap.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn find(&self, id: NodeId) -> Option<&DiagramNode> {
        self.root.find(id)
    }

    pub fn is_collapsed(&self, id: NodeId) -> Result<bool> {
        self.find(id)
            .map(|n| n.collapsed)
            .ok_or(Error::UnknownNode(id))
    }

    /// Sets the collapsed flag. Returns whether the flag actually changed.
    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) -> Result<bool> {
        let node = self.root.find_mut(id).ok_or(Error::UnknownNode(id))?;
        let changed = node.collapsed != collapsed;
        node.collapsed = collapsed;
        Ok(changed)
    }

    /// Flips the collapsed flag and returns the new value.
    pub fn toggle(&mut self, id: NodeId) -> Result<bool> {
        let node = self.root.find_mut(id).ok_or(Error::UnknownNode(id))?;
        node.collapsed = !node.collapsed;
        Ok(node.collapsed)
    }

    pub fn expand_all(&mut self) -> usize {
        fn walk(n: &mut DiagramNode, changed: &mut usize) {
            if n.collapsed {
                n.collapsed = false;
                *changed += 1;
            }
            for c in &mut n.children {
                walk(c, changed);
            }
        }
        let mut changed = 0;
        walk(&mut self.root, &mut changed);
        changed
    }

    /// Collapses every node with children at exactly `depth`, expanding everything above it.
    pub fn collapse_below(&mut self, depth: usize) -> usize {
        fn walk(n: &mut DiagramNode, d: usize, target: usize, changed: &mut usize) {
            let want = d == target && n.has_children();
            if n.collapsed != want && (want || d < target) {
                n.collapsed = want;
                *changed += 1;
            }
            if d < target {
                for c in &mut n.children {
                    walk(c, d + 1, target, changed);
                }
            }
        }
        let mut changed = 0;
        walk(&mut self.root, 0, depth, &mut changed);
        changed
    }

    pub fn visible_count(&self) -> usize {
        let mut count = 0;
        self.walk_visible(|_, _, _| count += 1);
        count
    }

    /// Preorder walk over visible nodes: `(node, depth, parent)`.
    pub fn walk_visible<'a>(&'a self, mut f: impl FnMut(&'a DiagramNode, usize, Option<NodeId>)) {
        fn walk<'a>(
            n: &'a DiagramNode,
            depth: usize,
            parent: Option<NodeId>,
            f: &mut impl FnMut(&'a DiagramNode, usize, Option<NodeId>),
        ) {
            f(n, depth, parent);
            for c in n.visible_children() {
                walk(c, depth + 1, Some(n.id), f);
            }
        }
        walk(&self.root, 0, None, &mut f);
    }

    /// The full tree (collapsed subtrees included) without ids.
    pub fn to_outline(&self) -> Outline {
        self.root.to_outline()
    }

    pub fn to_json(&self) -> Value {
        self.to_outline().to_json()
    }
}

fn count_levels(o: &Outline, depth: usize, sizes: &mut Vec<usize>) {
    if sizes.len() <= depth {
        sizes.push(0);
    }
    sizes[depth] += 1;
    for c in &o.children {
        count_levels(c, depth + 1, sizes);
    }
}

fn build_node(
    o: &Outline,
    depth: usize,
    quota: &mut [usize],
    next_id: &mut u32,
) -> Option<DiagramNode> {
    let slot = quota.get_mut(depth)?;
    if *slot == 0 {
        return None;
    }
    *slot -= 1;

    let id = NodeId(*next_id);
    *next_id += 1;
    let children = o
        .children
        .iter()
        .filter_map(|c| build_node(c, depth + 1, quota, next_id))
        .collect();
    Some(DiagramNode {
        id,
        label: o.label.clone(),
        children,
        collapsed: false,
    })
}
