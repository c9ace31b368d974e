use serde::{Deserialize, Serialize};
use studymap_core::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let mut b = Self {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in it {
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
        Some(b)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPoint {
    pub x: f64,
    pub y: f64,
}

/// A positioned mindmap node. `x`/`y` is the box center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: NodeId,
    pub label: String,
    /// The label after wrapping to `maxNodeWidth`.
    pub lines: Vec<String>,
    pub depth: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub collapsed: bool,
    /// Children not drawn because this node is collapsed.
    pub hidden_children: usize,
}

impl LayoutNode {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.x - self.width / 2.0,
            min_y: self.y - self.height / 2.0,
            max_x: self.x + self.width / 2.0,
            max_y: self.y + self.height / 2.0,
        }
    }
}

/// Cubic parent→child curve from the parent's right anchor to the child's left anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub start: LayoutPoint,
    pub control1: LayoutPoint,
    pub control2: LayoutPoint,
    pub end: LayoutPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindmapLayout {
    /// Visible nodes in preorder.
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    pub bounds: Option<Bounds>,
    /// Canvas size including margins.
    pub width: f64,
    pub height: f64,
}

impl MindmapLayout {
    pub fn node(&self, id: NodeId) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Topmost node whose box contains the point.
    pub fn node_at(&self, x: f64, y: f64) -> Option<&LayoutNode> {
        self.nodes.iter().rev().find(|n| n.bounds().contains(x, y))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBar {
    pub category: usize,
    pub series: usize,
    pub value: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTick {
    pub value: f64,
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartCategory {
    pub label: String,
    /// Band center.
    pub x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLegendItem {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub plot: Bounds,
    /// Y of the value-zero baseline.
    pub baseline_y: f64,
    pub font_size: f64,
    pub categories: Vec<ChartCategory>,
    pub ticks: Vec<ChartTick>,
    /// Bars for numeric cells only; missing values leave a gap in their band.
    pub bars: Vec<ChartBar>,
    pub legend: Vec<ChartLegendItem>,
}
