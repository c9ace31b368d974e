#![forbid(unsafe_code)]

//! Layout and SVG emission for studymap artifacts: a left-to-right tidy tree for mindmaps and a
//! grouped bar chart for graded tables. Everything is headless and deterministic with the
//! default [`DeterministicTextMeasurer`].

pub mod chart;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod svg;
pub mod text;

use crate::chart::ChartLayoutConfig;
use crate::layout::TreeLayoutConfig;
use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use std::sync::Arc;
use studymap_core::StudyConfig;

pub use chart::{layout_chart, nice_ticks};
pub use interaction::MindmapSession;
pub use layout::layout_mindmap;
pub use model::{ChartLayout, MindmapLayout};
pub use svg::{SvgRenderOptions, render_chart_svg, render_mindmap_svg};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] studymap_core::Error),
    #[error("invalid layout model: {message}")]
    InvalidModel { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct LayoutOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
    pub tree: TreeLayoutConfig,
    pub chart: ChartLayoutConfig,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
            tree: TreeLayoutConfig::default(),
            chart: ChartLayoutConfig::default(),
        }
    }
}

impl LayoutOptions {
    pub fn from_config(config: &StudyConfig) -> Self {
        Self {
            tree: TreeLayoutConfig::from_config(config),
            chart: ChartLayoutConfig::from_config(config),
            ..Self::default()
        }
    }

    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer + Send + Sync>) -> Self {
        self.text_measurer = measurer;
        self
    }
}
