#![forbid(unsafe_code)]

//! `studymap` turns study material into study artifacts: bar charts for grade sheets,
//! flashcards and summaries from generated text, and collapsible mindmaps.
//!
//! The semantic core ([`studymap_core`]) is re-exported at the crate root.
//!
//! # Features
//!
//! - `render`: mindmap/chart layout and SVG output (`studymap::render`)
//! - `raster`: PNG/JPG/PDF export of rendered SVG via pure-Rust rasterization

pub use studymap_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use studymap_render::chart::ChartLayoutConfig;
    pub use studymap_render::layout::TreeLayoutConfig;
    pub use studymap_render::model::{ChartLayout, MindmapLayout};
    pub use studymap_render::svg::SvgRenderOptions;
    pub use studymap_render::text::{DeterministicTextMeasurer, TextMeasurer};
    pub use studymap_render::{LayoutOptions, MindmapSession};

    use studymap_core::{Artifact, ChartDataset, DiagramModel};

    #[cfg(feature = "raster")]
    pub mod raster;

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Core(#[from] studymap_core::Error),
        #[error(transparent)]
        Render(#[from] studymap_render::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Converts an arbitrary string into a conservative SVG `id` token, so several rendered
    /// artifacts can be inlined in one page without colliding.
    ///
    /// Unsupported characters become `-`, runs of `-` collapse, and ids that do not start with
    /// an ASCII letter get an `s-` prefix.
    pub fn sanitize_svg_id(raw: &str) -> String {
        let raw = raw.trim();
        let mut out = String::with_capacity(raw.len() + 2);
        for ch in raw.chars() {
            let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == ':' || ch == '.';
            out.push(if ok { ch } else { '-' });
        }
        while out.contains("--") {
            out = out.replace("--", "-");
        }
        let trimmed = out.trim_matches('-');
        if trimmed.is_empty() {
            return "s-untitled".to_string();
        }
        if trimmed.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            trimmed.to_string()
        } else {
            format!("s-{trimmed}")
        }
    }

    pub fn render_mindmap_svg(
        model: &DiagramModel,
        layout_options: &LayoutOptions,
        svg_options: &SvgRenderOptions,
    ) -> String {
        let layout = studymap_render::layout_mindmap(
            model,
            &layout_options.tree,
            layout_options.text_measurer.as_ref(),
        );
        studymap_render::render_mindmap_svg(&layout, layout_options.tree.font_size, svg_options)
    }

    pub fn render_chart_svg(
        dataset: &ChartDataset,
        layout_options: &LayoutOptions,
        svg_options: &SvgRenderOptions,
    ) -> Result<String> {
        let layout = studymap_render::layout_chart(
            dataset,
            &layout_options.chart,
            layout_options.text_measurer.as_ref(),
        )?;
        Ok(studymap_render::render_chart_svg(&layout, svg_options))
    }

    /// SVG for the artifacts that have a drawing (mindmaps and charts); `None` for text,
    /// flashcards and plain tables.
    pub fn render_artifact_svg(
        artifact: &Artifact,
        layout_options: &LayoutOptions,
        svg_options: &SvgRenderOptions,
    ) -> Result<Option<String>> {
        match artifact {
            Artifact::Mindmap(model) => Ok(Some(render_mindmap_svg(
                model,
                layout_options,
                svg_options,
            ))),
            Artifact::Chart(dataset) => {
                Ok(Some(render_chart_svg(dataset, layout_options, svg_options)?))
            }
            Artifact::Text(_) | Artifact::Flashcards(_) | Artifact::Table(_) => Ok(None),
        }
    }

    /// SVG of a live session's current collapsed state.
    pub fn render_session_svg(session: &MindmapSession, svg_options: &SvgRenderOptions) -> String {
        studymap_render::render_mindmap_svg(
            session.layout(),
            session.options().tree.font_size,
            svg_options,
        )
    }

}
