#![forbid(unsafe_code)]

//! Headless core for turning study material into study artifacts.
//!
//! - tables: grade-sheet classification and chart datasets
//! - generated text: structured-output recovery into flashcards or mindmap trees
//! - mindmaps: the canonical collapsible tree the layout engine consumes
//!
//! Async entry points return `Send` futures and need no particular executor, except that the
//! generation timeout in [`Pipeline`] uses tokio's timer.

pub mod chart;
pub mod classify;
pub mod config;
pub mod diagram;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod service;
pub mod table;

pub use chart::{ChartDataset, ChartSeries, ChartSeriesBuilder};
pub use classify::{Classification, ClassifyReason, TabularClassifier};
pub use config::StudyConfig;
pub use diagram::{DiagramBounds, DiagramModel, DiagramNode, NodeId, Outline};
pub use error::{Error, ExtractionError, GenerationError, Result};
pub use extract::{
    Extracted, ExtractionResult, Flashcard, FlashcardSet, ShapeTag, StructuredExtractor,
};
pub use pipeline::{Artifact, Pipeline, Task};
pub use service::{ContentExtractor, ContentKind, ContentSource, ExtractedContent, Generator};
pub use table::{Cell, Table};
