//! Structured-output recovery for free-form generation text.
//!
//! Generated text carries no structural guarantee: JSON may be wrapped in prose or markdown
//! fences, followed by commentary, cut off, or written with JSON5-isms. Extraction either
//! recovers a value of the requested shape or reports [`ExtractionResult::Malformed`] with the
//! raw text attached; it never substitutes defaults.

mod scan;
mod shape;

#[cfg(test)]
mod tests;

pub use scan::RecoveryPath;

use crate::diagram::{DiagramBounds, DiagramModel};
use crate::{Error, Result, StudyConfig};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const NO_VALID_JSON: &str = "no valid json found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeTag {
    FlatText,
    PairArray,
    DiagramTree,
}

impl FromStr for ShapeTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "flat" | "flattext" => Ok(Self::FlatText),
            "pairs" | "pairarray" | "flashcards" | "qa" => Ok(Self::PairArray),
            "tree" | "diagramtree" | "mindmap" | "diagram" => Ok(Self::DiagramTree),
            other => Err(Error::Config {
                message: format!("unknown output shape: {other:?}"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult<T> {
    Ok(T),
    Malformed { raw: String, reason: String },
}

impl<T> ExtractionResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(v) => Some(v),
            Self::Malformed { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractionResult<U> {
        match self {
            Self::Ok(v) => ExtractionResult::Ok(f(v)),
            Self::Malformed { raw, reason } => ExtractionResult::Malformed { raw, reason },
        }
    }

    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Ok(v) => Ok(v),
            Self::Malformed { raw, reason } => Err(Error::MalformedOutput { raw, reason }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub q: String,
    pub a: String,
}

impl Flashcard {
    pub fn new(q: impl Into<String>, a: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            a: a.into(),
        }
    }
}

/// Recovered cards plus the number of array elements discarded for lacking a question or an
/// answer. An empty `cards` with `dropped == 0` is a valid empty batch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FlashcardSet {
    pub cards: Vec<Flashcard>,
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Text(String),
    Flashcards(FlashcardSet),
    Diagram(DiagramModel),
}

#[derive(Debug, Clone)]
pub struct StructuredExtractor {
    max_raw_bytes: usize,
    lenient: bool,
    bounds: DiagramBounds,
    default_title: String,
}

impl Default for StructuredExtractor {
    fn default() -> Self {
        Self::from_config(&StudyConfig::default())
    }
}

impl StructuredExtractor {
    pub fn from_config(config: &StudyConfig) -> Self {
        Self {
            max_raw_bytes: config
                .get_u64("extract.maxRawBytes")
                .map_or(262_144, |v| v as usize),
            lenient: config.get_bool("extract.lenient").unwrap_or(true),
            bounds: DiagramBounds::from_config(config),
            default_title: config
                .get_str("diagram.defaultTitle")
                .filter(|t| !t.trim().is_empty())
                .unwrap_or("Mindmap")
                .to_string(),
        }
    }

    pub fn extract(&self, raw: &str, shape: ShapeTag) -> ExtractionResult<Extracted> {
        match shape {
            ShapeTag::FlatText => self.extract_text(raw).map(Extracted::Text),
            ShapeTag::PairArray => self.extract_flashcards(raw).map(Extracted::Flashcards),
            ShapeTag::DiagramTree => self.extract_diagram(raw).map(Extracted::Diagram),
        }
    }

    /// Always succeeds.
    pub fn extract_text(&self, raw: &str) -> ExtractionResult<String> {
        ExtractionResult::Ok(raw.trim().to_string())
    }

    pub fn extract_flashcards(&self, raw: &str) -> ExtractionResult<FlashcardSet> {
        let opts = scan::ScanOptions {
            opener: '[',
            lenient: self.lenient,
            repair_arrays: true,
        };
        match scan::recover(self.clip(raw), opts, |v| shape::flashcards(&v)) {
            Some((set, path)) => {
                tracing::debug!(
                    ?path,
                    cards = set.cards.len(),
                    dropped = set.dropped,
                    "flashcards recovered"
                );
                ExtractionResult::Ok(set)
            }
            None => malformed(raw, ShapeTag::PairArray),
        }
    }

    pub fn extract_diagram(&self, raw: &str) -> ExtractionResult<DiagramModel> {
        let opts = scan::ScanOptions {
            opener: '{',
            lenient: self.lenient,
            repair_arrays: false,
        };
        let found = scan::recover(self.clip(raw), opts, |v| {
            shape::outline(&v, &self.default_title)
        });
        match found {
            Some((outline, path)) => {
                let model = DiagramModel::from_outline(&outline, self.bounds);
                tracing::debug!(
                    ?path,
                    nodes = model.node_count(),
                    truncated = model.truncated(),
                    "diagram tree recovered"
                );
                ExtractionResult::Ok(model)
            }
            None => malformed(raw, ShapeTag::DiagramTree),
        }
    }

    fn clip<'a>(&self, raw: &'a str) -> &'a str {
        let clipped = scan::clip(raw, self.max_raw_bytes);
        if clipped.len() < raw.len() {
            tracing::warn!(
                len = raw.len(),
                max = self.max_raw_bytes,
                "raw model output clipped before recovery"
            );
        }
        clipped
    }
}

fn malformed<T>(raw: &str, shape: ShapeTag) -> ExtractionResult<T> {
    tracing::warn!(?shape, len = raw.len(), "no valid json found in model output");
    ExtractionResult::Malformed {
        raw: raw.to_string(),
        reason: NO_VALID_JSON.to_string(),
    }
}
