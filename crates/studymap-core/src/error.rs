use crate::diagram::NodeId;

pub type Result<T> = std::result::Result<T, Error>;

/// The byte source could not be turned into text or rows by the content extraction service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("content extraction failed ({kind}): {message}")]
pub struct ExtractionError {
    pub kind: String,
    pub message: String,
}

impl ExtractionError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// The text-generation backend failed. Retrying is the caller's decision.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("generation service unavailable: {0}")]
    Unavailable(String),

    #[error("generation timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("generation service returned an empty completion")]
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The model text did not contain a structure of the requested shape. `raw` is kept so the
    /// caller can fall back to showing plain text.
    #[error("malformed model output: {reason}")]
    MalformedOutput { raw: String, reason: String },

    #[error("invalid table: {message}")]
    InvalidTable { message: String },

    #[error("unknown diagram node: {0}")]
    UnknownNode(NodeId),

    #[error("content too short to process ({chars} chars, need at least {min})")]
    InsufficientContent { chars: usize, min: usize },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
