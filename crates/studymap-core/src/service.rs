//! Seams to the external collaborators: content extraction and text generation.
//!
//! Both are plain traits returning `Send` futures so they can be driven by any executor. Real
//! implementations (OCR, document parsing, HTTP model clients) live outside this crate.

use crate::error::{ExtractionError, GenerationError};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    Text,
    Url,
    Pdf,
    Docx,
    Spreadsheet,
    Image,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Url => "url",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Spreadsheet => "spreadsheet",
            Self::Image => "image",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSource {
    pub kind: ContentKind,
    pub bytes: Vec<u8>,
    /// Original file name or URL, for diagnostics only.
    pub name: Option<String>,
}

impl ContentSource {
    pub fn new(kind: ContentKind, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            bytes: bytes.into(),
            name: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ContentKind::Text, text.into().into_bytes())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// What the content extraction service hands back: prose ready for prompting, or rows.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedContent {
    Text(String),
    Rows(Table),
}

pub trait ContentExtractor {
    fn extract(
        &self,
        source: &ContentSource,
    ) -> impl Future<Output = Result<ExtractedContent, ExtractionError>> + Send;
}

pub trait Generator {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

/// Extractor for inputs that need no document parsing: UTF-8 text, and spreadsheets already
/// exported as JSON rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainContentExtractor;

impl PlainContentExtractor {
    fn extract_sync(source: &ContentSource) -> Result<ExtractedContent, ExtractionError> {
        let kind = source.kind.as_str();
        match source.kind {
            ContentKind::Text => std::str::from_utf8(&source.bytes)
                .map(|s| ExtractedContent::Text(s.to_string()))
                .map_err(|e| ExtractionError::new(kind, e.to_string())),
            ContentKind::Spreadsheet => {
                let value: serde_json::Value = serde_json::from_slice(&source.bytes)
                    .map_err(|e| ExtractionError::new(kind, e.to_string()))?;
                Table::from_json(&value)
                    .map(ExtractedContent::Rows)
                    .map_err(|e| ExtractionError::new(kind, e.to_string()))
            }
            _ => Err(ExtractionError::new(
                kind,
                "no extractor configured for this content kind",
            )),
        }
    }
}

impl ContentExtractor for PlainContentExtractor {
    fn extract(
        &self,
        source: &ContentSource,
    ) -> impl Future<Output = Result<ExtractedContent, ExtractionError>> + Send {
        std::future::ready(Self::extract_sync(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn text_and_json_rows_are_extracted() {
        let text = block_on(PlainContentExtractor.extract(&ContentSource::text("hello")));
        assert_eq!(text.unwrap(), ExtractedContent::Text("hello".to_string()));

        let rows = ContentSource::new(ContentKind::Spreadsheet, r#"[{"name":"An","score":8}]"#);
        match block_on(PlainContentExtractor.extract(&rows)).unwrap() {
            ExtractedContent::Rows(t) => assert_eq!(t.len(), 1),
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_kinds_fail_with_their_kind() {
        let err = block_on(PlainContentExtractor.extract(&ContentSource::new(
            ContentKind::Pdf,
            b"%PDF-1.7".to_vec(),
        )))
        .unwrap_err();
        assert_eq!(err.kind, "pdf");
    }
}
