//! One content-processing request, end to end.
//!
//! Tables always take the chart route. Text is bounded, turned into a prompt, sent to the
//! generator under a timeout, and the completion is handed to the structured-output extractor.
//! Nothing is retried here; a failed request is the caller's to repeat.

use crate::chart::{ChartDataset, ChartSeriesBuilder};
use crate::classify::TabularClassifier;
use crate::diagram::DiagramModel;
use crate::error::GenerationError;
use crate::extract::{Extracted, FlashcardSet, ShapeTag, StructuredExtractor};
use crate::service::{ContentExtractor, ContentSource, ExtractedContent, Generator};
use crate::table::Table;
use crate::{Error, Result, StudyConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Task {
    Summary,
    Flashcards,
    Qa,
    Mindmap,
}

impl Task {
    pub fn shape(self) -> ShapeTag {
        match self {
            Self::Summary => ShapeTag::FlatText,
            Self::Flashcards | Self::Qa => ShapeTag::PairArray,
            Self::Mindmap => ShapeTag::DiagramTree,
        }
    }

    fn prompt_key(self) -> &'static str {
        match self {
            Self::Summary => "prompts.summary",
            Self::Flashcards => "prompts.flashcards",
            Self::Qa => "prompts.qa",
            Self::Mindmap => "prompts.mindmap",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Text(String),
    Flashcards(FlashcardSet),
    Mindmap(DiagramModel),
    Chart(ChartDataset),
    /// An ungraded table, passed through for generic display.
    Table(Table),
}

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    config: StudyConfig,
}

impl PromptTemplates {
    pub fn from_config(config: &StudyConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Fills `{content}`; a template without the placeholder gets the content appended.
    pub fn render(&self, task: Task, content: &str) -> String {
        let template = self.config.get_str(task.prompt_key()).unwrap_or("{content}");
        if template.contains("{content}") {
            template.replace("{content}", content)
        } else {
            format!("{template}\n\n{content}")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentBounds {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl ContentBounds {
    pub fn from_config(config: &StudyConfig) -> Self {
        let min_chars = config.get_u64("content.minChars").unwrap_or(50) as usize;
        let max_chars = config.get_u64("content.maxChars").unwrap_or(20_000) as usize;
        Self {
            min_chars,
            max_chars: max_chars.max(min_chars),
        }
    }

    /// Trims, rejects text that is too short and cuts text that is too long.
    pub fn apply<'a>(&self, text: &'a str) -> Result<&'a str> {
        let trimmed = text.trim();
        let chars = trimmed.chars().count();
        if chars < self.min_chars {
            return Err(Error::InsufficientContent {
                chars,
                min: self.min_chars,
            });
        }
        if chars <= self.max_chars {
            return Ok(trimmed);
        }
        let end = trimmed
            .char_indices()
            .nth(self.max_chars)
            .map_or(trimmed.len(), |(i, _)| i);
        tracing::debug!(chars, max = self.max_chars, "content cut to max chars");
        Ok(&trimmed[..end])
    }
}

pub struct Pipeline<E, G> {
    extractor: E,
    generator: G,
    classifier: TabularClassifier,
    charts: ChartSeriesBuilder,
    structured: StructuredExtractor,
    prompts: PromptTemplates,
    bounds: ContentBounds,
    timeout: Duration,
}

impl<E, G> Pipeline<E, G>
where
    E: ContentExtractor + Sync,
    G: Generator + Sync,
{
    pub fn new(config: &StudyConfig, extractor: E, generator: G) -> Self {
        Self {
            extractor,
            generator,
            classifier: TabularClassifier::from_config(config),
            charts: ChartSeriesBuilder::from_config(config),
            structured: StructuredExtractor::from_config(config),
            prompts: PromptTemplates::from_config(config),
            bounds: ContentBounds::from_config(config),
            timeout: Duration::from_millis(
                config.get_u64("generation.timeoutMs").unwrap_or(60_000),
            ),
        }
    }

    pub async fn process(&self, source: &ContentSource, task: Task) -> Result<Artifact> {
        match self.extractor.extract(source).await? {
            ExtractedContent::Rows(table) => self.chart_route(table),
            ExtractedContent::Text(text) => self.generate_artifact(&text, task).await,
        }
    }

    /// Graded tables become charts; everything else passes through unchanged.
    pub fn chart_route(&self, table: Table) -> Result<Artifact> {
        let verdict = self.classifier.classify(&table);
        tracing::info!(
            graded = verdict.is_graded,
            reason = ?verdict.reason,
            rows = table.len(),
            "table classified"
        );
        if verdict.is_graded {
            Ok(Artifact::Chart(self.charts.build(&table)?))
        } else {
            Ok(Artifact::Table(table))
        }
    }

    pub async fn generate_artifact(&self, text: &str, task: Task) -> Result<Artifact> {
        let content = self.bounds.apply(text)?;
        let prompt = self.prompts.render(task, content);
        let raw = self.generate(&prompt).await?;

        let artifact = match self.structured.extract(&raw, task.shape()).into_result()? {
            Extracted::Text(text) => Artifact::Text(text),
            Extracted::Flashcards(set) => Artifact::Flashcards(set),
            Extracted::Diagram(model) => Artifact::Mindmap(model),
        };
        Ok(artifact)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let after_ms = self.timeout.as_millis() as u64;
        let raw = match tokio::time::timeout(self.timeout, self.generator.generate(prompt)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(after_ms, "generation timed out");
                return Err(GenerationError::Timeout { after_ms }.into());
            }
        };
        if raw.trim().is_empty() {
            return Err(GenerationError::Empty.into());
        }
        tracing::debug!(len = raw.len(), "generation completed");
        Ok(raw)
    }
}
