//! Decides whether a table holds scored/graded data worth charting.
//!
//! Two signals, checked in order:
//! 1. a column header containing one of the configured grade keywords;
//! 2. numeric density: some column whose sampled non-blank cells mostly parse as numbers.

use crate::StudyConfig;
use crate::table::Table;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClassifyReason {
    HeaderKeyword { column: String, keyword: String },
    NumericColumn { column: String },
    EmptyTable,
    TooFewRows { rows: usize, min_rows: usize },
    NoSignal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub is_graded: bool,
    pub reason: ClassifyReason,
}

#[derive(Debug, Clone)]
pub struct TabularClassifier {
    grade_keywords: Vec<String>,
    sample_rows: usize,
    numeric_threshold: f64,
    min_rows: usize,
}

impl Default for TabularClassifier {
    fn default() -> Self {
        Self::from_config(&StudyConfig::default())
    }
}

impl TabularClassifier {
    pub fn from_config(config: &StudyConfig) -> Self {
        Self {
            grade_keywords: config
                .get_str_list("classify.gradeKeywords")
                .into_iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            sample_rows: config.get_u64("classify.sampleRows").unwrap_or(30).max(1) as usize,
            numeric_threshold: config
                .get_f64("classify.numericThreshold")
                .unwrap_or(0.6)
                .clamp(0.0, 1.0),
            min_rows: config.get_u64("classify.minRows").unwrap_or(1).max(1) as usize,
        }
    }

    pub fn grade_keywords(&self) -> &[String] {
        &self.grade_keywords
    }

    pub fn classify(&self, table: &Table) -> Classification {
        let verdict = |is_graded, reason| Classification { is_graded, reason };

        if table.is_empty() {
            return verdict(false, ClassifyReason::EmptyTable);
        }
        if table.len() < self.min_rows {
            return verdict(
                false,
                ClassifyReason::TooFewRows {
                    rows: table.len(),
                    min_rows: self.min_rows,
                },
            );
        }

        for column in table.columns() {
            let lowered = column.to_lowercase();
            if let Some(keyword) = self
                .grade_keywords
                .iter()
                .find(|k| lowered.contains(k.as_str()))
            {
                tracing::debug!(column = %column, keyword = %keyword, "graded by header keyword");
                return verdict(
                    true,
                    ClassifyReason::HeaderKeyword {
                        column: column.clone(),
                        keyword: keyword.clone(),
                    },
                );
            }
        }

        if let Some(column) = table
            .columns()
            .iter()
            .find(|c| self.is_numeric_column(table, c))
        {
            tracing::debug!(column = %column, "graded by numeric density");
            return verdict(
                true,
                ClassifyReason::NumericColumn {
                    column: column.clone(),
                },
            );
        }

        tracing::debug!(columns = table.columns().len(), "table is not graded");
        verdict(false, ClassifyReason::NoSignal)
    }

    /// Numeric-density test over the first `classify.sampleRows` rows.
    ///
    /// A column with no non-blank sampled cells is not numeric.
    pub fn is_numeric_column(&self, table: &Table, column: &str) -> bool {
        let mut non_blank = 0usize;
        let mut numeric = 0usize;
        for cell in table.column_cells(column).take(self.sample_rows) {
            if cell.is_blank() {
                continue;
            }
            non_blank += 1;
            if cell.as_number().is_some() {
                numeric += 1;
            }
        }
        non_blank > 0 && (numeric as f64) >= self.numeric_threshold * (non_blank as f64)
    }

    pub fn numeric_columns<'a>(&self, table: &'a Table) -> Vec<&'a str> {
        table
            .columns()
            .iter()
            .filter(|c| self.is_numeric_column(table, c))
            .map(String::as_str)
            .collect()
    }
}
