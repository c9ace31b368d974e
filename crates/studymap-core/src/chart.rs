use crate::classify::TabularClassifier;
use crate::table::Table;
use crate::{Error, Result, StudyConfig};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    /// `None` marks a missing or non-numeric cell; renderers show it as a gap.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartDataset {
    /// Every series has exactly one value per label.
    pub fn is_consistent(&self) -> bool {
        self.series
            .iter()
            .all(|s| s.values.len() == self.labels.len())
    }

    /// The `{labels, datasets: [{label, data}]}` payload consumed by Chart.js-style bar charts.
    pub fn to_chartjs(&self) -> Value {
        json!({
            "labels": self.labels,
            "datasets": self
                .series
                .iter()
                .map(|s| json!({ "label": s.name, "data": s.values }))
                .collect::<Vec<_>>(),
        })
    }
}

/// Which columns the builder picked, for logging and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnChoice {
    pub label_column: String,
    pub value_column: String,
}

#[derive(Debug, Clone)]
pub struct ChartSeriesBuilder {
    classifier: TabularClassifier,
    label_pattern: Option<Regex>,
}

impl Default for ChartSeriesBuilder {
    fn default() -> Self {
        Self::from_config(&StudyConfig::default())
    }
}

impl ChartSeriesBuilder {
    pub fn from_config(config: &StudyConfig) -> Self {
        Self {
            classifier: TabularClassifier::from_config(config),
            label_pattern: label_pattern(&config.get_str_list("chart.labelKeywords")),
        }
    }

    /// Picks the label and value columns.
    ///
    /// Label: first identity-like header, else the first column. Value: first numeric column
    /// other than the label, else the first non-label column by position.
    pub fn choose_columns(&self, table: &Table) -> Result<ColumnChoice> {
        let columns = table.columns();
        if columns.len() < 2 {
            return Err(Error::InvalidTable {
                message: format!(
                    "charting needs a label and a value column, table has {}",
                    columns.len()
                ),
            });
        }

        let label_column = columns
            .iter()
            .find(|c| self.is_label_like(c))
            .unwrap_or(&columns[0])
            .clone();

        let value_column = columns
            .iter()
            .filter(|c| **c != label_column)
            .find(|c| self.classifier.is_numeric_column(table, c))
            .or_else(|| columns.iter().find(|c| **c != label_column))
            .cloned()
            .ok_or_else(|| Error::InvalidTable {
                message: "table has no value column".to_string(),
            })?;

        Ok(ColumnChoice {
            label_column,
            value_column,
        })
    }

    /// Builds a single-series dataset. The table is expected to be classified as graded.
    pub fn build(&self, table: &Table) -> Result<ChartDataset> {
        let choice = self.choose_columns(table)?;
        tracing::debug!(
            label = %choice.label_column,
            value = %choice.value_column,
            rows = table.len(),
            "chart columns chosen"
        );

        let labels = table
            .column_cells(&choice.label_column)
            .map(|c| c.display())
            .collect();
        let values = table
            .column_cells(&choice.value_column)
            .map(|c| c.as_number())
            .collect();

        Ok(ChartDataset {
            labels,
            series: vec![ChartSeries {
                name: choice.value_column,
                values,
            }],
        })
    }

    fn is_label_like(&self, column: &str) -> bool {
        self.label_pattern
            .as_ref()
            .is_some_and(|re| re.is_match(&column.to_lowercase()))
    }
}

/// Short keywords (`id`, `tên`) only match as whole tokens so that `paid` or `grid` do not
/// count; longer ones match anywhere (`studentname`).
fn label_pattern(keywords: &[String]) -> Option<Regex> {
    let alternatives = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .map(|k| {
            let escaped = regex::escape(&k);
            if k.chars().count() <= 3 {
                format!(r"(?:^|[^\p{{L}}\p{{N}}]){escaped}(?:$|[^\p{{L}}\p{{N}}])")
            } else {
                escaped
            }
        })
        .collect::<Vec<_>>();
    if alternatives.is_empty() {
        return None;
    }
    match Regex::new(&alternatives.join("|")) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::warn!(error = %err, "invalid chart.labelKeywords pattern; label detection disabled");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(value: serde_json::Value) -> Table {
        Table::from_json(&value).unwrap()
    }

    #[test]
    fn graded_scenario_builds_expected_dataset() {
        let t = table(json!([
            { "name": "An", "score": "8.5" },
            { "name": "Bao", "score": "7" }
        ]));
        let ds = ChartSeriesBuilder::default().build(&t).unwrap();
        assert_eq!(
            ds,
            ChartDataset {
                labels: vec!["An".to_string(), "Bao".to_string()],
                series: vec![ChartSeries {
                    name: "score".to_string(),
                    values: vec![Some(8.5), Some(7.0)],
                }],
            }
        );
    }

    #[test]
    fn label_column_prefers_identity_headers() {
        let t = table(json!([
            { "math": 9, "Student ID": "S01", "physics": 8 }
        ]));
        let choice = ChartSeriesBuilder::default().choose_columns(&t).unwrap();
        assert_eq!(choice.label_column, "Student ID");
        assert_eq!(choice.value_column, "math");
    }

    #[test]
    fn short_keywords_need_token_boundaries() {
        let t = table(json!([{ "paid": "yes", "grid": "a", "total": 3 }]));
        let choice = ChartSeriesBuilder::default().choose_columns(&t).unwrap();
        assert_eq!(choice.label_column, "paid");
        assert_eq!(choice.value_column, "total");
    }

    #[test]
    fn value_falls_back_to_second_column() {
        let t = table(json!([{ "name": "An", "comment": "good" }]));
        let choice = ChartSeriesBuilder::default().choose_columns(&t).unwrap();
        assert_eq!(choice.value_column, "comment");
        let ds = ChartSeriesBuilder::default().build(&t).unwrap();
        assert_eq!(ds.series[0].values, vec![None]);
    }

    #[test]
    fn unparsable_cells_stay_null() {
        let t = table(json!([
            { "name": "An", "score": "absent" },
            { "name": "Bao", "score": "6,5" },
            { "name": "Chi", "score": null }
        ]));
        let ds = ChartSeriesBuilder::default().build(&t).unwrap();
        assert_eq!(ds.series[0].values, vec![None, Some(6.5), None]);
        assert!(ds.is_consistent());
    }

    #[test]
    fn single_column_table_cannot_be_charted() {
        let t = table(json!([{ "score": 1 }]));
        let err = ChartSeriesBuilder::default().build(&t).unwrap_err();
        assert!(matches!(err, Error::InvalidTable { .. }));
    }

    #[test]
    fn chartjs_payload_keeps_nulls() {
        let ds = ChartDataset {
            labels: vec!["a".into(), "b".into()],
            series: vec![ChartSeries {
                name: "score".into(),
                values: vec![Some(1.0), None],
            }],
        };
        assert_eq!(
            ds.to_chartjs(),
            json!({ "labels": ["a", "b"], "datasets": [{ "label": "score", "data": [1.0, null] }] })
        );
    }
}
