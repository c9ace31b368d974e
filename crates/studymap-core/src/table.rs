//! Tabular input: rows of column-name → scalar cells.
//!
//! Tables are produced by the content extraction service (spreadsheets, CSV exports) and are
//! immutable once built. The first row's keys define the column order; later rows that miss a
//! column read as [`Cell::Empty`], extra keys are ignored.

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Text(b.to_string()),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.is_finite() => Cell::Number(f),
                _ => Cell::Text(n.to_string()),
            },
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }

    /// Empty cells and whitespace-only text do not count towards numeric density.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(f) => Some(*f).filter(|f| f.is_finite()),
            Cell::Text(s) => parse_number(s),
            Cell::Empty => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Cell::Number(f) => fmt_number(*f),
            Cell::Text(s) => s.clone(),
            Cell::Empty => String::new(),
        }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Cell::from_json(&value))
    }
}

/// Parses a spreadsheet-style number, accepting a decimal comma (`"8,5"`).
///
/// A single comma with no dot is read as the decimal separator; anything else containing a
/// comma is rejected rather than guessed at.
pub fn parse_number(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }
    let normalized;
    let t = if t.contains(',') {
        if t.contains('.') || t.matches(',').count() > 1 {
            return None;
        }
        normalized = t.replace(',', ".");
        normalized.as_str()
    } else {
        t
    };
    // `f64::from_str` accepts "inf"/"nan"; those are words, not scores.
    if !t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Formats a number the way a spreadsheet shows it: integral values without a trailing `.0`.
pub fn fmt_number(v: f64) -> String {
    if !v.is_finite() {
        return String::new();
    }
    if v.fract() == 0.0 && v.abs() < 1e15 {
        let s = format!("{}", v as i64);
        return if s == "-0" { "0".to_string() } else { s };
    }
    v.to_string()
}

pub type Row = IndexMap<String, Cell>;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        let columns = rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        Self { columns, rows }
    }

    /// Accepts either an array of objects (`[{"name": "An", "score": 8}]`) or an array of
    /// arrays whose first entry is the header row.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Some(items) = value.as_array() else {
            return Err(Error::InvalidTable {
                message: "expected a JSON array of rows".to_string(),
            });
        };
        let Some(first) = items.first() else {
            return Ok(Self::default());
        };

        if first.is_array() {
            return Self::from_header_rows(items);
        }

        let mut rows = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let Some(obj) = item.as_object() else {
                return Err(Error::InvalidTable {
                    message: format!("row {idx} is not an object"),
                });
            };
            rows.push(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Cell::from_json(v)))
                    .collect::<Row>(),
            );
        }
        Ok(Self::new(rows))
    }

    fn from_header_rows(items: &[Value]) -> Result<Self> {
        let header: Vec<String> = items[0]
            .as_array()
            .map(|cells| {
                cells
                    .iter()
                    .enumerate()
                    .map(|(i, c)| match Cell::from_json(c).display() {
                        s if s.trim().is_empty() => format!("column{}", i + 1),
                        s => s,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut rows = Vec::with_capacity(items.len().saturating_sub(1));
        for (idx, item) in items.iter().enumerate().skip(1) {
            let Some(cells) = item.as_array() else {
                return Err(Error::InvalidTable {
                    message: format!("row {idx} is not an array"),
                });
            };
            let mut row = Row::with_capacity(header.len());
            for (i, name) in header.iter().enumerate() {
                let cell = cells.get(i).map(Cell::from_json).unwrap_or(Cell::Empty);
                row.insert(name.clone(), cell);
            }
            rows.push(row);
        }
        Ok(Self {
            columns: header,
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: &str) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn column_cells<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Cell> + 'a {
        self.rows
            .iter()
            .map(move |r| r.get(column).unwrap_or(&EMPTY_CELL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decimal_comma_parses() {
        assert_eq!(parse_number("8,5"), Some(8.5));
        assert_eq!(parse_number(" 7 "), Some(7.0));
        assert_eq!(parse_number("1,2,3"), None);
        assert_eq!(parse_number("1,234.5"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn integral_numbers_format_without_fraction() {
        assert_eq!(fmt_number(7.0), "7");
        assert_eq!(fmt_number(8.5), "8.5");
        assert_eq!(fmt_number(-0.0), "0");
    }

    #[test]
    fn first_row_defines_columns_and_missing_cells_read_empty() {
        let table = Table::from_json(&json!([
            { "name": "An", "score": "8.5" },
            { "score": 7, "extra": true }
        ]))
        .unwrap();
        assert_eq!(table.columns(), ["name", "score"]);
        assert_eq!(table.cell(1, "name"), &Cell::Empty);
        assert_eq!(table.cell(1, "score"), &Cell::Number(7.0));
        assert_eq!(table.cell(5, "score"), &Cell::Empty);
    }

    #[test]
    fn header_row_arrays_are_accepted() {
        let table = Table::from_json(&json!([["Name", "Score"], ["An", 9], ["Bao"]])).unwrap();
        assert_eq!(table.columns(), ["Name", "Score"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, "Score"), &Cell::Empty);
    }

    #[test]
    fn non_array_input_is_rejected() {
        let err = Table::from_json(&json!({ "rows": [] })).unwrap_err();
        assert!(matches!(err, Error::InvalidTable { .. }));
    }
}
