mod defaults;

pub use defaults::default_config;

use crate::{Error, Result};
use serde_json::{Map, Value};

/// JSON-object-backed configuration.
///
/// Every lookup is a dotted path (`"layout.levelSpacing"`). [`StudyConfig::default`] carries the
/// built-in defaults, so callers normally start there and merge user overrides on top.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyConfig(Value);

impl Default for StudyConfig {
    fn default() -> Self {
        Self(default_config())
    }
}

impl StudyConfig {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Built-in defaults with `overrides` deep-merged on top.
    pub fn with_overrides(overrides: &Value) -> Self {
        let mut cfg = Self::default();
        cfg.deep_merge(overrides);
        cfg
    }

    /// Parses a JSON or YAML override document and merges it over the defaults.
    ///
    /// YAML is a superset of JSON for our purposes, but JSON is tried first so that JSON syntax
    /// errors are reported with serde_json's positions.
    pub fn from_override_text(text: &str) -> Result<Self> {
        let overrides: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(json_err) => serde_yaml::from_str(text).map_err(|yaml_err| Error::Config {
                message: format!("not valid JSON ({json_err}) or YAML ({yaml_err})"),
            })?,
        };
        if !overrides.is_object() {
            return Err(Error::Config {
                message: "config document must be an object".to_string(),
            });
        }
        Ok(Self::with_overrides(&overrides))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    pub fn get(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.get(dotted_path)?.as_str()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.get(dotted_path)?.as_bool()
    }

    pub fn get_f64(&self, dotted_path: &str) -> Option<f64> {
        self.get(dotted_path)?.as_f64().filter(|v| v.is_finite())
    }

    pub fn get_u64(&self, dotted_path: &str) -> Option<u64> {
        let v = self.get(dotted_path)?;
        v.as_u64().or_else(|| {
            v.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        })
    }

    /// String list lookup. Non-string entries are skipped; a missing key yields an empty list.
    pub fn get_str_list(&self, dotted_path: &str) -> Vec<String> {
        self.get(dotted_path)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        // Callers can construct a config from any JSON value via `from_value`; coerce a
        // non-object root so this API never panics on user input.
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }

        let Value::Object(ref mut root) = self.0 else {
            return;
        };
        let mut cur: &mut Map<String, Value> = root;
        let mut segments = dotted_path.split('.').peekable();
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                cur.insert(seg.to_string(), value);
                return;
            }
            let slot = cur
                .entry(seg)
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Some(next) = slot.as_object_mut() else {
                return;
            };
            cur = next;
        }
    }

    pub fn deep_merge(&mut self, other: &Value) {
        deep_merge_value(&mut self.0, other);
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_resolve_every_documented_key() {
        let cfg = StudyConfig::default();
        assert_eq!(cfg.get_u64("classify.sampleRows"), Some(30));
        assert_eq!(cfg.get_f64("classify.numericThreshold"), Some(0.6));
        assert_eq!(cfg.get_u64("diagram.maxDepth"), Some(12));
        assert_eq!(cfg.get_u64("diagram.maxNodes"), Some(2000));
        assert_eq!(cfg.get_f64("export.scale"), Some(2.0));
        assert_eq!(cfg.get_str("export.background"), Some("white"));
        assert!(
            cfg.get_str_list("classify.gradeKeywords")
                .contains(&"score".to_string())
        );
    }

    #[test]
    fn overrides_merge_without_dropping_siblings() {
        let cfg = StudyConfig::with_overrides(&json!({ "layout": { "levelSpacing": 300 } }));
        assert_eq!(cfg.get_f64("layout.levelSpacing"), Some(300.0));
        assert_eq!(cfg.get_f64("layout.margin"), Some(20.0));
    }

    #[test]
    fn set_value_creates_intermediate_objects() {
        let mut cfg = StudyConfig::from_value(json!(42));
        cfg.set_value("a.b.c", json!(true));
        assert_eq!(cfg.get_bool("a.b.c"), Some(true));
    }

    #[test]
    fn override_text_accepts_yaml() {
        let cfg = StudyConfig::from_override_text("generation:\n  timeoutMs: 500\n").unwrap();
        assert_eq!(cfg.get_u64("generation.timeoutMs"), Some(500));
    }

    #[test]
    fn override_text_rejects_non_objects() {
        let err = StudyConfig::from_override_text("[1, 2]").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
