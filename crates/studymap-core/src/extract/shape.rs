//! Shape contracts: which parsed JSON values count as flashcards or as a diagram tree, and how
//! their field-name synonyms normalize.

use super::{Flashcard, FlashcardSet};
use crate::diagram::Outline;
use serde_json::{Map, Value};

const QUESTION_KEYS: &[&str] = &["q", "question", "front", "term"];
const ANSWER_KEYS: &[&str] = &["a", "answer", "back", "definition"];
/// Wrapper objects some models put around the card array.
const CARD_LIST_KEYS: &[&str] = &["flashcards", "cards", "questions", "qa", "items", "data"];

const ROOT_TEXT_KEYS: &[&str] = &["title", "name", "label", "text", "topic"];
const NODE_TEXT_KEYS: &[&str] = &["label", "name", "title", "text", "topic"];
const CHILD_KEYS: &[&str] = &["children", "nodes", "subtopics"];

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(scalar_text))
}

/// An array whose elements are objects, or the empty array. Anything else is not a card batch.
fn card_items(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) if items.is_empty() || items.iter().any(Value::is_object) => {
            Some(items)
        }
        Value::Object(obj) => CARD_LIST_KEYS
            .iter()
            .filter_map(|k| obj.get(*k))
            .find_map(|v| match v {
                Value::Array(items) if items.iter().any(Value::is_object) => Some(items),
                _ => None,
            }),
        _ => None,
    }
}

pub(super) fn flashcards(value: &Value) -> Option<FlashcardSet> {
    let items = card_items(value)?;
    let mut set = FlashcardSet::default();
    for item in items {
        let card = item.as_object().and_then(|obj| {
            Some(Flashcard {
                q: first_text(obj, QUESTION_KEYS)?,
                a: first_text(obj, ANSWER_KEYS)?,
            })
        });
        match card {
            Some(card) => set.cards.push(card),
            None => set.dropped += 1,
        }
    }
    Some(set)
}

fn has_child_list(obj: &Map<String, Value>) -> bool {
    CHILD_KEYS.iter().any(|k| obj.get(*k).is_some_and(Value::is_array))
}

fn child_values(obj: &Map<String, Value>) -> &[Value] {
    CHILD_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Normalizes a node; label-less nodes dissolve into their children so no branch is lost.
fn nodes(value: &Value, out: &mut Vec<Outline>) {
    match value {
        Value::Object(obj) => {
            let mut children = Vec::new();
            for child in child_values(obj) {
                nodes(child, &mut children);
            }
            match first_text(obj, NODE_TEXT_KEYS) {
                Some(label) => out.push(Outline { label, children }),
                None => out.extend(children),
            }
        }
        Value::Array(items) => {
            for item in items {
                nodes(item, out);
            }
        }
        other => {
            if let Some(label) = scalar_text(other) {
                out.push(Outline::leaf(label));
            }
        }
    }
}

/// A diagram tree is an object carrying a children list (possibly empty); the title-like field
/// is optional. A bare array of nodes is accepted too and hung under `default_title`.
///
/// A lone `{"label": ..}` is a node, not a tree.
pub(super) fn outline(value: &Value, default_title: &str) -> Option<Outline> {
    match value {
        Value::Object(obj) => {
            if !has_child_list(obj) {
                return None;
            }
            let title = first_text(obj, ROOT_TEXT_KEYS);
            let mut children = Vec::new();
            for child in child_values(obj) {
                nodes(child, &mut children);
            }
            Some(Outline {
                label: title.unwrap_or_else(|| default_title.to_string()),
                children,
            })
        }
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            let mut children = Vec::new();
            nodes(value, &mut children);
            (!children.is_empty()).then(|| Outline {
                label: default_title.to_string(),
                children,
            })
        }
        _ => None,
    }
}
