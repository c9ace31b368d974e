use super::*;
use crate::diagram::Outline;

fn extractor() -> StructuredExtractor {
    StructuredExtractor::default()
}

fn cards(raw: &str) -> FlashcardSet {
    extractor().extract_flashcards(raw).into_result().unwrap()
}

fn tree(raw: &str) -> Outline {
    extractor()
        .extract_diagram(raw)
        .into_result()
        .unwrap()
        .to_outline()
}

#[test]
fn flat_text_is_trimmed_and_never_fails() {
    let out = extractor().extract("  just prose\n", ShapeTag::FlatText);
    assert_eq!(out, ExtractionResult::Ok(Extracted::Text("just prose".to_string())));
    assert!(extractor().extract("", ShapeTag::FlatText).is_ok());
}

#[test]
fn fenced_pairs_inside_prose() {
    let raw = "Here is your data:\n```json\n[{\"q\":\"a\",\"a\":\"b\"}]\n```\nHope that helps!";
    assert_eq!(
        cards(raw),
        FlashcardSet {
            cards: vec![Flashcard::new("a", "b")],
            dropped: 0,
        }
    );
}

#[test]
fn trailing_prose_after_bare_array() {
    let raw = r#"[{"q":"What is ATP?","a":"Energy currency"}] Let me know if you need more!"#;
    assert_eq!(cards(raw).cards, vec![Flashcard::new("What is ATP?", "Energy currency")]);
}

#[test]
fn leading_bracket_in_prose_is_skipped() {
    let raw = r#"Cards [draft]: [{"q":"1+1","a":"2"}]"#;
    assert_eq!(cards(raw).cards, vec![Flashcard::new("1+1", "2")]);
}

#[test]
fn incomplete_pairs_are_dropped_not_fatal() {
    let raw = r#"[{"q":"kept","a":"yes"},{"q":"no answer"},{"a":"no question"},"stray"]"#;
    let set = cards(raw);
    assert_eq!(set.cards, vec![Flashcard::new("kept", "yes")]);
    assert_eq!(set.dropped, 3);
}

#[test]
fn question_answer_synonyms_and_scalars() {
    let raw = r#"{"flashcards":[{"question":"Boiling point of water (C)?","answer":100}]}"#;
    assert_eq!(
        cards(raw).cards,
        vec![Flashcard::new("Boiling point of water (C)?", "100")]
    );
}

#[test]
fn cut_off_array_keeps_complete_cards() {
    let raw = r#"[{"q":"one","a":"1"},{"q":"two","a":"2"},{"q":"thr"#;
    let set = cards(raw);
    assert_eq!(set.cards.len(), 2);
    assert_eq!(set.cards[1], Flashcard::new("two", "2"));
}

#[test]
fn json5_isms_are_tolerated() {
    let raw = "Sure!\n[{q: 'mitosis', a: 'cell division',},]\nDone.";
    assert_eq!(cards(raw).cards, vec![Flashcard::new("mitosis", "cell division")]);
}

#[test]
fn lenient_pass_can_be_disabled() {
    let cfg = StudyConfig::with_overrides(&serde_json::json!({ "extract": { "lenient": false } }));
    let out = StructuredExtractor::from_config(&cfg).extract_flashcards("[{q: 'x', a: 'y'}]");
    assert!(!out.is_ok());
}

#[test]
fn empty_array_is_a_valid_empty_result() {
    let set = cards("[]");
    assert!(set.cards.is_empty());
    assert_eq!(set.dropped, 0);
}

#[test]
fn no_json_is_malformed_with_raw_attached() {
    let out = extractor().extract("no json here at all", ShapeTag::DiagramTree);
    match out {
        ExtractionResult::Malformed { raw, reason } => {
            assert_eq!(raw, "no json here at all");
            assert_eq!(reason, NO_VALID_JSON);
        }
        other => panic!("expected malformed, got {other:?}"),
    }
}

#[test]
fn malformed_converts_into_error() {
    let err = extractor()
        .extract_flashcards("nothing")
        .into_result()
        .unwrap_err();
    assert!(matches!(err, Error::MalformedOutput { ref raw, .. } if raw == "nothing"));
}

#[test]
fn cells_scenario_builds_four_nodes() {
    let raw = "{\"title\":\"Cells\",\"nodes\":[{\"label\":\"Nucleus\"},{\"label\":\"Membrane\",\"children\":[{\"label\":\"Lipids\"}]}]}";
    let model = extractor().extract_diagram(raw).into_result().unwrap();
    assert_eq!(model.node_count(), 4);
    assert_eq!(model.title(), "Cells");
    assert_eq!(model.root().children.len(), 2);
    assert_eq!(model.root().children[1].children[0].label, "Lipids");
    assert!(!model.truncated());
}

#[test]
fn tree_synonyms_normalize() {
    let raw = r#"Mindmap below.
```
{"name": "Photosynthesis", "children": [
  {"topic": "Light reactions", "subtopics": ["Photolysis", {"text": "ATP synthase"}]},
  {"title": "Calvin cycle"}
]}
```"#;
    assert_eq!(
        tree(raw),
        Outline::with_children(
            "Photosynthesis",
            vec![
                Outline::with_children(
                    "Light reactions",
                    vec![Outline::leaf("Photolysis"), Outline::leaf("ATP synthase")]
                ),
                Outline::leaf("Calvin cycle"),
            ]
        )
    );
}

#[test]
fn untitled_root_gets_default_title() {
    let t = tree(r#"{"nodes":[{"label":"A"}]}"#);
    assert_eq!(t.label, "Mindmap");
    assert_eq!(t.children, vec![Outline::leaf("A")]);
}

#[test]
fn labelless_inner_node_dissolves_into_parent() {
    let t = tree(r#"{"title":"T","nodes":[{"children":[{"label":"x"},{"label":"y"}]}]}"#);
    assert_eq!(t.children, vec![Outline::leaf("x"), Outline::leaf("y")]);
}

#[test]
fn wrapped_tree_is_found_inside_outer_object() {
    let t = tree(r#"{"status":"ok","mindmap":{"title":"Inner","nodes":[]}} trailing"#);
    assert_eq!(t.label, "Inner");
}

#[test]
fn object_without_tree_fields_is_malformed() {
    assert!(!extractor().extract_diagram(r#"{"foo": 1}"#).is_ok());
}

#[test]
fn cut_off_tree_is_malformed_not_a_fragment() {
    let raw = r#"{"title":"Cells","nodes":[{"label":"Nucleus"},{"label":"Membrane","children":[{"label":"Lip"#;
    let result = extractor().extract_diagram(raw);
    assert!(
        matches!(result, ExtractionResult::Malformed { raw: ref r, .. } if r == raw),
        "{result:?}"
    );
}

#[test]
fn title_only_object_in_prose_is_malformed() {
    let raw = "Sorry, I can only list {\"name\": \"Photosynthesis\"} as a topic.";
    assert!(!extractor().extract_diagram(raw).is_ok());
}

#[test]
fn title_only_root_with_empty_nodes_is_a_tree() {
    let t = tree(r#"{"title":"Cells","nodes":[]}"#);
    assert_eq!(t, Outline::leaf("Cells"));
}

#[test]
fn oversized_tree_is_truncated_not_rejected() {
    let cfg = StudyConfig::with_overrides(&serde_json::json!({ "diagram": { "maxNodes": 3 } }));
    let raw = r#"{"title":"T","nodes":[{"label":"a"},{"label":"b"},{"label":"c"}]}"#;
    let model = StructuredExtractor::from_config(&cfg)
        .extract_diagram(raw)
        .into_result()
        .unwrap();
    assert!(model.truncated());
    assert_eq!(model.node_count(), 3);
}

#[test]
fn raw_text_is_clipped_at_char_boundary() {
    assert_eq!(scan::clip("héllo", 2), "h");
    assert_eq!(scan::clip("abc", 10), "abc");
}

#[test]
fn shape_tags_parse_from_cli_names() {
    assert_eq!("mindmap".parse::<ShapeTag>().unwrap(), ShapeTag::DiagramTree);
    assert_eq!("flashcards".parse::<ShapeTag>().unwrap(), ShapeTag::PairArray);
    assert_eq!("text".parse::<ShapeTag>().unwrap(), ShapeTag::FlatText);
    assert!("xml".parse::<ShapeTag>().is_err());
}
