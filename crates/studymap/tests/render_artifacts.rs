#![cfg(feature = "raster")]

use studymap::render::raster::{Exporter, RasterError, RasterFormat, RasterOptions};
use studymap::render::{LayoutOptions, SvgRenderOptions, render_artifact_svg};
use studymap::{Artifact, ChartSeriesBuilder, StructuredExtractor, Table, TabularClassifier};

fn grades() -> Table {
    let rows = serde_json::json!([
        {"name": "An", "score": "8.5"},
        {"name": "Bao", "score": "7"}
    ]);
    Table::from_json(&rows).expect("rows")
}

#[test]
fn graded_table_renders_as_chart_and_exports() {
    let table = grades();
    assert!(TabularClassifier::default().classify(&table).is_graded);
    let dataset = ChartSeriesBuilder::default().build(&table).expect("dataset");
    assert_eq!(dataset.labels, ["An", "Bao"]);

    let mut exporter = Exporter::new(RasterOptions::default());
    assert!(matches!(
        exporter.export(RasterFormat::Png),
        Err(RasterError::NothingRendered)
    ));

    let drawn = exporter
        .render_artifact(
            &Artifact::Chart(dataset),
            &LayoutOptions::default(),
            &SvgRenderOptions::default(),
        )
        .expect("render");
    assert!(drawn);

    let svg = exporter.rendered().expect("rendered svg");
    let doc = roxmltree::Document::parse(svg).expect("valid xml");
    assert_eq!(
        doc.descendants()
            .filter(|n| n.attribute("class") == Some("bar"))
            .count(),
        2
    );

    let png = exporter.export(RasterFormat::Png).expect("png");
    assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[test]
fn flashcards_keep_the_previous_drawing() {
    let raw = r#"{"title":"Cells","nodes":[{"label":"Nucleus"}]}"#;
    let model = StructuredExtractor::default()
        .extract_diagram(raw)
        .into_result()
        .expect("tree");

    let mut exporter = Exporter::default();
    assert!(
        exporter
            .render_artifact(
                &Artifact::Mindmap(model),
                &LayoutOptions::default(),
                &SvgRenderOptions::default(),
            )
            .unwrap()
    );
    let before = exporter.rendered().map(str::to_string);

    let cards = StructuredExtractor::default()
        .extract_flashcards(r#"[{"q":"a","a":"b"}]"#)
        .into_result()
        .expect("cards");
    assert!(
        !exporter
            .render_artifact(
                &Artifact::Flashcards(cards),
                &LayoutOptions::default(),
                &SvgRenderOptions::default(),
            )
            .unwrap()
    );
    assert_eq!(exporter.rendered().map(str::to_string), before);

    let svg = render_artifact_svg(
        &Artifact::Text("plain".to_string()),
        &LayoutOptions::default(),
        &SvgRenderOptions::default(),
    )
    .unwrap();
    assert!(svg.is_none());
}
