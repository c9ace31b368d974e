use studymap_core::{
    ChartDataset, ChartSeries, DiagramBounds, DiagramModel, Outline, StructuredExtractor,
};
use studymap_render::text::DeterministicTextMeasurer;
use studymap_render::{
    LayoutOptions, MindmapSession, SvgRenderOptions, layout_chart, render_chart_svg,
    render_mindmap_svg,
};

fn cells_model() -> DiagramModel {
    let raw = r#"{"title":"Cells","nodes":[{"label":"Nucleus"},{"label":"Membrane & wall","children":[{"label":"Lipids"}]}]}"#;
    StructuredExtractor::default()
        .extract_diagram(raw)
        .ok()
        .expect("tree extracted")
}

#[test]
fn mindmap_svg_is_well_formed_and_has_one_group_per_node() {
    let session = MindmapSession::new(cells_model(), LayoutOptions::default());
    let svg = render_mindmap_svg(session.layout(), 14.0, &SvgRenderOptions::default());

    let doc = roxmltree::Document::parse(&svg).expect("valid xml");
    let root = doc.root_element();
    assert_eq!(root.tag_name().name(), "svg");
    assert_eq!(root.attribute("id"), Some("mindmap"));
    assert!(root.attribute("viewBox").is_some());

    let nodes = doc
        .descendants()
        .filter(|n| n.has_tag_name("g") && n.attribute("data-id").is_some())
        .count();
    let edges = doc
        .descendants()
        .filter(|n| n.attribute("class") == Some("edge"))
        .count();
    assert_eq!(nodes, 4);
    assert_eq!(edges, 3);

    // No background rect: the only rects are node boxes.
    let rects = doc.descendants().filter(|n| n.has_tag_name("rect")).count();
    assert_eq!(rects, 4);

    let texts: Vec<&str> = doc
        .descendants()
        .filter(|n| n.has_tag_name("tspan"))
        .filter_map(|n| n.text())
        .collect();
    assert!(texts.contains(&"Membrane & wall"));
}

#[test]
fn collapsed_node_shows_hidden_child_count() {
    let mut session = MindmapSession::new(cells_model(), LayoutOptions::default());
    session.toggle("n2".parse().unwrap()).unwrap();
    let svg = render_mindmap_svg(session.layout(), 14.0, &SvgRenderOptions::default());

    let doc = roxmltree::Document::parse(&svg).expect("valid xml");
    let collapsed = doc
        .descendants()
        .find(|n| n.attribute("class") == Some("node collapsed"))
        .expect("collapsed node rendered");
    assert_eq!(collapsed.attribute("data-id"), Some("n2"));
    let marker = collapsed
        .descendants()
        .find(|n| n.attribute("class") == Some("collapsed-marker"))
        .expect("marker");
    let label = marker
        .descendants()
        .find(|n| n.has_tag_name("text"))
        .and_then(|n| n.text());
    assert_eq!(label, Some("+1"));
    assert!(!svg.contains("Lipids"));
}

#[test]
fn chart_svg_draws_one_bar_per_numeric_cell() {
    let dataset = ChartDataset {
        labels: vec!["An".to_string(), "Bao".to_string(), "Chi".to_string()],
        series: vec![ChartSeries {
            name: "score".to_string(),
            values: vec![Some(8.5), None, Some(7.0)],
        }],
    };
    let options = LayoutOptions::default();
    let layout = layout_chart(&dataset, &options.chart, &DeterministicTextMeasurer::default())
        .expect("chart layout");
    let svg = render_chart_svg(
        &layout,
        &SvgRenderOptions {
            diagram_id: Some("grades".to_string()),
            ..SvgRenderOptions::default()
        },
    );

    let doc = roxmltree::Document::parse(&svg).expect("valid xml");
    assert_eq!(doc.root_element().attribute("id"), Some("grades"));
    let bars: Vec<_> = doc
        .descendants()
        .filter(|n| n.attribute("class") == Some("bar"))
        .collect();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[1].attribute("data-category"), Some("2"));

    let categories: Vec<&str> = doc
        .descendants()
        .filter(|n| n.attribute("class") == Some("categories"))
        .flat_map(|g| g.children().filter_map(|t| t.text()))
        .collect();
    assert_eq!(categories, ["An", "Bao", "Chi"]);
}

#[test]
fn single_node_mindmap_renders() {
    let model = DiagramModel::from_outline(&Outline::leaf("Alone"), DiagramBounds::default());
    let session = MindmapSession::new(model, LayoutOptions::default());
    let svg = render_mindmap_svg(session.layout(), 14.0, &SvgRenderOptions::default());
    let doc = roxmltree::Document::parse(&svg).expect("valid xml");
    assert_eq!(
        doc.descendants()
            .filter(|n| n.attribute("class") == Some("edge"))
            .count(),
        0
    );
}
