use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use studymap::render::{LayoutOptions, MindmapSession, SvgRenderOptions, render_session_svg};
use studymap::{DiagramBounds, DiagramModel, Outline, StructuredExtractor};

const MINDMAP_RAW: &str = include_str!("../../../fixtures/mindmap_raw.txt");
const FLASHCARDS_RAW: &str = include_str!("../../../fixtures/flashcards_raw.txt");

fn balanced(depth: usize, fanout: usize) -> Outline {
    if depth == 0 {
        return Outline::leaf("leaf topic");
    }
    Outline::with_children(
        format!("topic at depth {depth}"),
        (0..fanout).map(|_| balanced(depth - 1, fanout)).collect(),
    )
}

fn bench_extract(c: &mut Criterion) {
    let extractor = StructuredExtractor::default();
    let mut group = c.benchmark_group("extract");
    group.bench_function("mindmap_fixture", |b| {
        b.iter(|| black_box(extractor.extract_diagram(black_box(MINDMAP_RAW))).is_ok());
    });
    group.bench_function("flashcards_fixture", |b| {
        b.iter(|| black_box(extractor.extract_flashcards(black_box(FLASHCARDS_RAW))).is_ok());
    });
    // Worst case: no recoverable value, every bracket is a candidate start.
    let noise = "[{ not json ".repeat(400);
    group.bench_function("malformed_noise", |b| {
        b.iter(|| black_box(extractor.extract_diagram(black_box(&noise))).is_ok());
    });
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let model = DiagramModel::from_outline(&balanced(4, 5), DiagramBounds::default());
    let mut group = c.benchmark_group("layout");
    group.sample_size(50);
    group.bench_function("balanced_780_toggle_and_svg", |b| {
        b.iter(|| {
            let mut session = MindmapSession::new(model.clone(), LayoutOptions::default());
            let first_child = session.model().root().children[0].id;
            session.toggle(first_child).expect("toggle");
            session.toggle(first_child).expect("toggle");
            black_box(render_session_svg(&session, &SvgRenderOptions::default()).len())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_extract, bench_layout);
criterion_main!(benches);
