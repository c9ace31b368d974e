use proptest::prelude::*;
use studymap_core::{DiagramBounds, DiagramModel, NodeId, Outline};
use studymap_render::{LayoutOptions, MindmapSession};

fn outline() -> impl Strategy<Value = Outline> {
    let leaf = "[a-z]{1,12}( [a-z]{1,8}){0,3}".prop_map(|s| Outline::leaf(s));
    leaf.prop_recursive(4, 48, 5, |inner| {
        ("[A-Z][a-z]{0,10}", prop::collection::vec(inner, 1..5))
            .prop_map(|(label, children)| Outline::with_children(label, children))
    })
}

fn ids_with_children(model: &DiagramModel) -> Vec<NodeId> {
    let mut out = Vec::new();
    model.walk_visible(|n, _, _| {
        if n.has_children() {
            out.push(n.id);
        }
    });
    out
}

proptest! {
    #[test]
    fn collapse_then_expand_is_identity(tree in outline(), pick in any::<prop::sample::Index>()) {
        let model = DiagramModel::from_outline(&tree, DiagramBounds::default());
        let candidates = ids_with_children(&model);
        prop_assume!(!candidates.is_empty());
        let id = candidates[pick.index(candidates.len())];

        let mut session = MindmapSession::new(model, LayoutOptions::default());
        let before = session.layout().clone();
        prop_assert!(session.collapse(id).unwrap());
        prop_assert!(session.layout().nodes.len() < before.nodes.len());
        prop_assert!(session.expand(id).unwrap());
        prop_assert_eq!(session.layout(), &before);
    }

    #[test]
    fn siblings_keep_their_order(tree in outline()) {
        let model = DiagramModel::from_outline(&tree, DiagramBounds::default());
        let session = MindmapSession::new(model, LayoutOptions::default());
        let layout = session.layout();
        let model = session.model();
        model.walk_visible(|n, _, _| {
            let ys: Vec<f64> = n
                .visible_children()
                .iter()
                .filter_map(|c| layout.node(c.id).map(|l| l.y))
                .collect();
            assert!(ys.windows(2).all(|w| w[0] < w[1]), "{ys:?}");
        });
    }

    #[test]
    fn every_visible_node_is_inside_the_canvas(tree in outline()) {
        let model = DiagramModel::from_outline(&tree, DiagramBounds::default());
        let session = MindmapSession::new(model, LayoutOptions::default());
        let layout = session.layout();
        for n in &layout.nodes {
            let b = n.bounds();
            prop_assert!(b.min_x >= 0.0 && b.min_y >= 0.0);
            prop_assert!(b.max_x <= layout.width + 1e-9 && b.max_y <= layout.height + 1e-9);
        }
    }
}
