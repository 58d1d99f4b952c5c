use std::collections::HashSet;

use pidgraph_core::{
    assemble, parse_tag, validate, BoundingBox, Edge, EdgeKind, Graph, Node, NodeKind, Text,
};
use proptest::prelude::*;

fn square(side: i64) -> BoundingBox {
    BoundingBox::new(0, 0, side, side)
}

fn coord() -> impl Strategy<Value = i64> {
    0i64..600
}

fn nodes(max: usize) -> impl Strategy<Value = Vec<Node>> {
    let node = (coord(), coord(), 4i64..60, 4i64..60, 0.0f64..=1.0);
    proptest::collection::vec(node, 0..max).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (x, y, w, h, c))| {
                let kind = if i % 2 == 0 { NodeKind::Equipment } else { NodeKind::Instrument };
                let bbox = BoundingBox::new(x, y, w, h);
                Node::symbol(format!("symbol_{i}"), kind, "valve", bbox, c)
            })
            .collect()
    })
}

fn edges(max: usize) -> impl Strategy<Value = Vec<Edge>> {
    let line = (coord(), coord(), coord(), coord(), any::<bool>());
    proptest::collection::vec(line, 0..max).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (x1, y1, x2, y2, signal))| {
                let kind = if signal { EdgeKind::Signal } else { EdgeKind::Process };
                Edge::line(format!("line_{i}"), kind, (x1, y1), (x2, y2))
            })
            .collect()
    })
}

fn texts(max: usize) -> impl Strategy<Value = Vec<Text>> {
    proptest::collection::vec((coord(), coord(), 1i64..40, 1i64..15), 0..max).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (x, y, w, h))| {
                Text::new(format!("text_{i}"), format!("T-{i}"), BoundingBox::new(x, y, w, h))
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn each_text_is_consumed_at_most_once(n in nodes(25), e in edges(25), t in texts(40)) {
        let total_texts = t.len();
        let g = assemble(n, e, vec![], t);

        let assigned: Vec<&str> = g
            .nodes
            .iter()
            .filter_map(|n| n.tag.as_deref())
            .chain(g.edges.iter().filter_map(|e| e.label.as_deref()))
            .collect();
        let unique: HashSet<&str> = assigned.iter().copied().collect();
        prop_assert_eq!(unique.len(), assigned.len());
        prop_assert!(assigned.len() <= total_texts);
        prop_assert_eq!(g.texts.len(), total_texts);
    }

    #[test]
    fn resolved_endpoints_reference_existing_nodes(n in nodes(25), e in edges(25)) {
        let g = assemble(n, e, vec![], vec![]);
        let ids: HashSet<&str> = g.nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in &g.edges {
            for end in [&edge.endpoints.0, &edge.endpoints.1].into_iter().flatten() {
                prop_assert!(ids.contains(end.as_str()));
            }
        }
    }

    #[test]
    fn validation_is_idempotent(n in nodes(20), e in edges(20), t in texts(20)) {
        let mut g: Graph = assemble(n, e, vec![], t);
        let first = validate(&mut g);
        let second = validate(&mut g);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn tag_parser_is_total(s in ".{0,16}") {
        let tag = parse_tag(&s);
        prop_assert_eq!(&tag.raw_tag, &s);
        if !tag.is_parsed {
            prop_assert!(tag.loop_letters.is_none());
            prop_assert!(tag.loop_no.is_none());
            prop_assert!(tag.modifiers.is_none());
        }
    }

    #[test]
    fn generated_tags_parse(
        letters in "[A-Z]{1,4}",
        dash in any::<bool>(),
        no in 0u32..100000,
        mods in "[A-Z]{0,4}",
    ) {
        let raw = format!("{letters}{}{no}{mods}", if dash { "-" } else { "" });
        let tag = parse_tag(&raw);
        prop_assert!(tag.is_parsed);
        prop_assert_eq!(tag.loop_letters.as_deref(), Some(letters.as_str()));
        prop_assert_eq!(tag.loop_no, Some(no));
        let expected: Vec<String> = mods.chars().map(|c| c.to_string()).collect();
        prop_assert_eq!(tag.modifiers, Some(expected));
    }
}

#[test]
fn text_exactly_one_hundred_pixels_away_is_not_assigned() {
    // Node centre (50, 50); text centre (110, 130): 60-80-100 triangle.
    let node = Node::symbol("n", NodeKind::Equipment, "tank", square(100), 0.9);
    let text = Text::new("t", "TK-1", BoundingBox::new(100, 120, 20, 20));
    let g = assemble(vec![node], vec![], vec![], vec![text]);
    assert_eq!(g.nodes[0].tag, None);

    // One pixel closer on the y axis is inside the radius.
    let node = Node::symbol("n", NodeKind::Equipment, "tank", square(100), 0.9);
    let text = Text::new("t", "TK-1", BoundingBox::new(100, 119, 20, 20));
    let g = assemble(vec![node], vec![], vec![], vec![text]);
    assert_eq!(g.nodes[0].tag.as_deref(), Some("TK-1"));
}
