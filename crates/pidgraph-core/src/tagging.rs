//! ISA-5.1 style instrument tag parsing.
//!
//! Grammar (after trimming and upper-casing):
//! `LETTERS{1,4} [-] DIGITS{1,5} [LETTERS{1,4}]`, e.g. `FIC-101`, `PSHH12`, `T-23A`.
//!
//! Letters and digits are ASCII only. OCR output on drawings is ASCII, and a
//! tag written with other Unicode digits (e.g. `FIC-١٠١`) is reported as
//! unparsed rather than given a loop number.

use regex::Regex;
use std::sync::OnceLock;

use crate::model::{Graph, InstrumentTag};

/// Attribute key under which a successfully parsed tag is stored on a node.
pub const PARSED_TAG_ATTR: &str = "parsed_tag";

fn isa_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Z]{1,4})-?([0-9]{1,5})([A-Z]{1,4})?$").expect("valid ISA tag regex")
    })
}

/// Parse free text as an instrument tag. Total: never fails, only reports
/// `is_parsed = false`.
pub fn parse_tag(text: &str) -> InstrumentTag {
    let normalized = text.trim().to_uppercase();
    let Some(caps) = isa_tag_regex().captures(&normalized) else {
        return InstrumentTag::unparsed(text);
    };

    let Ok(loop_no) = caps[2].parse::<u32>() else {
        return InstrumentTag::unparsed(text);
    };
    let modifiers = caps
        .get(3)
        .map(|m| m.as_str().chars().map(|c| c.to_string()).collect())
        .unwrap_or_default();

    InstrumentTag {
        raw_tag: text.to_string(),
        loop_letters: Some(caps[1].to_string()),
        loop_no: Some(loop_no),
        modifiers: Some(modifiers),
        is_parsed: true,
    }
}

/// Store parsed tags on every tagged node whose tag matches the grammar.
pub fn annotate_tags(mut graph: Graph) -> Graph {
    let mut parsed = 0usize;
    for node in graph.nodes.iter_mut() {
        let Some(tag) = node.tag.as_deref() else {
            continue;
        };
        let tag = parse_tag(tag);
        if !tag.is_parsed {
            continue;
        }
        node.attributes.insert(
            PARSED_TAG_ATTR.to_string(),
            serde_json::json!({
                "rawTag": tag.raw_tag,
                "loopLetters": tag.loop_letters,
                "loopNo": tag.loop_no,
                "modifiers": tag.modifiers,
                "isParsed": tag.is_parsed,
            }),
        );
        parsed += 1;
    }
    tracing::debug!(parsed, "annotated instrument tags");
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, Node, NodeKind};

    #[test]
    fn parses_hyphenated_tag() {
        let t = parse_tag("FIC-101");
        assert!(t.is_parsed);
        assert_eq!(t.loop_letters.as_deref(), Some("FIC"));
        assert_eq!(t.loop_no, Some(101));
        assert_eq!(t.modifiers, Some(vec![]));
        assert_eq!(t.raw_tag, "FIC-101");
    }

    #[test]
    fn modifiers_split_into_single_letters() {
        let t = parse_tag("PSHH-12A");
        assert_eq!(t.loop_letters.as_deref(), Some("PSHH"));
        assert_eq!(t.loop_no, Some(12));
        assert_eq!(t.modifiers, Some(vec!["A".to_string()]));

        let t = parse_tag("LT-7HH");
        assert_eq!(t.modifiers, Some(vec!["H".to_string(), "H".to_string()]));
    }

    #[test]
    fn lowercase_and_padding_are_normalized_but_raw_is_kept() {
        let t = parse_tag("  tic0042 ");
        assert!(t.is_parsed);
        assert_eq!(t.loop_letters.as_deref(), Some("TIC"));
        assert_eq!(t.loop_no, Some(42));
        assert_eq!(t.raw_tag, "  tic0042 ");
    }

    #[test]
    fn rejects_non_tags() {
        let t = parse_tag("not_a_tag!");
        assert!(!t.is_parsed);
        assert_eq!(t.raw_tag, "not_a_tag!");
        assert_eq!(t.loop_letters, None);
        assert_eq!(t.loop_no, None);
        assert_eq!(t.modifiers, None);

        for s in ["", "FIC-", "-101", "ABCDE-1", "FI-123456", "FI--1", "FI-1ABCDE", "12-FIC"] {
            assert!(!parse_tag(s).is_parsed, "{s:?} should not parse");
        }
    }

    #[test]
    fn non_ascii_digits_are_not_tag_numbers() {
        let t = parse_tag("FIC-\u{661}\u{660}\u{661}");
        assert!(!t.is_parsed);
        assert_eq!(t.loop_no, None);
        assert!(!parse_tag("FIC-１０１").is_parsed);
    }

    #[test]
    fn annotate_only_stores_successful_parses() {
        let bbox = BoundingBox::new(0, 0, 10, 10);
        let mut a = Node::symbol("a", NodeKind::Instrument, "bubble", bbox, 0.9);
        a.tag = Some("FIC-101".to_string());
        let mut b = Node::symbol("b", NodeKind::Equipment, "pump", bbox, 0.9);
        b.tag = Some("feed pump".to_string());
        let g = annotate_tags(Graph {
            nodes: vec![a, b],
            ..Graph::default()
        });

        let parsed = &g.nodes[0].attributes[PARSED_TAG_ATTR];
        assert_eq!(parsed["loopLetters"], "FIC");
        assert_eq!(parsed["loopNo"], 101);
        assert_eq!(parsed["modifiers"], serde_json::json!([]));
        assert!(!g.nodes[1].attributes.contains_key(PARSED_TAG_ATTR));
    }
}
