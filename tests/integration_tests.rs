//! Integration tests for the complete pidgraph pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - raw perception output → bundle → assembled, tagged, validated graph
//! - graph → DEXPI-lite / CSV export
//! - graph → natural-language query
//!
//! Run with: cargo test --test integration_tests

use std::thread;

use pidgraph_core::{
    check_graph, to_interchange_json, to_tabular_export, AssemblyConfig, BoundingBox, DiagramId,
    Edge, EdgeKind, Graph, LineExtraction, Node, NodeKind, PerceptionBundle, Pipeline,
    PipelineConfig, Severity, SymbolDetection, Text, ValidationConfig, PARSED_TAG_ATTR,
};
use pidgraph_perception::{
    DetectorChain, LineSegment, OcrWord, PerceptionConfig, RawPerception, SidecarDetector,
    SymbolCandidate,
};
use pidgraph_query::{KnowledgeBase, QueryService, RetrievalConfig, Retriever, TokenHashEmbedder};

// ============================================================================
// Tank with one outgoing line
// ============================================================================

fn tank_bundle() -> PerceptionBundle {
    PerceptionBundle {
        symbols: SymbolDetection {
            nodes: vec![Node::symbol(
                "symbol_0",
                NodeKind::Equipment,
                "tank",
                BoundingBox::new(150, 150, 100, 100),
                0.92,
            )],
            issues: vec![],
        },
        lines: LineExtraction {
            edges: vec![Edge::line("line_0", EdgeKind::Process, (200, 200), (400, 200))],
            junctions: vec![],
        },
        texts: vec![Text::new("text_0", "TANK-101", BoundingBox::new(190, 195, 40, 20))],
    }
}

#[test]
fn test_tank_with_dangling_line() {
    let id = DiagramId::new("tank-sheet").unwrap();
    let analysis = Pipeline::default().run(&id, tank_bundle()).unwrap();
    let g = &analysis.graph;

    assert_eq!(g.nodes[0].tag.as_deref(), Some("TANK-101"));
    assert_eq!(g.edges[0].endpoints, (Some("symbol_0".to_string()), None));

    let dangling_end: Vec<_> = g
        .issues_for("line_0")
        .filter(|i| i.message.contains("dangling end"))
        .collect();
    assert_eq!(dangling_end.len(), 1);
    assert_eq!(dangling_end[0].severity, Severity::Warn);
    assert!(g.issues_for("line_0").all(|i| !i.message.contains("dangling start")));

    assert_eq!(analysis.summary.equipment, 1);
    assert_eq!(analysis.summary.connected_edges, 0);
    check_graph(g).unwrap();
}

#[test]
fn test_line_far_from_every_node_dangles_at_both_ends() {
    let mut bundle = tank_bundle();
    bundle.lines.edges = vec![Edge::line("line_0", EdgeKind::Signal, (1000, 1000), (1200, 1000))];

    let g = Pipeline::default()
        .run(&DiagramId::new("far").unwrap(), bundle)
        .unwrap()
        .graph;
    assert_eq!(g.edges[0].endpoints, (None, None));

    let messages: Vec<&str> = g.issues_for("line_0").map(|i| i.message.as_str()).collect();
    assert_eq!(messages.len(), 2, "{messages:?}");
    assert_eq!(messages.iter().filter(|m| m.contains("dangling start")).count(), 1);
    assert_eq!(messages.iter().filter(|m| m.contains("dangling end")).count(), 1);
    assert!(g.issues_for("line_0").all(|i| i.severity == Severity::Warn));
}

#[test]
fn test_tank_tag_is_annotated_when_parseable() {
    let analysis = Pipeline::default()
        .run(&DiagramId::new("t").unwrap(), tank_bundle())
        .unwrap();
    let parsed = &analysis.graph.nodes[0].attributes[PARSED_TAG_ATTR];
    assert_eq!(parsed["loopLetters"], "TANK");
    assert_eq!(parsed["loopNo"], 101);
}

// ============================================================================
// Raw perception → pipeline → export
// ============================================================================

fn pump_loop_raw() -> RawPerception {
    RawPerception {
        symbols: vec![
            SymbolCandidate {
                class_name: "pump".to_string(),
                bbox: BoundingBox::new(80, 80, 40, 40),
                score: 0.94,
            },
            // Duplicate hit on the same pump.
            SymbolCandidate {
                class_name: "pump".to_string(),
                bbox: BoundingBox::new(82, 81, 40, 40),
                score: 0.71,
            },
            SymbolCandidate {
                class_name: "valve_control".to_string(),
                bbox: BoundingBox::new(380, 85, 40, 30),
                score: 0.66,
            },
        ],
        segments: vec![LineSegment::new((100, 100), (400, 100))],
        words: vec![
            OcrWord {
                text: "P-101".to_string(),
                confidence: 93.0,
                bbox: BoundingBox::new(85, 60, 30, 10),
            },
            OcrWord {
                text: "4\"-P-12".to_string(),
                confidence: 81.0,
                bbox: BoundingBox::new(235, 85, 40, 10),
            },
            OcrWord {
                text: "~".to_string(),
                confidence: 12.0,
                bbox: BoundingBox::new(0, 0, 3, 3),
            },
        ],
    }
}

#[test]
fn test_raw_perception_through_pipeline() {
    let bundle = pump_loop_raw().to_bundle(&PerceptionConfig::default());
    assert_eq!(bundle.symbols.nodes.len(), 2);
    assert_eq!(bundle.symbols.issues.len(), 1, "low-score valve gets one detection issue");
    assert_eq!(bundle.texts.len(), 2);

    let analysis = Pipeline::default()
        .run(&DiagramId::new("pump-loop").unwrap(), bundle)
        .unwrap();
    let g = &analysis.graph;

    assert_eq!(g.node("symbol_0").and_then(|n| n.tag.as_deref()), Some("P-101"));
    let line = g.edge("line_0").unwrap();
    assert_eq!(line.label.as_deref(), Some("4\"-P-12"));
    assert_eq!(line.endpoints, (Some("symbol_0".to_string()), Some("symbol_1".to_string())));

    // Perception issues first, then validator issues.
    assert_eq!(g.issues[0].id, "detection_issue_0");
    let low_conf: Vec<_> = g
        .issues_for("symbol_1")
        .filter(|i| i.id.starts_with("issue_"))
        .collect();
    assert_eq!(low_conf.len(), 1);
    assert_eq!(low_conf[0].message, "Low confidence symbol match (0.66) for 'valve_control'.");
    assert_eq!(analysis.summary.connected_edges, 1);
}

#[test]
fn test_exports_of_pipeline_output() {
    let bundle = pump_loop_raw().to_bundle(&PerceptionConfig::default());
    let analysis = Pipeline::default()
        .run(&DiagramId::new("pump-loop").unwrap(), bundle)
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&to_interchange_json(&analysis.graph).unwrap()).unwrap();
    assert_eq!(json["equipment"].as_array().unwrap().len(), 2);
    assert_eq!(json["connections"][0]["from_node"], "symbol_0");
    assert_eq!(json["connections"][0]["to_node"], "symbol_1");
    assert_eq!(json["lines"][0]["classRef"], "placeholder/process_line");

    let tables = to_tabular_export(&analysis.graph).unwrap();
    // Two symbols plus two junctions.
    assert_eq!(tables.nodes.lines().count(), 1 + 4);
    assert_eq!(
        tables.edges.lines().nth(1),
        Some("line_0,process,\"4\"\"-P-12\",unknown,symbol_0,symbol_1")
    );
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_changes_snap_radius_and_self_loops() {
    let mut bundle = tank_bundle();
    // Short line whose ends both land inside the tank.
    bundle.lines.edges = vec![Edge::line("line_0", EdgeKind::Signal, (190, 200), (230, 200))];

    let strict = PipelineConfig {
        validation: ValidationConfig {
            flag_self_loops: true,
            ..ValidationConfig::default()
        },
        ..PipelineConfig::default()
    };
    let g = Pipeline::new(strict).run(&DiagramId::new("a").unwrap(), bundle.clone()).unwrap().graph;
    assert!(g.issues.iter().any(|i| i.message.contains("same node 'symbol_0'")));

    let tight = PipelineConfig {
        assembly: AssemblyConfig {
            endpoint_snap_radius: 5.0,
            ..AssemblyConfig::default()
        },
        ..PipelineConfig::default()
    };
    let g = Pipeline::new(tight).run(&DiagramId::new("b").unwrap(), bundle).unwrap().graph;
    assert_eq!(g.edges[0].endpoints, (None, None));
    assert_eq!(g.issues_for("line_0").filter(|i| i.message.contains("dangling")).count(), 2);
}

// ============================================================================
// Concurrency and isolation
// ============================================================================

#[test]
fn test_independent_diagrams_in_parallel() {
    let pipeline = Pipeline::default();
    let results: Vec<Graph> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pipeline = &pipeline;
                s.spawn(move || {
                    let id = DiagramId::new(format!("sheet-{i}")).unwrap();
                    pipeline.run(&id, tank_bundle()).unwrap().graph
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let sequential = pipeline.run(&DiagramId::new("seq").unwrap(), tank_bundle()).unwrap().graph;
    assert!(results.iter().all(|g| *g == sequential));
}

// ============================================================================
// Detection chain and query over the result
// ============================================================================

#[test]
fn test_sidecar_detection_then_query() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("sheet.png");
    std::fs::write(
        dir.path().join("sheet.symbols.json"),
        serde_json::to_string(&pump_loop_raw().symbols).unwrap(),
    )
    .unwrap();

    let outcome = DetectorChain::new().with(SidecarDetector::default()).detect(&image);
    assert_eq!(outcome.used.as_deref(), Some("sidecar"));

    let raw = pump_loop_raw();
    let config = PerceptionConfig::default();
    let mut bundle = raw.to_bundle(&config);
    bundle.symbols = outcome.detection;
    let analysis = Pipeline::default()
        .run(&DiagramId::new("sheet").unwrap(), bundle)
        .unwrap();

    let kb = KnowledgeBase::from_json_str(
        r#"{"equipment": {"pump": {"description": "Centrifugal pump", "function": "Moves process liquid"}}}"#,
    )
    .unwrap();
    let service = QueryService::new(Retriever::with_embedder(
        kb,
        Box::new(TokenHashEmbedder),
        RetrievalConfig::default(),
    ));
    let answer = service.answer("pump", &analysis.graph);
    assert!(answer.context_used.contains("pump (ID: symbol_0) with tag: P-101"));
    assert!(answer.confidence > 0.1);
}
