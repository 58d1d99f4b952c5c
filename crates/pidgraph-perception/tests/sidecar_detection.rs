use std::fs;

use pidgraph_core::NodeKind;
use pidgraph_perception::{DetectionError, DetectorChain, SidecarDetector, SymbolDetector};

#[test]
fn sidecar_candidates_run_through_policy() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("sheet.png");
    fs::write(&image, b"").unwrap();
    fs::write(
        dir.path().join("sheet.symbols.json"),
        r#"[
            {"class_name": "tank", "bbox": {"x": 150, "y": 150, "w": 100, "h": 100}, "score": 0.92},
            {"class_name": "tank", "bbox": {"x": 152, "y": 151, "w": 100, "h": 100}, "score": 0.81},
            {"class_name": "instrument_bubble", "bbox": {"x": 400, "y": 80, "w": 30, "h": 30}, "score": 0.2}
        ]"#,
    )
    .unwrap();

    let detection = SidecarDetector::default().detect(&image).unwrap();
    assert_eq!(detection.nodes.len(), 1);
    assert_eq!(detection.nodes[0].kind, NodeKind::Equipment);
    assert_eq!(detection.nodes[0].confidence, Some(0.92));
    assert!(detection.issues.is_empty());
}

#[test]
fn sidecar_accepts_finished_detection() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("p1.tif");
    fs::write(
        dir.path().join("p1.symbols.json"),
        r#"{"nodes": [{"id": "symbol_0", "kind": "instrument", "type": "instrument_bubble",
                       "bbox": {"x": 0, "y": 0, "w": 20, "h": 20}, "confidence": 0.7}],
            "issues": []}"#,
    )
    .unwrap();

    let detection = SidecarDetector::default().detect(&image).unwrap();
    assert_eq!(detection.nodes[0].symbol_type.as_deref(), Some("instrument_bubble"));
}

#[test]
fn missing_sidecar_is_a_recorded_failure() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("none.png");

    let err = SidecarDetector::default().detect(&image).unwrap_err();
    assert!(matches!(err, DetectionError::Missing(_)));

    let outcome = DetectorChain::new().with(SidecarDetector::default()).detect(&image);
    assert!(outcome.used.is_none());
    assert_eq!(outcome.failures[0].strategy, "sidecar");
}

#[test]
fn malformed_sidecar_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("bad.png");
    fs::write(dir.path().join("bad.symbols.json"), "{not json").unwrap();
    let err = SidecarDetector::default().detect(&image).unwrap_err();
    assert!(matches!(err, DetectionError::Json(_)));
}
