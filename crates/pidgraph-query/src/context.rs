use pidgraph_core::Graph;

/// Plain-text digest of a graph for prompting: symbols, texts, issues.
/// Sections with nothing to report are omitted.
pub fn graph_context(graph: &Graph) -> String {
    let mut parts: Vec<String> = Vec::new();

    let symbols: Vec<String> = graph
        .nodes
        .iter()
        .filter(|n| n.kind.is_symbol())
        .map(|n| {
            let symbol_type = n.symbol_type.as_deref().unwrap_or("unknown");
            let mut line = format!("- {symbol_type} (ID: {})", n.id);
            if let Some(tag) = &n.tag {
                line.push_str(&format!(" with tag: {tag}"));
            }
            if let Some(c) = n.confidence {
                line.push_str(&format!(" (confidence: {c:.2})"));
            }
            line
        })
        .collect();
    if !symbols.is_empty() {
        parts.push("Detected symbols and equipment:".to_string());
        parts.extend(symbols);
    }

    let texts: Vec<String> = graph
        .texts
        .iter()
        .filter(|t| !t.content.trim().is_empty())
        .map(|t| format!("- '{}' at position ({}, {})", t.content, t.bbox.x, t.bbox.y))
        .collect();
    if !texts.is_empty() {
        parts.push("\nDetected text elements:".to_string());
        parts.extend(texts);
    }

    if !graph.issues.is_empty() {
        parts.push("\nIdentified issues:".to_string());
        parts.extend(
            graph
                .issues
                .iter()
                .map(|i| format!("- {}: {}", i.severity.as_str().to_uppercase(), i.message)),
        );
    }

    parts.join("\n")
}
