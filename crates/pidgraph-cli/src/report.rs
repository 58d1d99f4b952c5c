use colored::Colorize;
use std::collections::BTreeMap;

use pidgraph_core::{GraphSummary, Issue, IssueCounts, Severity};

pub fn render_summary(id: &str, s: &GraphSummary) -> String {
    format!(
        "{} {}\n  nodes: equipment={} instruments={} junctions={}\n  \
         edges: {} ({} connected)  texts: {}\n  \
         issues: errors={} warnings={} infos={}\n",
        "analyzed".green().bold(),
        id.bold(),
        s.equipment,
        s.instruments,
        s.junctions,
        s.edges,
        s.connected_edges,
        s.texts,
        s.issues.error,
        s.issues.warn,
        s.issues.info,
    )
}

fn severity_label(s: Severity) -> String {
    match s {
        Severity::Error => "error".red().bold().to_string(),
        Severity::Warn => "warn".yellow().bold().to_string(),
        Severity::Info => "info".cyan().to_string(),
    }
}

pub fn render_issues_text(issues: &[Issue]) -> String {
    let counts = IssueCounts::of(issues);
    let mut out = String::new();
    out.push_str("validation\n");
    out.push_str(&format!(
        "  summary: errors={} warnings={} infos={}\n",
        counts.error, counts.warn, counts.info
    ));

    if issues.is_empty() {
        out.push_str("  (no issues)\n");
        return out;
    }

    // Most severe first.
    let mut by_severity: BTreeMap<std::cmp::Reverse<Severity>, Vec<&Issue>> = BTreeMap::new();
    for i in issues {
        by_severity.entry(std::cmp::Reverse(i.severity)).or_default().push(i);
    }
    for (std::cmp::Reverse(severity), items) in by_severity {
        out.push_str(&format!("\n{}\n", severity_label(severity)));
        for i in items {
            let target = i
                .target_id
                .as_deref()
                .map(|t| format!(" target={t}"))
                .unwrap_or_default();
            out.push_str(&format!("  - {}: {}{}\n", i.id, i.message, target));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_issues_most_severe_first() {
        colored::control::set_override(false);
        let issues = vec![
            Issue::new("issue_0", Severity::Info, "low confidence", Some("symbol_0".to_string())),
            Issue::new("issue_1", Severity::Error, "broken", None),
        ];
        let text = render_issues_text(&issues);
        let err_at = text.find("error\n").unwrap();
        let info_at = text.find("info\n").unwrap();
        assert!(err_at < info_at);
        assert!(text.contains("  - issue_0: low confidence target=symbol_0\n"));
        assert!(text.contains("errors=1 warnings=0 infos=1"));
    }

    #[test]
    fn no_issues_is_explicit() {
        assert!(render_issues_text(&[]).ends_with("(no issues)\n"));
    }
}
