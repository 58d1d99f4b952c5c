//! Answer generation: prompt assembly for an external model, plus a
//! rule-based answer used when no model is available.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::Result;
use crate::knowledge::EntryKind;
use crate::retrieve::KnowledgeMatch;

/// Large-language-model backend. Implementations own transport and auth.
pub trait AnswerGenerator: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String>;
}

const EQUIPMENT_KEYWORDS: [&str; 5] = ["pump", "valve", "tank", "heat exchanger", "instrument"];
const ISSUES_NOTE: &str = "The diagram analysis identified some issues that should be addressed.";
const GENERIC_OPENING: &str =
    "Based on the P&ID analysis, I can see various process equipment and instrumentation.";

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Z]{2,3})-?(\d+)").expect("static regex"))
}

fn render_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Knowledge entries as indented `field: value` blocks.
pub fn render_knowledge(knowledge: &[KnowledgeMatch]) -> String {
    knowledge
        .iter()
        .map(|m| {
            let mut block = format!("{}: {}\n", m.kind, m.key);
            for (field, value) in &m.fields {
                block.push_str(&format!("  {field}: {}\n", render_value(value)));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(query: &str, context: &str, knowledge: &[KnowledgeMatch]) -> String {
    format!(
        "You are an expert P&ID (Piping and Instrumentation Diagram) analyst.\n\
         Answer the user's question about the P&ID diagram based on the extracted information and knowledge base.\n\
         \n\
         P&ID Analysis Context:\n\
         {context}\n\
         \n\
         Relevant Knowledge Base Information:\n\
         {knowledge}\n\
         \n\
         User Question: {query}\n\
         \n\
         Please provide a clear, technical answer that:\n\
         1. Directly addresses the user's question\n\
         2. References specific elements from the P&ID analysis when relevant\n\
         3. Uses information from the knowledge base to provide accurate technical details\n\
         4. Mentions any issues or concerns identified in the diagram\n\
         5. Provides practical insights for process engineers\n\
         \n\
         Answer:",
        knowledge = render_knowledge(knowledge),
    )
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut boundary = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if boundary {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            boundary = false;
        } else {
            out.push(c);
            boundary = true;
        }
    }
    out
}

/// Answer assembled from retrieved entries without a model.
pub fn fallback_answer(query: &str, context: &str, knowledge: &[KnowledgeMatch]) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(caps) = tag_regex().captures(&query.to_uppercase()) {
        let (prefix, number) = (&caps[1], &caps[2]);
        let hit = knowledge
            .iter()
            .find(|m| m.kind == EntryKind::InstrumentTag && m.key == prefix);
        if let Some(m) = hit {
            parts.push(format!(
                "Tag {prefix}-{number} refers to a {}.",
                m.field_str("description").unwrap_or("instrument")
            ));
            parts.push(format!("Function: {}", m.field_str("function").unwrap_or("Not specified")));
            if let Some(use_) = m.field_str("typical_use").filter(|s| !s.is_empty()) {
                parts.push(format!("Typical use: {use_}"));
            }
            if let Some(Value::Array(modes)) = m.fields.get("fault_modes") {
                if !modes.is_empty() {
                    let modes: Vec<String> = modes.iter().map(render_value).collect();
                    parts.push(format!("Common issues: {}", modes.join(", ")));
                }
            }
        }
    }

    let q = query.to_lowercase();
    for keyword in EQUIPMENT_KEYWORDS.iter().filter(|k| q.contains(*k)) {
        let hit = knowledge.iter().find(|m| {
            m.kind == EntryKind::Equipment
                && m.key.to_lowercase().replace('_', " ").contains(keyword)
        });
        if let Some(m) = hit {
            parts.push(format!(
                "{} is {}.",
                title_case(&m.key),
                m.field_str("description").unwrap_or("equipment")
            ));
            parts.push(format!("Function: {}", m.field_str("function").unwrap_or("Not specified")));
        }
    }

    if context.to_lowercase().contains("issues:") {
        parts.push(ISSUES_NOTE.to_string());
    }

    if parts.is_empty() {
        parts.push(GENERIC_OPENING.to_string());
        if !knowledge.is_empty() {
            parts.push("Here's what I found in the knowledge base:".to_string());
            for m in knowledge.iter().take(3) {
                parts.push(format!(
                    "- {}: {}",
                    m.key,
                    m.field_str("description").unwrap_or("No description available")
                ));
            }
        }
    }

    parts.join("\n")
}
