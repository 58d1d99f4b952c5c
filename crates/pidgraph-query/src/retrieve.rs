//! Knowledge retrieval: embedding similarity with a keyword fallback.

use serde::{Deserialize, Serialize};

use crate::embed::{cosine, Embedder};
use crate::knowledge::{EntryFields, EntryKind, EntryRef, KnowledgeBase};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Semantic matches must score strictly above this.
    pub min_similarity: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_similarity: 0.3,
        }
    }
}

/// One retrieved entry with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeMatch {
    pub kind: EntryKind,
    pub key: String,
    pub fields: EntryFields,
    pub similarity: f64,
}

impl KnowledgeMatch {
    fn from_entry(entry: EntryRef<'_>, similarity: f64) -> Self {
        Self {
            kind: entry.kind,
            key: entry.key.to_string(),
            fields: entry.fields.clone(),
            similarity,
        }
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }
}

struct IndexedEntry {
    kind: EntryKind,
    key: String,
    vector: Vec<f32>,
}

pub struct Retriever {
    kb: KnowledgeBase,
    embedder: Option<Box<dyn Embedder>>,
    index: Option<Vec<IndexedEntry>>,
    config: RetrievalConfig,
}

impl Retriever {
    /// Keyword-only retriever.
    pub fn keyword(kb: KnowledgeBase, config: RetrievalConfig) -> Self {
        Self {
            kb,
            embedder: None,
            index: None,
            config,
        }
    }

    /// Embeds every entry up front. If any entry fails to embed, retrieval
    /// degrades to keyword search.
    pub fn with_embedder(
        kb: KnowledgeBase,
        embedder: Box<dyn Embedder>,
        config: RetrievalConfig,
    ) -> Self {
        let index: Result<Vec<IndexedEntry>, _> = kb
            .entries()
            .map(|e| {
                embedder.embed(&e.embedding_text()).map(|vector| IndexedEntry {
                    kind: e.kind,
                    key: e.key.to_string(),
                    vector,
                })
            })
            .collect();
        let index = match index {
            Ok(index) => Some(index),
            Err(err) => {
                tracing::warn!(error = %err, "knowledge embedding failed; using keyword search");
                None
            }
        };
        Self {
            kb,
            embedder: Some(embedder),
            index,
            config,
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn retrieve(&self, query: &str) -> Vec<KnowledgeMatch> {
        let (Some(embedder), Some(index)) = (&self.embedder, &self.index) else {
            return self.keyword_search(query);
        };
        let q = match embedder.embed(query) {
            Ok(q) => q,
            Err(err) => {
                tracing::warn!(error = %err, "query embedding failed; using keyword search");
                return self.keyword_search(query);
            }
        };

        let mut scored: Vec<(&IndexedEntry, f64)> =
            index.iter().map(|e| (e, cosine(&q, &e.vector))).collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(self.config.top_k)
            .filter(|(_, s)| *s > self.config.min_similarity)
            .filter_map(|(e, s)| {
                let entry = self.kb.get(e.kind, &e.key)?;
                Some(KnowledgeMatch::from_entry(entry, s))
            })
            .collect()
    }

    /// Tag and equipment sections only: 2 points when the key occurs in the
    /// query, 1 when any query word occurs in the description.
    pub fn keyword_search(&self, query: &str) -> Vec<KnowledgeMatch> {
        let q = query.to_lowercase();
        let words: Vec<&str> = q.split_whitespace().collect();

        let mut matches: Vec<KnowledgeMatch> = self
            .kb
            .entries()
            .filter(|e| matches!(e.kind, EntryKind::InstrumentTag | EntryKind::Equipment))
            .filter_map(|e| {
                let mut score = 0u32;
                if q.contains(&e.key.to_lowercase()) {
                    score += 2;
                }
                let description = e.description().to_lowercase();
                if words.iter().any(|w| description.contains(w)) {
                    score += 1;
                }
                (score > 0).then(|| KnowledgeMatch::from_entry(e, score as f64 / 3.0))
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(self.config.top_k);
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::TokenHashEmbedder;
    use crate::error::{QueryError, Result};
    use approx::assert_relative_eq;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::from_json_str(
            r#"{
                "instrument_tags": {
                    "FIC": {"description": "Flow Indicating Controller", "function": "Controls flow rate"},
                    "LT": {"description": "Level Transmitter", "function": "Transmits tank level"}
                },
                "equipment": {
                    "pump": {"description": "Centrifugal pump moving liquid", "function": "Raises pressure"}
                },
                "safety_systems": {
                    "psv": {"description": "Pressure safety valve", "function": "Relieves overpressure"}
                }
            }"#,
        )
        .unwrap()
    }

    struct Broken;

    impl Embedder for Broken {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(QueryError::Embedding("model not loaded".to_string()))
        }
    }

    #[test]
    fn keyword_scores_key_and_description_hits() {
        let r = Retriever::keyword(kb(), RetrievalConfig::default());
        let m = r.keyword_search("What does the pump do for flow");
        let got: Vec<(&str, f64)> = m.iter().map(|m| (m.key.as_str(), m.similarity)).collect();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].0, "pump");
        assert_relative_eq!(got[0].1, 1.0);
        assert_eq!(got[1].0, "FIC");
        assert_relative_eq!(got[1].1, 1.0 / 3.0);
    }

    #[test]
    fn keyword_ignores_other_sections() {
        let r = Retriever::keyword(kb(), RetrievalConfig::default());
        assert!(r.keyword_search("psv").is_empty());
    }

    #[test]
    fn semantic_retrieval_ranks_matching_entry_first() {
        let r =
            Retriever::with_embedder(kb(), Box::new(TokenHashEmbedder), RetrievalConfig::default());
        let m = r.retrieve("pressure safety valve relieves overpressure");
        assert_eq!(m[0].key, "psv");
        assert_eq!(m[0].kind, EntryKind::SafetySystem);
        assert!(m.iter().all(|m| m.similarity > 0.3));
    }

    #[test]
    fn failing_embedder_degrades_to_keywords() {
        let r = Retriever::with_embedder(kb(), Box::new(Broken), RetrievalConfig::default());
        let m = r.retrieve("LT on the tank");
        assert_eq!(m[0].key, "LT");
        assert_relative_eq!(m[0].similarity, 2.0 / 3.0);
    }

    #[test]
    fn top_k_limits_results() {
        let config = RetrievalConfig {
            top_k: 1,
            ..RetrievalConfig::default()
        };
        let r = Retriever::keyword(kb(), config);
        assert_eq!(r.keyword_search("flow level pump").len(), 1);
    }
}
