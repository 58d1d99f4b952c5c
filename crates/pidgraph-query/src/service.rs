//! Question answering over one analyzed graph.

use serde::{Deserialize, Serialize};

use pidgraph_core::Graph;

use crate::answer::{build_prompt, fallback_answer, AnswerGenerator};
use crate::context::graph_context;
use crate::knowledge::EntryKind;
use crate::retrieve::{KnowledgeMatch, Retriever};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSource {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub key: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub query: String,
    pub context_used: String,
    pub knowledge_sources: Vec<KnowledgeSource>,
    pub confidence: f64,
}

pub struct QueryService {
    retriever: Retriever,
    generator: Option<Box<dyn AnswerGenerator>>,
}

impl QueryService {
    pub fn new(retriever: Retriever) -> Self {
        Self {
            retriever,
            generator: None,
        }
    }

    pub fn with_generator(mut self, generator: Box<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer `query` about `graph`. The graph is only read.
    pub fn answer(&self, query: &str, graph: &Graph) -> QueryAnswer {
        let context = graph_context(graph);
        let knowledge = self.retriever.retrieve(query);
        let answer = self.generate(query, &context, &knowledge);
        let confidence = response_confidence(&knowledge, &context);

        tracing::debug!(
            sources = knowledge.len(),
            confidence,
            "answered query"
        );

        QueryAnswer {
            answer,
            query: query.to_string(),
            knowledge_sources: knowledge
                .iter()
                .map(|m| KnowledgeSource {
                    kind: m.kind,
                    key: m.key.clone(),
                    similarity: m.similarity,
                })
                .collect(),
            context_used: context,
            confidence,
        }
    }

    fn generate(&self, query: &str, context: &str, knowledge: &[KnowledgeMatch]) -> String {
        if let Some(generator) = &self.generator {
            match generator.generate(&build_prompt(query, context, knowledge)) {
                Ok(answer) => return answer.trim().to_string(),
                Err(err) => {
                    tracing::warn!(
                        generator = generator.name(),
                        error = %err,
                        "answer generation failed; using fallback"
                    );
                }
            }
        }
        fallback_answer(query, context, knowledge)
    }
}

/// 0.1 with no knowledge; otherwise weighted mean similarity plus a bonus
/// for context length, capped at 1.
pub fn response_confidence(knowledge: &[KnowledgeMatch], context: &str) -> f64 {
    if knowledge.is_empty() {
        return 0.1;
    }
    let mean = knowledge.iter().map(|m| m.similarity).sum::<f64>() / knowledge.len() as f64;
    let richness = (context.split_whitespace().count() as f64 / 100.0).min(1.0);
    (mean * 0.7 + richness * 0.3).min(1.0)
}
