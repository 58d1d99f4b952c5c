//! Natural-language questions over an analyzed P&ID graph.
//!
//! Retrieval-augmented: a [`KnowledgeBase`] of domain entries is searched
//! for the question (embedding similarity, or keywords when no embedder is
//! usable), the graph is rendered to a text context, and an
//! [`AnswerGenerator`] produces the answer. Without a generator a
//! rule-based answer is built from the retrieved entries.
//!
//! The query layer never mutates the graph.

pub mod answer;
pub mod context;
pub mod embed;
pub mod error;
pub mod knowledge;
pub mod retrieve;
pub mod service;

pub use answer::{build_prompt, fallback_answer, AnswerGenerator};
pub use context::graph_context;
pub use embed::{cosine, Embedder, TokenHashEmbedder, TOKEN_HASH_DIM};
pub use error::QueryError;
pub use knowledge::{EntryKind, KnowledgeBase};
pub use retrieve::{KnowledgeMatch, RetrievalConfig, Retriever};
pub use service::{response_confidence, KnowledgeSource, QueryAnswer, QueryService};
