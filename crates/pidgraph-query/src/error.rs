use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Failed to read knowledge base {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid knowledge base: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),
}

pub type Result<T> = std::result::Result<T, QueryError>;
