use crate::error::{IndexError, InferenceError};
use crate::models::TextFragment;
use async_trait::async_trait;

/// Semantic store collaborator. Embedding happens inside the collaborator;
/// callers hand over plain text and get plain text back.
#[async_trait]
pub trait FragmentIndex: Send + Sync {
    async fn add_fragments(&self, fragments: &[TextFragment]) -> Result<(), IndexError>;

    /// Returns the `top_k` most relevant fragment texts, best first. An
    /// index with nothing relevant returns an empty list, not an error.
    async fn query_similar(&self, query: &str, top_k: usize)
        -> Result<Vec<String>, IndexError>;
}

/// Language-model collaborator.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, InferenceError>;
}
