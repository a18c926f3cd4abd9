use crate::embeddings::{Embedder, HashedNgramEmbedder};
use crate::error::IndexError;
use crate::models::TextFragment;
use crate::traits::FragmentIndex;
use async_trait::async_trait;
use tokio::sync::RwLock;

struct StoredFragment {
    fragment: TextFragment,
    embedding: Vec<f32>,
}

/// Process-local semantic index: embeds with the hashed n-gram embedder and
/// ranks by cosine. Used by tests; the hosted Chroma collaborator is the
/// server's production path.
pub struct InMemoryIndex {
    embedder: HashedNgramEmbedder,
    entries: RwLock<Vec<StoredFragment>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            embedder: HashedNgramEmbedder::default(),
            entries: RwLock::new(Vec::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FragmentIndex for InMemoryIndex {
    async fn add_fragments(&self, fragments: &[TextFragment]) -> Result<(), IndexError> {
        let mut entries = self.entries.write().await;
        for fragment in fragments {
            entries.push(StoredFragment {
                embedding: self.embedder.embed(&fragment.text),
                fragment: fragment.clone(),
            });
        }
        Ok(())
    }

    async fn query_similar(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<String>, IndexError> {
        let query_vector = self.embedder.embed(query);
        let entries = self.entries.read().await;

        let mut scored: Vec<(f32, &StoredFragment)> = entries
            .iter()
            .map(|entry| (dot(&query_vector, &entry.embedding), entry))
            .collect();
        scored.sort_by(|left, right| right.0.total_cmp(&left.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, entry)| entry.fragment.text.clone())
            .collect())
    }
}

// Embeddings are L2-normalized, so the dot product is the cosine.
fn dot(left: &[f32], right: &[f32]) -> f32 {
    left.iter().zip(right).map(|(a, b)| a * b).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(id: &str, text: &str) -> TextFragment {
        TextFragment {
            fragment_id: id.to_string(),
            source: "doc.txt".to_string(),
            position: 0,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn empty_index_returns_no_matches() {
        let index = InMemoryIndex::new();
        let matches = index.query_similar("anything", 3).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn closest_fragment_ranks_first() {
        let index = InMemoryIndex::new();
        index
            .add_fragments(&[
                fragment("a", "hydraulic pump maintenance interval"),
                fragment("b", "employee onboarding checklist"),
            ])
            .await
            .unwrap();

        let matches = index
            .query_similar("when is the hydraulic pump maintained?", 1)
            .await
            .unwrap();

        assert_eq!(matches, vec!["hydraulic pump maintenance interval"]);
        assert_eq!(index.len().await, 2);
    }

    #[tokio::test]
    async fn top_k_caps_the_result_count() {
        let index = InMemoryIndex::new();
        index
            .add_fragments(&[
                fragment("a", "one"),
                fragment("b", "two"),
                fragment("c", "three"),
            ])
            .await
            .unwrap();

        let matches = index.query_similar("one two three", 2).await.unwrap();
        assert_eq!(matches.len(), 2);
    }
}
