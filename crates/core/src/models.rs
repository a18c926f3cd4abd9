use serde::{Deserialize, Serialize};

/// One indexed slice of a source document. Fragments are immutable once
/// built; `position` is the zero-based order among fragments of `source`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextFragment {
    pub fragment_id: String,
    pub source: String,
    pub position: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkingOptions {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            max_chars: 600,
            overlap_chars: 100,
        }
    }
}

/// Fragments judged relevant to one question, in ranking order. Built and
/// consumed within a single query/answer cycle.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    pub question: String,
    pub fragments: Vec<String>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub context: Vec<String>,
    pub question: String,
}
