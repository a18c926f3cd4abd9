pub mod answer;
pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod jobs;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stores;
pub mod traits;

pub use answer::{AnswerEngine, DEFAULT_TOP_K, DEGRADED_MARKER, NO_MATCH_ANSWER, SIMULATED_MARKER};
pub use chunking::chunk_text;
pub use embeddings::{Embedder, HashedNgramEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{IndexError, InferenceError, IngestError, QueryError};
pub use extractor::{DocumentExtractor, TextExtractor};
pub use jobs::{IngestionJob, JobStatus, JobStore};
pub use llm::{GroqClient, GroqGenerator, DEFAULT_GROQ_MODEL};
pub use models::{ChunkingOptions, QueryAnswer, RetrievedContext, TextFragment};
pub use pipeline::{IngestionPipeline, EMPTY_CHUNKS_ERROR, NO_TEXT_ERROR};
pub use stores::{ChromaStore, InMemoryIndex};
pub use traits::{FragmentIndex, InferenceClient};
