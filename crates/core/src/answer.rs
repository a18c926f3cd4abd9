use crate::error::{InferenceError, QueryError};
use crate::models::{QueryAnswer, RetrievedContext};
use crate::traits::{FragmentIndex, InferenceClient};
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_TOP_K: usize = 3;

pub const NO_MATCH_ANSWER: &str =
    "I couldn't find any relevant information in your documents.";

pub const SIMULATED_MARKER: &str = "[SIMULATED RESPONSE]";
pub const DEGRADED_MARKER: &str = "[DEGRADED RESPONSE]";

const CONTEXT_SEPARATOR: &str = "\n---\n";

const SYSTEM_INSTRUCTIONS: &str = "You are a professional assistant. Answer the user's \
    question using ONLY the provided context. If the answer is not in the context, \
    politely state that you cannot find the information. Respond in concise Markdown.";

/// Answers questions from the indexed fragments: retrieve, then generate.
/// Generation failures degrade to marker text instead of failing the query,
/// so retrieval keeps working without a usable inference backend.
pub struct AnswerEngine<I, L> {
    index: Arc<I>,
    generator: Arc<L>,
}

impl<I, L> AnswerEngine<I, L>
where
    I: FragmentIndex,
    L: InferenceClient,
{
    pub fn new(index: Arc<I>, generator: Arc<L>) -> Self {
        Self { index, generator }
    }

    pub async fn answer(&self, question: &str, top_k: usize) -> Result<QueryAnswer, QueryError> {
        if question.trim().is_empty() {
            return Err(QueryError::InvalidArgument("question is empty".to_string()));
        }

        if top_k < 1 {
            return Err(QueryError::InvalidArgument(format!(
                "top_k must be at least 1, got {top_k}"
            )));
        }

        let fragments = self.index.query_similar(question, top_k).await?;
        let context = RetrievedContext {
            question: question.to_string(),
            fragments,
        };

        if context.is_empty() {
            return Ok(QueryAnswer {
                answer: NO_MATCH_ANSWER.to_string(),
                context: Vec::new(),
                question: context.question,
            });
        }

        let answer = self.generate(&context).await;
        Ok(QueryAnswer {
            answer,
            context: context.fragments,
            question: context.question,
        })
    }

    async fn generate(&self, context: &RetrievedContext) -> String {
        let material = context.fragments.join(CONTEXT_SEPARATOR);
        let prompt = format!(
            "CONTEXT MATERIAL:\n{material}\n\nUSER QUESTION: {}",
            context.question
        );

        match self.generator.complete(SYSTEM_INSTRUCTIONS, &prompt).await {
            Ok(text) => text,
            Err(InferenceError::Unconfigured) => format!(
                "{SIMULATED_MARKER} Generation is not configured; retrieval matched {} fragment(s).",
                context.fragments.len()
            ),
            Err(error) => {
                warn!(%error, "inference call failed, returning degraded answer");
                format!("{DEGRADED_MARKER} Generation failed: {error}")
            }
        }
    }
}
