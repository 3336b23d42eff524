//! Answer composer.
//!
//! Builds a bounded context from the top-ranked hits and turns it into an
//! answer, either by asking the generator or by returning the context itself.
//! Generator problems never reach the caller.

use std::sync::Arc;

use super::types::{AnswerResult, RetrievalHit};
use crate::llm::{GenerationParams, Generator};

/// Number of top-ranked hits whose documents form the context.
pub const MAX_CONTEXT_DOCUMENTS: usize = 3;
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

pub const NO_DOCUMENTS_ANSWER: &str = "No relevant documents were found.";
pub const EMPTY_GENERATION_ANSWER: &str = "Could not generate an answer from the documents.";
const CONTEXT_ONLY_PREFIX: &str = "Context-based answer (beta):\n";

pub const ANSWER_TEMPERATURE: f64 = 0.2;
pub const ANSWER_MAX_TOKENS: u32 = 800;

const ANSWER_SYSTEM_PROMPT: &str = "You answer questions for a retrieval-augmented search system. \
Use only the information in the provided context; do not rely on outside knowledge. \
Answer in the same language as the question. \
If the context does not contain enough information to answer, say so plainly instead of guessing.";

#[derive(Clone)]
pub struct AnswerComposer {
    generator: Option<Arc<dyn Generator>>,
    model: String,
}

impl AnswerComposer {
    /// `generator` is `None` when no API key is configured.
    pub fn new(generator: Option<Arc<dyn Generator>>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Produces the answer for `question`. `contexts` is `hits` unchanged.
    pub async fn compose(&self, question: &str, hits: Vec<RetrievalHit>) -> AnswerResult {
        let context = build_context(&hits);

        let answer = match (&self.generator, context.is_empty()) {
            (_, true) => NO_DOCUMENTS_ANSWER.to_string(),
            (None, false) => context_only_answer(&context),
            (Some(generator), false) => self.generate(generator.as_ref(), question, &context).await,
        };

        AnswerResult {
            answer,
            contexts: hits,
        }
    }

    async fn generate(&self, generator: &dyn Generator, question: &str, context: &str) -> String {
        let params = GenerationParams::new(&self.model, ANSWER_TEMPERATURE, ANSWER_MAX_TOKENS);
        let user_prompt = build_user_prompt(question, context);

        match generator
            .complete(ANSWER_SYSTEM_PROMPT, &user_prompt, &params)
            .await
        {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    tracing::warn!("Generator '{}' returned an empty answer", generator.name());
                    EMPTY_GENERATION_ANSWER.to_string()
                } else {
                    text.to_string()
                }
            }
            Err(err) => {
                tracing::warn!(
                    "Generator '{}' failed, using context-only answer: {}",
                    generator.name(),
                    err
                );
                context_only_answer(context)
            }
        }
    }
}

/// Joins the non-null documents among the first [`MAX_CONTEXT_DOCUMENTS`] hits.
pub fn build_context(hits: &[RetrievalHit]) -> String {
    hits.iter()
        .take(MAX_CONTEXT_DOCUMENTS)
        .filter_map(|hit| hit.document.as_deref())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

pub fn context_only_answer(context: &str) -> String {
    format!("{}{}", CONTEXT_ONLY_PREFIX, context)
}

fn build_user_prompt(question: &str, context: &str) -> String {
    format!(
        "Context:\n{}\n\nQuestion: {}\n\nAnswer using only the context above.",
        context, question
    )
}
