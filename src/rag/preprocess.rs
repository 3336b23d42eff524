//! Turns a multi-turn conversation into one retrieval-friendly document.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::llm::{GenerationParams, Generator};

const PREPROCESS_TEMPERATURE: f64 = 0.2;
const PREPROCESS_MAX_TOKENS: u32 = 800;

const PREPROCESS_SYSTEM_PROMPT: &str = "You are a preprocessing assistant for a retrieval system. \
Given a raw multi-turn chat transcript, produce clean, concise text that preserves the facts and works well for dense retrieval embeddings. \
The transcript labels turns with 'Q:' for user questions and 'A:' for assistant answers; keep those labels and the turn order exactly. \
Remove filler, normalize spacing and casing, expand abbreviations, and keep key entities, dates, amounts and tasks. \
Reply in the language of the transcript.";

#[derive(Clone)]
pub struct Preprocessor {
    generator: Option<Arc<dyn Generator>>,
    model: String,
}

impl Preprocessor {
    pub fn new(generator: Option<Arc<dyn Generator>>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    /// Uses the generator when configured and falls back to [`heuristic`]
    /// on any failure or empty output.
    pub async fn preprocess(&self, messages: &[String]) -> String {
        let joined = join_messages(messages);

        let Some(generator) = &self.generator else {
            return heuristic(&joined);
        };

        let params = GenerationParams::new(&self.model, PREPROCESS_TEMPERATURE, PREPROCESS_MAX_TOKENS);
        let user_prompt = format!(
            "Below is a multi-speaker conversation with Q/A prefixes. Keep every 'Q:' and 'A:' prefix \
while producing normalized text that is optimal for vector embeddings.\n\n{}",
            joined
        );

        match generator
            .complete(PREPROCESS_SYSTEM_PROMPT, &user_prompt, &params)
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                tracing::warn!("Preprocessing returned empty text; using heuristic");
                heuristic(&joined)
            }
            Err(err) => {
                tracing::warn!("Preprocessing via '{}' failed: {}", generator.name(), err);
                heuristic(&joined)
            }
        }
    }
}

fn join_messages(messages: &[String]) -> String {
    messages
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn repeated_spaces() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {2,}").expect("static regex"))
}

/// Local normalisation: collapse space runs, strip bullets, drop blank lines.
pub fn heuristic(text: &str) -> String {
    let text = text.replace('\r', "\n");
    let text = repeated_spaces().replace_all(text.trim(), " ");

    text.split('\n')
        .map(|line| line.trim_matches(|c| matches!(c, ' ' | '-' | '•' | '\t')))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
