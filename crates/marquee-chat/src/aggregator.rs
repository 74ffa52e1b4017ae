//! Merging resolver outputs into one cited answer.
//!
//! Entities arrive already ordered (movies, then people, then topics,
//! each in resolution order). Aggregation assigns response-scoped
//! numbers 1..N, labels each block, builds the citation legend, and
//! makes a single generation call. Numbering restarts every turn; it is
//! unrelated to the discovery index in the cache.

use std::sync::Arc;

use marquee_core::{Citation, ImageData, Message, MessageRole};
use marquee_llm::TextGenerator;
use marquee_sources::FormattedEntity;
use tracing::debug;

use crate::error::ChatError;

/// A generated answer with its full (unfiltered) citation list and
/// images, in numbering order.
#[derive(Clone, Debug)]
pub struct EnrichedAnswer {
    pub text: String,
    pub citations: Vec<Citation>,
    pub images: Vec<ImageData>,
}

const FALLBACK_SYSTEM_PROMPT: &str = "You are an expert on Movies and a helpful AI assistant assisting in movie-related queries. \
Provide accurate and helpful responses. If you don't know something, say so. \
Be concise but informative.";

fn build_context(entities: &[FormattedEntity]) -> String {
    entities
        .iter()
        .enumerate()
        .map(|(index, entity)| format!("Entity #{} - {}:\n{}", index + 1, entity.name, entity.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_legend(entities: &[FormattedEntity]) -> String {
    entities
        .iter()
        .enumerate()
        .map(|(index, entity)| format!("[{}] {}", index + 1, entity.citation.title))
        .collect::<Vec<_>>()
        .join("\n")
}

fn combined_prompt(query: &str, context: &str, legend: &str) -> String {
    format!(
        "You are a helpful AI assistant with access to movie information from multiple sources.\n\n\
         User query: {query}\n\n\
         Available information:\n{context}\n\n\
         Citations:\n{legend}\n\n\
         Provide a concise, focused answer to the user's query using only the most relevant information provided.\n\
         Keep your response under 500 words unless extensive detail is absolutely necessary.\n\n\
         When citing specific facts, include a numbered citation like [1], [2], etc. at the end of the sentence containing information from the sources.\n\
         DO NOT use source names like [TMDb] or [Wikipedia] in the main text, use only numbered citations.\n\n\
         Make sure each source has its own citation number, and maintain consistency throughout your answer.\n\
         For example:\n\
         - \"Inception was directed by Christopher Nolan [1].\"\n\
         - \"The film explores themes of reality and dreams [2].\"\n\n\
         Focus on directly answering the query with the most important information first.\n\
         If information is available from multiple sources, prioritize the most relevant details rather than including everything.\n\n\
         Your answer:"
    )
}

fn fallback_prompt(history: &[Message]) -> String {
    let mut prompt = String::from(FALLBACK_SYSTEM_PROMPT);
    prompt.push_str("\n\n");
    for message in history {
        let speaker = match message.role {
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        };
        prompt.push_str(speaker);
        prompt.push_str(": ");
        prompt.push_str(&message.content);
        prompt.push('\n');
    }
    prompt.push_str("Assistant:");
    prompt
}

/// Turns resolved entities into one cited answer via a single
/// generation call.
pub struct ResponseAggregator {
    generator: Arc<dyn TextGenerator>,
}

impl ResponseAggregator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Generate the enriched answer, or `None` when no resolver
    /// contributed anything and the caller should fall back to
    /// [`respond_plain`](Self::respond_plain).
    pub async fn respond(
        &self,
        query: &str,
        entities: &[FormattedEntity],
    ) -> Result<Option<EnrichedAnswer>, ChatError> {
        if entities.is_empty() {
            return Ok(None);
        }

        let context = build_context(entities);
        let legend = build_legend(entities);
        debug!(entities = entities.len(), "aggregating enriched answer");

        let text = self
            .generator
            .generate(&combined_prompt(query, &context, &legend))
            .await?;

        Ok(Some(EnrichedAnswer {
            text,
            citations: entities.iter().map(|e| e.citation.clone()).collect(),
            images: entities.iter().flat_map(|e| e.images.clone()).collect(),
        }))
    }

    /// Plain conversational answer from the message history, used when
    /// no source contributed context. Carries no citations or images.
    pub async fn respond_plain(&self, history: &[Message]) -> Result<String, ChatError> {
        Ok(self.generator.generate(&fallback_prompt(history)).await?)
    }
}

// =============================================================================
// Tests
// =============================================================================
