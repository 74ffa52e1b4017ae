//! Follow-up query suggestions.
//!
//! After each answered turn the engine offers follow-up questions built
//! from the conversation so far. The generator's reply is split into
//! lines, list prefixes and code fences are stripped, and the result is
//! padded or truncated to exactly the configured count. Malformed
//! generator output can shrink the parsed list but never the returned
//! one.

use std::sync::Arc;

use marquee_core::{Message, MessageRole, RelatedQuery};
use marquee_llm::TextGenerator;
use tracing::warn;

fn related_prompt(user_questions: &[&str], latest_answer: &str, count: usize) -> String {
    let questions = user_questions
        .iter()
        .map(|q| format!("- {}", q))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Based on the conversation history, generate {count} related queries that the user might want to ask next.\n\n\
         Previous user questions:\n{questions}\n\n\
         Latest assistant response:\n{latest_answer}\n\n\
         The related queries should:\n\
         1. Be answerable using movie database information (cast, ratings, release dates, streaming availability), Wikipedia (film history, cultural context, themes), or the current conversation context\n\
         2. Not repeat questions already asked\n\
         3. Focus on one of these categories:\n\
            - Streaming availability of movies mentioned\n\
            - Historical context or cultural impact of movies mentioned\n\
            - Thematic analysis or comparisons between movies mentioned\n\
            - Information about directors or actors mentioned\n\
            - Similar movies or recommendations\n\n\
         Return exactly {count} related queries, one per line, in a clear, direct format."
    )
}

/// Strip a leading "1. ", "12) ", "- ", or "* " list marker.
fn strip_list_prefix(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return rest.trim_start();
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim_start();
        }
    }
    line
}

fn parse_suggestion_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```") && !line.ends_with("```"))
        .map(strip_list_prefix)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Derives follow-up suggestions from conversation history.
pub struct RelatedQueryGenerator {
    generator: Arc<dyn TextGenerator>,
    count: usize,
}

impl RelatedQueryGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, count: usize) -> Self {
        Self { generator, count }
    }

    /// Suggest follow-ups for a conversation.
    ///
    /// Conversations with fewer than two messages get none. Otherwise
    /// the result always holds exactly the configured count, padded
    /// with a deterministic fallback templated on the most recent user
    /// question when the generator under-delivers.
    pub async fn suggest(&self, history: &[Message]) -> Vec<RelatedQuery> {
        if history.len() < 2 {
            return Vec::new();
        }

        let user_questions: Vec<&str> = history
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .collect();
        let latest_answer = history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
            .map(|m| m.content.as_str())
            .unwrap_or("");

        let prompt = related_prompt(&user_questions, latest_answer, self.count);
        let raw = match self.generator.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "related query call failed, padding with fallback");
                String::new()
            }
        };

        let mut suggestions = parse_suggestion_lines(&raw);
        suggestions.truncate(self.count);

        let seed = user_questions.last().copied().unwrap_or_default();
        while suggestions.len() < self.count {
            suggestions.push(format!("Tell me more about another movie like {}", seed));
        }

        suggestions.into_iter().map(RelatedQuery::new).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
