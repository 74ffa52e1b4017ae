//! Entity reference analysis: what does this query actually mention?
//!
//! One structured call per active kind extracts the identifiers the
//! query names explicitly, plus a flag for phrases that point back at
//! previously discussed entities without naming them ("compare it to
//! those", "the previous ones"). Analysis fails closed: if the call or
//! the parse fails, the report is empty. Fabricating entities is worse
//! than missing them, which is the inverse of the router's policy.

use std::sync::Arc;

use marquee_core::SourceKind;
use marquee_llm::{parse_or_fallback, TextGenerator};
use serde::Deserialize;
use tracing::warn;

/// What one query says about one kind of entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceReport {
    /// Identifiers named explicitly, exactly as the user wrote them.
    pub mentions: Vec<String>,
    /// The query refers to earlier entities without naming them.
    pub references_previous: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ReferenceReply {
    #[serde(default)]
    mentions: Vec<String>,
    #[serde(default)]
    references_previous: bool,
}

fn reference_prompt(kind: SourceKind, query: &str, discovered: &[String]) -> String {
    let (plural, guidance) = match kind {
        SourceKind::Movie => (
            "movies",
            "film titles the query names, copied exactly as the user wrote them",
        ),
        SourceKind::Person => (
            "people",
            "actor and director names the query names, copied exactly as the user wrote them",
        ),
        SourceKind::Topic => (
            "topics",
            "encyclopedia topics the query asks about, as short search phrases (e.g. \"film noir\", \"history of science fiction film\")",
        ),
    };
    let previous = if discovered.is_empty() {
        "(none)".to_string()
    } else {
        discovered
            .iter()
            .map(|name| format!("- {}", name))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "Analyze this movie-related query and identify the {plural} it refers to.\n\n\
         Query: {query}\n\n\
         Previously discussed {plural}:\n\
         {previous}\n\n\
         Determine:\n\
         1) \"mentions\": {guidance}.\n\
         2) \"references_previous\": whether the query points back at previously discussed {plural} without naming them, e.g. \"compare it to those\" or \"the previous ones\".\n\n\
         Response format (JSON):\n\
         {{\n  \"mentions\": [\"...\"],\n  \"references_previous\": true/false\n}}"
    )
}

/// Extracts per-kind entity references from a query.
pub struct ReferenceAnalyzer {
    generator: Arc<dyn TextGenerator>,
}

impl ReferenceAnalyzer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Analyze one query for one kind. `discovered` is that kind's
    /// display-name history for the conversation, in discovery order.
    /// Never fails: call or parse failure yields the empty report.
    pub async fn analyze(
        &self,
        kind: SourceKind,
        query: &str,
        discovered: &[String],
    ) -> ReferenceReport {
        let prompt = reference_prompt(kind, query, discovered);
        let raw = match self.generator.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    kind = kind.label(),
                    error = %e,
                    "reference analysis call failed, treating as no references"
                );
                return ReferenceReport::default();
            }
        };

        let reply =
            parse_or_fallback(&raw, ReferenceReply::default(), "entity reference analysis")
                .into_inner();
        ReferenceReport {
            mentions: reply
                .mentions
                .into_iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            references_previous: reply.references_previous,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
