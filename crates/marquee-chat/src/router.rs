//! Query routing: which source kinds does this turn need?
//!
//! A single classification call decides, per kind, whether the query
//! warrants consulting that source. Routing fails open: if the call or
//! the parse fails, every kind is marked needed. An extra lookup is
//! cheaper than silently dropping relevant context. The opposite policy
//! applies in the reference analyzer.

use std::sync::Arc;

use marquee_core::config::SourcesConfig;
use marquee_core::SourceKind;
use marquee_llm::{parse_or_fallback, TextGenerator};
use serde::Deserialize;
use tracing::warn;

/// Per-kind routing decision for one query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoutePlan {
    pub movies: bool,
    pub people: bool,
    pub topics: bool,
}

impl RoutePlan {
    /// Every kind needed. The fail-open default.
    pub fn all() -> Self {
        Self {
            movies: true,
            people: true,
            topics: true,
        }
    }

    pub fn none() -> Self {
        Self {
            movies: false,
            people: false,
            topics: false,
        }
    }

    pub fn needs(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Movie => self.movies,
            SourceKind::Person => self.people,
            SourceKind::Topic => self.topics,
        }
    }

    pub fn any(&self) -> bool {
        self.movies || self.people || self.topics
    }

    /// AND the routed decision with the per-kind enable flags from
    /// configuration, so an operator can switch a source off globally.
    pub fn restrict(self, sources: &SourcesConfig) -> Self {
        Self {
            movies: self.movies && sources.enable_movies,
            people: self.people && sources.enable_people,
            topics: self.topics && sources.enable_topics,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct KindNeed {
    #[serde(default)]
    needed: bool,
}

/// Reply shape for the classification call. Explanation fields are
/// accepted and discarded; a kind missing from a parsed reply counts
/// as not needed.
#[derive(Debug, Default, Deserialize)]
struct RouteReply {
    #[serde(default)]
    movies: KindNeed,
    #[serde(default)]
    people: KindNeed,
    #[serde(default)]
    topics: KindNeed,
}

impl RouteReply {
    fn fail_open() -> Self {
        Self {
            movies: KindNeed { needed: true },
            people: KindNeed { needed: true },
            topics: KindNeed { needed: true },
        }
    }
}

const ROUTING_GUIDE: &str = r#"Available sources:
1. Movie database - factual information about specific films: plot, cast, crew, release dates, ratings, genres, and streaming availability.
2. Person database - filmographies and biographical information about actors and directors.
3. Wikipedia - background information, film history, cultural context, thematic analysis, and open-ended questions; also useful for in-depth comparisons.

For each source, evaluate if it is needed to answer the query comprehensively.
General rules:
- If the query is only about a specific movie or a basic comparison, use the movie database.
- If the query asks about an actor or director as a person, use the person database.
- If the query involves deeper comparison, film history, or open-ended discussion, use Wikipedia as well.

Response format (JSON):
{
  "movies": {
    "needed": true/false,
    "explanation": "Brief explanation why the movie database is needed or not needed"
  },
  "people": {
    "needed": true/false,
    "explanation": "Brief explanation why the person database is needed or not needed"
  },
  "topics": {
    "needed": true/false,
    "explanation": "Brief explanation why Wikipedia is needed or not needed"
  }
}

Examples:
- For "What is the plot of Inception?":
  {"movies": {"needed": true, "explanation": "Plot details for one film"},
   "people": {"needed": false, "explanation": "Not about a person"},
   "topics": {"needed": false, "explanation": "Not needed for basic plot details"}}

- For "Who directed The Dark Knight and what themes does it explore?":
  {"movies": {"needed": true, "explanation": "Director credit and film details"},
   "people": {"needed": true, "explanation": "Background on the director"},
   "topics": {"needed": true, "explanation": "Thematic analysis"}}

- For "What is the history of science fiction films?":
  {"movies": {"needed": false, "explanation": "No specific film"},
   "people": {"needed": false, "explanation": "No specific person"},
   "topics": {"needed": true, "explanation": "Film history is encyclopedia material"}}"#;

fn routing_prompt(query: &str) -> String {
    format!(
        "Determine which data source(s) would be most appropriate to answer this movie-related query.\n\nQuery: {}\n\n{}",
        query, ROUTING_GUIDE
    )
}

/// Classifies a query into the set of source kinds it needs.
pub struct SourceRouter {
    generator: Arc<dyn TextGenerator>,
}

impl SourceRouter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Route a query. Never fails: call or parse failure yields the
    /// all-needed plan.
    pub async fn route(&self, query: &str) -> RoutePlan {
        let raw = match self.generator.generate(&routing_prompt(query)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "routing call failed, consulting every source");
                return RoutePlan::all();
            }
        };

        let reply = parse_or_fallback(&raw, RouteReply::fail_open(), "source routing").into_inner();
        RoutePlan {
            movies: reply.movies.needed,
            people: reply.people.needed,
            topics: reply.topics.needed,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
