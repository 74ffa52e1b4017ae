//! Conversation-scoped entity resolution and citation aggregation.
//!
//! This crate is the engine behind the chat endpoint. Each user turn is
//! routed to the source kinds it needs, entity references are resolved
//! against per-conversation memory or fresh lookups, and the resolved
//! blocks are merged into one numbered-citation answer whose citation
//! list is post-filtered to the markers the generated prose actually
//! uses.

pub mod aggregator;
pub mod analyzer;
pub mod cache;
pub mod citations;
pub mod engine;
pub mod error;
pub mod related;
pub mod resolver;
pub mod router;
pub mod store;

pub use aggregator::{EnrichedAnswer, ResponseAggregator};
pub use analyzer::{ReferenceAnalyzer, ReferenceReport};
pub use cache::{normalize_key, EntityCache, EntityCommit, KindSnapshot};
pub use citations::filter_citations;
pub use engine::{ChatEngine, TurnOutput};
pub use error::ChatError;
pub use related::RelatedQueryGenerator;
pub use resolver::{EntityResolver, ResolverOutput};
pub use router::{RoutePlan, SourceRouter};
pub use store::ConversationStore;
