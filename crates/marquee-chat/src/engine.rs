//! Turn orchestration: the full pipeline for one chat message.
//!
//! `ChatEngine` wires the router, the per-kind analyzer/resolver pairs,
//! the response aggregator, and the related-query generator around shared
//! conversation and entity state. One call to [`ChatEngine::handle_message`]
//! runs a complete turn.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error};
use uuid::Uuid;

use marquee_core::config::SourcesConfig;
use marquee_core::{Citation, ImageData, MarqueeConfig, Message, RelatedQuery, SourceKind};
use marquee_llm::TextGenerator;
use marquee_sources::EntitySource;

use crate::aggregator::ResponseAggregator;
use crate::analyzer::ReferenceAnalyzer;
use crate::cache::{EntityCache, KindSnapshot};
use crate::citations::filter_citations;
use crate::error::ChatError;
use crate::related::RelatedQueryGenerator;
use crate::resolver::{EntityResolver, ResolverOutput};
use crate::router::SourceRouter;
use crate::store::ConversationStore;

/// Outcome of one handled message.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    /// Generated answer text.
    pub response: String,
    /// Conversation id, minted when the request carried none.
    pub conversation_id: String,
    /// Citations actually referenced by the answer. `None` when the turn
    /// fell back to a plain answer without source enrichment.
    pub citations: Option<Vec<Citation>>,
    /// Images from the entities backing the answer, `None` on fallback.
    pub images: Option<Vec<ImageData>>,
    /// Follow-up suggestions, empty only for conversations too short to
    /// suggest from.
    pub related_queries: Vec<RelatedQuery>,
}

/// Central coordinator for chat turns.
pub struct ChatEngine {
    max_message_length: usize,
    sources: SourcesConfig,
    router: SourceRouter,
    analyzer: ReferenceAnalyzer,
    aggregator: ResponseAggregator,
    related: RelatedQueryGenerator,
    resolvers: Vec<EntityResolver>,
    store: ConversationStore,
    cache: EntityCache,
}

impl ChatEngine {
    /// Create an engine from configuration and its collaborators.
    ///
    /// Entities are numbered across kinds in the order given here, so the
    /// sources are fixed as movies, then people, then topics.
    pub fn new(
        config: &MarqueeConfig,
        generator: Arc<dyn TextGenerator>,
        movies: Arc<dyn EntitySource>,
        people: Arc<dyn EntitySource>,
        topics: Arc<dyn EntitySource>,
    ) -> Self {
        let max_images = config.chat.max_images_per_entity;
        Self {
            max_message_length: config.chat.max_message_length,
            sources: config.sources.clone(),
            router: SourceRouter::new(Arc::clone(&generator)),
            analyzer: ReferenceAnalyzer::new(Arc::clone(&generator)),
            aggregator: ResponseAggregator::new(Arc::clone(&generator)),
            related: RelatedQueryGenerator::new(generator, config.chat.related_query_count),
            resolvers: vec![
                EntityResolver::new(movies, max_images),
                EntityResolver::new(people, max_images),
                EntityResolver::new(topics, max_images),
            ],
            store: ConversationStore::new(config.chat.max_conversations),
            cache: EntityCache::new(),
        }
    }

    /// Handle one user message and produce the assistant's turn.
    ///
    /// Appends the user message, runs routing, reference analysis, and
    /// entity resolution, generates the answer, appends it, and derives
    /// follow-up suggestions from the updated history. Any failure after
    /// the user message was recorded is written into the history as an
    /// error message before being returned to the caller.
    pub async fn handle_message(
        &self,
        message: &str,
        conversation_id: Option<String>,
    ) -> Result<TurnOutput, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.len() > self.max_message_length {
            return Err(ChatError::MessageTooLong(self.max_message_length));
        }

        let conversation_id = match conversation_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => Uuid::new_v4().to_string(),
        };

        let evicted = self.store.append(&conversation_id, Message::user(message))?;
        for id in &evicted {
            self.cache.evict(id);
        }

        match self.enriched_turn(message, &conversation_id).await {
            Ok((text, citations, images)) => {
                let assistant = Message::assistant(text.clone())
                    .with_citations(citations.clone())
                    .with_images(images.clone());
                self.store.append(&conversation_id, assistant)?;

                let history = self.store.history(&conversation_id)?.unwrap_or_default();
                let related_queries = self.related.suggest(&history).await;

                Ok(TurnOutput {
                    response: text,
                    conversation_id,
                    citations,
                    images,
                    related_queries,
                })
            }
            Err(e) => {
                let note = Message::turn_error(format!("Error: {}", e));
                if let Err(append_err) = self.store.append(&conversation_id, note) {
                    error!(error = %append_err, "could not record turn error in history");
                }
                Err(e)
            }
        }
    }

    /// Message history for a conversation, or `None` if unknown.
    pub fn history(&self, conversation_id: &str) -> Result<Option<Vec<Message>>, ChatError> {
        self.store.history(conversation_id)
    }

    /// Run routing, resolution, and aggregation for one query.
    ///
    /// Returns the answer text plus citations and images, which are `None`
    /// when no entity could be resolved and the answer came from the
    /// conversation history alone.
    async fn enriched_turn(
        &self,
        query: &str,
        conversation_id: &str,
    ) -> Result<(String, Option<Vec<Citation>>, Option<Vec<ImageData>>), ChatError> {
        let plan = self.router.route(query).await.restrict(&self.sources);

        // Snapshot every active kind up front so concurrent resolution
        // reads one consistent state; commits merge after the join.
        let mut jobs = Vec::new();
        for resolver in &self.resolvers {
            if !plan.needs(resolver.kind()) {
                continue;
            }
            let snapshot = self.cache.snapshot(conversation_id, resolver.kind())?;
            jobs.push(self.resolve_kind(query, resolver, snapshot));
        }

        let mut entities = Vec::new();
        for result in join_all(jobs).await {
            let (kind, output) = result?;
            let applied = self.cache.commit(conversation_id, kind, output.commits)?;
            if applied > 0 {
                debug!(kind = kind.label(), applied, "cached newly resolved entities");
            }
            entities.extend(output.entities);
        }

        match self.aggregator.respond(query, &entities).await? {
            Some(answer) => {
                let citations = filter_citations(&answer.text, &answer.citations);
                Ok((answer.text, Some(citations), Some(answer.images)))
            }
            None => {
                let history = self.store.history(conversation_id)?.unwrap_or_default();
                let text = self.aggregator.respond_plain(&history).await?;
                Ok((text, None, None))
            }
        }
    }

    async fn resolve_kind(
        &self,
        query: &str,
        resolver: &EntityResolver,
        snapshot: KindSnapshot,
    ) -> Result<(SourceKind, ResolverOutput), ChatError> {
        let kind = resolver.kind();
        let report = self.analyzer.analyze(kind, query, &snapshot.discovered).await;
        let output = resolver.resolve(&report, &snapshot).await?;
        Ok((kind, output))
    }
}

// =============================================================================
// Tests
// =============================================================================
