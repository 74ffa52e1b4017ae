//! Entity resolution for one source kind.
//!
//! The resolver turns a reference report into an ordered list of
//! formatted entities, reusing the conversation's cached records where
//! possible and looking the rest up externally. It is pure with respect
//! to shared state: it reads the snapshot it is given and returns the
//! records to commit, so concurrently running resolvers never write
//! anything themselves.
//!
//! The algorithm order is fixed. Implicit references union in the
//! previously discovered names, cache hits are appended first in
//! identifier order, then cache misses in identifier order. This keeps
//! output order deterministic and guarantees no identifier is resolved
//! twice within one call.

use std::collections::HashSet;
use std::sync::Arc;

use marquee_core::SourceKind;
use marquee_sources::{format_candidate, format_profile, EntitySource, FormattedEntity};
use tracing::debug;

use crate::analyzer::ReferenceReport;
use crate::cache::{normalize_key, EntityCommit, KindSnapshot};
use crate::error::ChatError;

/// What one resolver contributed to a turn.
#[derive(Debug, Default)]
pub struct ResolverOutput {
    /// Formatted entities in resolution order: hits, then new lookups.
    pub entities: Vec<FormattedEntity>,
    /// Newly resolved records for the cache merge.
    pub commits: Vec<EntityCommit>,
}

/// Resolves entity identifiers for one kind against cache and source.
pub struct EntityResolver {
    source: Arc<dyn EntitySource>,
    max_images: usize,
}

impl EntityResolver {
    pub fn new(source: Arc<dyn EntitySource>, max_images: usize) -> Self {
        Self { source, max_images }
    }

    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// Resolve a reference report against a cache snapshot.
    ///
    /// Identifiers with no search results are skipped silently; an
    /// absent detail record degrades to formatting the search candidate.
    /// Transport failures from the source abort the turn.
    pub async fn resolve(
        &self,
        report: &ReferenceReport,
        snapshot: &KindSnapshot,
    ) -> Result<ResolverOutput, ChatError> {
        let kind = self.kind();

        // Union in previously discovered names on implicit reference,
        // unless an explicit mention already covers them.
        let mut identifiers: Vec<String> = report.mentions.clone();
        if report.references_previous {
            for previous in &snapshot.discovered {
                if !already_named(&identifiers, previous) {
                    identifiers.push(previous.clone());
                }
            }
        }
        if identifiers.is_empty() {
            return Ok(ResolverOutput::default());
        }

        let mut output = ResolverOutput::default();
        let mut processed: HashSet<String> = HashSet::new();
        let mut misses: Vec<String> = Vec::new();

        // Pass 1: cache hits, in identifier order.
        for identifier in identifiers {
            let key = normalize_key(&identifier);
            if !processed.insert(key.clone()) {
                continue;
            }
            match snapshot.records.get(&key) {
                Some(entity) => {
                    debug!(kind = kind.label(), name = %entity.name, "cache hit");
                    output.entities.push(entity.clone());
                }
                None => misses.push(identifier),
            }
        }

        // Pass 2: fresh lookups, in identifier order.
        for identifier in misses {
            let mut candidates = self.source.search(&identifier).await?;
            if candidates.is_empty() {
                debug!(
                    kind = kind.label(),
                    identifier = %identifier,
                    "no search results, skipping"
                );
                continue;
            }
            let top = candidates.remove(0);

            let entity = match self.source.detail(&top.id).await? {
                Some(profile) => format_profile(&profile, self.max_images),
                None => {
                    debug!(
                        kind = kind.label(),
                        identifier = %identifier,
                        "detail record absent, formatting search candidate"
                    );
                    format_candidate(&top, kind)
                }
            };

            output.commits.push(EntityCommit {
                key: normalize_key(&identifier),
                entity: entity.clone(),
            });
            output.entities.push(entity);
        }

        Ok(output)
    }
}

/// Whether an explicit identifier already covers a previously discussed
/// name. Containment runs both ways so "The Dark Knight" covers "Dark
/// Knight" and vice versa.
fn already_named(identifiers: &[String], previous: &str) -> bool {
    let previous = previous.to_lowercase();
    identifiers.iter().any(|identifier| {
        let identifier = identifier.to_lowercase();
        identifier.contains(&previous) || previous.contains(&identifier)
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use marquee_core::MarqueeError;
    use marquee_sources::{Candidate, EntityProfile, MovieProfile};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A movie source with a fixed catalog and call counters.
    struct StubMovies {
        titles: Vec<&'static str>,
        detail_available: bool,
        search_calls: AtomicUsize,
        detail_calls: AtomicUsize,
    }

    impl StubMovies {
        fn new(titles: Vec<&'static str>) -> Self {
            Self {
                titles,
                detail_available: true,
                search_calls: AtomicUsize::new(0),
                detail_calls: AtomicUsize::new(0),
            }
        }

        fn without_detail(titles: Vec<&'static str>) -> Self {
            Self {
                detail_available: false,
                ..Self::new(titles)
            }
        }
    }

    #[async_trait]
    impl EntitySource for StubMovies {
        fn kind(&self) -> SourceKind {
            SourceKind::Movie
        }

        async fn search(&self, name: &str) -> marquee_core::Result<Vec<Candidate>> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            let wanted = name.trim().to_lowercase();
            Ok(self
                .titles
                .iter()
                .enumerate()
                .filter(|(_, title)| title.to_lowercase() == wanted)
                .map(|(index, title)| Candidate {
                    id: index.to_string(),
                    name: title.to_string(),
                    summary: Some(format!("{} search overview", title)),
                    date: Some("2010-07-15".to_string()),
                    rating: Some(8.0),
                    image_url: None,
                })
                .collect())
        }

        async fn detail(&self, id: &str) -> marquee_core::Result<Option<EntityProfile>> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            if !self.detail_available {
                return Ok(None);
            }
            let index: usize = id.parse().unwrap();
            let title = self.titles[index];
            Ok(Some(EntityProfile::Movie(MovieProfile {
                id: index as u64,
                title: title.to_string(),
                overview: Some(format!("{} full overview", title)),
                directors: vec!["Christopher Nolan".to_string()],
                cast: Vec::new(),
                release_date: Some("2010-07-15".to_string()),
                genres: Vec::new(),
                keywords: Vec::new(),
                rating: Some(8.4),
                providers: Vec::new(),
                poster_url: None,
                backdrop_urls: Vec::new(),
            })))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl EntitySource for FailingSource {
        fn kind(&self) -> SourceKind {
            SourceKind::Movie
        }

        async fn search(&self, _name: &str) -> marquee_core::Result<Vec<Candidate>> {
            Err(MarqueeError::Source("connect refused".to_string()))
        }

        async fn detail(&self, _id: &str) -> marquee_core::Result<Option<EntityProfile>> {
            Err(MarqueeError::Source("connect refused".to_string()))
        }
    }

    fn report(mentions: &[&str], references_previous: bool) -> ReferenceReport {
        ReferenceReport {
            mentions: mentions.iter().map(|m| m.to_string()).collect(),
            references_previous,
        }
    }

    fn snapshot_with(entries: &[(&str, &str)]) -> KindSnapshot {
        let mut snapshot = KindSnapshot::default();
        for (key, name) in entries {
            snapshot.records.insert(
                key.to_string(),
                FormattedEntity {
                    name: name.to_string(),
                    text: format!("Title: {}", name),
                    citation: marquee_core::Citation {
                        text: format!("{} overview", name),
                        url: "https://www.themoviedb.org/movie/1".to_string(),
                        title: format!("{} - TMDb", name),
                    },
                    images: Vec::new(),
                },
            );
            snapshot.discovered.push(name.to_string());
        }
        snapshot
    }

    // ---- explicit mentions ----

    #[tokio::test]
    async fn test_explicit_mentions_resolved_in_order() {
        let source = Arc::new(StubMovies::new(vec!["Inception", "Interstellar"]));
        let resolver = EntityResolver::new(source.clone(), 3);

        let output = resolver
            .resolve(
                &report(&["Inception", "Interstellar"], false),
                &KindSnapshot::default(),
            )
            .await
            .unwrap();

        let names: Vec<&str> = output.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Inception", "Interstellar"]);
        assert_eq!(source.search_calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.detail_calls.load(Ordering::SeqCst), 2);
        assert_eq!(output.commits.len(), 2);
    }

    #[tokio::test]
    async fn test_commit_keyed_by_original_query_spelling() {
        let source = Arc::new(StubMovies::new(vec!["The Dark Knight"]));
        let resolver = EntityResolver::new(source, 3);

        let output = resolver
            .resolve(&report(&["  the dark knight "], false), &KindSnapshot::default())
            .await
            .unwrap();

        assert_eq!(output.commits.len(), 1);
        assert_eq!(output.commits[0].key, "the dark knight");
        assert_eq!(output.commits[0].entity.name, "The Dark Knight");
    }

    #[tokio::test]
    async fn test_duplicate_mentions_resolved_once() {
        let source = Arc::new(StubMovies::new(vec!["Inception"]));
        let resolver = EntityResolver::new(source.clone(), 3);

        let output = resolver
            .resolve(
                &report(&["Inception", "inception", " INCEPTION "], false),
                &KindSnapshot::default(),
            )
            .await
            .unwrap();

        assert_eq!(output.entities.len(), 1);
        assert_eq!(source.search_calls.load(Ordering::SeqCst), 1);
    }

    // ---- cache hits ----

    #[tokio::test]
    async fn test_cache_hit_skips_external_calls() {
        let source = Arc::new(StubMovies::new(vec!["Inception"]));
        let resolver = EntityResolver::new(source.clone(), 3);
        let snapshot = snapshot_with(&[("inception", "Inception")]);

        let output = resolver
            .resolve(&report(&["INCEPTION"], false), &snapshot)
            .await
            .unwrap();

        assert_eq!(output.entities.len(), 1);
        assert_eq!(output.entities[0].name, "Inception");
        assert!(output.commits.is_empty());
        assert_eq!(source.search_calls.load(Ordering::SeqCst), 0);
        assert_eq!(source.detail_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hits_precede_misses() {
        // Follow-up turn: the query names a new film and points back at
        // two already-discussed ones.
        let source = Arc::new(StubMovies::new(vec!["The Dark Knight"]));
        let resolver = EntityResolver::new(source.clone(), 3);
        let snapshot = snapshot_with(&[
            ("inception", "Inception"),
            ("interstellar", "Interstellar"),
        ]);

        let output = resolver
            .resolve(&report(&["The Dark Knight"], true), &snapshot)
            .await
            .unwrap();

        let names: Vec<&str> = output.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Inception", "Interstellar", "The Dark Knight"]);
        assert_eq!(source.search_calls.load(Ordering::SeqCst), 1);
        assert_eq!(output.commits.len(), 1);
        assert_eq!(output.commits[0].key, "the dark knight");
    }

    // ---- implicit references ----

    #[tokio::test]
    async fn test_references_previous_replays_discovered() {
        let source = Arc::new(StubMovies::new(vec![]));
        let resolver = EntityResolver::new(source.clone(), 3);
        let snapshot = snapshot_with(&[
            ("inception", "Inception"),
            ("interstellar", "Interstellar"),
        ]);

        let output = resolver.resolve(&report(&[], true), &snapshot).await.unwrap();

        let names: Vec<&str> = output.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Inception", "Interstellar"]);
        assert_eq!(source.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_references_previous_with_no_history_is_empty() {
        let source = Arc::new(StubMovies::new(vec!["Inception"]));
        let resolver = EntityResolver::new(source.clone(), 3);

        let output = resolver
            .resolve(&report(&[], true), &KindSnapshot::default())
            .await
            .unwrap();

        assert!(output.entities.is_empty());
        assert_eq!(source.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_explicit_mention_covers_previous_name() {
        // Replay must not duplicate an entity the query already names,
        // even when the spellings differ by an article.
        let source = Arc::new(StubMovies::new(vec!["The Dark Knight"]));
        let resolver = EntityResolver::new(source.clone(), 3);
        let snapshot = snapshot_with(&[("dark knight", "Dark Knight")]);

        let output = resolver
            .resolve(&report(&["The Dark Knight"], true), &snapshot)
            .await
            .unwrap();

        assert_eq!(output.entities.len(), 1);
        assert_eq!(output.entities[0].name, "The Dark Knight");
    }

    // ---- empty and missing ----

    #[tokio::test]
    async fn test_empty_report_is_noop() {
        let source = Arc::new(StubMovies::new(vec!["Inception"]));
        let resolver = EntityResolver::new(source.clone(), 3);

        let output = resolver
            .resolve(&report(&[], false), &KindSnapshot::default())
            .await
            .unwrap();

        assert!(output.entities.is_empty());
        assert!(output.commits.is_empty());
        assert_eq!(source.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_identifier_skipped_silently() {
        let source = Arc::new(StubMovies::new(vec!["Inception"]));
        let resolver = EntityResolver::new(source.clone(), 3);

        let output = resolver
            .resolve(
                &report(&["A Film That Does Not Exist"], false),
                &KindSnapshot::default(),
            )
            .await
            .unwrap();

        assert!(output.entities.is_empty());
        assert!(output.commits.is_empty());
        assert_eq!(source.search_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.detail_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_absent_detail_degrades_to_candidate() {
        let source = Arc::new(StubMovies::without_detail(vec!["Inception"]));
        let resolver = EntityResolver::new(source.clone(), 3);

        let output = resolver
            .resolve(&report(&["Inception"], false), &KindSnapshot::default())
            .await
            .unwrap();

        assert_eq!(output.entities.len(), 1);
        let entity = &output.entities[0];
        assert!(entity.text.contains("Inception search overview"));
        assert!(entity.text.contains("Rating: 8 (out of 10)"));
        // Degraded results are still cached.
        assert_eq!(output.commits.len(), 1);
    }

    // ---- errors ----

    #[tokio::test]
    async fn test_source_transport_error_propagates() {
        let resolver = EntityResolver::new(Arc::new(FailingSource), 3);

        let result = resolver
            .resolve(&report(&["Inception"], false), &KindSnapshot::default())
            .await;

        assert!(matches!(result, Err(ChatError::Source(_))));
    }

    // ---- already_named ----

    #[test]
    fn test_already_named_containment_both_ways() {
        let identifiers = vec!["The Dark Knight".to_string()];
        assert!(already_named(&identifiers, "Dark Knight"));
        assert!(already_named(&identifiers, "the dark knight"));
        assert!(already_named(
            &["Dark Knight".to_string()],
            "The Dark Knight"
        ));
        assert!(!already_named(&identifiers, "Inception"));
    }
}
