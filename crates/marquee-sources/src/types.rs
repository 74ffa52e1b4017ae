//! Data carried between the source clients, the formatter, and the chat
//! engine's entity cache.

use marquee_core::{Citation, ImageData, SourceKind};

/// A ranked search result, before detail fetch.
///
/// Carries enough fields to render a degraded block when the detail fetch
/// fails: the entity is still answerable from what search returned.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Source-native identifier: numeric id for TMDb, page title for
    /// Wikipedia. Passed back verbatim to `detail`.
    pub id: String,
    /// Display name (movie title, person name, article title).
    pub name: String,
    /// Short descriptive text (overview, department, search snippet).
    pub summary: Option<String>,
    /// Release date where the source provides one.
    pub date: Option<String>,
    /// Average rating where the source provides one.
    pub rating: Option<f64>,
    /// Full URL of a representative image, when known at search time.
    pub image_url: Option<String>,
}

/// Full detail for one resolved entity, by kind.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityProfile {
    Movie(MovieProfile),
    Person(PersonProfile),
    Topic(TopicProfile),
}

impl EntityProfile {
    /// Canonical display name as returned by the source.
    pub fn name(&self) -> &str {
        match self {
            EntityProfile::Movie(m) => &m.title,
            EntityProfile::Person(p) => &p.name,
            EntityProfile::Topic(t) => &t.title,
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            EntityProfile::Movie(_) => SourceKind::Movie,
            EntityProfile::Person(_) => SourceKind::Person,
            EntityProfile::Topic(_) => SourceKind::Topic,
        }
    }
}

/// Detailed movie record from TMDb.
#[derive(Clone, Debug, PartialEq)]
pub struct MovieProfile {
    pub id: u64,
    pub title: String,
    pub overview: Option<String>,
    pub directors: Vec<String>,
    pub cast: Vec<String>,
    pub release_date: Option<String>,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    pub rating: Option<f64>,
    /// US flatrate streaming providers.
    pub providers: Vec<String>,
    /// Full poster URL.
    pub poster_url: Option<String>,
    /// Full backdrop URLs, in source order.
    pub backdrop_urls: Vec<String>,
}

/// Detailed person record from TMDb.
#[derive(Clone, Debug, PartialEq)]
pub struct PersonProfile {
    pub id: u64,
    pub name: String,
    pub known_for: Option<String>,
    pub biography: Option<String>,
    pub birthday: Option<String>,
    pub place_of_birth: Option<String>,
    /// Top credits by popularity, already ranked and capped.
    pub notable_films: Vec<NotableFilm>,
    /// Full profile photo URL.
    pub photo_url: Option<String>,
}

/// One entry in a person's filmography.
#[derive(Clone, Debug, PartialEq)]
pub struct NotableFilm {
    pub title: String,
    /// Four-digit release year when known.
    pub year: Option<String>,
}

/// Encyclopedia article from Wikipedia.
#[derive(Clone, Debug, PartialEq)]
pub struct TopicProfile {
    pub title: String,
    /// Plain-text intro extract.
    pub extract: String,
    /// Canonical article URL.
    pub url: Option<String>,
    /// Thumbnail image URL.
    pub thumbnail_url: Option<String>,
}

/// A fully rendered entity: what the aggregator consumes and the
/// conversation cache stores.
#[derive(Clone, Debug, PartialEq)]
pub struct FormattedEntity {
    /// Canonical display name, registered in the conversation's discovery
    /// order.
    pub name: String,
    /// Formatted text block for the generation prompt.
    pub text: String,
    pub citation: Citation,
    pub images: Vec<ImageData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_name_and_kind() {
        let movie = EntityProfile::Movie(MovieProfile {
            id: 27205,
            title: "Inception".to_string(),
            overview: None,
            directors: vec![],
            cast: vec![],
            release_date: None,
            genres: vec![],
            keywords: vec![],
            rating: None,
            providers: vec![],
            poster_url: None,
            backdrop_urls: vec![],
        });
        assert_eq!(movie.name(), "Inception");
        assert_eq!(movie.kind(), SourceKind::Movie);

        let topic = EntityProfile::Topic(TopicProfile {
            title: "Film noir".to_string(),
            extract: "A style of filmmaking.".to_string(),
            url: None,
            thumbnail_url: None,
        });
        assert_eq!(topic.name(), "Film noir");
        assert_eq!(topic.kind(), SourceKind::Topic);
    }
}
