//! TMDb API client covering the movie and person kinds.
//!
//! One shared [`TmdbClient`] holds the HTTP connection pool and API key;
//! [`TmdbMovies`] and [`TmdbPeople`] are thin per-kind views implementing
//! [`EntitySource`]. Upstream error statuses are logged and surfaced as
//! "not found" rather than failing the turn.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use marquee_core::config::TmdbConfig;
use marquee_core::{Result, SourceKind};

use crate::client::EntitySource;
use crate::error::SourceError;
use crate::types::{Candidate, EntityProfile, MovieProfile, NotableFilm, PersonProfile};

/// Extra record sections requested alongside movie detail.
const MOVIE_APPEND: &str = "images,credits,keywords,watch/providers";
/// Extra record sections requested alongside person detail.
const PERSON_APPEND: &str = "movie_credits,images";

/// Shared TMDb HTTP client.
pub struct TmdbClient {
    client: reqwest::Client,
    base_url: String,
    image_base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(
        config: &TmdbConfig,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(SourceError::Http)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.clone(),
            api_key: api_key.into(),
        })
    }

    /// Search for movies by title, best match first.
    pub async fn search_movies(&self, query: &str) -> Result<Vec<Candidate>> {
        let url = format!("{}/search/movie", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", query)])
            .send()
            .await
            .map_err(SourceError::Http)?;

        if !response.status().is_success() {
            warn!(status = %response.status(), query, "TMDb movie search returned an error status");
            return Ok(Vec::new());
        }

        let parsed: MovieSearchResponse = response.json().await.map_err(SourceError::Http)?;
        Ok(parsed
            .results
            .into_iter()
            .map(|result| movie_candidate(result, &self.image_base_url))
            .collect())
    }

    /// Fetch full movie detail with credits, keywords, images, and providers.
    pub async fn movie_detail(&self, id: u64) -> Result<Option<MovieProfile>> {
        let url = format!("{}/movie/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("append_to_response", MOVIE_APPEND),
            ])
            .send()
            .await
            .map_err(SourceError::Http)?;

        if !response.status().is_success() {
            warn!(status = %response.status(), id, "TMDb movie detail returned an error status");
            return Ok(None);
        }

        let detail: MovieDetail = response.json().await.map_err(SourceError::Http)?;
        Ok(Some(movie_profile(detail, &self.image_base_url)))
    }

    /// Search for people by name, best match first.
    pub async fn search_people(&self, query: &str) -> Result<Vec<Candidate>> {
        let url = format!("{}/search/person", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", query)])
            .send()
            .await
            .map_err(SourceError::Http)?;

        if !response.status().is_success() {
            warn!(status = %response.status(), query, "TMDb person search returned an error status");
            return Ok(Vec::new());
        }

        let parsed: PersonSearchResponse = response.json().await.map_err(SourceError::Http)?;
        Ok(parsed
            .results
            .into_iter()
            .map(|result| person_candidate(result, &self.image_base_url))
            .collect())
    }

    /// Fetch full person detail with filmography and photos.
    pub async fn person_detail(&self, id: u64) -> Result<Option<PersonProfile>> {
        let url = format!("{}/person/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("append_to_response", PERSON_APPEND),
            ])
            .send()
            .await
            .map_err(SourceError::Http)?;

        if !response.status().is_success() {
            warn!(status = %response.status(), id, "TMDb person detail returned an error status");
            return Ok(None);
        }

        let detail: PersonDetail = response.json().await.map_err(SourceError::Http)?;
        Ok(Some(person_profile(detail, &self.image_base_url)))
    }
}

/// Movie-kind view over a shared [`TmdbClient`].
pub struct TmdbMovies {
    client: Arc<TmdbClient>,
}

impl TmdbMovies {
    pub fn new(client: Arc<TmdbClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EntitySource for TmdbMovies {
    fn kind(&self) -> SourceKind {
        SourceKind::Movie
    }

    async fn search(&self, name: &str) -> Result<Vec<Candidate>> {
        self.client.search_movies(name).await
    }

    async fn detail(&self, id: &str) -> Result<Option<EntityProfile>> {
        let movie_id = match id.parse::<u64>() {
            Ok(v) => v,
            Err(_) => {
                warn!(id, "Non-numeric TMDb movie id");
                return Ok(None);
            }
        };
        Ok(self
            .client
            .movie_detail(movie_id)
            .await?
            .map(EntityProfile::Movie))
    }
}

/// Person-kind view over a shared [`TmdbClient`].
pub struct TmdbPeople {
    client: Arc<TmdbClient>,
}

impl TmdbPeople {
    pub fn new(client: Arc<TmdbClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EntitySource for TmdbPeople {
    fn kind(&self) -> SourceKind {
        SourceKind::Person
    }

    async fn search(&self, name: &str) -> Result<Vec<Candidate>> {
        self.client.search_people(name).await
    }

    async fn detail(&self, id: &str) -> Result<Option<EntityProfile>> {
        let person_id = match id.parse::<u64>() {
            Ok(v) => v,
            Err(_) => {
                warn!(id, "Non-numeric TMDb person id");
                return Ok(None);
            }
        };
        Ok(self
            .client
            .person_detail(person_id)
            .await?
            .map(EntityProfile::Person))
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct MovieSearchResponse {
    #[serde(default)]
    results: Vec<MovieSearchResult>,
}

#[derive(Debug, Deserialize)]
struct MovieSearchResult {
    id: u64,
    title: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f64>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MovieDetail {
    id: u64,
    title: String,
    overview: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f64>,
    #[serde(default)]
    genres: Vec<Named>,
    poster_path: Option<String>,
    credits: Option<Credits>,
    keywords: Option<KeywordList>,
    images: Option<ImageList>,
    #[serde(rename = "watch/providers")]
    watch_providers: Option<WatchProviders>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Credits {
    #[serde(default)]
    cast: Vec<Named>,
    #[serde(default)]
    crew: Vec<CrewEntry>,
}

#[derive(Debug, Deserialize)]
struct CrewEntry {
    name: String,
    job: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeywordList {
    #[serde(default)]
    keywords: Vec<Named>,
}

#[derive(Debug, Deserialize)]
struct ImageList {
    #[serde(default)]
    backdrops: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct ImageEntry {
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct WatchProviders {
    #[serde(default)]
    results: HashMap<String, CountryProviders>,
}

#[derive(Debug, Deserialize)]
struct CountryProviders {
    flatrate: Option<Vec<ProviderEntry>>,
}

#[derive(Debug, Deserialize)]
struct ProviderEntry {
    provider_name: String,
}

#[derive(Debug, Deserialize)]
struct PersonSearchResponse {
    #[serde(default)]
    results: Vec<PersonSearchResult>,
}

#[derive(Debug, Deserialize)]
struct PersonSearchResult {
    id: u64,
    name: Option<String>,
    known_for_department: Option<String>,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PersonDetail {
    id: u64,
    name: String,
    biography: Option<String>,
    birthday: Option<String>,
    place_of_birth: Option<String>,
    known_for_department: Option<String>,
    profile_path: Option<String>,
    movie_credits: Option<PersonCredits>,
}

#[derive(Debug, Deserialize)]
struct PersonCredits {
    #[serde(default)]
    cast: Vec<PersonCredit>,
}

#[derive(Debug, Deserialize)]
struct PersonCredit {
    title: Option<String>,
    release_date: Option<String>,
    popularity: Option<f64>,
}

// =============================================================================
// Mapping
// =============================================================================

fn image_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn movie_candidate(result: MovieSearchResult, image_base: &str) -> Candidate {
    Candidate {
        id: result.id.to_string(),
        name: result.title.unwrap_or_else(|| "Unknown".to_string()),
        summary: result.overview,
        date: result.release_date,
        rating: result.vote_average,
        image_url: result
            .poster_path
            .as_deref()
            .map(|path| image_url(image_base, path)),
    }
}

fn person_candidate(result: PersonSearchResult, image_base: &str) -> Candidate {
    Candidate {
        id: result.id.to_string(),
        name: result.name.unwrap_or_else(|| "Unknown".to_string()),
        summary: result.known_for_department,
        date: None,
        rating: None,
        image_url: result
            .profile_path
            .as_deref()
            .map(|path| image_url(image_base, path)),
    }
}

fn movie_profile(detail: MovieDetail, image_base: &str) -> MovieProfile {
    let MovieDetail {
        id,
        title,
        overview,
        release_date,
        vote_average,
        genres,
        poster_path,
        credits,
        keywords,
        images,
        watch_providers,
    } = detail;

    let (directors, cast) = match credits {
        Some(credits) => {
            let directors = credits
                .crew
                .into_iter()
                .filter(|member| member.job.as_deref() == Some("Director"))
                .map(|member| member.name)
                .collect();
            let cast = credits.cast.into_iter().map(|member| member.name).collect();
            (directors, cast)
        }
        None => (Vec::new(), Vec::new()),
    };

    let providers = watch_providers
        .and_then(|mut wp| wp.results.remove("US"))
        .and_then(|us| us.flatrate)
        .map(|entries| entries.into_iter().map(|p| p.provider_name).collect())
        .unwrap_or_default();

    MovieProfile {
        id,
        title,
        overview,
        directors,
        cast,
        release_date,
        genres: genres.into_iter().map(|g| g.name).collect(),
        keywords: keywords
            .map(|list| list.keywords.into_iter().map(|k| k.name).collect())
            .unwrap_or_default(),
        rating: vote_average,
        providers,
        poster_url: poster_path
            .as_deref()
            .map(|path| image_url(image_base, path)),
        backdrop_urls: images
            .map(|list| {
                list.backdrops
                    .into_iter()
                    .map(|entry| image_url(image_base, &entry.file_path))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn person_profile(detail: PersonDetail, image_base: &str) -> PersonProfile {
    let PersonDetail {
        id,
        name,
        biography,
        birthday,
        place_of_birth,
        known_for_department,
        profile_path,
        movie_credits,
    } = detail;

    let mut credits: Vec<PersonCredit> = movie_credits.map(|c| c.cast).unwrap_or_default();
    credits.retain(|credit| credit.title.is_some());
    credits.sort_by(|a, b| {
        b.popularity
            .unwrap_or(0.0)
            .total_cmp(&a.popularity.unwrap_or(0.0))
    });
    let notable_films = credits
        .into_iter()
        .take(5)
        .map(|credit| NotableFilm {
            title: credit.title.unwrap_or_default(),
            year: credit
                .release_date
                .filter(|date| date.len() >= 4)
                .map(|date| date.chars().take(4).collect()),
        })
        .collect();

    PersonProfile {
        id,
        name,
        known_for: known_for_department,
        biography,
        birthday,
        place_of_birth,
        notable_films,
        photo_url: profile_path
            .as_deref()
            .map(|path| image_url(image_base, path)),
    }
}
