//! Rendering fetched records into prompt blocks, citations, and images.
//!
//! All functions here are pure. Each entity yields exactly one citation whose
//! title carries a source suffix ("- TMDb", "- Wikipedia") so co-numbered
//! citations in a combined answer stay distinguishable.

use marquee_core::{Citation, ImageData, SourceKind};

use crate::types::{
    Candidate, EntityProfile, FormattedEntity, MovieProfile, PersonProfile, TopicProfile,
};
use crate::wikipedia::article_url;

/// Render a full detail record.
pub fn format_profile(profile: &EntityProfile, max_images: usize) -> FormattedEntity {
    match profile {
        EntityProfile::Movie(movie) => format_movie(movie, max_images),
        EntityProfile::Person(person) => format_person(person, max_images),
        EntityProfile::Topic(topic) => format_topic(topic, max_images),
    }
}

/// Render a degraded block from a search candidate, used when the detail
/// fetch came back empty. Only the fields search returned are shown.
pub fn format_candidate(candidate: &Candidate, kind: SourceKind) -> FormattedEntity {
    match kind {
        SourceKind::Movie => format_movie_candidate(candidate),
        SourceKind::Person => format_person_candidate(candidate),
        SourceKind::Topic => format_topic_candidate(candidate),
    }
}

// =============================================================================
// Movies
// =============================================================================

fn format_movie(movie: &MovieProfile, max_images: usize) -> FormattedEntity {
    let overview = movie
        .overview
        .as_deref()
        .unwrap_or("No overview available.");

    let mut lines = vec![
        format!("Title: {}", movie.title),
        format!("Overview: {}", overview),
        format!("Director(s): {}", movie.directors.join(", ")),
        format!(
            "Main Cast: {}",
            movie
                .cast
                .iter()
                .take(5)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ),
        format!(
            "Release Date: {}",
            movie.release_date.as_deref().unwrap_or("Unknown")
        ),
        format!("Genres: {}", movie.genres.join(", ")),
        format!("Themes/Keywords: {}", movie.keywords.join(", ")),
        match movie.rating {
            Some(rating) => format!("Rating: {}/10", rating),
            None => "Rating: N/A".to_string(),
        },
    ];
    if !movie.providers.is_empty() {
        lines.push(format!("Available on: {}", movie.providers.join(", ")));
    }

    let mut images = Vec::new();
    if let Some(poster) = &movie.poster_url {
        images.push(ImageData {
            url: poster.clone(),
            alt: format!("{} poster", movie.title),
            caption: Some(format!("Official poster for {}", movie.title)),
        });
    }
    for backdrop in &movie.backdrop_urls {
        if images.len() >= max_images {
            break;
        }
        images.push(ImageData {
            url: backdrop.clone(),
            alt: format!("{} scene", movie.title),
            caption: Some(format!("Scene from {}", movie.title)),
        });
    }
    images.truncate(max_images);

    FormattedEntity {
        name: movie.title.clone(),
        text: lines.join("\n"),
        citation: Citation {
            text: overview.to_string(),
            url: format!("https://www.themoviedb.org/movie/{}", movie.id),
            title: format!("{} - TMDb", movie.title),
        },
        images,
    }
}

fn format_movie_candidate(candidate: &Candidate) -> FormattedEntity {
    let overview = candidate
        .summary
        .as_deref()
        .unwrap_or("No overview available");

    let lines = vec![
        format!("Title: {}", candidate.name),
        format!("Overview: {}", overview),
        format!(
            "Release Date: {}",
            candidate.date.as_deref().unwrap_or("Unknown")
        ),
        match candidate.rating {
            Some(rating) => format!("Rating: {} (out of 10)", rating),
            None => "Rating: Not rated".to_string(),
        },
    ];

    let mut images = Vec::new();
    if let Some(url) = &candidate.image_url {
        images.push(ImageData {
            url: url.clone(),
            alt: format!("{} poster", candidate.name),
            caption: Some(format!("Official poster for {}", candidate.name)),
        });
    }

    FormattedEntity {
        name: candidate.name.clone(),
        text: lines.join("\n"),
        citation: Citation {
            text: overview.to_string(),
            url: format!("https://www.themoviedb.org/movie/{}", candidate.id),
            title: format!("{} - TMDb", candidate.name),
        },
        images,
    }
}

// =============================================================================
// People
// =============================================================================

fn format_person(person: &PersonProfile, max_images: usize) -> FormattedEntity {
    let biography = person
        .biography
        .as_deref()
        .filter(|b| !b.is_empty())
        .unwrap_or("No biography available.");

    let mut lines = vec![format!("Name: {}", person.name)];
    if let Some(known_for) = &person.known_for {
        lines.push(format!("Known For: {}", known_for));
    }
    lines.push(format!("Biography: {}", biography));
    if let Some(birthday) = &person.birthday {
        match &person.place_of_birth {
            Some(place) => lines.push(format!("Born: {} in {}", birthday, place)),
            None => lines.push(format!("Born: {}", birthday)),
        }
    }
    if !person.notable_films.is_empty() {
        let films: Vec<String> = person
            .notable_films
            .iter()
            .map(|film| match &film.year {
                Some(year) => format!("{} ({})", film.title, year),
                None => film.title.clone(),
            })
            .collect();
        lines.push(format!("Notable Films: {}", films.join(", ")));
    }

    let mut images = Vec::new();
    if let Some(photo) = &person.photo_url {
        images.push(ImageData {
            url: photo.clone(),
            alt: format!("{} photo", person.name),
            caption: Some(format!("Photo of {}", person.name)),
        });
    }
    images.truncate(max_images);

    FormattedEntity {
        name: person.name.clone(),
        text: lines.join("\n"),
        citation: Citation {
            text: biography.to_string(),
            url: format!("https://www.themoviedb.org/person/{}", person.id),
            title: format!("{} - TMDb", person.name),
        },
        images,
    }
}

fn format_person_candidate(candidate: &Candidate) -> FormattedEntity {
    let mut lines = vec![format!("Name: {}", candidate.name)];
    if let Some(known_for) = &candidate.summary {
        lines.push(format!("Known For: {}", known_for));
    }

    let mut images = Vec::new();
    if let Some(url) = &candidate.image_url {
        images.push(ImageData {
            url: url.clone(),
            alt: format!("{} photo", candidate.name),
            caption: Some(format!("Photo of {}", candidate.name)),
        });
    }

    FormattedEntity {
        name: candidate.name.clone(),
        text: lines.join("\n"),
        citation: Citation {
            text: candidate
                .summary
                .clone()
                .unwrap_or_else(|| "No details available".to_string()),
            url: format!("https://www.themoviedb.org/person/{}", candidate.id),
            title: format!("{} - TMDb", candidate.name),
        },
        images,
    }
}

// =============================================================================
// Topics
// =============================================================================

fn format_topic(topic: &TopicProfile, max_images: usize) -> FormattedEntity {
    let extract = if topic.extract.is_empty() {
        "No content available."
    } else {
        topic.extract.as_str()
    };

    let mut images = Vec::new();
    if let Some(thumbnail) = &topic.thumbnail_url {
        images.push(ImageData {
            url: thumbnail.clone(),
            alt: format!("{} image", topic.title),
            caption: Some(format!("Image from Wikipedia article: {}", topic.title)),
        });
    }
    images.truncate(max_images);

    FormattedEntity {
        name: topic.title.clone(),
        text: format!("Wikipedia information about '{}':\n{}", topic.title, extract),
        citation: Citation {
            text: extract.to_string(),
            url: topic
                .url
                .clone()
                .unwrap_or_else(|| article_url(&topic.title)),
            title: format!("{} - Wikipedia", topic.title),
        },
        images,
    }
}

fn format_topic_candidate(candidate: &Candidate) -> FormattedEntity {
    let snippet = candidate
        .summary
        .as_deref()
        .unwrap_or("No content available.");

    FormattedEntity {
        name: candidate.name.clone(),
        text: format!(
            "Wikipedia information about '{}':\n{}",
            candidate.name, snippet
        ),
        citation: Citation {
            text: snippet.to_string(),
            url: article_url(&candidate.name),
            title: format!("{} - Wikipedia", candidate.name),
        },
        images: Vec::new(),
    }
}
