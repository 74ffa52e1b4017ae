//! External entity sources for Marquee.
//!
//! Wraps the TMDb and Wikipedia HTTP APIs behind the [`EntitySource`] trait
//! (search by name, fetch detail by id) and renders fetched records into
//! formatted text blocks, citations, and images for the chat engine.

pub mod client;
pub mod error;
pub mod format;
pub mod tmdb;
pub mod types;
pub mod wikipedia;

pub use client::EntitySource;
pub use error::SourceError;
pub use format::{format_candidate, format_profile};
pub use tmdb::{TmdbClient, TmdbMovies, TmdbPeople};
pub use types::{
    Candidate, EntityProfile, FormattedEntity, MovieProfile, NotableFilm, PersonProfile,
    TopicProfile,
};
pub use wikipedia::WikipediaClient;
