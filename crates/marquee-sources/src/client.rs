//! The `EntitySource` trait: search by name, fetch detail by id.

use async_trait::async_trait;

use marquee_core::{Result, SourceKind};

use crate::types::{Candidate, EntityProfile};

/// A backing service for one entity kind.
///
/// Both operations treat "nothing there" as a successful empty result:
/// `search` returns an empty list and `detail` returns `None`. Errors are
/// reserved for transport failures. The resolver depends on this trait so
/// tests can substitute scripted sources and count external calls.
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// The kind of entity this source resolves.
    fn kind(&self) -> SourceKind;

    /// Search for candidates by free-text name, best match first.
    async fn search(&self, name: &str) -> Result<Vec<Candidate>>;

    /// Fetch the full record for a candidate id from [`search`].
    ///
    /// [`search`]: EntitySource::search
    async fn detail(&self, id: &str) -> Result<Option<EntityProfile>>;
}
