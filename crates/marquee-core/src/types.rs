use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// The category of entity and the external source that backs it.
///
/// Kinds are ordered: aggregation merges movie blocks before people before
/// topics, so citation numbering across kinds is deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Film metadata from the movie database.
    Movie,
    /// Actor/director metadata from the movie database.
    Person,
    /// Background and analysis topics from the encyclopedia.
    Topic,
}

impl SourceKind {
    /// All kinds in aggregation merge order.
    pub const ALL: [SourceKind; 3] = [SourceKind::Movie, SourceKind::Person, SourceKind::Topic];

    /// Lowercase label used in prompts and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Movie => "movie",
            SourceKind::Person => "person",
            SourceKind::Topic => "topic",
        }
    }
}

/// The sender of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

// =============================================================================
// Citations and images
// =============================================================================

/// A reference to source material backing a factual statement.
///
/// Titles carry a source suffix ("Inception - TMDb", "Film noir - Wikipedia")
/// so co-numbered citations in a combined answer remain distinguishable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Quoted excerpt from the source (overview, extract).
    pub text: String,
    /// URL of the source record.
    pub url: String,
    /// Display title with source suffix.
    pub title: String,
}

/// An image attached to a resolved entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    /// Full image URL.
    pub url: String,
    /// Alternative text.
    pub alt: String,
    /// Optional caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// A suggested follow-up query shown to the user after a response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelatedQuery {
    pub text: String,
}

impl RelatedQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

// =============================================================================
// Messages and conversations
// =============================================================================

/// A single message in a conversation.
///
/// Messages are appended, never mutated or removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Set when the message records a turn failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageData>>,
}

impl Message {
    /// A user message with the current timestamp.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            error: None,
            citations: None,
            images: None,
        }
    }

    /// An assistant message with the current timestamp.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            error: None,
            citations: None,
            images: None,
        }
    }

    /// An assistant message recording a turn failure.
    pub fn turn_error(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            error: Some(true),
            citations: None,
            images: None,
        }
    }

    /// Attach citations, dropping the field entirely when the list is `None`.
    pub fn with_citations(mut self, citations: Option<Vec<Citation>>) -> Self {
        self.citations = citations;
        self
    }

    /// Attach images, dropping the field entirely when the list is `None`.
    pub fn with_images(mut self, images: Option<Vec<ImageData>>) -> Self {
        self.images = images;
        self
    }
}

/// A complete conversation between a user and the assistant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Opaque identifier, minted by the server when the client sends none.
    pub id: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation with both timestamps set to now.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ---- SourceKind ----

    #[test]
    fn test_source_kind_order() {
        assert_eq!(
            SourceKind::ALL,
            [SourceKind::Movie, SourceKind::Person, SourceKind::Topic]
        );
        assert!(SourceKind::Movie < SourceKind::Person);
        assert!(SourceKind::Person < SourceKind::Topic);
    }

    #[test]
    fn test_source_kind_labels() {
        assert_eq!(SourceKind::Movie.label(), "movie");
        assert_eq!(SourceKind::Person.label(), "person");
        assert_eq!(SourceKind::Topic.label(), "topic");
    }

    #[test]
    fn test_source_kind_serde() {
        let json = serde_json::to_string(&SourceKind::Movie).unwrap();
        assert_eq!(json, "\"movie\"");
        let kind: SourceKind = serde_json::from_str("\"topic\"").unwrap();
        assert_eq!(kind, SourceKind::Topic);
    }

    // ---- MessageRole ----

    #[test]
    fn test_message_role_serde() {
        assert_eq!(
            serde_json::to_string(&MessageRole::User).unwrap(),
            "\"user\""
        );
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    // ---- Message constructors ----

    #[test]
    fn test_message_user() {
        let msg = Message::user("hello");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, "hello");
        assert!(msg.error.is_none());
        assert!(msg.citations.is_none());
        assert!(msg.images.is_none());
    }

    #[test]
    fn test_message_assistant() {
        let msg = Message::assistant("hi there");
        assert_eq!(msg.role, MessageRole::Assistant);
        assert!(msg.error.is_none());
    }

    #[test]
    fn test_message_turn_error() {
        let msg = Message::turn_error("Error: upstream timeout");
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.error, Some(true));
        assert!(msg.content.starts_with("Error:"));
    }

    #[test]
    fn test_message_with_citations_and_images() {
        let citation = Citation {
            text: "A thief who steals corporate secrets".to_string(),
            url: "https://www.themoviedb.org/movie/27205".to_string(),
            title: "Inception - TMDb".to_string(),
        };
        let image = ImageData {
            url: "https://image.tmdb.org/t/p/original/poster.jpg".to_string(),
            alt: "Inception poster".to_string(),
            caption: Some("Official poster for Inception".to_string()),
        };
        let msg = Message::assistant("answer")
            .with_citations(Some(vec![citation.clone()]))
            .with_images(Some(vec![image.clone()]));
        assert_eq!(msg.citations.as_ref().unwrap()[0], citation);
        assert_eq!(msg.images.as_ref().unwrap()[0], image);
    }

    // ---- Serde shape ----

    #[test]
    fn test_message_optional_fields_omitted() {
        let msg = Message::user("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("error"));
        assert!(!json.contains("citations"));
        assert!(!json.contains("images"));
    }

    #[test]
    fn test_message_deserialize_without_optionals() {
        let json = r#"{
            "role": "user",
            "content": "hello",
            "timestamp": "2026-01-15T10:00:00Z"
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.role, MessageRole::User);
        assert!(msg.error.is_none());
        assert!(msg.citations.is_none());
    }

    #[test]
    fn test_image_caption_omitted_when_none() {
        let image = ImageData {
            url: "https://example.com/a.jpg".to_string(),
            alt: "a".to_string(),
            caption: None,
        };
        let json = serde_json::to_string(&image).unwrap();
        assert!(!json.contains("caption"));
    }

    #[test]
    fn test_citation_roundtrip() {
        let citation = Citation {
            text: "extract".to_string(),
            url: "https://en.wikipedia.org/wiki/Film_noir".to_string(),
            title: "Film noir - Wikipedia".to_string(),
        };
        let json = serde_json::to_string(&citation).unwrap();
        let back: Citation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, citation);
    }

    // ---- Conversation ----

    #[test]
    fn test_conversation_new() {
        let conv = Conversation::new("abc-123");
        assert_eq!(conv.id, "abc-123");
        assert!(conv.messages.is_empty());
        assert_eq!(conv.created_at, conv.updated_at);
    }

    #[test]
    fn test_related_query_new() {
        let q = RelatedQuery::new("What else did Christopher Nolan direct?");
        assert_eq!(q.text, "What else did Christopher Nolan direct?");
    }
}
