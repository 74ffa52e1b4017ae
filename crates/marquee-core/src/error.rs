use thiserror::Error;

/// Top-level error type for the Marquee system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for MarqueeError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MarqueeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for MarqueeError {
    fn from(err: toml::de::Error) -> Self {
        MarqueeError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MarqueeError {
    fn from(err: toml::ser::Error) -> Self {
        MarqueeError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MarqueeError {
    fn from(err: serde_json::Error) -> Self {
        MarqueeError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Marquee operations.
pub type Result<T> = std::result::Result<T, MarqueeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MarqueeError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(MarqueeError, &str)> = vec![
            (
                MarqueeError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                MarqueeError::Generation("model timeout".to_string()),
                "Generation error: model timeout",
            ),
            (
                MarqueeError::Source("lookup failed".to_string()),
                "Source error: lookup failed",
            ),
            (
                MarqueeError::Chat("turn aborted".to_string()),
                "Chat error: turn aborted",
            ),
            (
                MarqueeError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                MarqueeError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MarqueeError = io_err.into();
        assert!(matches!(err, MarqueeError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        assert!(parsed.is_err());
        let err: MarqueeError = parsed.unwrap_err().into();
        assert!(matches!(err, MarqueeError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad_json = "{ invalid json }";
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        assert!(parsed.is_err());
        let err: MarqueeError = parsed.unwrap_err().into();
        assert!(matches!(err, MarqueeError::Serialization(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(MarqueeError::Config("fail".to_string()))
        }

        assert_eq!(returns_ok().unwrap(), 42);
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }

    #[test]
    fn test_error_debug_impl() {
        let err = MarqueeError::Generation("test debug".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Generation"));
        assert!(debug_str.contains("test debug"));
    }
}
