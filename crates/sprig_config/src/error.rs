//! Configuration errors.

/// Errors produced while reading `sprig.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML is malformed or has wrongly typed fields.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A value parsed but is not acceptable.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected '='".to_string());
        assert_eq!(err.to_string(), "failed to parse configuration: expected '='");
    }

    #[test]
    fn display_validation_error() {
        let err = ConfigError::ValidationError("cache.root must not be empty".to_string());
        assert_eq!(
            err.to_string(),
            "validation error: cache.root must not be empty"
        );
    }
}
