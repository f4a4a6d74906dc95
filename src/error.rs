use thiserror::Error;

#[derive(Debug, Error)]
pub enum NewstrendsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No GKG artifact available for {0}")]
    NoArtifact(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = NewstrendsError::Parse {
            line: 42,
            message: "bad field".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("42"));
        assert!(msg.contains("bad field"));
    }

    #[test]
    fn test_no_artifact_display() {
        let err = NewstrendsError::NoArtifact("2024-05-01".to_string());
        let msg = format!("{err}");
        assert!(msg.contains("2024-05-01"));
    }

    #[test]
    fn test_other_error_display() {
        let err = NewstrendsError::Other("custom error".to_string());
        assert_eq!(format!("{err}"), "custom error");
    }
}
