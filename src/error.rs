use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("API Error: {0}")]
    RemoteService(u16),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Failures of the research endpoint, whether it answered or not.
    pub fn is_remote(&self) -> bool {
        matches!(self, AppError::RemoteService(_) | AppError::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_status_is_shown_verbatim() {
        let err = AppError::RemoteService(500);
        assert_eq!(err.to_string(), "API Error: 500");
        assert!(err.is_remote());
    }

    #[test]
    fn validation_is_not_remote() {
        let err = AppError::validation("Please enter a topic name");
        assert_eq!(err.to_string(), "Please enter a topic name");
        assert!(!err.is_remote());
    }
}
