use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListsError {
    #[error("API request failed: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("Service {service} responded with status {status}")]
    StatusError { service: String, status: u16 },

    #[error("Malformed JSON body: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("Accessor path '{path}': segment '{segment}' not found")]
    AccessorNotFound { path: String, segment: String },

    #[error("Accessor path '{path}': wrong type at '{segment}': {reason}")]
    AccessorWrongType {
        path: String,
        segment: String,
        reason: String,
    },

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid config value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ListsError>;
