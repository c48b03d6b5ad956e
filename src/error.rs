//! Error handling for the Breastie client core

use std::fmt;
use thiserror::Error;

/// Unified error type for the Breastie client core
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// A form field was missing or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// A display date could not be parsed as `dd/mm/yyyy`
    #[error("Invalid date: {0}")]
    InvalidDate(#[from] crate::reminder::DateError),

    /// The document store refused a query before sending it
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A document or local entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A write was attempted without a signed-in user
    #[error("No authenticated user")]
    Unauthenticated,

    /// Document store errors
    #[error("Database error: {0}")]
    Database(String),

    /// Blob storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Chat-completion errors
    #[error("Chat error: {0}")]
    Chat(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

/// Convenience result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new query error
    pub fn invalid_query<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidQuery(msg.to_string())
    }

    /// Create a new not-found error
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    /// Create a new database error
    pub fn database<T: fmt::Display>(msg: T) -> Self {
        Error::Database(msg.to_string())
    }

    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Error::Storage(msg.to_string())
    }

    /// Create a new chat error
    pub fn chat<T: fmt::Display>(msg: T) -> Self {
        Error::Chat(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// Whether the error was raised by input validation, before any backend call
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::InvalidDate(_))
    }

    /// Text suitable for showing to the user
    ///
    /// Validation failures get a short message the user can act on by
    /// re-entering the form. Everything else is a backend failure and carries
    /// the underlying error text.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::InvalidDate(_) => "Invalid date format. Use dd/mm/yyyy".to_string(),
            Error::Unauthenticated => "Please sign in first".to_string(),
            other => format!("Something went wrong: {}", other),
        }
    }
}
