//! Error handling for SignalPilot
//!
//! This module defines the main error type used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for the SignalPilot application
#[derive(Error, Debug)]
pub enum SignalPilotError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for SignalPilot operations
pub type Result<T> = std::result::Result<T, SignalPilotError>;

impl SignalPilotError {
    /// Check if the error is recoverable (the update is acknowledged and the
    /// bot keeps running)
    pub fn is_recoverable(&self) -> bool {
        match self {
            SignalPilotError::Database(_) => true,
            SignalPilotError::Telegram(_) => true,
            SignalPilotError::Serialization(_) => false,
            SignalPilotError::Io(_) => true,
            SignalPilotError::UrlParse(_) => false,
            SignalPilotError::Config(_) => false,
            SignalPilotError::InvalidInput(_) => false,
        }
    }
}
