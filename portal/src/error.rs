//! Error types for the teacher portal
//!
//! All errors use thiserror for structured error handling.
//! Validation and authentication failures are kept as their own enums so the
//! front end can tell "the user typed something wrong" apart from storage or
//! network failures.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Routine not found: {0}")]
    RoutineNotFound(String),

    #[error("Credential store error: {0}")]
    Credentials(String),

    #[error("{0}")]
    Generic(String),
}

/// Failures of the authentication gate. None of them mutate state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("You are not authorized to use this app")]
    NotAuthorized,

    #[error("Password must be exactly {expected} characters (got {actual})")]
    InvalidPasswordLength { expected: usize, actual: usize },

    #[error("Invalid ID or Password!")]
    InvalidCredentials,

    #[error("No teacher is signed in")]
    NotSignedIn,
}

/// Boundary validation failures for routine and profile input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("Invalid time '{0}', expected HH:MM (24-hour)")]
    InvalidTime(String),

    #[error("Unknown class '{0}'")]
    UnknownClass(String),

    #[error("Section '{section}' does not exist for class {class_name}")]
    UnknownSection { class_name: String, section: String },

    #[error("Invalid image payload: {0}")]
    InvalidImage(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
