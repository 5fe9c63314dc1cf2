//! Error types for the gateway client

use thiserror::Error;

/// Gateway client error
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Gateway returned an error
    #[error("Gateway error {status}: {message}")]
    Server { status: u16, message: String },

    /// Row or procedure not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness or other constraint violation
    #[error("Constraint violation: {0}")]
    Conflict(String),

    /// Invalid response from gateway
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication failure
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// Authentication error, surfaced by the auth endpoints
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email/password combination
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// An account already exists for this email
    #[error("Email already registered")]
    EmailTaken,

    /// Access token missing, expired, or revoked
    #[error("Session expired")]
    SessionExpired,

    /// Any other auth service failure
    #[error("Auth service error: {0}")]
    Other(String),
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
