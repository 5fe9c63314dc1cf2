//! Error types for the Atrium SDK

use atrium_gateway_client::{AuthError, GatewayError};
use thiserror::Error;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK error types
#[derive(Debug, Error)]
pub enum SdkError {
    /// Authentication failure
    #[error("Auth error: {0}")]
    Auth(AuthError),

    /// Remote gateway failure
    #[error("Gateway error: {0}")]
    Gateway(GatewayError),

    /// Client-side validation failure
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation requires an authenticated session
    #[error("No active session")]
    NoSession,
}

impl From<GatewayError> for SdkError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Auth(auth) => SdkError::Auth(auth),
            other => SdkError::Gateway(other),
        }
    }
}

impl From<AuthError> for SdkError {
    fn from(err: AuthError) -> Self {
        SdkError::Auth(err)
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::Gateway(GatewayError::Json(err))
    }
}
