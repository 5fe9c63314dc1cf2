//! Auth endpoints of the gateway
//!
//! Token-based credential surface under `/auth/v1`: sign-up, password grant,
//! sign-out, and session-user retrieval. Credential storage and token
//! issuance are owned by the gateway; this module only maps the HTTP
//! surface to typed results.

use crate::client::GatewayClient;
use crate::error::{AuthError, GatewayError, Result};
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The authenticated credential holder, as reported by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// Opaque unique user id; identity rows are keyed by this
    pub id: String,
    pub email: Option<String>,
}

/// An issued session: bearer token plus the user it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthUser,
}

impl GatewayClient {
    /// Create a credential and return the initial session
    ///
    /// Creating the corresponding identity row is the caller's concern;
    /// the auth service knows nothing about profiles.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        let url = format!("{}/auth/v1/signup", self.config().base_url);
        let response = self
            .authorize(self.client_post(&url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        Self::handle_auth_response(response, |status, body| {
            if status == StatusCode::UNPROCESSABLE_ENTITY || body.contains("already registered") {
                AuthError::EmailTaken
            } else {
                AuthError::Other(body.to_string())
            }
        })
        .await
    }

    /// Exchange email/password for a session (password grant)
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        let url = format!(
            "{}/auth/v1/token?grant_type=password",
            self.config().base_url
        );
        let response = self
            .authorize(self.client_post(&url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        Self::handle_auth_response(response, |status, body| {
            if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
                AuthError::InvalidCredentials
            } else {
                AuthError::Other(body.to_string())
            }
        })
        .await
    }

    /// Revoke the given session token
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let url = format!("{}/auth/v1/logout", self.config().base_url);
        let response = self
            .client_post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AuthError::SessionExpired.into());
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Server { status, message: body });
        }
        Ok(())
    }

    /// Resolve the user behind a session token
    pub async fn current_user(&self, access_token: &str) -> Result<AuthUser> {
        let url = format!("{}/auth/v1/user", self.config().base_url);
        let response = self
            .client_get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AuthError::SessionExpired.into());
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Server { status, message: body });
        }

        Ok(response.json().await?)
    }

    async fn handle_auth_response(
        response: reqwest::Response,
        classify: impl FnOnce(StatusCode, &str) -> AuthError,
    ) -> Result<AuthSession> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, &body).into());
        }
        Ok(response.json().await?)
    }
}
