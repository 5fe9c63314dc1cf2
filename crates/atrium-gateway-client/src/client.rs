//! HTTP client for the Atrium remote data gateway
//!
//! The gateway exposes a PostgREST-style row surface under `/rest/v1` and a
//! token-based auth surface under `/auth/v1`. This module covers the row
//! CRUD and stored-procedure calls; the auth endpoints live in [`crate::auth`].

use crate::error::{GatewayError, Result};
use crate::filter::{Filter, Order};
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use std::sync::RwLock;
use std::time::Duration;

/// Configuration for [`GatewayClient`]
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway base URL (e.g., "https://project.example.co")
    pub base_url: String,
    /// Project API key, sent as the `apikey` header on every request
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// HTTP client for the gateway's row CRUD and RPC surface
///
/// # Example
///
/// ```rust,no_run
/// use atrium_gateway_client::{GatewayClient, GatewayConfig, Filter};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GatewayClient::new(GatewayConfig {
///     base_url: "https://project.example.co".into(),
///     ..Default::default()
/// });
///
/// // Rows where the identity is either party
/// let rows = client
///     .select(
///         "connections",
///         &Filter::Any(vec![
///             Filter::eq("follower_id", "me"),
///             Filter::eq("following_id", "me"),
///         ]),
///         None,
///         None,
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct GatewayClient {
    config: GatewayConfig,
    client: Client,
    /// Bearer token applied to requests once a user session exists.
    /// Row-level auth at the gateway keys off this token.
    access_token: RwLock<Option<String>>,
}

impl GatewayClient {
    /// Create a new gateway client
    pub fn new(config: GatewayConfig) -> Self {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            headers.insert(
                "apikey",
                header::HeaderValue::from_str(api_key).expect("Invalid API key"),
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            config,
            client,
            access_token: RwLock::new(None),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Set (or clear) the bearer token used for subsequent requests
    pub fn set_access_token(&self, token: Option<String>) {
        let mut guard = self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = token;
    }

    /// The current bearer token, if a session is active
    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    // ==================== Row CRUD ====================

    /// Select rows matching a filter
    pub async fn select(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(filter.to_query_params());
        if let Some(order) = order {
            params.push(("order".to_string(), order.to_query_value()));
        }
        if let Some(limit) = limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        let url = self.table_url(table, &params);
        let response = self.authorize(self.client.get(&url)).send().await?;
        self.handle_response(response).await
    }

    /// Insert a single row, returning the stored representation
    pub async fn insert(&self, table: &str, row: &Value) -> Result<Value> {
        let url = self.table_url(table, &[]);
        let response = self
            .authorize(self.client.post(&url))
            .header("Prefer", "return=representation")
            .header(header::CONTENT_TYPE, "application/json")
            .json(row)
            .send()
            .await?;

        let mut rows: Vec<Value> = self.handle_response(response).await?;
        if rows.is_empty() {
            return Err(GatewayError::InvalidResponse(
                "insert returned no representation".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    /// Patch rows matching a filter, returning the updated representations
    pub async fn update(&self, table: &str, filter: &Filter, patch: &Value) -> Result<Vec<Value>> {
        let params = filter.to_query_params();
        let url = self.table_url(table, &params);
        let response = self
            .authorize(self.client.patch(&url))
            .header("Prefer", "return=representation")
            .header(header::CONTENT_TYPE, "application/json")
            .json(patch)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete rows matching a filter, returning how many were removed
    pub async fn delete(&self, table: &str, filter: &Filter) -> Result<u64> {
        let params = filter.to_query_params();
        let url = self.table_url(table, &params);
        let response = self
            .authorize(self.client.delete(&url))
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let rows: Vec<Value> = self.handle_response(response).await?;
        Ok(rows.len() as u64)
    }

    // ==================== RPC ====================

    /// Call a stored procedure
    ///
    /// Counter procedures (`increment_likes`, `decrement_likes`) go through
    /// here so the mutation is atomic at the storage layer instead of a
    /// read-modify-write from the client.
    pub async fn rpc(&self, procedure: &str, params: &Value) -> Result<Value> {
        let url = format!(
            "{}/rest/v1/rpc/{}",
            self.config.base_url,
            urlencoding::encode(procedure)
        );

        let response = self
            .authorize(self.client.post(&url))
            .header(header::CONTENT_TYPE, "application/json")
            .json(params)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(procedure.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Server { status, message: body });
        }

        let body = response.text().await?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    // ==================== Helper Methods ====================

    fn table_url(&self, table: &str, params: &[(String, String)]) -> String {
        let mut url = format!(
            "{}/rest/v1/{}",
            self.config.base_url,
            urlencoding::encode(table)
        );
        if !params.is_empty() {
            let rendered: Vec<String> = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&rendered.join("&"));
        }
        url
    }

    pub(crate) fn client_get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url)
    }

    pub(crate) fn client_post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.post(url)
    }

    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let token = self.access_token().or_else(|| self.config.api_key.clone());
        match token {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound("Resource not found".to_string()));
        }

        if response.status() == StatusCode::CONFLICT {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Conflict(body));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Server {
                status,
                message: body,
            });
        }

        let body = response.json().await?;
        Ok(body)
    }
}
