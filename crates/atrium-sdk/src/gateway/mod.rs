//! Gateway trait seams
//!
//! Repositories and the session provider take these traits by `Arc`
//! instead of reaching for an ambient global client. The HTTP
//! implementation delegates to `atrium-gateway-client`; the in-process
//! implementation backs the test suites.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use atrium_gateway_client::{AuthSession, AuthUser, Filter, Order, Result};
use serde_json::Value;

pub use memory::MemoryGateway;

/// Row CRUD and stored-procedure surface of the remote data gateway
#[async_trait]
pub trait RowGateway: Send + Sync {
    /// Select rows matching a filter
    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>>;

    /// Insert a single row, returning the stored representation
    async fn insert(&self, table: &str, row: Value) -> Result<Value>;

    /// Patch rows matching a filter, returning the updated representations
    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<Vec<Value>>;

    /// Delete rows matching a filter, returning how many were removed
    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64>;

    /// Call a stored procedure
    async fn rpc(&self, procedure: &str, params: Value) -> Result<Value>;

    /// Attach a session token to subsequent row operations
    ///
    /// Row-level auth at the remote gateway keys off this token. The
    /// in-process gateway has no row-level auth and keeps the default no-op.
    fn set_access_token(&self, _token: Option<String>) {}
}

/// Credential surface of the gateway's auth service
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Create a credential and return the initial session
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Exchange email/password for a session
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Revoke a session token
    async fn sign_out(&self, access_token: &str) -> Result<()>;

    /// Resolve the user behind a session token
    async fn current_user(&self, access_token: &str) -> Result<AuthUser>;
}
