//! Gateway trait implementations over the HTTP client

use super::{AuthGateway, RowGateway};
use async_trait::async_trait;
use atrium_gateway_client::{AuthSession, AuthUser, Filter, GatewayClient, Order, Result};
use serde_json::Value;

#[async_trait]
impl RowGateway for GatewayClient {
    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>> {
        GatewayClient::select(self, table, filter, order, limit).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        GatewayClient::insert(self, table, &row).await
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<Vec<Value>> {
        GatewayClient::update(self, table, filter, &patch).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64> {
        GatewayClient::delete(self, table, filter).await
    }

    async fn rpc(&self, procedure: &str, params: Value) -> Result<Value> {
        GatewayClient::rpc(self, procedure, &params).await
    }

    fn set_access_token(&self, token: Option<String>) {
        GatewayClient::set_access_token(self, token)
    }
}

#[async_trait]
impl AuthGateway for GatewayClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        GatewayClient::sign_up(self, email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        GatewayClient::sign_in_with_password(self, email, password).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        GatewayClient::sign_out(self, access_token).await
    }

    async fn current_user(&self, access_token: &str) -> Result<AuthUser> {
        GatewayClient::current_user(self, access_token).await
    }
}
