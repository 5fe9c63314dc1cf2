//! In-process gateway
//!
//! Table rows under a single lock, with the storage-layer behaviors the
//! repositories rely on:
//! - uniqueness constraint on `id` (duplicate insert → `Conflict`)
//! - generated `id`/`created_at` defaults on insert
//! - atomic `increment_likes`/`decrement_likes` procedures
//!
//! Backs the test suites. Not an offline mode: there is no persistence
//! and no row-level auth.

use super::{AuthGateway, RowGateway};
use async_trait::async_trait;
use atrium_gateway_client::{AuthError, AuthSession, AuthUser, Filter, GatewayError, Order, Result};
use chrono::Utc;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct MemoryAccount {
    user_id: String,
    password: String,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Value>>,
    /// Credential store keyed by email
    accounts: HashMap<String, MemoryAccount>,
    /// Issued tokens → user id
    tokens: HashMap<String, String>,
}

/// In-process implementation of [`RowGateway`] and [`AuthGateway`]
pub struct MemoryGateway {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    /// Number of rows currently in a table
    pub async fn row_count(&self, table: &str) -> usize {
        let state = self.state.lock().await;
        state.tables.get(table).map_or(0, |rows| rows.len())
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RowGateway for MemoryGateway {
    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Value> = state
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ord = compare_column(a, b, &order.column);
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        if let Some(limit) = limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        let mut row = match row {
            Value::Object(map) => map,
            other => {
                return Err(GatewayError::InvalidResponse(format!(
                    "insert expects an object row, got {}",
                    other
                )))
            }
        };

        let id = match row.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                row.insert("id".to_string(), json!(id));
                id
            }
        };
        if !row.contains_key("created_at") {
            row.insert("created_at".to_string(), json!(Utc::now().to_rfc3339()));
        }

        let mut state = self.state.lock().await;
        let rows = state.tables.entry(table.to_string()).or_default();
        if rows
            .iter()
            .any(|existing| existing.get("id").and_then(Value::as_str) == Some(id.as_str()))
        {
            return Err(GatewayError::Conflict(format!(
                "duplicate key: {}.id = {}",
                table, id
            )));
        }

        let stored = Value::Object(row);
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<Vec<Value>> {
        let patch = match patch {
            Value::Object(map) => map,
            other => {
                return Err(GatewayError::InvalidResponse(format!(
                    "update expects an object patch, got {}",
                    other
                )))
            }
        };

        let mut state = self.state.lock().await;
        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| filter.matches(r)) {
                if let Value::Object(map) = row {
                    for (key, value) in &patch {
                        map.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64> {
        let mut state = self.state.lock().await;
        let Some(rows) = state.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        Ok((before - rows.len()) as u64)
    }

    async fn rpc(&self, procedure: &str, params: Value) -> Result<Value> {
        let delta: i64 = match procedure {
            "increment_likes" => 1,
            "decrement_likes" => -1,
            other => return Err(GatewayError::NotFound(other.to_string())),
        };

        let post_id = params
            .get("post_id")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::InvalidResponse("rpc requires post_id".to_string()))?
            .to_string();

        let mut state = self.state.lock().await;
        let posts = state.tables.entry("posts".to_string()).or_default();
        for row in posts.iter_mut() {
            if row.get("id").and_then(Value::as_str) == Some(post_id.as_str()) {
                let current = row.get("likes_count").and_then(Value::as_i64).unwrap_or(0);
                // counter never goes below zero, matching the stored procedure
                let next = (current + delta).max(0);
                if let Value::Object(map) = row {
                    map.insert("likes_count".to_string(), json!(next));
                }
                return Ok(Value::Null);
            }
        }
        Err(GatewayError::NotFound(format!("posts.id = {}", post_id)))
    }
}

#[async_trait]
impl AuthGateway for MemoryGateway {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(email) {
            return Err(AuthError::EmailTaken.into());
        }

        let user_id = Uuid::new_v4().to_string();
        state.accounts.insert(
            email.to_string(),
            MemoryAccount {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );

        let access_token = Uuid::new_v4().to_string();
        state.tokens.insert(access_token.clone(), user_id.clone());
        Ok(AuthSession {
            access_token,
            user: AuthUser {
                id: user_id,
                email: Some(email.to_string()),
            },
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let mut state = self.state.lock().await;
        let user_id = match state.accounts.get(email) {
            Some(account) if account.password == password => account.user_id.clone(),
            _ => return Err(AuthError::InvalidCredentials.into()),
        };

        let access_token = Uuid::new_v4().to_string();
        state.tokens.insert(access_token.clone(), user_id.clone());
        Ok(AuthSession {
            access_token,
            user: AuthUser {
                id: user_id,
                email: Some(email.to_string()),
            },
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.tokens.remove(access_token).is_none() {
            return Err(AuthError::SessionExpired.into());
        }
        Ok(())
    }

    async fn current_user(&self, access_token: &str) -> Result<AuthUser> {
        let state = self.state.lock().await;
        let user_id = state
            .tokens
            .get(access_token)
            .ok_or(AuthError::SessionExpired)?
            .clone();
        let email = state
            .accounts
            .iter()
            .find(|(_, account)| account.user_id == user_id)
            .map(|(email, _)| email.clone());
        Ok(AuthUser { id: user_id, email })
    }
}

fn compare_column(a: &Value, b: &Value, column: &str) -> Ordering {
    match (a.get(column), b.get(column)) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_generates_id_and_created_at() {
        let gw = MemoryGateway::new();
        let row = gw
            .insert("posts", json!({"user_id": "u1", "content": "hi"}))
            .await
            .unwrap();
        assert!(row.get("id").and_then(Value::as_str).is_some());
        assert!(row.get("created_at").and_then(Value::as_str).is_some());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_a_conflict() {
        let gw = MemoryGateway::new();
        gw.insert("users", json!({"id": "u1"})).await.unwrap();
        let err = gw.insert("users", json!({"id": "u1"})).await.unwrap_err();
        assert!(matches!(err, GatewayError::Conflict(_)));
        assert_eq!(gw.row_count("users").await, 1);
    }

    #[tokio::test]
    async fn test_counter_rpc_floors_at_zero() {
        let gw = MemoryGateway::new();
        gw.insert("posts", json!({"id": "p1", "likes_count": 0}))
            .await
            .unwrap();

        gw.rpc("decrement_likes", json!({"post_id": "p1"})).await.unwrap();
        gw.rpc("increment_likes", json!({"post_id": "p1"})).await.unwrap();
        gw.rpc("increment_likes", json!({"post_id": "p1"})).await.unwrap();

        let rows = gw
            .select("posts", &Filter::eq("id", "p1"), None, None)
            .await
            .unwrap();
        assert_eq!(rows[0]["likes_count"], 2);
    }

    #[tokio::test]
    async fn test_unknown_procedure_is_not_found() {
        let gw = MemoryGateway::new();
        let err = gw.rpc("reset_likes", json!({"post_id": "p1"})).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_order_and_limit() {
        let gw = MemoryGateway::new();
        for (id, at) in [("a", "2024-01-01T00:00:00Z"), ("b", "2024-03-01T00:00:00Z"), ("c", "2024-02-01T00:00:00Z")] {
            gw.insert("posts", json!({"id": id, "created_at": at}))
                .await
                .unwrap();
        }

        let rows = gw
            .select(
                "posts",
                &Filter::All(vec![]),
                Some(&Order::desc("created_at")),
                Some(2),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "b");
        assert_eq!(rows[1]["id"], "c");
    }
}
