//! Identity repository
//!
//! All reads/writes of profile rows in the `users` table, including the
//! upsert-on-first-access contract the session provider relies on.

use crate::error::{Result, SdkError};
use crate::gateway::RowGateway;
use crate::model::{Identity, IdentityPatch};
use atrium_gateway_client::{Filter, GatewayError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) const USERS_TABLE: &str = "users";

/// Seed values for a profile that does not exist yet
#[derive(Debug, Clone)]
pub struct IdentitySeed {
    /// The auth user id; identity rows are keyed by it
    pub id: String,
    pub email: String,
    pub full_name: String,
}

/// Repository over the `users` table
#[derive(Clone)]
pub struct IdentityRepository {
    rows: Arc<dyn RowGateway>,
}

impl IdentityRepository {
    pub fn new(rows: Arc<dyn RowGateway>) -> Self {
        Self { rows }
    }

    /// Fetch a single identity by id
    pub async fn get(&self, id: &str) -> Result<Option<Identity>> {
        let rows = self
            .rows
            .select(USERS_TABLE, &Filter::eq("id", id), None, None)
            .await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// Fetch several identities by id, keyed by id
    pub(crate) async fn get_many(&self, ids: &[String]) -> Result<HashMap<String, Identity>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let values: Vec<Value> = ids.iter().map(|id| json!(id)).collect();
        let rows = self
            .rows
            .select(USERS_TABLE, &Filter::In("id".into(), values), None, None)
            .await?;

        let mut resolved = HashMap::new();
        for row in rows {
            let identity: Identity = serde_json::from_value(row)?;
            resolved.insert(identity.id.clone(), identity);
        }
        Ok(resolved)
    }

    /// Every identity except the given one
    pub async fn directory(&self, excluding: &str, limit: Option<u32>) -> Result<Vec<Identity>> {
        let rows = self
            .rows
            .select(USERS_TABLE, &Filter::neq("id", excluding), None, limit)
            .await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(SdkError::from))
            .collect()
    }

    /// Apply a partial update to a profile, returning the stored row
    ///
    /// Only the owning identity can mutate its row; the gateway enforces
    /// that through row-level auth on the session token.
    pub async fn update(&self, id: &str, patch: &IdentityPatch) -> Result<Identity> {
        if patch.is_empty() {
            return Err(SdkError::Validation("empty profile update".to_string()));
        }

        let rows = self
            .rows
            .update(USERS_TABLE, &Filter::eq("id", id), serde_json::to_value(patch)?)
            .await?;
        match rows.into_iter().next() {
            Some(row) => Ok(serde_json::from_value(row)?),
            None => Err(GatewayError::NotFound(format!("users.id = {}", id)).into()),
        }
    }

    /// Resolve the identity for an auth user, creating a default profile
    /// when none exists yet.
    ///
    /// Upsert-on-first-access contract: the `users.id` uniqueness constraint
    /// at the storage layer turns a lost insert race into a `Conflict`,
    /// which is recovered by re-selecting. Calling this twice for the same
    /// new user id yields exactly one row.
    pub async fn resolve_or_create(&self, seed: &IdentitySeed) -> Result<Identity> {
        if let Some(identity) = self.get(&seed.id).await? {
            return Ok(identity);
        }

        let row = json!({
            "id": seed.id,
            "email": seed.email,
            "full_name": seed.full_name,
            "skills": [],
            "education": [],
            "experience": [],
            "certifications": [],
        });

        match self.rows.insert(USERS_TABLE, row).await {
            Ok(stored) => Ok(serde_json::from_value(stored)?),
            Err(GatewayError::Conflict(_)) => {
                // lost the first-login race; the winner's row is authoritative
                tracing::debug!(user_id = %seed.id, "profile insert raced, re-resolving");
                self.get(&seed.id)
                    .await?
                    .ok_or_else(|| GatewayError::NotFound(format!("users.id = {}", seed.id)).into())
            }
            Err(err) => Err(err.into()),
        }
    }
}
