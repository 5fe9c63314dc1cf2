//! Connection repository
//!
//! Reads and mutates the directed follow/collaboration edges of the
//! signed-in identity. Edges live in the `connections` table; both party
//! records are resolved client-side with a batch fetch.

use crate::error::{Result, SdkError};
use crate::gateway::RowGateway;
use crate::identity::IdentityRepository;
use crate::model::{Connection, ConnectionStatus, ConnectionWithParties};
use atrium_gateway_client::{Filter, GatewayError};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

pub(crate) const CONNECTIONS_TABLE: &str = "connections";

/// Repository over the `connections` table, scoped to one identity
#[derive(Clone)]
pub struct ConnectionRepository {
    rows: Arc<dyn RowGateway>,
    identities: IdentityRepository,
    self_id: String,
}

impl ConnectionRepository {
    pub fn new(rows: Arc<dyn RowGateway>, self_id: impl Into<String>) -> Self {
        let identities = IdentityRepository::new(rows.clone());
        Self {
            rows,
            identities,
            self_id: self_id.into(),
        }
    }

    /// The identity this repository is scoped to
    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// Accepted edges where this identity is either party, with both
    /// party records resolved
    pub async fn list_connections(&self) -> Result<Vec<ConnectionWithParties>> {
        let filter = Filter::All(vec![
            self.either_side(),
            Filter::eq("status", "accepted"),
        ]);
        let connections = self.fetch(&filter).await?;
        self.resolve_parties(connections).await
    }

    /// Incoming pending requests (this identity is the target)
    ///
    /// Outgoing pending requests are a separate derived set, see
    /// [`Self::pending_outgoing_ids`].
    pub async fn list_pending_requests(&self) -> Result<Vec<ConnectionWithParties>> {
        let filter = Filter::All(vec![
            Filter::eq("following_id", self.self_id.as_str()),
            Filter::eq("status", "pending"),
        ]);
        let requests = self.fetch(&filter).await?;
        self.resolve_parties(requests).await
    }

    /// Target ids of this identity's outgoing pending requests
    pub async fn pending_outgoing_ids(&self) -> Result<HashSet<String>> {
        let filter = Filter::All(vec![
            Filter::eq("follower_id", self.self_id.as_str()),
            Filter::eq("status", "pending"),
        ]);
        let outgoing = self.fetch(&filter).await?;
        Ok(outgoing.into_iter().map(|c| c.target_id).collect())
    }

    /// Send a connection request to another identity
    ///
    /// Duplicate-edge policy: an existing edge between the pair
    /// short-circuits. Same direction → that edge is returned untouched.
    /// Reverse pending → both sides want the connection, so the existing
    /// edge is accepted in place instead of creating a second one.
    pub async fn send_request(&self, target_id: &str) -> Result<Connection> {
        if target_id == self.self_id {
            return Err(SdkError::Validation(
                "cannot send a connection request to yourself".to_string(),
            ));
        }

        if let Some(existing) = self.existing_edge(target_id).await? {
            if existing.requester_id == self.self_id {
                tracing::debug!(edge = %existing.id, "request already exists, skipping insert");
                return Ok(existing);
            }
            return match existing.status {
                ConnectionStatus::Pending => {
                    tracing::info!(edge = %existing.id, "mutual request, accepting existing edge");
                    self.accept(&existing.id).await
                }
                ConnectionStatus::Accepted => Ok(existing),
            };
        }

        let row = json!({
            "follower_id": self.self_id,
            "following_id": target_id,
            "status": "pending",
        });
        let stored = self.rows.insert(CONNECTIONS_TABLE, row).await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Accept a pending request by edge id
    pub async fn accept(&self, connection_id: &str) -> Result<Connection> {
        let rows = self
            .rows
            .update(
                CONNECTIONS_TABLE,
                &Filter::eq("id", connection_id),
                json!({ "status": "accepted" }),
            )
            .await?;
        match rows.into_iter().next() {
            Some(row) => Ok(serde_json::from_value(row)?),
            None => Err(GatewayError::NotFound(format!(
                "connections.id = {}",
                connection_id
            ))
            .into()),
        }
    }

    /// Reject a request: the edge is deleted outright, there is no
    /// rejected state to keep
    pub async fn reject(&self, connection_id: &str) -> Result<()> {
        let deleted = self
            .rows
            .delete(CONNECTIONS_TABLE, &Filter::eq("id", connection_id))
            .await?;
        if deleted == 0 {
            return Err(GatewayError::NotFound(format!(
                "connections.id = {}",
                connection_id
            ))
            .into());
        }
        Ok(())
    }

    /// Follow another identity: a directly-accepted edge, no request step
    pub async fn follow(&self, target_id: &str) -> Result<Connection> {
        if target_id == self.self_id {
            return Err(SdkError::Validation("cannot follow yourself".to_string()));
        }

        if let Some(existing) = self.existing_edge(target_id).await? {
            return match existing.status {
                ConnectionStatus::Pending => self.accept(&existing.id).await,
                ConnectionStatus::Accepted => Ok(existing),
            };
        }

        let row = json!({
            "follower_id": self.self_id,
            "following_id": target_id,
            "status": "accepted",
        });
        let stored = self.rows.insert(CONNECTIONS_TABLE, row).await?;
        Ok(serde_json::from_value(stored)?)
    }

    // ==================== Helper Methods ====================

    /// `follower_id = self OR following_id = self`
    fn either_side(&self) -> Filter {
        Filter::Any(vec![
            Filter::eq("follower_id", self.self_id.as_str()),
            Filter::eq("following_id", self.self_id.as_str()),
        ])
    }

    /// Any edge between this identity and `other`, in either direction
    async fn existing_edge(&self, other: &str) -> Result<Option<Connection>> {
        let filter = Filter::Any(vec![
            Filter::All(vec![
                Filter::eq("follower_id", self.self_id.as_str()),
                Filter::eq("following_id", other),
            ]),
            Filter::All(vec![
                Filter::eq("follower_id", other),
                Filter::eq("following_id", self.self_id.as_str()),
            ]),
        ]);
        Ok(self.fetch(&filter).await?.into_iter().next())
    }

    async fn fetch(&self, filter: &Filter) -> Result<Vec<Connection>> {
        let rows = self
            .rows
            .select(CONNECTIONS_TABLE, filter, None, None)
            .await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(SdkError::from))
            .collect()
    }

    async fn resolve_parties(
        &self,
        connections: Vec<Connection>,
    ) -> Result<Vec<ConnectionWithParties>> {
        let mut ids: Vec<String> = Vec::new();
        for conn in &connections {
            for id in [&conn.requester_id, &conn.target_id] {
                if !ids.contains(id) {
                    ids.push(id.clone());
                }
            }
        }
        let identities = self.identities.get_many(&ids).await?;

        let mut resolved = Vec::with_capacity(connections.len());
        for connection in connections {
            let requester = identities.get(&connection.requester_id);
            let target = identities.get(&connection.target_id);
            match (requester, target) {
                (Some(requester), Some(target)) => resolved.push(ConnectionWithParties {
                    connection,
                    requester: requester.clone(),
                    target: target.clone(),
                }),
                _ => {
                    // edge pointing at a deleted profile; nothing to render
                    tracing::warn!(edge = %connection.id, "dropping edge with unresolvable party");
                }
            }
        }
        Ok(resolved)
    }
}
