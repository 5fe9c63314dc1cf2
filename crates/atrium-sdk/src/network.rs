//! Network view composition
//!
//! Combines repository results into the three presentation sets of the
//! network screen: discover, my connections, and incoming requests.
//! Composition only: no sorting, no pagination, and every mutation is
//! followed by a full refetch of all three sets rather than incremental
//! patching of the previous snapshot.

use crate::connections::ConnectionRepository;
use crate::error::Result;
use crate::gateway::RowGateway;
use crate::identity::IdentityRepository;
use crate::model::{ConnectionWithParties, Identity};
use std::collections::HashSet;
use std::sync::Arc;

/// How a directory entry relates to the signed-in identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverState {
    /// An accepted edge exists
    Connected,
    /// This identity has an incoming pending request from the entry
    Pending,
    /// No edge; a request can be sent
    Connectable,
}

/// One entry of the discover set
#[derive(Debug, Clone)]
pub struct DiscoverEntry {
    pub identity: Identity,
    pub state: DiscoverState,
}

impl DiscoverEntry {
    /// Case-insensitive substring match on name, title, or company
    fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        let fields = [
            Some(self.identity.full_name.as_str()),
            self.identity.title.as_deref(),
            self.identity.company.as_deref(),
        ];
        fields
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// A consistent snapshot of the three presentation sets
#[derive(Debug, Clone)]
pub struct NetworkDirectory {
    /// Everyone except self, annotated by edge membership
    pub discover: Vec<DiscoverEntry>,
    /// Accepted edges; render the non-self party
    pub connections: Vec<ConnectionWithParties>,
    /// Incoming pending requests with accept/decline actions
    pub requests: Vec<ConnectionWithParties>,
    /// Target ids of outgoing pending requests, tracked separately
    pub outgoing: HashSet<String>,
    self_id: String,
}

impl NetworkDirectory {
    /// Discover entries matching a search term; an empty term matches all
    pub fn search(&self, term: &str) -> Vec<&DiscoverEntry> {
        if term.is_empty() {
            return self.discover.iter().collect();
        }
        self.discover.iter().filter(|e| e.matches(term)).collect()
    }

    /// The non-self party of each accepted connection
    pub fn connected_peers(&self) -> Vec<&Identity> {
        self.connections
            .iter()
            .filter_map(|c| c.peer(&self.self_id))
            .collect()
    }
}

/// Loads and mutates the network screen's data
pub struct NetworkView {
    connections: ConnectionRepository,
    identities: IdentityRepository,
}

impl NetworkView {
    pub fn new(rows: Arc<dyn RowGateway>, self_id: impl Into<String>) -> Self {
        Self {
            connections: ConnectionRepository::new(rows.clone(), self_id),
            identities: IdentityRepository::new(rows),
        }
    }

    /// The underlying connection repository
    pub fn connections(&self) -> &ConnectionRepository {
        &self.connections
    }

    /// Fetch all three sets and compose a fresh directory
    pub async fn refresh(&self) -> Result<NetworkDirectory> {
        let self_id = self.connections.self_id().to_string();
        let everyone = self.identities.directory(&self_id, None).await?;
        let connections = self.connections.list_connections().await?;
        let requests = self.connections.list_pending_requests().await?;
        let outgoing = self.connections.pending_outgoing_ids().await?;

        let connected_ids: HashSet<String> = connections
            .iter()
            .filter_map(|c| c.connection.peer_id(&self_id))
            .map(str::to_string)
            .collect();
        let pending_requester_ids: HashSet<String> = requests
            .iter()
            .map(|r| r.connection.requester_id.clone())
            .collect();

        let discover = everyone
            .into_iter()
            .map(|identity| {
                let state = if connected_ids.contains(&identity.id) {
                    DiscoverState::Connected
                } else if pending_requester_ids.contains(&identity.id) {
                    DiscoverState::Pending
                } else {
                    DiscoverState::Connectable
                };
                DiscoverEntry { identity, state }
            })
            .collect();

        Ok(NetworkDirectory {
            discover,
            connections,
            requests,
            outgoing,
            self_id,
        })
    }

    /// Send a request, then refetch the directory
    pub async fn send_request(&self, target_id: &str) -> Result<NetworkDirectory> {
        self.connections.send_request(target_id).await?;
        self.refresh().await
    }

    /// Accept an incoming request, then refetch the directory
    pub async fn accept(&self, connection_id: &str) -> Result<NetworkDirectory> {
        self.connections.accept(connection_id).await?;
        self.refresh().await
    }

    /// Decline an incoming request, then refetch the directory
    pub async fn reject(&self, connection_id: &str) -> Result<NetworkDirectory> {
        self.connections.reject(connection_id).await?;
        self.refresh().await
    }

    /// Follow an identity directly, then refetch the directory
    pub async fn follow(&self, target_id: &str) -> Result<NetworkDirectory> {
        self.connections.follow(target_id).await?;
        self.refresh().await
    }
}
