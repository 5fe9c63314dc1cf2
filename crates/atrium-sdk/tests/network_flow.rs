//! Integration tests for the connection lifecycle and network composition
//!
//! Drives the request and accept/reject flow from both parties' perspectives
//! through the in-process gateway, checking the derived presentation sets
//! after every mutation.

use atrium_sdk::gateway::{AuthGateway, MemoryGateway, RowGateway};
use atrium_sdk::{
    ConnectionStatus, DiscoverState, Identity, NetworkView, SdkError, SessionProvider,
};
use std::sync::Arc;

async fn sign_up(gw: &Arc<MemoryGateway>, email: &str, name: &str) -> Identity {
    let rows: Arc<dyn RowGateway> = gw.clone();
    let auth: Arc<dyn AuthGateway> = gw.clone();
    let session = SessionProvider::new(rows, auth);
    session.sign_up(email, "secret", name).await.unwrap()
}

fn network(gw: &Arc<MemoryGateway>, self_id: &str) -> NetworkView {
    let rows: Arc<dyn RowGateway> = gw.clone();
    NetworkView::new(rows, self_id)
}

#[tokio::test]
async fn test_request_accept_lifecycle() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;
    let b = sign_up(&gw, "b@example.org", "Barbara Liskov").await;

    let a_view = network(&gw, &a.id);
    let b_view = network(&gw, &b.id);

    // A sends a request to B
    let a_dir = a_view.send_request(&b.id).await.unwrap();
    assert!(a_dir.connections.is_empty());
    assert!(a_dir.requests.is_empty());
    assert!(a_dir.outgoing.contains(&b.id));

    // the record shows up only in B's incoming requests
    let b_dir = b_view.refresh().await.unwrap();
    assert!(b_dir.connections.is_empty());
    assert_eq!(b_dir.requests.len(), 1);
    let request = &b_dir.requests[0];
    assert_eq!(request.connection.requester_id, a.id);
    assert_eq!(request.connection.target_id, b.id);
    assert_eq!(request.connection.status, ConnectionStatus::Pending);

    // B's discover set marks A as pending
    let a_entry = b_dir
        .discover
        .iter()
        .find(|e| e.identity.id == a.id)
        .unwrap();
    assert_eq!(a_entry.state, DiscoverState::Pending);

    // B accepts: the record moves to both parties' connections
    let b_dir = b_view.accept(&request.connection.id).await.unwrap();
    assert!(b_dir.requests.is_empty());
    assert_eq!(b_dir.connections.len(), 1);
    assert_eq!(
        b_dir.connections[0].peer(&b.id).unwrap().full_name,
        "Ada Lovelace"
    );

    let a_dir = a_view.refresh().await.unwrap();
    assert!(a_dir.requests.is_empty());
    assert_eq!(a_dir.connections.len(), 1);
    assert_eq!(
        a_dir.connections[0].peer(&a.id).unwrap().full_name,
        "Barbara Liskov"
    );

    // both discover sets now show the other side as connected
    let b_entry = a_dir
        .discover
        .iter()
        .find(|e| e.identity.id == b.id)
        .unwrap();
    assert_eq!(b_entry.state, DiscoverState::Connected);
}

#[tokio::test]
async fn test_pending_and_connection_sets_are_disjoint() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;
    let b = sign_up(&gw, "b@example.org", "Barbara Liskov").await;

    let b_view = network(&gw, &b.id);
    network(&gw, &a.id).send_request(&b.id).await.unwrap();

    let before = b_view.refresh().await.unwrap();
    let edge_id = before.requests[0].connection.id.clone();

    let after = b_view.accept(&edge_id).await.unwrap();
    assert!(after.requests.iter().all(|r| r.connection.id != edge_id));
    assert_eq!(
        after
            .connections
            .iter()
            .filter(|c| c.connection.id == edge_id)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_reject_deletes_permanently() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;
    let b = sign_up(&gw, "b@example.org", "Barbara Liskov").await;

    let b_view = network(&gw, &b.id);
    network(&gw, &a.id).send_request(&b.id).await.unwrap();

    let before = b_view.refresh().await.unwrap();
    let edge_id = before.requests[0].connection.id.clone();

    let after = b_view.reject(&edge_id).await.unwrap();
    assert!(after.requests.is_empty());
    assert!(after.connections.is_empty());
    assert_eq!(gw.row_count("connections").await, 0);

    // rejecting again is not found, not a silent success
    let err = b_view.connections().reject(&edge_id).await.unwrap_err();
    assert!(matches!(err, SdkError::Gateway(_)));
}

#[tokio::test]
async fn test_duplicate_request_short_circuits() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;
    let b = sign_up(&gw, "b@example.org", "Barbara Liskov").await;

    let repo = network(&gw, &a.id);
    let first = repo.connections().send_request(&b.id).await.unwrap();
    let second = repo.connections().send_request(&b.id).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.status, ConnectionStatus::Pending);
    assert_eq!(gw.row_count("connections").await, 1);
}

#[tokio::test]
async fn test_mutual_requests_merge_to_one_accepted_edge() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;
    let b = sign_up(&gw, "b@example.org", "Barbara Liskov").await;

    network(&gw, &a.id)
        .connections()
        .send_request(&b.id)
        .await
        .unwrap();
    let merged = network(&gw, &b.id)
        .connections()
        .send_request(&a.id)
        .await
        .unwrap();

    assert_eq!(merged.status, ConnectionStatus::Accepted);
    assert_eq!(gw.row_count("connections").await, 1);

    // the single accepted edge renders for both parties
    let a_dir = network(&gw, &a.id).refresh().await.unwrap();
    let b_dir = network(&gw, &b.id).refresh().await.unwrap();
    assert_eq!(a_dir.connections.len(), 1);
    assert_eq!(b_dir.connections.len(), 1);
    assert!(a_dir.requests.is_empty());
    assert!(b_dir.requests.is_empty());
}

#[tokio::test]
async fn test_cannot_request_self() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;

    let err = network(&gw, &a.id)
        .connections()
        .send_request(&a.id)
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Validation(_)));
}

#[tokio::test]
async fn test_follow_creates_accepted_edge() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;
    let b = sign_up(&gw, "b@example.org", "Barbara Liskov").await;

    let dir = network(&gw, &a.id).follow(&b.id).await.unwrap();
    assert_eq!(dir.connections.len(), 1);
    assert_eq!(dir.connections[0].connection.status, ConnectionStatus::Accepted);

    // following someone with a pending request upgrades it instead of duplicating
    let c = sign_up(&gw, "c@example.org", "Claude Shannon").await;
    network(&gw, &c.id)
        .connections()
        .send_request(&a.id)
        .await
        .unwrap();
    let upgraded = network(&gw, &a.id)
        .connections()
        .follow(&c.id)
        .await
        .unwrap();
    assert_eq!(upgraded.status, ConnectionStatus::Accepted);
    assert_eq!(gw.row_count("connections").await, 2);
}

#[tokio::test]
async fn test_discover_excludes_self_and_search_matches() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;
    sign_up(&gw, "b@example.org", "Barbara Liskov").await;
    sign_up(&gw, "c@example.org", "Claude Shannon").await;

    let session_rows: Arc<dyn RowGateway> = gw.clone();
    let session_auth: Arc<dyn AuthGateway> = gw.clone();
    let session = SessionProvider::new(session_rows, session_auth);
    session.sign_in("b@example.org", "secret").await.unwrap();
    session
        .update_profile(&atrium_sdk::IdentityPatch {
            title: Some("Type Theorist".to_string()),
            company: Some("MIT".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let dir = network(&gw, &a.id).refresh().await.unwrap();
    assert_eq!(dir.discover.len(), 2);
    assert!(dir.discover.iter().all(|e| e.identity.id != a.id));
    assert!(dir
        .discover
        .iter()
        .all(|e| e.state == DiscoverState::Connectable));

    // case-insensitive substring over name, title, company
    assert_eq!(dir.search("liskov").len(), 1);
    assert_eq!(dir.search("type theor").len(), 1);
    assert_eq!(dir.search("mit").len(), 1);
    assert_eq!(dir.search("").len(), 2);
    assert_eq!(dir.search("nobody").len(), 0);
}
