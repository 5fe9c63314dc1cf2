//! Integration tests for the feed: posts, like toggling through the
//! counter procedures, comments, and suggestions.

use atrium_sdk::gateway::{AuthGateway, MemoryGateway, RowGateway};
use atrium_sdk::{FeedRepository, Filter, Identity, SdkError, SessionProvider};
use serde_json::json;
use std::sync::Arc;

async fn sign_up(gw: &Arc<MemoryGateway>, email: &str, name: &str) -> Identity {
    let rows: Arc<dyn RowGateway> = gw.clone();
    let auth: Arc<dyn AuthGateway> = gw.clone();
    let session = SessionProvider::new(rows, auth);
    session.sign_up(email, "secret", name).await.unwrap()
}

fn feed(gw: &Arc<MemoryGateway>, self_id: &str) -> FeedRepository {
    let rows: Arc<dyn RowGateway> = gw.clone();
    FeedRepository::new(rows, self_id)
}

async fn likes_count(gw: &Arc<MemoryGateway>, post_id: &str) -> i64 {
    let rows: Arc<dyn RowGateway> = gw.clone();
    let posts = rows
        .select("posts", &Filter::eq("id", post_id), None, None)
        .await
        .unwrap();
    posts[0]["likes_count"].as_i64().unwrap()
}

#[tokio::test]
async fn test_create_post_requires_content() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;
    let feed = feed(&gw, &a.id);

    for empty in ["", "   ", "\n\t"] {
        let err = feed.create_post(empty).await.unwrap_err();
        assert!(matches!(err, SdkError::Validation(_)));
    }

    let post = feed.create_post("  First result is in.  ").await.unwrap();
    assert_eq!(post.content, "First result is in.");
    assert_eq!(post.likes_count, 0);
    assert_eq!(post.author_id, a.id);
}

#[tokio::test]
async fn test_like_toggle_converges() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;
    let a_feed = feed(&gw, &a.id);

    let post = a_feed.create_post("Toggle me").await.unwrap();

    // rapid double invocation: liked, then unliked, never double-counted
    assert!(a_feed.toggle_like(&post.id).await.unwrap());
    assert_eq!(likes_count(&gw, &post.id).await, 1);
    assert!(a_feed.has_liked(&post.id).await.unwrap());

    assert!(!a_feed.toggle_like(&post.id).await.unwrap());
    assert_eq!(likes_count(&gw, &post.id).await, 0);
    assert!(!a_feed.has_liked(&post.id).await.unwrap());
}

#[tokio::test]
async fn test_likes_from_two_users_accumulate() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;
    let b = sign_up(&gw, "b@example.org", "Barbara Liskov").await;

    let a_feed = feed(&gw, &a.id);
    let b_feed = feed(&gw, &b.id);
    let post = a_feed.create_post("Popular take").await.unwrap();

    a_feed.toggle_like(&post.id).await.unwrap();
    b_feed.toggle_like(&post.id).await.unwrap();
    assert_eq!(likes_count(&gw, &post.id).await, 2);

    // one user withdrawing does not affect the other's like
    a_feed.toggle_like(&post.id).await.unwrap();
    assert_eq!(likes_count(&gw, &post.id).await, 1);
    assert!(b_feed.has_liked(&post.id).await.unwrap());
    assert_eq!(b_feed.liked_post_ids().await.unwrap(), vec![post.id.clone()]);
}

#[tokio::test]
async fn test_feed_is_newest_first_with_authors() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;
    let b = sign_up(&gw, "b@example.org", "Barbara Liskov").await;

    let rows: Arc<dyn RowGateway> = gw.clone();
    for (id, author, at) in [
        ("p1", &a.id, "2024-01-01T00:00:00Z"),
        ("p2", &b.id, "2024-03-01T00:00:00Z"),
        ("p3", &a.id, "2024-02-01T00:00:00Z"),
    ] {
        rows.insert(
            "posts",
            json!({
                "id": id,
                "user_id": author,
                "content": "post",
                "likes_count": 0,
                "comments_count": 0,
                "created_at": at,
            }),
        )
        .await
        .unwrap();
    }

    let posts = feed(&gw, &a.id).list_posts().await.unwrap();
    let ids: Vec<&str> = posts.iter().map(|p| p.post.id.as_str()).collect();
    assert_eq!(ids, vec!["p2", "p3", "p1"]);
    assert_eq!(posts[0].author.full_name, "Barbara Liskov");
    assert_eq!(posts[1].author.full_name, "Ada Lovelace");
}

#[tokio::test]
async fn test_comments_are_oldest_first() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;
    let b = sign_up(&gw, "b@example.org", "Barbara Liskov").await;

    let a_feed = feed(&gw, &a.id);
    let b_feed = feed(&gw, &b.id);
    let post = a_feed.create_post("Thoughts?").await.unwrap();

    let err = a_feed.add_comment(&post.id, "  ").await.unwrap_err();
    assert!(matches!(err, SdkError::Validation(_)));

    // distinct timestamps so the ordering is observable
    let rows: Arc<dyn RowGateway> = gw.clone();
    rows.insert(
        "comments",
        json!({
            "post_id": post.id,
            "user_id": a.id,
            "content": "first",
            "created_at": "2024-01-01T00:00:00Z",
        }),
    )
    .await
    .unwrap();
    rows.insert(
        "comments",
        json!({
            "post_id": post.id,
            "user_id": b.id,
            "content": "second",
            "created_at": "2024-01-02T00:00:00Z",
        }),
    )
    .await
    .unwrap();

    let comments = b_feed.list_comments(&post.id).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].content, "first");
    assert_eq!(comments[1].content, "second");
}

#[tokio::test]
async fn test_suggestions_exclude_self_and_honor_limit() {
    let gw = Arc::new(MemoryGateway::new());
    let a = sign_up(&gw, "a@example.org", "Ada Lovelace").await;
    sign_up(&gw, "b@example.org", "Barbara Liskov").await;
    sign_up(&gw, "c@example.org", "Claude Shannon").await;
    sign_up(&gw, "d@example.org", "Donald Knuth").await;

    let suggestions = feed(&gw, &a.id).suggestions(2).await.unwrap();
    assert_eq!(suggestions.len(), 2);
    assert!(suggestions.iter().all(|s| s.id != a.id));
}
