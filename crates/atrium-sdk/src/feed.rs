//! Feed repository
//!
//! Posts, likes, and comments for the signed-in identity. Like counters
//! are mutated through the gateway's `increment_likes`/`decrement_likes`
//! procedures, never read-modify-write, so concurrent likes from
//! different users cannot lose updates.

use crate::error::{Result, SdkError};
use crate::gateway::RowGateway;
use crate::identity::IdentityRepository;
use crate::model::{Comment, Identity, Like, Post, PostWithAuthor};
use atrium_gateway_client::{Filter, Order};
use serde_json::json;
use std::sync::Arc;

pub(crate) const POSTS_TABLE: &str = "posts";
pub(crate) const LIKES_TABLE: &str = "likes";
pub(crate) const COMMENTS_TABLE: &str = "comments";

/// Default page size for the feed
const FEED_LIMIT: u32 = 20;

/// Repository over the `posts`, `likes`, and `comments` tables
#[derive(Clone)]
pub struct FeedRepository {
    rows: Arc<dyn RowGateway>,
    identities: IdentityRepository,
    self_id: String,
}

impl FeedRepository {
    pub fn new(rows: Arc<dyn RowGateway>, self_id: impl Into<String>) -> Self {
        let identities = IdentityRepository::new(rows.clone());
        Self {
            rows,
            identities,
            self_id: self_id.into(),
        }
    }

    /// Newest posts first, authors resolved, bounded to the feed page size
    pub async fn list_posts(&self) -> Result<Vec<PostWithAuthor>> {
        let rows = self
            .rows
            .select(
                POSTS_TABLE,
                &Filter::All(vec![]),
                Some(&Order::desc("created_at")),
                Some(FEED_LIMIT),
            )
            .await?;

        let posts: Vec<Post> = rows
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(SdkError::from))
            .collect::<Result<_>>()?;

        let mut author_ids: Vec<String> = Vec::new();
        for post in &posts {
            if !author_ids.contains(&post.author_id) {
                author_ids.push(post.author_id.clone());
            }
        }
        let authors = self.identities.get_many(&author_ids).await?;

        let mut resolved = Vec::with_capacity(posts.len());
        for post in posts {
            match authors.get(&post.author_id) {
                Some(author) => resolved.push(PostWithAuthor {
                    post,
                    author: author.clone(),
                }),
                None => {
                    tracing::warn!(post = %post.id, "dropping post with unresolvable author");
                }
            }
        }
        Ok(resolved)
    }

    /// Publish a new post
    pub async fn create_post(&self, content: &str) -> Result<Post> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SdkError::Validation("post content is required".to_string()));
        }

        let row = json!({
            "user_id": self.self_id,
            "content": content,
            "likes_count": 0,
            "comments_count": 0,
        });
        let stored = self.rows.insert(POSTS_TABLE, row).await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Toggle this identity's like on a post
    ///
    /// Membership is the `likes` row; the counter moves through the
    /// atomic RPC. Returns the resulting state: `true` when the post is
    /// now liked.
    pub async fn toggle_like(&self, post_id: &str) -> Result<bool> {
        let membership = Filter::All(vec![
            Filter::eq("post_id", post_id),
            Filter::eq("user_id", self.self_id.as_str()),
        ]);
        let existing = self
            .rows
            .select(LIKES_TABLE, &membership, None, Some(1))
            .await?;

        if existing.is_empty() {
            let row = json!({ "post_id": post_id, "user_id": self.self_id });
            self.rows.insert(LIKES_TABLE, row).await?;
            self.rows
                .rpc("increment_likes", json!({ "post_id": post_id }))
                .await?;
            Ok(true)
        } else {
            self.rows.delete(LIKES_TABLE, &membership).await?;
            self.rows
                .rpc("decrement_likes", json!({ "post_id": post_id }))
                .await?;
            Ok(false)
        }
    }

    /// Whether this identity currently likes a post
    pub async fn has_liked(&self, post_id: &str) -> Result<bool> {
        let membership = Filter::All(vec![
            Filter::eq("post_id", post_id),
            Filter::eq("user_id", self.self_id.as_str()),
        ]);
        let rows = self
            .rows
            .select(LIKES_TABLE, &membership, None, Some(1))
            .await?;
        Ok(!rows.is_empty())
    }

    /// This identity's likes, for rendering the liked state of a feed page
    pub async fn liked_post_ids(&self) -> Result<Vec<String>> {
        let rows = self
            .rows
            .select(
                LIKES_TABLE,
                &Filter::eq("user_id", self.self_id.as_str()),
                None,
                None,
            )
            .await?;
        let likes: Vec<Like> = rows
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(SdkError::from))
            .collect::<Result<_>>()?;
        Ok(likes.into_iter().map(|l| l.post_id).collect())
    }

    /// Comments on a post, oldest first
    ///
    /// `comments_count` on the post is maintained by the gateway; this
    /// client only inserts the rows.
    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let rows = self
            .rows
            .select(
                COMMENTS_TABLE,
                &Filter::eq("post_id", post_id),
                Some(&Order::asc("created_at")),
                None,
            )
            .await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(SdkError::from))
            .collect()
    }

    /// Comment on a post
    pub async fn add_comment(&self, post_id: &str, content: &str) -> Result<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SdkError::Validation(
                "comment content is required".to_string(),
            ));
        }

        let row = json!({
            "post_id": post_id,
            "user_id": self.self_id,
            "content": content,
        });
        let stored = self.rows.insert(COMMENTS_TABLE, row).await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// A bounded sample of other identities ("people you may know")
    pub async fn suggestions(&self, limit: u32) -> Result<Vec<Identity>> {
        self.identities.directory(&self.self_id, Some(limit)).await
    }
}
