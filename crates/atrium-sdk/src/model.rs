//! Data model for the researcher network
//!
//! Row shapes match the gateway tables (`users`, `connections`, `posts`,
//! `likes`, `comments`). Wire column names are kept where they differ from
//! the Rust-side naming (`follower_id`/`following_id` carry the
//! requester/target direction of a connection edge).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A registered researcher's profile record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Unstructured records; the gateway stores these as JSON
    #[serde(default)]
    pub education: Vec<Value>,
    #[serde(default)]
    pub experience: Vec<Value>,
    #[serde(default)]
    pub certifications: Vec<Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial profile update; only set fields are sent to the gateway
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdentityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Vec<Value>>,
}

impl IdentityPatch {
    pub fn is_empty(&self) -> bool {
        serde_json::to_value(self)
            .map(|v| v.as_object().map_or(true, |o| o.is_empty()))
            .unwrap_or(true)
    }
}

/// Lifecycle state of a connection edge
///
/// There is no rejected state: rejection deletes the record outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
}

/// A directed follow/collaboration edge between two identities
///
/// Exactly one direction per record: `requester_id` initiated the edge
/// toward `target_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    #[serde(rename = "follower_id")]
    pub requester_id: String,
    #[serde(rename = "following_id")]
    pub target_id: String,
    pub status: ConnectionStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Connection {
    /// Whether the given identity is one of the two parties
    pub fn involves(&self, identity_id: &str) -> bool {
        self.requester_id == identity_id || self.target_id == identity_id
    }

    /// The party that is not `self_id`
    ///
    /// Returns `None` when `self_id` is not a party at all, so a rendering
    /// context can never pick the wrong side silently.
    pub fn peer_id(&self, self_id: &str) -> Option<&str> {
        if self.requester_id == self_id {
            Some(&self.target_id)
        } else if self.target_id == self_id {
            Some(&self.requester_id)
        } else {
            None
        }
    }
}

/// A connection with both party records resolved
#[derive(Debug, Clone)]
pub struct ConnectionWithParties {
    pub connection: Connection,
    pub requester: Identity,
    pub target: Identity,
}

impl ConnectionWithParties {
    /// The resolved party that is not `self_id`
    pub fn peer(&self, self_id: &str) -> Option<&Identity> {
        if self.connection.requester_id == self_id {
            Some(&self.target)
        } else if self.connection.target_id == self_id {
            Some(&self.requester)
        } else {
            None
        }
    }
}

/// A feed post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(rename = "user_id")]
    pub author_id: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Mutated only through the gateway's counter procedures
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub comments_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A post with its author record resolved
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: Identity,
}

/// A like row; existence marks "this user likes this post"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A comment on a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
