//! Atrium SDK - client-side data plane for the researcher network
//!
//! # Architecture
//!
//! Every screen of the Atrium client is a thin presentational layer over
//! this crate:
//! - [`SessionProvider`] owns the authenticated identity and publishes
//!   auth-state changes over a watch channel
//! - [`IdentityRepository`], [`ConnectionRepository`], and
//!   [`FeedRepository`] issue row CRUD against the remote gateway
//! - [`NetworkView`] composes repository results into the discover /
//!   connections / requests presentation sets
//!
//! Repositories take the gateway through the [`gateway::RowGateway`] and
//! [`gateway::AuthGateway`] traits: the HTTP implementation delegates to
//! `atrium-gateway-client`, and [`gateway::MemoryGateway`] backs the
//! test suites.
//!
//! # Example
//!
//! ```rust,ignore
//! use atrium_sdk::{SessionProvider, NetworkView};
//! use atrium_gateway_client::{GatewayClient, GatewayConfig};
//! use std::sync::Arc;
//!
//! let client = Arc::new(GatewayClient::new(GatewayConfig {
//!     base_url: "https://project.example.co".into(),
//!     ..Default::default()
//! }));
//!
//! let session = SessionProvider::new(client.clone(), client.clone());
//! let me = session.sign_in("ada@example.org", "secret").await?;
//!
//! let network = NetworkView::new(client, me.id);
//! let directory = network.refresh().await?;
//! ```

// Gateway trait seams and implementations
pub mod gateway;

// Data model (users, connections, posts, likes, comments)
pub mod model;

// Session provider and auth-state lifecycle
pub mod session;

// Repositories
pub mod connections;
pub mod feed;
pub mod identity;

// Network screen composition
pub mod network;

// Error types
pub mod error;

// Re-export core types
pub use connections::ConnectionRepository;
pub use error::{Result, SdkError};
pub use feed::FeedRepository;
pub use gateway::{AuthGateway, MemoryGateway, RowGateway};
pub use identity::{IdentityRepository, IdentitySeed};
pub use model::{
    Comment, Connection, ConnectionStatus, ConnectionWithParties, Identity, IdentityPatch, Like,
    Post, PostWithAuthor,
};
pub use network::{DiscoverEntry, DiscoverState, NetworkDirectory, NetworkView};
pub use session::{SessionProvider, SessionState};

// Re-export from the gateway client
pub use atrium_gateway_client::{
    AuthError, AuthSession, AuthUser, Filter, GatewayClient, GatewayConfig, GatewayError, Order,
};
