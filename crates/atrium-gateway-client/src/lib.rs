//! Atrium Gateway Client
//!
//! Typed HTTP client for the hosted data gateway behind the Atrium
//! researcher network:
//! - Row CRUD and filtering against `/rest/v1/{table}`
//! - Stored-procedure calls against `/rest/v1/rpc/{procedure}`
//! - Token-based auth against `/auth/v1` (sign-up, password grant,
//!   sign-out, session-user retrieval)
//!
//! Application-level repositories live in `atrium-sdk`; this crate is
//! transport only.

pub mod auth;
pub mod client;
pub mod error;
pub mod filter;

pub use auth::{AuthSession, AuthUser};
pub use client::{GatewayClient, GatewayConfig};
pub use error::{AuthError, GatewayError, Result};
pub use filter::{Filter, Order};
