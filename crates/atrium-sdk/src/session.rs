//! Session provider
//!
//! Owns the authenticated identity and publishes auth-state changes.
//! The session is an explicit object handed to repositories, not ambient
//! state: screens subscribe to the watch channel, repositories take the
//! gateway by `Arc`.
//!
//! Lifecycle: `Anonymous → Resolving → Authenticated` (or back to
//! `Anonymous` when resolution fails or the user signs out). Profile
//! resolution self-heals: a credential with no profile row gets a default
//! one on first resolve.

use crate::error::{Result, SdkError};
use crate::gateway::{AuthGateway, RowGateway};
use crate::identity::{IdentityRepository, IdentitySeed};
use crate::model::{Identity, IdentityPatch};
use atrium_gateway_client::AuthUser;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Display name used when the auth service has nothing better to offer
const DEFAULT_DISPLAY_NAME: &str = "Researcher";

/// Auth state visible to every screen
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No session
    Anonymous,
    /// Credential verified, identity row being resolved
    Resolving { user_id: String },
    /// Session active with a resolved profile
    Authenticated { identity: Identity },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}

/// Holds the current session and exposes the auth operations
pub struct SessionProvider {
    rows: Arc<dyn RowGateway>,
    auth: Arc<dyn AuthGateway>,
    identities: IdentityRepository,
    state: watch::Sender<SessionState>,
    access_token: RwLock<Option<String>>,
}

impl SessionProvider {
    pub fn new(rows: Arc<dyn RowGateway>, auth: Arc<dyn AuthGateway>) -> Self {
        let identities = IdentityRepository::new(rows.clone());
        let (state, _) = watch::channel(SessionState::Anonymous);
        Self {
            rows,
            auth,
            identities,
            state,
            access_token: RwLock::new(None),
        }
    }

    /// Subscribe to auth-state changes (fires on every transition,
    /// including the initial state)
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The signed-in identity, if any
    pub fn current_identity(&self) -> Option<Identity> {
        match &*self.state.borrow() {
            SessionState::Authenticated { identity } => Some(identity.clone()),
            _ => None,
        }
    }

    /// The identity repository bound to this session's gateway
    pub fn identities(&self) -> &IdentityRepository {
        &self.identities
    }

    /// Sign in with email/password and resolve the profile
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let session = self.auth.sign_in(email, password).await?;
        self.adopt_session(session.access_token, session.user).await
    }

    /// Create a credential, then a profile row for it
    ///
    /// The profile insert is best-effort: when it fails the credential
    /// still stands (there is no transactional rollback across the auth
    /// and row services) and the missing row is created by the
    /// resolve-or-create step that follows.
    pub async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<Identity> {
        let session = self.auth.sign_up(email, password).await?;
        self.rows
            .set_access_token(Some(session.access_token.clone()));

        let seed = IdentitySeed {
            id: session.user.id.clone(),
            email: email.to_string(),
            full_name: full_name.to_string(),
        };
        if let Err(err) = self.identities.resolve_or_create(&seed).await {
            tracing::warn!(user_id = %session.user.id, error = %err,
                "profile creation failed after sign-up, will self-heal on next resolve");
        }

        self.adopt_session(session.access_token, session.user).await
    }

    /// Resume a previously issued session token (first-load path)
    pub async fn resume(&self, access_token: &str) -> Result<Identity> {
        let user = self.auth.current_user(access_token).await?;
        self.adopt_session(access_token.to_string(), user).await
    }

    /// Revoke the session; local state is cleared only on success
    pub async fn sign_out(&self) -> Result<()> {
        let token = {
            let guard = self.access_token.read().await;
            guard.clone().ok_or(SdkError::NoSession)?
        };

        self.auth.sign_out(&token).await?;

        *self.access_token.write().await = None;
        self.rows.set_access_token(None);
        self.state.send_replace(SessionState::Anonymous);
        tracing::debug!("signed out");
        Ok(())
    }

    /// Apply a partial profile update; local state follows the stored row
    pub async fn update_profile(&self, patch: &IdentityPatch) -> Result<Identity> {
        let identity = self.current_identity().ok_or(SdkError::NoSession)?;
        let updated = self.identities.update(&identity.id, patch).await?;
        self.state.send_replace(SessionState::Authenticated {
            identity: updated.clone(),
        });
        Ok(updated)
    }

    /// Install a verified session and resolve its identity
    async fn adopt_session(&self, token: String, user: AuthUser) -> Result<Identity> {
        *self.access_token.write().await = Some(token.clone());
        self.rows.set_access_token(Some(token));
        self.state.send_replace(SessionState::Resolving {
            user_id: user.id.clone(),
        });

        let seed = IdentitySeed {
            id: user.id.clone(),
            email: user.email.clone().unwrap_or_default(),
            full_name: DEFAULT_DISPLAY_NAME.to_string(),
        };

        match self.identities.resolve_or_create(&seed).await {
            Ok(identity) => {
                tracing::debug!(user_id = %identity.id, "session authenticated");
                self.state.send_replace(SessionState::Authenticated {
                    identity: identity.clone(),
                });
                Ok(identity)
            }
            Err(err) => {
                // credential stands at the auth service; drop back to
                // anonymous locally and let the next sign-in resolve it
                tracing::error!(user_id = %user.id, error = %err, "identity resolution failed");
                *self.access_token.write().await = None;
                self.rows.set_access_token(None);
                self.state.send_replace(SessionState::Anonymous);
                Err(err)
            }
        }
    }
}
