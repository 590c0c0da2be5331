//! Administrator identity
//!
//! The server never stores passwords of its own accounts in the document
//! store. Credential checks go through an [`IdentityProvider`]:
//!
//! - [`local::LocalIdentity`] - accounts from configuration, argon2 password hashes
//! - [`firebase::FirebaseIdentity`] - Firebase Auth REST API
//!
//! A successful sign-in yields an opaque session token. The auth state of a
//! token is observed through a `watch` channel that flips to `None` when the
//! token is signed out, so long-lived consumers (live streams) can end as
//! soon as the administrator leaves.

pub mod firebase;
pub mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::watch;

pub use firebase::FirebaseIdentity;
pub use local::LocalIdentity;

/// A signed-in administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub uid: String,
    pub email: String,
}

/// Result of a successful sign-in
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: AdminUser,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Identity service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Identity service error: {0}")]
    Service(String),
}

/// Receiver half of a token's auth state
pub type AuthStateReceiver = watch::Receiver<Option<AdminUser>>;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;

    /// End the session behind `token`. Unknown tokens are ignored.
    async fn sign_out(&self, token: &str) -> Result<(), IdentityError>;

    /// Current and future auth state of `token`.
    async fn auth_state(&self, token: &str) -> Result<AuthStateReceiver, IdentityError>;
}

/// Live tokens and their auth-state channels
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: Arc<Mutex<HashMap<String, watch::Sender<Option<AdminUser>>>>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, token: &str, user: AdminUser) -> AuthStateReceiver {
        let (sender, receiver) = watch::channel(Some(user));
        self.lock().insert(token.to_string(), sender);
        receiver
    }

    /// Publish the signed-out state and forget the token.
    pub fn revoke(&self, token: &str) -> bool {
        match self.lock().remove(token) {
            Some(sender) => {
                sender.send_replace(None);
                true
            },
            None => false,
        }
    }

    pub fn watch(&self, token: &str) -> Option<AuthStateReceiver> {
        self.lock().get(token).map(watch::Sender::subscribe)
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, watch::Sender<Option<AdminUser>>>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Auth state of a token nobody is signed in with
pub fn signed_out() -> AuthStateReceiver {
    watch::channel(None).1
}

/// Resolves once `receiver` reports the signed-out state (or its token is gone).
pub async fn wait_for_sign_out(mut receiver: AuthStateReceiver) {
    loop {
        if receiver.borrow_and_update().is_none() {
            return;
        }
        if receiver.changed().await.is_err() {
            return;
        }
    }
}
