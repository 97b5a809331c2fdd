//! Identity session source.
//!
//! The identity provider itself (token issuance, sign-in UI) lives outside
//! this crate. What the client consumes is the stream of "who is signed in"
//! values, held here in a `watch` channel, plus a [`TokenSource`] that mints
//! a bearer token for the current principal on demand.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::errors::ClientError;

/// The authenticated principal. `uid` is the provider's stable identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub uid: String,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// The provider has not reported anything yet.
    Checking,
    SignedIn(Principal),
    SignedOut,
}

impl AuthState {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            AuthState::SignedIn(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, AuthState::Checking)
    }
}

/// Current-principal stream. Cloning hands out another handle to the same
/// channel.
#[derive(Clone)]
pub struct SessionSource {
    tx: Arc<watch::Sender<AuthState>>,
}

impl Default for SessionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::Checking);
        Self { tx: Arc::new(tx) }
    }

    pub fn sign_in(&self, principal: Principal) {
        info!("Session established for uid {}", principal.uid);
        self.tx.send_replace(AuthState::SignedIn(principal));
    }

    /// Sign-out and token invalidation look the same to the client.
    pub fn sign_out(&self) {
        info!("Session cleared");
        self.tx.send_replace(AuthState::SignedOut);
    }

    pub fn current(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.tx.borrow().principal().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }
}

/// Mints identity tokens. Called once per outgoing request; implementations
/// are free to refresh provider-side.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn id_token(&self, principal: &Principal) -> Result<String, ClientError>;
}

/// Hands out one pre-issued token. Used by the headless binary.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn id_token(&self, _principal: &Principal) -> Result<String, ClientError> {
        if self.token.is_empty() {
            return Err(ClientError::Identity("no identity token configured".to_string()));
        }
        Ok(self.token.clone())
    }
}

/// Handle for a task listening to session changes. Must be released when
/// its owner is torn down; dropping it stops the listener as well.
#[must_use = "a session subscription must be released"]
pub struct SessionSubscription {
    handle: Option<JoinHandle<()>>,
}

impl SessionSubscription {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the listener and waits for it to wind down.
    pub async fn release(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_starts_checking() {
        let source = SessionSource::new();
        assert_eq!(source.current(), AuthState::Checking);
        assert!(source.principal().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_sign_in_and_out() {
        let source = SessionSource::new();
        let mut rx = source.subscribe();

        source.sign_in(Principal::new("u1", None));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().principal().map(|p| p.uid.as_str()), Some("u1"));

        source.sign_out();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn test_static_token_source_rejects_empty_token() {
        let principal = Principal::new("u1", None);
        assert!(StaticTokenSource::new("").id_token(&principal).await.is_err());
        assert_eq!(
            StaticTokenSource::new("tok").id_token(&principal).await.unwrap(),
            "tok"
        );
    }

    #[tokio::test]
    async fn test_release_stops_listener() {
        let handle = tokio::spawn(std::future::pending::<()>());
        let sub = SessionSubscription::new(handle);
        assert!(sub.is_active());
        sub.release().await;
    }
}
