use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{clients::ClientProvider, AuthError};

const AUTH_EVENT_CAPACITY: usize = 64;

/// Who the identity provider says the user is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// The external service that owns accounts and issues sessions.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
    async fn authenticate_federated(&self, provider: ClientProvider, access_token: &str) -> Result<Identity, AuthError>;
    async fn end_session(&self, user_id: &str) -> Result<(), AuthError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(String),
    SignedOut(String),
}

impl AuthEvent {
    pub fn user_id(&self) -> &str {
        match self {
            AuthEvent::SignedIn(user_id) | AuthEvent::SignedOut(user_id) => user_id,
        }
    }
}

/// Thin front over the identity provider. Errors pass through untouched;
/// successful sign-ins and sign-outs are announced to observers.
#[derive(Clone)]
pub struct AuthGateway {
    provider: Arc<dyn IdentityProvider>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthGateway {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        AuthGateway {
            provider,
            events: broadcast::channel(AUTH_EVENT_CAPACITY).0,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self.provider.authenticate(email, password).await?;
        self.announce(AuthEvent::SignedIn(identity.user_id.clone()));
        Ok(identity)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.provider.create_account(email, password).await
    }

    pub async fn sign_in_federated(&self, provider: ClientProvider, access_token: &str) -> Result<Identity, AuthError> {
        let identity = self.provider.authenticate_federated(provider, access_token).await?;
        self.announce(AuthEvent::SignedIn(identity.user_id.clone()));
        Ok(identity)
    }

    pub async fn sign_out(&self, user_id: &str) -> Result<(), AuthError> {
        self.provider.end_session(user_id).await?;
        self.announce(AuthEvent::SignedOut(user_id.to_owned()));
        Ok(())
    }

    /// Subscribes to sign-in/sign-out events. Drop the receiver to
    /// unsubscribe.
    pub fn observe_auth_state(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn announce(&self, event: AuthEvent) {
        // nobody watching is fine
        let _ = self.events.send(event);
    }
}
