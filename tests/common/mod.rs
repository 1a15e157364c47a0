#![allow(dead_code)]

use std::{collections::HashMap, sync::{atomic::{AtomicUsize, Ordering}, Arc, Mutex}};

use async_trait::async_trait;
use axum::{body::Body, http::{header, Request, Response}, Router};
use pitchcraft::{
    auth::{AuthError, AuthGateway, ClientProvider, Clients, Identity, IdentityProvider},
    db,
    genai::{GenerateError, PromptTemplate, TextGenerator},
    store::SqliteMessageStore,
    AppState,
};

pub const PITCH: &str = "## Name\nBrewGo\n\n## Tagline\nCoffee, now.\n\n## Pitch\nHot coffee in ten minutes.\n\n## Target Audience\nCommuters.\n\n## Landing Copy\nSkip the line.";

/// Email/password accounts kept in memory. Counts every call it receives.
/// Accounts whose email starts with "stuck" cannot sign out.
#[derive(Default)]
pub struct FakeIdentity {
    accounts: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if email.starts_with("quota") {
            return Err(AuthError::provider("QUOTA_EXCEEDED"));
        }
        if password.len() < 6 {
            return Err(AuthError::provider("WEAK_PASSWORD"));
        }
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(AuthError::provider("EMAIL_EXISTS"));
        }
        accounts.insert(email.to_owned(), password.to_owned());
        Ok(Identity { user_id: format!("uid-{email}"), display_name: None, email: Some(email.to_owned()) })
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.accounts.lock().unwrap().get(email) {
            Some(stored) if stored == password => {
                Ok(Identity { user_id: format!("uid-{email}"), display_name: None, email: Some(email.to_owned()) })
            }
            _ => Err(AuthError::provider("INVALID_LOGIN_CREDENTIALS")),
        }
    }

    async fn authenticate_federated(&self, _provider: ClientProvider, _access_token: &str) -> Result<Identity, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AuthError::provider("INVALID_IDP_RESPONSE"))
    }

    async fn end_session(&self, user_id: &str) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if user_id.starts_with("uid-stuck") {
            return Err(AuthError::provider("INTERNAL_ERROR"));
        }
        Ok(())
    }
}

/// Answers every prompt with [`PITCH`], unless the prompt starts with
/// "fail".
pub struct FakeGenerator;

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        if prompt.starts_with("fail") {
            return Err(GenerateError::Api { status: 500, body: "internal".to_owned() });
        }
        Ok(PITCH.to_owned())
    }
}

pub struct Harness {
    pub app: Router,
    pub identity: Arc<FakeIdentity>,
    pub store: Arc<SqliteMessageStore>,
}

pub async fn harness() -> Harness {
    let identity = Arc::new(FakeIdentity::default());
    let store = Arc::new(SqliteMessageStore::new(db::memory().await.unwrap()).await.unwrap());

    let state = AppState {
        gateway: AuthGateway::new(identity.clone()),
        clients: Clients::disabled(),
        store: store.clone(),
        generator: Arc::new(FakeGenerator),
        prompts: PromptTemplate::default(),
    };

    Harness {
        app: pitchcraft::app(state, time::Duration::minutes(5)),
        identity,
        store,
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut request = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    request.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    request.body(Body::from(body.to_owned())).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// The `name=value` part of the session cookie the response sets, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_owned)
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response.headers().get(header::LOCATION).and_then(|value| value.to_str().ok())
}
