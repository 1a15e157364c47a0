pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod genai;
pub mod notify;
pub mod res;
pub mod session;
pub mod store;

use std::{ops::Deref, sync::Arc};

use axum::{extract::FromRef, http::StatusCode, middleware, response::{IntoResponse, Response}, routing::get, Router};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

use crate::{auth::AuthGateway, genai::{PromptTemplate, TextGenerator}, session::Gate, store::MessageStore};

pub type SharedStore = Arc<dyn MessageStore>;
pub type SharedGenerator = Arc<dyn TextGenerator>;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub gateway: AuthGateway,
    pub clients: auth::Clients,
    pub store: SharedStore,
    pub generator: SharedGenerator,
    pub prompts: PromptTemplate,
}

/// Builds the full application: routes, route guards, request tracing and
/// the cookie session layer.
pub fn app(state: AppState, session_idle: time::Duration) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(session_idle));

    let signed_out = Router::new()
        .route("/", get(auth::login_page).post(auth::login))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route_layer(middleware::from_fn_with_state(Gate::SignedOut, session::guard));

    let signed_in = dashboard::router()
        .route_layer(middleware::from_fn_with_state(Gate::SignedIn, session::guard));

    Router::new()
        .merge(signed_out)
        .nest("/dashboard", signed_in)
        .merge(auth::router())
        .route("/static/{file}", get(res::asset))
        .fallback(res::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(session_layer)
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> AppResult<String>;
    fn get_obj_field(&self, field: &str) -> AppResult<&Value>;
}

impl GetField for serde_json::Value {
    fn get_str_field(&self, field: &str) -> AppResult<String> {
        Ok(
            self.get(field)
            .ok_or(format!("expected {field} in {self}"))?
            .as_str()
            .ok_or(format!("expected {field} in {self} to be string"))?
            .to_owned()
        )
    }

    fn get_obj_field(&self, field: &str) -> AppResult<&Value> {
        self.get(field)
        .ok_or(format!("expected {field} in {self}").into())
    }
}


pub type AppResult<T> = Result<T, AppError>;
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, backtrace = %self.0.backtrace(), "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong. Please try again.").into_response()
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self(anyhow::Error::msg(err.to_owned()))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(serde_json::Error);
apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(axum::Error);
apperr_impl!(reqwest::Error);
apperr_impl!(uuid::Error);
apperr_impl!(auth::AuthError);

impl<E: core::error::Error + Send + Sync + 'static, R: oauth2::ErrorResponse + Send + Sync + 'static> From<oauth2::RequestTokenError<E, R>> for AppError {
    fn from(err: oauth2::RequestTokenError<E, R>) -> Self {
        Self(anyhow::Error::from(err))
    }
}

/// Markdown source rendered to HTML. Raw HTML in the source is escaped
/// rather than passed through.
pub struct Markdown<T>(pub T);

impl<T> Markdown<T>
where
    T: Deref<Target = str>
{
    pub fn to_html(&self) -> String {
        use pulldown_cmark::{Event, Options, Parser};

        let parser = Parser::new_ext(&*self.0, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
            .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            _ => event,
        });

        let mut html_output = String::new();
        pulldown_cmark::html::push_html(&mut html_output, parser);
        html_output
    }
}
