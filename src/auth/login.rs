use axum::{debug_handler, extract::{Path, Query, State}, response::{Html, IntoResponse, Redirect, Response}, Form};
use oauth2::{CsrfToken, PkceCodeChallenge, Scope};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{include_res, notify::{self, Toast}, res::{self, escape_html}, session::{self, CSRF_STATE, DASHBOARD_PATH, LOGIN_PATH, PKCE_VERIFIER, RETURN_URL}, AppResult, AppState};

use super::{clients::ClientProvider, AuthGateway, Clients, Credentials, Flow};

const LOGIN_REDIRECT_DELAY_MS: u64 = 800;

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    pub(crate) return_url: Option<String>,
}

fn render_login(email: &str, toasts: &[Toast]) -> Html<String> {
    let body = include_res!(str, "/pages/login.html")
        .replace("{email}", &escape_html(email));
    res::page("Login", toasts, &body)
}

#[debug_handler]
pub async fn login_page(session: Session) -> AppResult<Html<String>> {
    let toasts = notify::take(&session).await?;
    Ok(render_login("", &toasts))
}

#[debug_handler(state = AppState)]
pub async fn login(
    State(gateway): State<AuthGateway>,
    session: Session,
    Form(Credentials { email, password }): Form<Credentials>,
) -> AppResult<Response> {
    if email.trim().is_empty() || password.trim().is_empty() {
        return Ok(render_login(&email, &[Toast::warning("Please fill in all fields!")]).into_response());
    }

    match gateway.sign_in(email.trim(), &password).await {
        Ok(identity) => {
            tracing::info!(user_id = %identity.user_id, "signed in");
            session::begin(&session, &identity.into()).await?;
            Ok(res::redirect_after(DASHBOARD_PATH, LOGIN_REDIRECT_DELAY_MS, Toast::success("Login successful!")).into_response())
        }
        Err(err) => {
            tracing::warn!(error = %err, "sign-in rejected");
            Ok(render_login(&email, &[Toast::error(err.user_message(Flow::Login))]).into_response())
        }
    }
}

/// Starts the OAuth authorization-code flow for `provider`.
#[debug_handler(state = AppState)]
pub(crate) async fn federated(
    Path(provider): Path<ClientProvider>,
    Query(LoginQuery { return_url }): Query<LoginQuery>,
    State(clients): State<Clients>,
    session: Session,
) -> AppResult<Response> {
    let client = match clients.get_client(provider) {
        Ok(client) => client,
        Err(err) => {
            tracing::warn!(%provider, error = %err.0, "federated sign-in unavailable");
            notify::push(&session, Toast::error(super::FEDERATED_FAILED)).await?;
            return Ok(Redirect::to(LOGIN_PATH).into_response());
        }
    };

    let (pkce_code_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

    let (authorize_url, csrf_state) = client.authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new("openid".to_string()))
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .set_pkce_challenge(pkce_code_challenge)
        .url();

    session.insert(CSRF_STATE, csrf_state.secret()).await?;
    session.insert(PKCE_VERIFIER, pkce_verifier.secret()).await?;
    if let Some(return_url) = return_url.as_deref().and_then(session::local_path) {
        session.insert(RETURN_URL, return_url).await?;
    }

    Ok(Redirect::to(authorize_url.as_str()).into_response())
}
