use axum::{debug_handler, extract::{Path, Query, State}, response::{IntoResponse, Redirect, Response}};
use oauth2::{AuthorizationCode, CsrfToken, PkceCodeVerifier, TokenResponse};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{notify::{self, Toast}, res, session::{self, CSRF_STATE, DASHBOARD_PATH, LOGIN_PATH, PKCE_VERIFIER, RETURN_URL}, AppResult, AppState};

use super::{clients::ClientProvider, AuthGateway, Clients, Identity};

const FEDERATED_REDIRECT_DELAY_MS: u64 = 1000;

#[derive(Deserialize)]
pub struct LockinQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

/// OAuth redirect target: finishes the code exchange and signs in with the
/// identity provider.
#[debug_handler(state = AppState)]
pub(crate) async fn lockin(
    Path(provider): Path<ClientProvider>,
    Query(query): Query<LockinQuery>,
    State(gateway): State<AuthGateway>,
    State(clients): State<Clients>,
    session: Session,
) -> AppResult<Response> {
    let identity = match exchange(provider, query, &gateway, &clients, &session).await {
        Ok(identity) => identity,
        Err(err) => {
            tracing::warn!(%provider, error = %err.0, "federated sign-in failed");
            notify::push(&session, Toast::error(super::FEDERATED_FAILED)).await?;
            return Ok(Redirect::to(LOGIN_PATH).into_response());
        }
    };

    tracing::info!(%provider, user_id = %identity.user_id, "signed in");

    let return_url: Option<String> = session.remove(RETURN_URL).await?;
    let greeting = match &identity.display_name {
        Some(name) => format!("Welcome, {name}!"),
        None => "Welcome!".to_owned(),
    };
    session::begin(&session, &identity.into()).await?;

    let return_url = return_url.as_deref().and_then(session::local_path).unwrap_or(DASHBOARD_PATH);
    Ok(res::redirect_after(return_url, FEDERATED_REDIRECT_DELAY_MS, Toast::success(greeting)).into_response())
}

async fn exchange(
    provider: ClientProvider,
    LockinQuery { state, code }: LockinQuery,
    gateway: &AuthGateway,
    clients: &Clients,
    session: &Session,
) -> AppResult<Identity> {
    let state = CsrfToken::new(state.ok_or("OAuth: without state")?);
    let code = AuthorizationCode::new(code.ok_or("OAuth: without code")?);

    let Some(stored_state) = session.remove::<String>(CSRF_STATE).await? else {
        return Err("no csrf_state")?;
    };

    if state.secret().as_str() != stored_state.as_str() {
        return Err("csrf tokens don't match")?;
    }

    let Some(pkce_verifier) = session.remove::<String>(PKCE_VERIFIER).await? else {
        return Err("no pkce_verifier")?;
    };

    let client = clients.get_client(provider)?;
    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let token_result = client
        .exchange_code(code)
        .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
        .request_async(&http_client)
        .await?;

    let access_token = token_result.access_token().secret();
    Ok(gateway.sign_in_federated(provider, access_token).await?)
}
