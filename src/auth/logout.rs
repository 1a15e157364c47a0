use axum::{debug_handler, extract::{Query, State}, response::Redirect};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{notify::{self, Toast}, session::{self, DASHBOARD_PATH, LOGIN_PATH}, AppResult, AppState};

use super::AuthGateway;

#[derive(Deserialize)]
pub(crate) struct LogoutQuery {
    pub(crate) return_url: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn logout(
    Query(LogoutQuery { return_url }): Query<LogoutQuery>,
    State(gateway): State<AuthGateway>,
    session: Session
) -> AppResult<Redirect> {
    let Some(user) = session::current_user(&session).await? else {
        return Ok(Redirect::to(LOGIN_PATH));
    };

    if let Err(err) = gateway.sign_out(&user.user_id).await {
        tracing::error!(user_id = %user.user_id, error = %err, "sign-out failed");
        notify::push(&session, Toast::error("Error logging out!")).await?;
        return Ok(Redirect::to(DASHBOARD_PATH));
    }

    tracing::info!(user_id = %user.user_id, "signed out");
    session.flush().await?;
    Ok(Redirect::to(return_url.as_deref().and_then(session::local_path).unwrap_or(LOGIN_PATH)))
}
