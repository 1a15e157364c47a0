use axum::{debug_handler, extract::State, response::{Html, Redirect}, Extension, Form};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{include_res, notify, res::{self, escape_html}, session::{SessionUser, DASHBOARD_PATH}, AppResult, AppState};

use super::msg;

#[derive(Deserialize)]
pub(crate) struct SendForm {
    #[serde(default)]
    text: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn dashboard(
    Extension(user): Extension<SessionUser>,
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Html<String>> {
    let toasts = notify::take(&session).await?;
    let history = state.store.list_ordered(&user.user_id).await?;

    let messages = if history.is_empty() {
        include_res!(str, "/pages/dashboard/empty.html").to_owned()
    } else {
        history.iter().map(msg::msg_to_html).collect()
    };

    let body = include_res!(str, "/pages/dashboard/dashboard.html")
        .replace("{display_name}", &escape_html(user.display_name.as_deref().unwrap_or("")))
        .replace("{messages}", &messages);

    Ok(res::page("PitchCraft", &toasts, &body))
}

/// Send path for browsers without the live socket: runs the whole exchange
/// inside the request and reloads the dashboard.
#[debug_handler(state = AppState)]
pub(crate) async fn send(
    Extension(user): Extension<SessionUser>,
    State(state): State<AppState>,
    Form(SendForm { text }): Form<SendForm>,
) -> AppResult<Redirect> {
    msg::send_prompt(
        state.store.as_ref(),
        state.generator.as_ref(),
        &state.prompts,
        &user.user_id,
        &text,
        None,
    ).await?;

    Ok(Redirect::to(DASHBOARD_PATH))
}
