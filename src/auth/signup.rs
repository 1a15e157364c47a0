use axum::{debug_handler, extract::State, response::{Html, IntoResponse, Response}, Form};
use tower_sessions::Session;

use crate::{include_res, notify::{self, Toast}, res::{self, escape_html}, session::LOGIN_PATH, AppResult, AppState};

use super::{AuthGateway, Credentials, Flow};

const SIGNUP_REDIRECT_DELAY_MS: u64 = 1000;

fn render_signup(email: &str, toasts: &[Toast]) -> Html<String> {
    let body = include_res!(str, "/pages/signup.html")
        .replace("{email}", &escape_html(email));
    res::page("Create Account", toasts, &body)
}

#[debug_handler]
pub async fn signup_page(session: Session) -> AppResult<Html<String>> {
    let toasts = notify::take(&session).await?;
    Ok(render_signup("", &toasts))
}

/// Creates the account, then sends the user to log in with it.
#[debug_handler(state = AppState)]
pub async fn signup(
    State(gateway): State<AuthGateway>,
    Form(Credentials { email, password }): Form<Credentials>,
) -> AppResult<Response> {
    if email.trim().is_empty() || password.trim().is_empty() {
        return Ok(render_signup(&email, &[Toast::warning("Please fill out all fields")]).into_response());
    }

    match gateway.sign_up(email.trim(), &password).await {
        Ok(identity) => {
            tracing::info!(user_id = %identity.user_id, "account created");
            Ok(res::redirect_after(LOGIN_PATH, SIGNUP_REDIRECT_DELAY_MS, Toast::success("Sign-up successful!")).into_response())
        }
        Err(err) => {
            tracing::warn!(error = %err, "sign-up rejected");
            Ok(render_signup(&email, &[Toast::error(err.user_message(Flow::SignUp))]).into_response())
        }
    }
}
