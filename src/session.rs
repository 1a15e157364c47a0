use axum::{extract::{Request, State}, middleware::Next, response::{IntoResponse, Redirect, Response}};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{auth::Identity, AppResult};

pub const USER: &str = "user";
pub const CSRF_STATE: &str = "csrf_state";
pub const PKCE_VERIFIER: &str = "pkce_verifier";
pub const RETURN_URL: &str = "return_url";
pub const TOASTS: &str = "toasts";

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// The signed-in user as remembered by this server's session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: String,
    pub display_name: Option<String>,
}

impl From<Identity> for SessionUser {
    fn from(identity: Identity) -> Self {
        SessionUser {
            user_id: identity.user_id,
            display_name: identity.display_name.or(identity.email),
        }
    }
}

pub async fn current_user(session: &Session) -> AppResult<Option<SessionUser>> {
    Ok(session.get::<SessionUser>(USER).await?)
}

/// Replaces whatever user the session held with `user`, under a fresh id.
pub async fn begin(session: &Session, user: &SessionUser) -> AppResult<()> {
    session.cycle_id().await?;
    session.insert(USER, user).await?;
    Ok(())
}

/// Keeps only same-site paths, so return urls can't bounce users elsewhere.
pub fn local_path(url: &str) -> Option<&str> {
    (url.starts_with('/') && !url.starts_with("//") && !url.contains('\\')).then_some(url)
}

/// Which session state a route accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    /// Requires a user; anonymous requests go to the login page.
    SignedIn,
    /// Entry pages; a signed-in user goes straight to the dashboard.
    SignedOut,
}

pub async fn guard(
    State(gate): State<Gate>,
    session: Session,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let user = current_user(&session).await?;

    match (gate, user) {
        (Gate::SignedIn, None) => Ok(Redirect::to(LOGIN_PATH).into_response()),
        (Gate::SignedIn, Some(user)) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        (Gate::SignedOut, Some(user)) => {
            tracing::debug!(user_id = %user.user_id, "already signed in");
            Ok(Redirect::to(DASHBOARD_PATH).into_response())
        }
        (Gate::SignedOut, None) => Ok(next.run(request).await),
    }
}
