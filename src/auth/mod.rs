use axum::{routing::{get, post}, Router};
use serde::Deserialize;

use crate::AppState;

mod clients;
mod error;
mod firebase;
mod gateway;
mod lockin;
mod login;
mod logout;
mod signup;

pub use clients::{ClientProvider, Clients};
pub use error::{AuthError, Flow};
pub use firebase::FirebaseIdentity;
pub use gateway::{AuthEvent, AuthGateway, Identity, IdentityProvider};
pub use login::{login, login_page};
pub use signup::{signup, signup_page};

pub(crate) const FEDERATED_FAILED: &str = "Google sign-in failed. Try again.";

/// Email/password form body. Missing fields read as empty.
#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Routes that work whatever the session state: federated sign-in and logout.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login/{provider}", get(login::federated))
        .route("/lockin/{provider}", get(lockin::lockin))
        .route("/logout", post(logout::logout))
}
