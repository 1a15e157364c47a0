use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::GetField;

use super::{clients::ClientProvider, error::parse_code, AuthError, Identity, IdentityProvider};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Firebase Authentication over the Identity Toolkit REST API.
#[derive(Clone)]
pub struct FirebaseIdentity {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    request_uri: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest {
    post_body: String,
    request_uri: String,
    return_idp_credential: bool,
    return_secure_token: bool,
}

impl FirebaseIdentity {
    pub fn new(api_key: String, public_url: &str) -> Self {
        FirebaseIdentity {
            http_client: reqwest::Client::new(),
            api_key,
            base_url: IDENTITY_TOOLKIT_URL.to_owned(),
            request_uri: format!("{public_url}/"),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn call<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<Identity, AuthError> {
        let url = format!("{}/accounts:{endpoint}?key={}", self.base_url, self.api_key);
        let response = self.http_client.post(url).json(body).send().await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            return Err(provider_error(&body));
        }
        identity_from(&body)
    }
}

fn provider_error(body: &Value) -> AuthError {
    match body.get_obj_field("error").and_then(|error| error.get_str_field("message")) {
        Ok(message) => AuthError::Provider { code: parse_code(&message) },
        Err(_) => AuthError::Malformed(body.to_string()),
    }
}

fn identity_from(body: &Value) -> Result<Identity, AuthError> {
    // signInWithIdp reports some failures in a 200 response
    if let Ok(message) = body.get_str_field("errorMessage") {
        return Err(AuthError::Provider { code: parse_code(&message) });
    }

    let user_id = body
        .get_str_field("localId")
        .map_err(|err| AuthError::Malformed(err.0.to_string()))?;
    let non_empty = |field: &str| body.get_str_field(field).ok().filter(|value| !value.is_empty());

    Ok(Identity {
        user_id,
        display_name: non_empty("displayName"),
        email: non_empty("email"),
    })
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.call("signUp", &PasswordRequest { email, password, return_secure_token: true }).await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.call("signInWithPassword", &PasswordRequest { email, password, return_secure_token: true }).await
    }

    async fn authenticate_federated(&self, provider: ClientProvider, access_token: &str) -> Result<Identity, AuthError> {
        let request = IdpRequest {
            post_body: format!("access_token={access_token}&providerId={}", provider.id()),
            request_uri: self.request_uri.clone(),
            return_idp_credential: true,
            return_secure_token: true,
        };
        self.call("signInWithIdp", &request).await
    }

    async fn end_session(&self, user_id: &str) -> Result<(), AuthError> {
        // id tokens are stateless; dropping our session record ends it
        tracing::debug!(%user_id, "firebase session ended");
        Ok(())
    }
}
