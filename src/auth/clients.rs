use std::fmt;

use oauth2::{basic::BasicClient, url, AuthUrl, Client, ClientId, ClientSecret, RedirectUrl, TokenUrl};
use serde::Deserialize;

use crate::{config::OAuthKeys, AppResult};

type HappyClient = Client<oauth2::StandardErrorResponse<oauth2::basic::BasicErrorResponseType>, oauth2::StandardTokenResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>, oauth2::StandardTokenIntrospectionResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>, oauth2::StandardRevocableToken, oauth2::StandardErrorResponse<oauth2::RevocationErrorResponseType>, oauth2::EndpointSet, oauth2::EndpointNotSet, oauth2::EndpointNotSet, oauth2::EndpointNotSet, oauth2::EndpointSet>;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientProvider {
    Google,
}

impl ClientProvider {
    /// Provider id as the identity toolkit names it.
    pub fn id(&self) -> &str {
        use ClientProvider::*;
        match self {
            Google => "google.com",
        }
    }

    pub fn path(&self) -> &str {
        use ClientProvider::*;
        match self {
            Google => "google",
        }
    }
}

impl fmt::Display for ClientProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone)]
pub struct Clients {
    google_client: Option<HappyClient>,
}

impl Clients {
    pub fn new(google: Option<&OAuthKeys>, public_url: &str) -> Result<Clients, url::ParseError> {
        let google_client = match google {
            Some(keys) => {
                let client_id = ClientId::new(keys.client_id.clone());
                let client_secret = ClientSecret::new(keys.client_secret.clone());

                let auth_url = AuthUrl::new("https://accounts.google.com/o/oauth2/auth".to_string())?;
                let token_url = TokenUrl::new("https://oauth2.googleapis.com/token".to_string())?;
                let redirect_url = RedirectUrl::new(format!("{public_url}/lockin/{}", ClientProvider::Google.path()))?;

                Some(
                    BasicClient::new(client_id)
                    .set_client_secret(client_secret)
                    .set_auth_uri(auth_url)
                    .set_token_uri(token_url)
                    .set_redirect_uri(redirect_url)
                )
            }
            None => None,
        };

        Ok(
            Clients {
                google_client,
            }
        )
    }

    /// No federated providers at all.
    pub fn disabled() -> Clients {
        Clients { google_client: None }
    }

    pub fn get_client(&self, provider: ClientProvider) -> AppResult<HappyClient> {
        use ClientProvider::*;
        match provider {
            Google => self.google_client.clone(),
        }.ok_or(format!("OAuth provider {provider} keys not supplied").into())
    }
}
