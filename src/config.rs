use thiserror::Error;

use crate::genai::{PromptTemplate, DEFAULT_FALLBACK_REPLY, DEFAULT_PROMPT_SUFFIX};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://pitchcraft.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_SESSION_IDLE_MINUTES: i64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct OAuthKeys {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub public_url: String,
    pub firebase_api_key: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub google: Option<OAuthKeys>,
    pub prompts: PromptTemplate,
    pub session_idle_minutes: i64,
}

impl Config {
    /// Reads the process environment, falling back to a `.env` file.
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let google = match (var("GOOGLE_CLIENT_ID"), var("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(OAuthKeys { client_id, client_secret }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("GOOGLE_CLIENT_SECRET")),
            (None, Some(_)) => return Err(ConfigError::Missing("GOOGLE_CLIENT_ID")),
        };

        let session_idle_minutes = match var("SESSION_IDLE_MINUTES") {
            Some(value) => match value.trim().parse::<i64>() {
                Ok(minutes) if minutes > 0 => minutes,
                _ => return Err(ConfigError::Invalid { key: "SESSION_IDLE_MINUTES", value }),
            },
            None => DEFAULT_SESSION_IDLE_MINUTES,
        };

        Ok(Config {
            database_url: var("DATABASE_URL").unwrap_or(DEFAULT_DATABASE_URL.to_owned()),
            bind_addr: var("BIND_ADDR").unwrap_or(DEFAULT_BIND_ADDR.to_owned()),
            public_url: var("PUBLIC_URL")
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or(DEFAULT_PUBLIC_URL.to_owned()),
            firebase_api_key: required("FIREBASE_API_KEY")?,
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: var("GEMINI_MODEL").unwrap_or(DEFAULT_GEMINI_MODEL.to_owned()),
            google,
            prompts: PromptTemplate {
                // the suffix is appended verbatim, so only an unset value falls back
                suffix: lookup("PROMPT_SUFFIX").unwrap_or(DEFAULT_PROMPT_SUFFIX.to_owned()),
                fallback_reply: var("FALLBACK_REPLY").unwrap_or(DEFAULT_FALLBACK_REPLY.to_owned()),
            },
            session_idle_minutes,
        })
    }
}
