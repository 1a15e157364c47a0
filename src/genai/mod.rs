mod gemini;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiClient;

pub const DEFAULT_PROMPT_SUFFIX: &str =
    " — generate a startup pitch with headings: Name, Tagline, Pitch, Target Audience, and Landing Copy.";
pub const DEFAULT_FALLBACK_REPLY: &str = "⚠️ Something went wrong! Please try again.";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("prompt was blocked: {0}")]
    Blocked(String),
    #[error("generation response carried no text")]
    Empty,
}

/// A text-in, text-out generative model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Wording wrapped around every chat prompt, and the reply persisted when
/// generation fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    pub suffix: String,
    pub fallback_reply: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        PromptTemplate {
            suffix: DEFAULT_PROMPT_SUFFIX.to_owned(),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_owned(),
        }
    }
}

impl PromptTemplate {
    pub fn build(&self, input: &str) -> String {
        format!("{input}{}", self.suffix)
    }
}
