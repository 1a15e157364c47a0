use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{include_res, res::escape_html, session::TOASTS, AppResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Success,
    Warning,
    Error,
}

impl Level {
    fn class(&self) -> &'static str {
        use Level::*;
        match self {
            Success => "toast-success",
            Warning => "toast-warning",
            Error => "toast-error",
        }
    }
}

/// A short-lived notification shown by the shell and dismissed on a timer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: Level,
    pub text: String,
}

impl Toast {
    pub fn success(text: impl Into<String>) -> Self {
        Toast { level: Level::Success, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Toast { level: Level::Warning, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Toast { level: Level::Error, text: text.into() }
    }
}

/// Queues a toast for the next page this session renders.
pub async fn push(session: &Session, toast: Toast) -> AppResult<()> {
    let mut toasts: Vec<Toast> = session.get(TOASTS).await?.unwrap_or_default();
    toasts.push(toast);
    session.insert(TOASTS, toasts).await?;
    Ok(())
}

pub async fn take(session: &Session) -> AppResult<Vec<Toast>> {
    Ok(session.remove::<Vec<Toast>>(TOASTS).await?.unwrap_or_default())
}

pub fn render(toasts: &[Toast]) -> String {
    toasts
        .iter()
        .map(|toast| {
            include_res!(str, "/pages/toast.html")
                .replace("{class}", toast.level.class())
                .replace("{text}", &escape_html(&toast.text))
        })
        .collect()
}
