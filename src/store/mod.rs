mod sqlite;

use std::{fmt, str::FromStr};

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::AppResult;

pub use sqlite::SqliteMessageStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        use Sender::*;
        match self {
            User => "user",
            Ai => "ai",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "ai" => Ok(Sender::Ai),
            other => Err(anyhow!("unknown sender {other:?}")),
        }
    }
}

/// A persisted chat record. Never changes once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub owner: String,
    pub sender: Sender,
    pub text: String,
    /// Unix millis, assigned by the database at write time.
    pub timestamp: i64,
    pub client_id: Option<Uuid>,
}

#[derive(Clone, Debug)]
pub struct NewMessage {
    pub sender: Sender,
    pub text: String,
    pub client_id: Option<Uuid>,
}

impl NewMessage {
    pub fn user(text: impl Into<String>, client_id: Option<Uuid>) -> Self {
        NewMessage { sender: Sender::User, text: text.into(), client_id }
    }

    pub fn ai(text: impl Into<String>, client_id: Option<Uuid>) -> Self {
        NewMessage { sender: Sender::Ai, text: text.into(), client_id }
    }
}

/// Per-user, append-only, timestamp-ordered message collections.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn append(&self, owner: &str, message: NewMessage) -> AppResult<Message>;

    /// All of `owner`'s messages, oldest first.
    async fn list_ordered(&self, owner: &str) -> AppResult<Vec<Message>>;

    /// Live feed of messages appended for `owner` from now on. Other owners'
    /// traffic never reaches it. Dropping the feed unsubscribes.
    fn subscribe(&self, owner: &str) -> MessageFeed;
}

/// What a [`MessageFeed`] yields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedEvent {
    Appended(Message),
    /// The feed fell behind and `skipped` appends were lost. Reload the
    /// history to catch up.
    Lagged(u64),
}

pub struct MessageFeed {
    owner: String,
    rx: broadcast::Receiver<Message>,
}

impl MessageFeed {
    pub fn new(owner: impl Into<String>, rx: broadcast::Receiver<Message>) -> Self {
        MessageFeed { owner: owner.into(), rx }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Next event for this feed's owner, `None` once the store is gone.
    pub async fn next(&mut self) -> Option<FeedEvent> {
        match self.rx.recv().await {
            Ok(message) => Some(FeedEvent::Appended(message)),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(owner = %self.owner, skipped, "message feed lagged");
                Some(FeedEvent::Lagged(skipped))
            }
            Err(RecvError::Closed) => None,
        }
    }
}
