use std::{collections::HashMap, sync::{Arc, Mutex, MutexGuard, PoisonError}};

use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{db, AppResult};

use super::{Message, MessageFeed, MessageStore, NewMessage};

const FEED_CAPACITY: usize = 256;

/// One broadcast channel per owner with live feeds. A channel is dropped
/// once its last feed is.
type Feeds = Arc<Mutex<HashMap<String, broadcast::Sender<Message>>>>;

#[derive(Clone)]
pub struct SqliteMessageStore {
    db_pool: SqlitePool,
    feeds: Feeds,
}

impl SqliteMessageStore {
    pub async fn new(db_pool: SqlitePool) -> Result<Self, sqlx::Error> {
        db::migrate(&db_pool).await?;
        Ok(SqliteMessageStore {
            db_pool,
            feeds: Feeds::default(),
        })
    }

    /// Live feeds across all owners.
    pub fn subscriber_count(&self) -> usize {
        self.feeds().values().map(broadcast::Sender::receiver_count).sum()
    }

    fn feeds(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<Message>>> {
        self.feeds.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, message: &Message) {
        let mut feeds = self.feeds();
        let unheard = feeds
            .get(&message.owner)
            .is_some_and(|tx| tx.send(message.clone()).is_err());
        if unheard {
            feeds.remove(&message.owner);
        }
    }
}

type MessageRow = (String, String, String, i64, Option<String>);

fn from_row(owner: &str, (id, sender, text, timestamp, client_id): MessageRow) -> AppResult<Message> {
    Ok(Message {
        id: Uuid::parse_str(&id)?,
        owner: owner.to_owned(),
        sender: sender.parse()?,
        text,
        timestamp,
        client_id: match client_id {
            Some(x) => Some(Uuid::parse_str(&x)?),
            None => None,
        },
    })
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn append(&self, owner: &str, message: NewMessage) -> AppResult<Message> {
        let NewMessage { sender, text, client_id } = message;
        let id = Uuid::now_v7();
        let (timestamp,): (i64,) = sqlx::query_as(
            "INSERT INTO messages (id,owner,sender,text,timestamp,client_id) \
             VALUES (?,?,?,?,CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER),?) \
             RETURNING timestamp",
        )
            .bind(id.to_string())
            .bind(owner)
            .bind(sender.as_str())
            .bind(&text)
            .bind(client_id.as_ref().map(Uuid::to_string))
            .fetch_one(&self.db_pool)
            .await?;

        let message = Message {
            id,
            owner: owner.to_owned(),
            sender,
            text,
            timestamp,
            client_id,
        };
        tracing::debug!(%owner, id = %message.id, %sender, "message appended");

        self.publish(&message);
        Ok(message)
    }

    async fn list_ordered(&self, owner: &str) -> AppResult<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id,sender,text,timestamp,client_id FROM messages WHERE owner=? ORDER BY timestamp ASC, rowid ASC",
        )
            .bind(owner)
            .fetch_all(&self.db_pool)
            .await?;

        rows.into_iter().map(|row| from_row(owner, row)).collect()
    }

    fn subscribe(&self, owner: &str) -> MessageFeed {
        let mut feeds = self.feeds();
        feeds.retain(|_, tx| tx.receiver_count() > 0);
        let rx = feeds
            .entry(owner.to_owned())
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .subscribe();
        MessageFeed::new(owner, rx)
    }
}
