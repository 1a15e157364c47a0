use axum::{debug_handler, extract::{ws::Message as WsMessage, State, WebSocketUpgrade}, response::IntoResponse, Extension};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::{sync::{broadcast::error::RecvError, mpsc}, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{auth::AuthEvent, session::SessionUser, store::{FeedEvent, Message, MessageFeed, MessageStore, Sender}, AppState, SharedStore};

use super::msg;

const OUTBOX_CAPACITY: usize = 32;

/// What the browser sends: one chat message, tagged with the id of its
/// optimistic entry.
#[derive(Debug, Deserialize)]
pub(crate) struct SendFrame {
    client_id: Option<Uuid>,
    text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Frame {
    Message {
        id: Uuid,
        client_id: Option<Uuid>,
        sender: Sender,
        html: String,
    },
    Loading {
        client_id: Option<Uuid>,
        on: bool,
    },
}

impl From<&Message> for Frame {
    fn from(message: &Message) -> Self {
        Frame::Message {
            id: message.id,
            client_id: message.client_id,
            sender: message.sender,
            html: msg::msg_to_html(message),
        }
    }
}

/// Frames bound for one socket. Once the socket's view is torn down the
/// token is cancelled and late frames are dropped.
#[derive(Clone)]
pub(crate) struct Outbox {
    tx: mpsc::Sender<Frame>,
    cancel: CancellationToken,
}

impl Outbox {
    pub(crate) fn new(tx: mpsc::Sender<Frame>, cancel: CancellationToken) -> Self {
        Outbox { tx, cancel }
    }

    pub(crate) async fn send(&self, frame: Frame) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.tx.send(frame).await.is_ok()
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn dashboard_ws(
    Extension(user): Extension<SessionUser>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        let (sink, stream) = socket.split();
        run(sink, stream, user.user_id, state)
    })
}

/// Serves one dashboard socket until the browser leaves or `owner` signs
/// out anywhere. Both subscriptions are released before this returns.
async fn run<Si, St>(mut sink: Si, mut stream: St, owner: String, state: AppState)
where
    Si: Sink<WsMessage> + Unpin + Send + 'static,
    St: Stream<Item = Result<WsMessage, axum::Error>> + Unpin + Send,
{
    tracing::debug!(%owner, "dashboard socket opened");

    let (tx, mut rx) = mpsc::channel::<Frame>(OUTBOX_CAPACITY);
    let cancel = CancellationToken::new();
    let outbox = Outbox::new(tx, cancel.clone());

    let feed = state.store.subscribe(&owner);
    let mut auth_events = state.gateway.observe_auth_state();

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let Ok(json) = serde_json::to_string(&frame) else {
                continue;
            };
            if sink.send(WsMessage::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let forwarder = {
        let store = state.store.clone();
        let outbox = outbox.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = mirror(store, feed, outbox) => {}
            }
        })
    };

    loop {
        tokio::select! {
            incoming = stream.next() => {
                let Some(Ok(incoming)) = incoming else { break };
                if let WsMessage::Close(_) = incoming {
                    break;
                }
                let Ok(frame) = serde_json::from_slice::<SendFrame>(&incoming.into_data()) else {
                    continue;
                };
                spawn_send(&state, &owner, frame, outbox.clone());
            }
            event = auth_events.recv() => match event {
                Ok(AuthEvent::SignedOut(user_id)) if user_id == owner => break,
                Err(RecvError::Closed) => break,
                _ => continue,
            }
        }
    }

    cancel.cancel();
    forwarder.abort();
    writer.abort();
    let _ = forwarder.await;
    let _ = writer.await;
    tracing::debug!(%owner, "dashboard socket closed");
}

/// Mirrors the feed owner's history into `outbox`: everything stored so far,
/// then each append. A lagging feed is caught up by sending the history
/// again; the browser skips rows it already shows.
async fn mirror(store: SharedStore, mut feed: MessageFeed, outbox: Outbox) {
    let owner = feed.owner().to_owned();
    if !send_history(store.as_ref(), &owner, &outbox).await {
        return;
    }

    while let Some(event) = feed.next().await {
        let delivered = match event {
            FeedEvent::Appended(message) => outbox.send(Frame::from(&message)).await,
            FeedEvent::Lagged(_) => send_history(store.as_ref(), &owner, &outbox).await,
        };
        if !delivered {
            break;
        }
    }
}

/// False once the outbox is closed.
async fn send_history(store: &dyn MessageStore, owner: &str, outbox: &Outbox) -> bool {
    let history = match store.list_ordered(owner).await {
        Ok(history) => history,
        Err(err) => {
            tracing::error!(%owner, error = %err.0, "history reload failed");
            return true;
        }
    };
    for message in &history {
        if !outbox.send(Frame::from(message)).await {
            return false;
        }
    }
    true
}

/// Runs one chat exchange detached from the socket. Both records are
/// persisted even if the socket goes away meanwhile; only the loading
/// frames are tied to the socket's lifetime.
pub(crate) fn spawn_send(state: &AppState, owner: &str, SendFrame { client_id, text }: SendFrame, outbox: Outbox) -> JoinHandle<()> {
    let store = state.store.clone();
    let generator = state.generator.clone();
    let prompts = state.prompts.clone();
    let owner = owner.to_owned();

    tokio::spawn(async move {
        if text.trim().is_empty() {
            return;
        }
        outbox.send(Frame::Loading { client_id, on: true }).await;
        if let Err(err) = msg::send_prompt(store.as_ref(), generator.as_ref(), &prompts, &owner, &text, client_id).await {
            tracing::error!(%owner, error = %err.0, "chat send failed");
        }
        outbox.send(Frame::Loading { client_id, on: false }).await;
    })
}
