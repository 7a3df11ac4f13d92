//! Live subscription feeds
//!
//! Each feed owns a pump task that pushes a full, freshly ordered snapshot
//! over an unbounded channel: once immediately, then again whenever a bus
//! event touches the watched data. Consumers always receive complete result
//! sets, never diffs. Dropping a feed aborts its pump.

use crate::events::ChatEvent;
use aula_store::{ChatRole, Conversation, ConversationStore, Message, ReadMarker, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::error;

/// A conversation paired with its read markers, so unread state can be
/// projected without a second query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    pub conversation: Conversation,
    pub read_markers: Vec<ReadMarker>,
}

/// A push-based view over one query. `recv` yields the next snapshot;
/// `None` means the bus shut down and no further snapshots will arrive.
pub struct Feed<T> {
    rx: mpsc::UnboundedReceiver<T>,
    pump: Option<JoinHandle<()>>,
}

pub type ConversationFeed = Feed<Vec<ConversationSnapshot>>;
pub type MessageFeed = Feed<Vec<Message>>;

impl<T> Feed<T> {
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Stop delivery and release the underlying bus listener.
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

impl<T> Drop for Feed<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Watch every conversation the user participates in, newest activity
/// first. A blank user id yields one empty snapshot and never registers a
/// bus listener.
pub(crate) fn subscribe_conversations(
    store: Arc<ConversationStore>,
    events: broadcast::Receiver<ChatEvent>,
    user_id: &str,
    role: ChatRole,
) -> ConversationFeed {
    let (tx, rx) = mpsc::unbounded_channel();

    if user_id.is_empty() {
        let _ = tx.send(Vec::new());
        return Feed { rx, pump: None };
    }

    let user_id = user_id.to_string();
    let pump = tokio::spawn(async move {
        let mut events = events;
        let mut last: Option<Vec<ConversationSnapshot>> = None;

        match conversation_snapshots(&store, &user_id, role).await {
            Ok(snapshot) => {
                last = Some(snapshot.clone());
                if tx.send(snapshot).is_err() {
                    return;
                }
            }
            Err(e) => error!("Conversation feed query failed for {}: {}", user_id, e),
        }

        loop {
            match events.recv().await {
                // The bus is coarser than the query, so re-run it and only
                // deliver when the visible result actually changed. A lagged
                // receiver resynchronizes the same way.
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    match conversation_snapshots(&store, &user_id, role).await {
                        Ok(snapshot) => {
                            if last.as_ref() == Some(&snapshot) {
                                continue;
                            }
                            last = Some(snapshot.clone());
                            if tx.send(snapshot).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Conversation feed query failed for {}: {}", user_id, e)
                        }
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    Feed {
        rx,
        pump: Some(pump),
    }
}

/// Watch one conversation's messages in send order. A blank conversation id
/// yields one empty snapshot and never registers a bus listener.
pub(crate) fn subscribe_messages(
    store: Arc<ConversationStore>,
    events: broadcast::Receiver<ChatEvent>,
    conversation_id: &str,
) -> MessageFeed {
    let (tx, rx) = mpsc::unbounded_channel();

    if conversation_id.is_empty() {
        let _ = tx.send(Vec::new());
        return Feed { rx, pump: None };
    }

    let conversation_id = conversation_id.to_string();
    let pump = tokio::spawn(async move {
        let mut events = events;

        match store.conversation_messages(&conversation_id).await {
            Ok(messages) => {
                if tx.send(messages).is_err() {
                    return;
                }
            }
            Err(e) => error!("Message feed query failed for {}: {}", conversation_id, e),
        }

        loop {
            match events.recv().await {
                Ok(event) => {
                    let relevant = matches!(
                        &event,
                        ChatEvent::MessageSent { .. } | ChatEvent::ConversationCreated { .. }
                    ) && event.conversation_id() == conversation_id;
                    if !relevant {
                        continue;
                    }

                    match store.conversation_messages(&conversation_id).await {
                        Ok(messages) => {
                            if tx.send(messages).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Message feed query failed for {}: {}", conversation_id, e)
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Missed events; resynchronize from the store.
                    match store.conversation_messages(&conversation_id).await {
                        Ok(messages) => {
                            if tx.send(messages).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Message feed query failed for {}: {}", conversation_id, e)
                        }
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    Feed {
        rx,
        pump: Some(pump),
    }
}

async fn conversation_snapshots(
    store: &ConversationStore,
    user_id: &str,
    role: ChatRole,
) -> Result<Vec<ConversationSnapshot>, StoreError> {
    let conversations = store.conversations_for_user(user_id, role).await?;
    let ids: Vec<String> = conversations.iter().map(|c| c.id.clone()).collect();
    let markers = store.read_markers_for(&ids).await?;

    let mut by_conversation: HashMap<String, Vec<ReadMarker>> = HashMap::new();
    for marker in markers {
        by_conversation
            .entry(marker.conversation_id.clone())
            .or_default()
            .push(marker);
    }

    Ok(conversations
        .into_iter()
        .map(|conversation| {
            let read_markers = by_conversation
                .remove(&conversation.id)
                .unwrap_or_default();
            ConversationSnapshot {
                conversation,
                read_markers,
            }
        })
        .collect())
}
