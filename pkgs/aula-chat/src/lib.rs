//! Aula Chat - parent/teacher messaging service for the Aula portal
//!
//! Fronts the conversation store with input validation, a broadcast change
//! bus, live snapshot feeds and read-state projections. Presentation code
//! talks to [`ChatService`]; it never touches the store's tables directly.
//!
//! User-initiated writes (starting a thread, sending a message) surface
//! failures to the caller. Read-marking is best-effort: a failure is logged
//! and swallowed so it can never block message display.

use aula_store::{
    ChatRole, ConversationStatus, ConversationStore, CreatedConversation, NewConversation,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

mod error;
mod events;
mod live;
pub mod read_state;

pub use error::ChatError;
pub use events::ChatEvent;
pub use live::{ConversationFeed, ConversationSnapshot, Feed, MessageFeed};

/// Bounded fan-out bus; a subscriber that falls this far behind
/// resynchronizes from the store instead of replaying events.
const EVENT_BUS_CAPACITY: usize = 256;

/// Messaging service
pub struct ChatService {
    store: Arc<ConversationStore>,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatService {
    pub fn new(store: ConversationStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            store: Arc::new(store),
            events,
        }
    }

    /// Direct access to the underlying store.
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Subscribe to the raw change bus.
    pub fn events(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    /// Start a conversation, or return the existing one for the same
    /// (student, parent, teacher) triple. Repeating the action is safe.
    pub async fn start_conversation(
        &self,
        mut new: NewConversation,
    ) -> Result<CreatedConversation, ChatError> {
        new.first_message = new.first_message.trim().to_string();
        if new.first_message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let created = self.store.create_conversation(new).await?;

        if !created.already_existed {
            self.publish(ChatEvent::ConversationCreated {
                conversation_id: created.id.clone(),
            });
        }

        Ok(created)
    }

    /// Send a message into an open conversation.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        sender_role: ChatRole,
        text: &str,
    ) -> Result<String, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let message_id = self
            .store
            .send_message(conversation_id, sender_id, sender_role, text)
            .await?;

        self.publish(ChatEvent::MessageSent {
            conversation_id: conversation_id.to_string(),
            message_id: message_id.clone(),
        });

        Ok(message_id)
    }

    /// Mark the whole conversation as read by `user_id`. Best-effort: a
    /// failure here must never block the reading experience, so it is
    /// logged and swallowed.
    pub async fn mark_read(&self, conversation_id: &str, user_id: &str) {
        match self
            .store
            .mark_conversation_read(conversation_id, user_id)
            .await
        {
            Ok(()) => self.publish(ChatEvent::ConversationRead {
                conversation_id: conversation_id.to_string(),
                user_id: user_id.to_string(),
            }),
            Err(e) => warn!(
                "Failed to mark conversation {} read for {}: {}",
                conversation_id, user_id, e
            ),
        }
    }

    /// Set the conversation status.
    pub async fn set_status(
        &self,
        conversation_id: &str,
        status: ConversationStatus,
    ) -> Result<(), ChatError> {
        self.store.set_status(conversation_id, status).await?;

        self.publish(ChatEvent::StatusChanged {
            conversation_id: conversation_id.to_string(),
            status,
        });

        Ok(())
    }

    /// Live view over the user's conversation list.
    pub fn subscribe_conversations(&self, user_id: &str, role: ChatRole) -> ConversationFeed {
        live::subscribe_conversations(self.store.clone(), self.events.subscribe(), user_id, role)
    }

    /// Live view over one conversation's messages.
    pub fn subscribe_messages(&self, conversation_id: &str) -> MessageFeed {
        live::subscribe_messages(self.store.clone(), self.events.subscribe(), conversation_id)
    }

    fn publish(&self, event: ChatEvent) {
        // Send only fails when nobody is listening, which is fine.
        let _ = self.events.send(event);
    }
}
