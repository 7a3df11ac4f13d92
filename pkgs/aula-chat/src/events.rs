//! Change events published on the service's broadcast bus

use aula_store::ConversationStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatEvent {
    ConversationCreated {
        conversation_id: String,
    },
    MessageSent {
        conversation_id: String,
        message_id: String,
    },
    ConversationRead {
        conversation_id: String,
        user_id: String,
    },
    StatusChanged {
        conversation_id: String,
        status: ConversationStatus,
    },
}

impl ChatEvent {
    /// The conversation this event belongs to.
    pub fn conversation_id(&self) -> &str {
        match self {
            ChatEvent::ConversationCreated { conversation_id }
            | ChatEvent::MessageSent {
                conversation_id, ..
            }
            | ChatEvent::ConversationRead {
                conversation_id, ..
            }
            | ChatEvent::StatusChanged {
                conversation_id, ..
            } => conversation_id,
        }
    }
}
