//! Conversation store - parent/teacher messaging threads and read markers
//!
//! A conversation's identity is derived from its participant triple, so the
//! primary key enforces the one-conversation-per-triple invariant; a lost
//! creation race surfaces as a unique violation and resolves to the
//! surviving row. Read state is a per-participant `last_read_at` pointer
//! rather than a per-message reader list: marking a thread read is a single
//! row upsert no matter how long the history is.

use crate::entities::{conversation_reads, conversations, messages};
use crate::error::{is_unique_violation, StoreError};
use chrono::Utc;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, info};

static LAST_TIMESTAMP: AtomicI64 = AtomicI64::new(0);

/// Millisecond wall-clock reading that never repeats or goes backward
/// within this process. Two sends landing in the same millisecond still
/// get distinct, ordered timestamps, which keeps the read projections
/// exact: a marker at the previous message's time never covers the next.
fn next_timestamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    loop {
        let last = LAST_TIMESTAMP.load(Ordering::Relaxed);
        let candidate = now.max(last + 1);
        if LAST_TIMESTAMP
            .compare_exchange(last, candidate, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            return candidate;
        }
    }
}

/// Role a user plays in the messaging feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Parent,
    Teacher,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::Parent => "parent",
            ChatRole::Teacher => "teacher",
        }
    }

    fn from_db(value: &str) -> Result<Self, StoreError> {
        match value {
            "parent" => Ok(ChatRole::Parent),
            "teacher" => Ok(ChatRole::Teacher),
            other => Err(StoreError::UnknownVariant {
                field: "sender_role",
                value: other.to_string(),
            }),
        }
    }
}

/// Conversation lifecycle state. Any state may be written over any other;
/// the UI only ever moves open threads to closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Open,
    Closed,
}

impl ConversationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConversationStatus::Open => "open",
            ConversationStatus::Closed => "closed",
        }
    }

    fn from_db(value: &str) -> Result<Self, StoreError> {
        match value {
            "open" => Ok(ConversationStatus::Open),
            "closed" => Ok(ConversationStatus::Closed),
            other => Err(StoreError::UnknownVariant {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Conversation model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub student_id: String,
    pub parent_id: String,
    pub teacher_id: String,
    pub class_id: String,
    pub parent_name: String,
    pub student_name: String,
    pub teacher_name: String,
    pub status: ConversationStatus,
    pub last_message: String,
    pub last_message_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<conversations::Model> for Conversation {
    type Error = StoreError;

    fn try_from(model: conversations::Model) -> Result<Self, StoreError> {
        Ok(Self {
            status: ConversationStatus::from_db(&model.status)?,
            id: model.id,
            student_id: model.student_id,
            parent_id: model.parent_id,
            teacher_id: model.teacher_id,
            class_id: model.class_id,
            parent_name: model.parent_name,
            student_name: model.student_name,
            teacher_name: model.teacher_name,
            last_message: model.last_message,
            last_message_at: model.last_message_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Message model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_role: ChatRole,
    pub text: String,
    pub created_at: i64,
}

impl TryFrom<messages::Model> for Message {
    type Error = StoreError;

    fn try_from(model: messages::Model) -> Result<Self, StoreError> {
        Ok(Self {
            sender_role: ChatRole::from_db(&model.sender_role)?,
            id: model.id,
            conversation_id: model.conversation_id,
            sender_id: model.sender_id,
            text: model.text,
            created_at: model.created_at,
        })
    }
}

/// Per-participant read pointer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadMarker {
    pub conversation_id: String,
    pub user_id: String,
    pub last_read_at: i64,
}

impl From<conversation_reads::Model> for ReadMarker {
    fn from(model: conversation_reads::Model) -> Self {
        Self {
            conversation_id: model.conversation_id,
            user_id: model.user_id,
            last_read_at: model.last_read_at,
        }
    }
}

/// Input for creating a conversation together with its first message.
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub student_id: String,
    pub parent_id: String,
    pub teacher_id: String,
    pub class_id: String,
    pub first_message: String,
    pub sender_id: String,
    pub sender_role: ChatRole,
    pub parent_name: String,
    pub student_name: String,
    pub teacher_name: String,
}

/// Outcome of `create_conversation`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedConversation {
    pub id: String,
    pub already_existed: bool,
}

/// Derive the conversation id from its participant triple. The separator
/// keeps distinct triples from hashing to the same byte string.
pub fn conversation_key(student_id: &str, parent_id: &str, teacher_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(student_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(parent_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(teacher_id.as_bytes());
    hex::encode(hasher.finalize())
}

/// Conversation store
pub struct ConversationStore {
    db: DatabaseConnection,
}

impl ConversationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a conversation for the (student, parent, teacher) triple, or
    /// return the existing one untouched. The conversation row, first
    /// message and sender read marker commit as one transaction.
    pub async fn create_conversation(
        &self,
        new: NewConversation,
    ) -> Result<CreatedConversation, StoreError> {
        if new.first_message.trim().is_empty() {
            return Err(StoreError::EmptyMessage);
        }

        let id = conversation_key(&new.student_id, &new.parent_id, &new.teacher_id);

        if conversations::Entity::find_by_id(id.as_str())
            .one(&self.db)
            .await?
            .is_some()
        {
            debug!("Conversation {} already exists, skipping create", id);
            return Ok(CreatedConversation {
                id,
                already_existed: true,
            });
        }

        let now = next_timestamp();
        let txn = self.db.begin().await?;

        let conversation = conversations::ActiveModel {
            id: Set(id.clone()),
            student_id: Set(new.student_id),
            parent_id: Set(new.parent_id),
            teacher_id: Set(new.teacher_id),
            class_id: Set(new.class_id),
            parent_name: Set(new.parent_name),
            student_name: Set(new.student_name),
            teacher_name: Set(new.teacher_name),
            status: Set(ConversationStatus::Open.as_str().to_string()),
            last_message: Set(new.first_message.clone()),
            last_message_at: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match conversation.insert(&txn).await {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                // Another writer created the same triple between our
                // existence check and the insert; their row wins.
                txn.rollback().await?;
                info!("Conversation {} created concurrently, reusing it", id);
                return Ok(CreatedConversation {
                    id,
                    already_existed: true,
                });
            }
            Err(e) => return Err(e.into()),
        }

        let message_id = uuid::Uuid::new_v4().to_string();
        messages::ActiveModel {
            id: Set(message_id.clone()),
            conversation_id: Set(id.clone()),
            sender_id: Set(new.sender_id.clone()),
            sender_role: Set(new.sender_role.as_str().to_string()),
            text: Set(new.first_message),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        // The sender has implicitly read their own message.
        conversation_reads::ActiveModel {
            conversation_id: Set(id.clone()),
            user_id: Set(new.sender_id),
            last_read_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!("Created conversation {} with first message {}", id, message_id);
        Ok(CreatedConversation {
            id,
            already_existed: false,
        })
    }

    /// Append a message and refresh the thread's last-message metadata.
    ///
    /// The sender's read marker advances to the new message's timestamp in
    /// the same transaction, so the thread immediately reads as unread for
    /// everyone except the sender. Closed conversations reject sends.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        sender_role: ChatRole,
        text: &str,
    ) -> Result<String, StoreError> {
        if text.trim().is_empty() {
            return Err(StoreError::EmptyMessage);
        }

        let txn = self.db.begin().await?;

        let conversation = conversations::Entity::find_by_id(conversation_id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))?;

        if ConversationStatus::from_db(&conversation.status)? == ConversationStatus::Closed {
            return Err(StoreError::ConversationClosed(conversation_id.to_string()));
        }

        let now = next_timestamp();
        let message_id = uuid::Uuid::new_v4().to_string();

        messages::ActiveModel {
            id: Set(message_id.clone()),
            conversation_id: Set(conversation_id.to_string()),
            sender_id: Set(sender_id.to_string()),
            sender_role: Set(sender_role.as_str().to_string()),
            text: Set(text.to_string()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut active: conversations::ActiveModel = conversation.into();
        active.last_message = Set(text.to_string());
        active.last_message_at = Set(now);
        active.updated_at = Set(now);
        active.update(&txn).await?;

        Self::advance_marker(&txn, conversation_id, sender_id, now).await?;

        txn.commit().await?;

        debug!(
            "Stored message {} in conversation {}",
            message_id, conversation_id
        );
        Ok(message_id)
    }

    /// Mark every message in the conversation as read by `user_id`.
    ///
    /// A single monotonic pointer upsert; calling it again is a no-op.
    pub async fn mark_conversation_read(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<(), StoreError> {
        let conversation = conversations::Entity::find_by_id(conversation_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))?;

        Self::advance_marker(
            &self.db,
            conversation_id,
            user_id,
            conversation.last_message_at,
        )
        .await?;

        debug!(
            "Marked conversation {} read for user {}",
            conversation_id, user_id
        );
        Ok(())
    }

    /// Set the conversation status. A plain field write, not a guarded
    /// transition.
    pub async fn set_status(
        &self,
        conversation_id: &str,
        status: ConversationStatus,
    ) -> Result<(), StoreError> {
        let conversation = conversations::Entity::find_by_id(conversation_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))?;

        let mut active: conversations::ActiveModel = conversation.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now().timestamp_millis());
        active.update(&self.db).await?;

        info!("Conversation {} status set to {}", conversation_id, status.as_str());
        Ok(())
    }

    /// Get a single conversation by id.
    pub async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, StoreError> {
        conversations::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Conversation::try_from)
            .transpose()
    }

    /// All conversations the user participates in, newest activity first.
    pub async fn conversations_for_user(
        &self,
        user_id: &str,
        role: ChatRole,
    ) -> Result<Vec<Conversation>, StoreError> {
        let column = match role {
            ChatRole::Parent => conversations::Column::ParentId,
            ChatRole::Teacher => conversations::Column::TeacherId,
        };

        conversations::Entity::find()
            .filter(column.eq(user_id))
            .order_by_desc(conversations::Column::LastMessageAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Conversation::try_from)
            .collect()
    }

    /// Messages of one conversation in send order.
    pub async fn conversation_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, StoreError> {
        messages::Entity::find()
            .filter(messages::Column::ConversationId.eq(conversation_id))
            .order_by_asc(messages::Column::CreatedAt)
            .order_by_asc(messages::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Message::try_from)
            .collect()
    }

    /// Read markers of one conversation.
    pub async fn read_markers(&self, conversation_id: &str) -> Result<Vec<ReadMarker>, StoreError> {
        let markers = conversation_reads::Entity::find()
            .filter(conversation_reads::Column::ConversationId.eq(conversation_id))
            .all(&self.db)
            .await?;

        Ok(markers.into_iter().map(ReadMarker::from).collect())
    }

    /// Read markers for a batch of conversations in one query.
    pub async fn read_markers_for(
        &self,
        conversation_ids: &[String],
    ) -> Result<Vec<ReadMarker>, StoreError> {
        if conversation_ids.is_empty() {
            return Ok(Vec::new());
        }

        let markers = conversation_reads::Entity::find()
            .filter(conversation_reads::Column::ConversationId.is_in(conversation_ids.to_vec()))
            .all(&self.db)
            .await?;

        Ok(markers.into_iter().map(ReadMarker::from).collect())
    }

    /// Move a read pointer forward to `read_at`. Never moves it backward.
    async fn advance_marker<C: ConnectionTrait>(
        conn: &C,
        conversation_id: &str,
        user_id: &str,
        read_at: i64,
    ) -> Result<(), StoreError> {
        let existing = conversation_reads::Entity::find_by_id((
            conversation_id.to_string(),
            user_id.to_string(),
        ))
        .one(conn)
        .await?;

        match existing {
            Some(marker) if marker.last_read_at >= read_at => {}
            Some(marker) => {
                let mut active: conversation_reads::ActiveModel = marker.into();
                active.last_read_at = Set(read_at);
                active.update(conn).await?;
            }
            None => {
                let insert = conversation_reads::ActiveModel {
                    conversation_id: Set(conversation_id.to_string()),
                    user_id: Set(user_id.to_string()),
                    last_read_at: Set(read_at),
                }
                .insert(conn)
                .await;

                match insert {
                    Ok(_) => {}
                    Err(e) if is_unique_violation(&e) => {
                        // Concurrent marker insert; retry as an update so the
                        // pointer still only moves forward.
                        let marker = conversation_reads::Entity::find_by_id((
                            conversation_id.to_string(),
                            user_id.to_string(),
                        ))
                        .one(conn)
                        .await?;
                        if let Some(marker) = marker {
                            if marker.last_read_at < read_at {
                                let mut active: conversation_reads::ActiveModel = marker.into();
                                active.last_read_at = Set(read_at);
                                active.update(conn).await?;
                            }
                        }
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_key_is_stable_and_distinct() {
        let a = conversation_key("s1", "p1", "t1");
        let b = conversation_key("s1", "p1", "t1");
        assert_eq!(a, b);

        // Shifting a boundary must not collide.
        let c = conversation_key("s1p", "1", "t1");
        assert_ne!(a, c);
    }

    #[test]
    fn status_round_trips() {
        for status in [ConversationStatus::Open, ConversationStatus::Closed] {
            assert_eq!(
                ConversationStatus::from_db(status.as_str()).unwrap(),
                status
            );
        }
        assert!(ConversationStatus::from_db("reopened").is_err());
    }
}
