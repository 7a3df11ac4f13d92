//! Read-state projections
//!
//! Pure functions over conversation and message snapshots plus their read
//! markers; nothing here holds state of its own. A user "has read" anything
//! timestamped at or before their marker.

use aula_store::{Conversation, Message, ReadMarker};

/// Users who have seen the conversation's latest message.
pub fn last_message_read_by(conversation: &Conversation, markers: &[ReadMarker]) -> Vec<String> {
    markers
        .iter()
        .filter(|m| {
            m.conversation_id == conversation.id && m.last_read_at >= conversation.last_message_at
        })
        .map(|m| m.user_id.clone())
        .collect()
}

/// True when the viewer has not yet seen the latest message.
pub fn is_unread(conversation: &Conversation, markers: &[ReadMarker], user_id: &str) -> bool {
    !markers.iter().any(|m| {
        m.conversation_id == conversation.id
            && m.user_id == user_id
            && m.last_read_at >= conversation.last_message_at
    })
}

/// Users who have seen this message. The sender is always included because
/// sending advances the sender's own marker.
pub fn seen_by(message: &Message, markers: &[ReadMarker]) -> Vec<String> {
    markers
        .iter()
        .filter(|m| {
            m.conversation_id == message.conversation_id && m.last_read_at >= message.created_at
        })
        .map(|m| m.user_id.clone())
        .collect()
}

/// True when `user_id` has seen this message.
pub fn is_seen_by(message: &Message, markers: &[ReadMarker], user_id: &str) -> bool {
    markers.iter().any(|m| {
        m.conversation_id == message.conversation_id
            && m.user_id == user_id
            && m.last_read_at >= message.created_at
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_store::{ChatRole, ConversationStatus};

    fn conversation(last_message_at: i64) -> Conversation {
        Conversation {
            id: "conv-1".to_string(),
            student_id: "s1".to_string(),
            parent_id: "p1".to_string(),
            teacher_id: "t1".to_string(),
            class_id: "grade-4".to_string(),
            parent_name: "Parent".to_string(),
            student_name: "Student".to_string(),
            teacher_name: "Teacher".to_string(),
            status: ConversationStatus::Open,
            last_message: "hi".to_string(),
            last_message_at,
            created_at: 1,
            updated_at: last_message_at,
        }
    }

    fn marker(user_id: &str, last_read_at: i64) -> ReadMarker {
        ReadMarker {
            conversation_id: "conv-1".to_string(),
            user_id: user_id.to_string(),
            last_read_at,
        }
    }

    #[test]
    fn unread_until_marker_reaches_last_message() {
        let conv = conversation(100);
        let markers = vec![marker("p1", 100), marker("t1", 50)];

        assert!(!is_unread(&conv, &markers, "p1"));
        assert!(is_unread(&conv, &markers, "t1"));
        assert_eq!(last_message_read_by(&conv, &markers), vec!["p1"]);
    }

    #[test]
    fn viewer_without_marker_is_unread() {
        let conv = conversation(100);
        assert!(is_unread(&conv, &[], "t1"));
    }

    #[test]
    fn markers_from_other_conversations_are_ignored() {
        let conv = conversation(100);
        let mut foreign = marker("t1", 200);
        foreign.conversation_id = "conv-2".to_string();

        assert!(is_unread(&conv, &[foreign], "t1"));
    }

    #[test]
    fn seen_by_compares_message_timestamps() {
        let message = Message {
            id: "m1".to_string(),
            conversation_id: "conv-1".to_string(),
            sender_id: "p1".to_string(),
            sender_role: ChatRole::Parent,
            text: "hi".to_string(),
            created_at: 80,
        };
        let markers = vec![marker("p1", 100), marker("t1", 50)];

        assert_eq!(seen_by(&message, &markers), vec!["p1"]);
        assert!(is_seen_by(&message, &markers, "p1"));
        assert!(!is_seen_by(&message, &markers, "t1"));
    }
}
