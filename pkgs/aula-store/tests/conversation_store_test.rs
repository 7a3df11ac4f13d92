// Comprehensive tests for ConversationStore

use aula_store::{
    ChatRole, ConversationStatus, ConversationStore, NewConversation, StoreError,
};
use tempfile::NamedTempFile;

async fn open_store(temp_file: &NamedTempFile) -> ConversationStore {
    let db = aula_store::open(temp_file.path())
        .await
        .expect("Failed to open database");
    ConversationStore::new(db)
}

fn first_contact(text: &str) -> NewConversation {
    NewConversation {
        student_id: "student-1".to_string(),
        parent_id: "parent-1".to_string(),
        teacher_id: "teacher-1".to_string(),
        class_id: "grade-4".to_string(),
        first_message: text.to_string(),
        sender_id: "parent-1".to_string(),
        sender_role: ChatRole::Parent,
        parent_name: "Dana Obi".to_string(),
        student_name: "Sam Obi".to_string(),
        teacher_name: "Mr. Mensah".to_string(),
    }
}

#[tokio::test]
async fn test_create_conversation_with_first_message() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = open_store(&temp_file).await;

    let created = store
        .create_conversation(first_contact("When is the exam?"))
        .await
        .expect("Failed to create conversation");
    assert!(!created.already_existed);

    let conversation = store
        .get_conversation(&created.id)
        .await
        .unwrap()
        .expect("Conversation should exist");
    assert_eq!(conversation.status, ConversationStatus::Open);
    assert_eq!(conversation.last_message, "When is the exam?");
    assert_eq!(conversation.parent_name, "Dana Obi");

    let messages = store.conversation_messages(&created.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender_id, "parent-1");
    assert_eq!(messages[0].sender_role, ChatRole::Parent);

    // The sender has implicitly read their own first message.
    let markers = store.read_markers(&created.id).await.unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].user_id, "parent-1");
    assert_eq!(markers[0].last_read_at, conversation.last_message_at);
}

#[tokio::test]
async fn test_duplicate_creation_is_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = open_store(&temp_file).await;

    let first = store
        .create_conversation(first_contact("Hello"))
        .await
        .unwrap();
    let second = store
        .create_conversation(first_contact("A different opener"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert!(!first.already_existed);
    assert!(second.already_existed);

    // The second call must not have written anything.
    let messages = store.conversation_messages(&first.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "Hello");

    let conversation = store.get_conversation(&first.id).await.unwrap().unwrap();
    assert_eq!(conversation.last_message, "Hello");
}

#[tokio::test]
async fn test_distinct_triples_get_distinct_conversations() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = open_store(&temp_file).await;

    let first = store
        .create_conversation(first_contact("Hello"))
        .await
        .unwrap();

    let mut other_teacher = first_contact("Hello again");
    other_teacher.teacher_id = "teacher-2".to_string();
    let second = store.create_conversation(other_teacher).await.unwrap();

    assert_ne!(first.id, second.id);
    assert!(!second.already_existed);
}

#[tokio::test]
async fn test_send_message_updates_thread_metadata() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = open_store(&temp_file).await;

    let created = store
        .create_conversation(first_contact("When is the exam?"))
        .await
        .unwrap();

    let message_id = store
        .send_message(&created.id, "teacher-1", ChatRole::Teacher, "Next Monday")
        .await
        .expect("Failed to send message");

    let conversation = store.get_conversation(&created.id).await.unwrap().unwrap();
    assert_eq!(conversation.last_message, "Next Monday");

    let messages = store.conversation_messages(&created.id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].id, message_id);
    assert_eq!(messages[1].created_at, conversation.last_message_at);
}

#[tokio::test]
async fn test_message_order_is_monotone() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = open_store(&temp_file).await;

    let created = store
        .create_conversation(first_contact("First"))
        .await
        .unwrap();

    for i in 0..5 {
        let (sender, role) = if i % 2 == 0 {
            ("teacher-1", ChatRole::Teacher)
        } else {
            ("parent-1", ChatRole::Parent)
        };
        store
            .send_message(&created.id, sender, role, &format!("Message {}", i))
            .await
            .unwrap();
    }

    let messages = store.conversation_messages(&created.id).await.unwrap();
    assert_eq!(messages.len(), 6);
    for pair in messages.windows(2) {
        assert!(
            pair[0].created_at <= pair[1].created_at,
            "Messages should be ordered by timestamp"
        );
    }
}

#[tokio::test]
async fn test_send_advances_only_the_senders_marker() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = open_store(&temp_file).await;

    let created = store
        .create_conversation(first_contact("Hello"))
        .await
        .unwrap();

    store
        .mark_conversation_read(&created.id, "teacher-1")
        .await
        .unwrap();

    store
        .send_message(&created.id, "parent-1", ChatRole::Parent, "Are you there?")
        .await
        .unwrap();

    let conversation = store.get_conversation(&created.id).await.unwrap().unwrap();
    let markers = store.read_markers(&created.id).await.unwrap();

    let parent = markers.iter().find(|m| m.user_id == "parent-1").unwrap();
    let teacher = markers.iter().find(|m| m.user_id == "teacher-1").unwrap();

    assert_eq!(parent.last_read_at, conversation.last_message_at);
    assert!(teacher.last_read_at < conversation.last_message_at);
}

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = open_store(&temp_file).await;

    let created = store
        .create_conversation(first_contact("Hello"))
        .await
        .unwrap();

    store
        .mark_conversation_read(&created.id, "teacher-1")
        .await
        .unwrap();
    let after_first = store.read_markers(&created.id).await.unwrap();

    store
        .mark_conversation_read(&created.id, "teacher-1")
        .await
        .unwrap();
    let after_second = store.read_markers(&created.id).await.unwrap();

    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_mark_read_never_moves_backward() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = open_store(&temp_file).await;

    let created = store
        .create_conversation(first_contact("Hello"))
        .await
        .unwrap();

    store
        .send_message(&created.id, "parent-1", ChatRole::Parent, "Second")
        .await
        .unwrap();

    // The sender's marker already sits at the newest message; re-marking
    // must not disturb it.
    let before = store.read_markers(&created.id).await.unwrap();
    store
        .mark_conversation_read(&created.id, "parent-1")
        .await
        .unwrap();
    let after = store.read_markers(&created.id).await.unwrap();

    assert_eq!(before, after);
}

#[tokio::test]
async fn test_closed_conversation_rejects_sends() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = open_store(&temp_file).await;

    let created = store
        .create_conversation(first_contact("Hello"))
        .await
        .unwrap();

    store
        .set_status(&created.id, ConversationStatus::Closed)
        .await
        .unwrap();

    let result = store
        .send_message(&created.id, "parent-1", ChatRole::Parent, "Still there?")
        .await;
    assert!(matches!(result, Err(StoreError::ConversationClosed(_))));

    // Nothing was written.
    let messages = store.conversation_messages(&created.id).await.unwrap();
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn test_status_is_a_plain_field_write() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = open_store(&temp_file).await;

    let created = store
        .create_conversation(first_contact("Hello"))
        .await
        .unwrap();

    store
        .set_status(&created.id, ConversationStatus::Closed)
        .await
        .unwrap();
    store
        .set_status(&created.id, ConversationStatus::Open)
        .await
        .unwrap();

    let conversation = store.get_conversation(&created.id).await.unwrap().unwrap();
    assert_eq!(conversation.status, ConversationStatus::Open);
}

#[tokio::test]
async fn test_empty_text_is_rejected() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = open_store(&temp_file).await;

    let result = store.create_conversation(first_contact("   ")).await;
    assert!(matches!(result, Err(StoreError::EmptyMessage)));

    let created = store
        .create_conversation(first_contact("Hello"))
        .await
        .unwrap();
    let result = store
        .send_message(&created.id, "parent-1", ChatRole::Parent, " \n\t ")
        .await;
    assert!(matches!(result, Err(StoreError::EmptyMessage)));
}

#[tokio::test]
async fn test_unknown_conversation_errors() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = open_store(&temp_file).await;

    let result = store
        .send_message("missing", "parent-1", ChatRole::Parent, "Hello")
        .await;
    assert!(matches!(result, Err(StoreError::ConversationNotFound(_))));

    let result = store.mark_conversation_read("missing", "parent-1").await;
    assert!(matches!(result, Err(StoreError::ConversationNotFound(_))));

    assert!(store.get_conversation("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_conversations_for_user_ordered_by_recency() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = open_store(&temp_file).await;

    let first = store
        .create_conversation(first_contact("About Sam"))
        .await
        .unwrap();

    let mut second_child = first_contact("About Ada");
    second_child.student_id = "student-2".to_string();
    second_child.student_name = "Ada Obi".to_string();
    let second = store.create_conversation(second_child).await.unwrap();

    // Activity in the older thread moves it back to the top.
    store
        .send_message(&first.id, "teacher-1", ChatRole::Teacher, "All good")
        .await
        .unwrap();

    let for_parent = store
        .conversations_for_user("parent-1", ChatRole::Parent)
        .await
        .unwrap();
    assert_eq!(for_parent.len(), 2);
    assert_eq!(for_parent[0].id, first.id);
    assert_eq!(for_parent[1].id, second.id);

    let for_teacher = store
        .conversations_for_user("teacher-1", ChatRole::Teacher)
        .await
        .unwrap();
    assert_eq!(for_teacher.len(), 2);

    let for_stranger = store
        .conversations_for_user("teacher-9", ChatRole::Teacher)
        .await
        .unwrap();
    assert!(for_stranger.is_empty());
}
