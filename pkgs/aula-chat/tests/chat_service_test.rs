// End-to-end tests for ChatService over a temp-file database

use aula_chat::{read_state, ChatError, ChatService};
use aula_store::{ChatRole, ConversationStatus, ConversationStore, NewConversation};
use tempfile::NamedTempFile;

async fn open_service(temp_file: &NamedTempFile) -> ChatService {
    let db = aula_store::open(temp_file.path())
        .await
        .expect("Failed to open database");
    ChatService::new(ConversationStore::new(db))
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

fn sorted(mut ids: Vec<String>) -> Vec<String> {
    ids.sort();
    ids
}

#[tokio::test]
async fn test_parent_asks_teacher_replies() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;
    let store = service.store();

    // Parent opens the thread.
    let created = service
        .start_conversation(first_contact("When is the exam?"))
        .await
        .unwrap();
    assert!(!created.already_existed);

    let conversation = store.get_conversation(&created.id).await.unwrap().unwrap();
    assert_eq!(conversation.status, ConversationStatus::Open);
    assert_eq!(conversation.last_message, "When is the exam?");

    let markers = store.read_markers(&created.id).await.unwrap();
    assert_eq!(
        read_state::last_message_read_by(&conversation, &markers),
        vec!["parent-1"]
    );

    // Teacher opens the thread and reads it.
    service.mark_read(&created.id, "teacher-1").await;

    let markers = store.read_markers(&created.id).await.unwrap();
    assert_eq!(
        sorted(read_state::last_message_read_by(&conversation, &markers)),
        vec!["parent-1", "teacher-1"]
    );

    let messages = store.conversation_messages(&created.id).await.unwrap();
    assert_eq!(
        sorted(read_state::seen_by(&messages[0], &markers)),
        vec!["parent-1", "teacher-1"]
    );

    // Teacher replies; everyone but the teacher is unread again.
    service
        .send_message(&created.id, "teacher-1", ChatRole::Teacher, "Next Monday")
        .await
        .unwrap();

    let conversation = store.get_conversation(&created.id).await.unwrap().unwrap();
    let markers = store.read_markers(&created.id).await.unwrap();
    assert_eq!(conversation.last_message, "Next Monday");
    assert_eq!(
        read_state::last_message_read_by(&conversation, &markers),
        vec!["teacher-1"]
    );
    assert!(read_state::is_unread(&conversation, &markers, "parent-1"));
    assert!(!read_state::is_unread(&conversation, &markers, "teacher-1"));

    let messages = store.conversation_messages(&created.id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(read_state::seen_by(&messages[1], &markers), vec!["teacher-1"]);
}

#[tokio::test]
async fn test_repeated_start_returns_same_conversation() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;

    let first = service
        .start_conversation(first_contact("Hello"))
        .await
        .unwrap();
    let second = service
        .start_conversation(first_contact("Hello again"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert!(second.already_existed);

    let messages = service
        .store()
        .conversation_messages(&first.id)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn test_sender_has_read_their_own_first_message() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;

    let created = service
        .start_conversation(first_contact("Hello"))
        .await
        .unwrap();
    let store = service.store();

    let conversation = store.get_conversation(&created.id).await.unwrap().unwrap();
    let markers = store.read_markers(&created.id).await.unwrap();
    let messages = store.conversation_messages(&created.id).await.unwrap();

    assert_eq!(
        read_state::last_message_read_by(&conversation, &markers),
        vec!["parent-1"]
    );
    assert_eq!(read_state::seen_by(&messages[0], &markers), vec!["parent-1"]);
    assert!(!read_state::is_unread(&conversation, &markers, "parent-1"));
    assert!(read_state::is_unread(&conversation, &markers, "teacher-1"));
}

#[tokio::test]
async fn test_text_is_trimmed_and_empty_rejected() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;

    let result = service.start_conversation(first_contact("   \n")).await;
    assert!(matches!(result, Err(ChatError::EmptyMessage)));

    let created = service
        .start_conversation(first_contact("  Hello there  "))
        .await
        .unwrap();
    let messages = service
        .store()
        .conversation_messages(&created.id)
        .await
        .unwrap();
    assert_eq!(messages[0].text, "Hello there");

    let result = service
        .send_message(&created.id, "parent-1", ChatRole::Parent, "  ")
        .await;
    assert!(matches!(result, Err(ChatError::EmptyMessage)));
}

#[tokio::test]
async fn test_send_to_closed_conversation_is_rejected() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;

    let created = service
        .start_conversation(first_contact("Hello"))
        .await
        .unwrap();
    service
        .set_status(&created.id, ConversationStatus::Closed)
        .await
        .unwrap();

    let result = service
        .send_message(&created.id, "parent-1", ChatRole::Parent, "Anyone?")
        .await;
    assert!(matches!(result, Err(ChatError::ConversationClosed(_))));
}

#[tokio::test]
async fn test_send_to_unknown_conversation_is_rejected() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;

    let result = service
        .send_message("missing", "parent-1", ChatRole::Parent, "Hello")
        .await;
    assert!(matches!(result, Err(ChatError::ConversationNotFound(_))));
}

#[tokio::test]
async fn test_mark_read_failures_are_swallowed() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;

    // Must not panic or error; the failure is logged and dropped.
    service.mark_read("missing", "teacher-1").await;
}

#[tokio::test]
async fn test_mark_read_twice_is_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;

    let created = service
        .start_conversation(first_contact("Hello"))
        .await
        .unwrap();

    service.mark_read(&created.id, "teacher-1").await;
    let first = service.store().read_markers(&created.id).await.unwrap();

    service.mark_read(&created.id, "teacher-1").await;
    let second = service.store().read_markers(&created.id).await.unwrap();

    assert_eq!(first, second);
}
