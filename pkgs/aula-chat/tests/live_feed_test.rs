// Tests for the live subscription feeds

use aula_chat::{read_state, ChatService, ConversationSnapshot, Feed};
use aula_store::{ChatRole, ConversationStore, NewConversation};
use std::time::Duration;
use tempfile::NamedTempFile;

async fn open_service(temp_file: &NamedTempFile) -> ChatService {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let db = aula_store::open(temp_file.path())
        .await
        .expect("Failed to open database");
    ChatService::new(ConversationStore::new(db))
}

fn first_contact(student_id: &str, text: &str) -> NewConversation {
    NewConversation {
        student_id: student_id.to_string(),
        parent_id: "parent-1".to_string(),
        teacher_id: "teacher-1".to_string(),
        class_id: "grade-4".to_string(),
        first_message: text.to_string(),
        sender_id: "parent-1".to_string(),
        sender_role: ChatRole::Parent,
        parent_name: "Dana Obi".to_string(),
        student_name: "Student".to_string(),
        teacher_name: "Mr. Mensah".to_string(),
    }
}

/// Pull snapshots until one satisfies the predicate, with a timeout so a
/// broken feed fails the test instead of hanging it.
async fn recv_until<T, F>(feed: &mut Feed<T>, pred: F) -> T
where
    F: Fn(&T) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let item = feed.recv().await.expect("feed ended unexpectedly");
            if pred(&item) {
                return item;
            }
        }
    })
    .await
    .expect("timed out waiting for feed delivery")
}

#[tokio::test]
async fn test_conversation_feed_tracks_changes() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;

    let mut feed = service.subscribe_conversations("teacher-1", ChatRole::Teacher);

    // Initial delivery happens before any data exists.
    let initial = feed.recv().await.expect("missing initial snapshot");
    assert!(initial.is_empty());

    let created = service
        .start_conversation(first_contact("student-1", "When is the exam?"))
        .await
        .unwrap();

    let snapshot = recv_until(&mut feed, |s: &Vec<ConversationSnapshot>| s.len() == 1).await;
    assert_eq!(snapshot[0].conversation.id, created.id);
    assert!(read_state::is_unread(
        &snapshot[0].conversation,
        &snapshot[0].read_markers,
        "teacher-1"
    ));

    // Reading the thread flows back out through the feed.
    service.mark_read(&created.id, "teacher-1").await;
    let snapshot = recv_until(&mut feed, |s: &Vec<ConversationSnapshot>| {
        s.len() == 1
            && !read_state::is_unread(&s[0].conversation, &s[0].read_markers, "teacher-1")
    })
    .await;
    assert_eq!(snapshot[0].conversation.last_message, "When is the exam?");
}

#[tokio::test]
async fn test_conversation_feed_orders_by_recency() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;

    let first = service
        .start_conversation(first_contact("student-1", "About Sam"))
        .await
        .unwrap();
    let second = service
        .start_conversation(first_contact("student-2", "About Ada"))
        .await
        .unwrap();

    let mut feed = service.subscribe_conversations("parent-1", ChatRole::Parent);
    let snapshot = recv_until(&mut feed, |s: &Vec<ConversationSnapshot>| s.len() == 2).await;
    assert_eq!(snapshot[0].conversation.id, second.id);

    // New activity moves the older thread back to the top.
    service
        .send_message(&first.id, "teacher-1", ChatRole::Teacher, "All good")
        .await
        .unwrap();

    let snapshot = recv_until(&mut feed, |s: &Vec<ConversationSnapshot>| {
        s.len() == 2 && s[0].conversation.id == first.id
    })
    .await;
    assert_eq!(snapshot[0].conversation.last_message, "All good");
}

#[tokio::test]
async fn test_message_feed_follows_sends_in_order() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;

    let created = service
        .start_conversation(first_contact("student-1", "First"))
        .await
        .unwrap();

    let mut feed = service.subscribe_messages(&created.id);
    let initial = recv_until(&mut feed, |m: &Vec<_>| m.len() == 1).await;
    assert_eq!(initial[0].text, "First");

    service
        .send_message(&created.id, "teacher-1", ChatRole::Teacher, "Second")
        .await
        .unwrap();
    service
        .send_message(&created.id, "parent-1", ChatRole::Parent, "Third")
        .await
        .unwrap();

    let messages = recv_until(&mut feed, |m: &Vec<_>| m.len() == 3).await;
    for pair in messages.windows(2) {
        assert!(pair[0].created_at <= pair[1].created_at);
    }
    assert_eq!(messages[2].text, "Third");
}

#[tokio::test]
async fn test_message_feed_ignores_other_conversations() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;

    let watched = service
        .start_conversation(first_contact("student-1", "Watched"))
        .await
        .unwrap();
    let other = service
        .start_conversation(first_contact("student-2", "Other"))
        .await
        .unwrap();

    let mut feed = service.subscribe_messages(&watched.id);
    recv_until(&mut feed, |m: &Vec<_>| m.len() == 1).await;

    // Traffic in another thread, then in the watched one.
    service
        .send_message(&other.id, "teacher-1", ChatRole::Teacher, "Elsewhere")
        .await
        .unwrap();
    service
        .send_message(&watched.id, "teacher-1", ChatRole::Teacher, "Here")
        .await
        .unwrap();

    let messages = recv_until(&mut feed, |m: &Vec<_>| m.len() == 2).await;
    assert!(messages.iter().all(|m| m.conversation_id == watched.id));
}

#[tokio::test]
async fn test_blank_ids_yield_one_empty_snapshot() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;

    let mut conversations = service.subscribe_conversations("", ChatRole::Parent);
    assert_eq!(conversations.recv().await, Some(Vec::new()));
    assert_eq!(conversations.recv().await, None);

    let mut messages = service.subscribe_messages("");
    assert_eq!(messages.recv().await, Some(Vec::new()));
    assert_eq!(messages.recv().await, None);
}

#[tokio::test]
async fn test_unsubscribe_does_not_disturb_other_feeds() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = open_service(&temp_file).await;

    let created = service
        .start_conversation(first_contact("student-1", "Hello"))
        .await
        .unwrap();

    let first = service.subscribe_messages(&created.id);
    let mut second = service.subscribe_messages(&created.id);

    first.unsubscribe();

    service
        .send_message(&created.id, "teacher-1", ChatRole::Teacher, "Still flowing")
        .await
        .unwrap();

    let messages = recv_until(&mut second, |m: &Vec<_>| m.len() == 2).await;
    assert_eq!(messages[1].text, "Still flowing");
}
