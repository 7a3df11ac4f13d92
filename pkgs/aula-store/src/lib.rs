//! Aula Store - persistent storage for the Aula school portal
//!
//! This crate provides SQLite-based persistent storage using Sea-ORM for the
//! portal's records and its parent/teacher messaging feature.
//!
//! # Architecture
//!
//! The storage layer is organized into specialized stores that share one
//! database connection:
//!
//! - **ConversationStore**: Messaging threads, messages and read markers
//! - **RosterStore**: User profiles, students and teacher assignments
//! - **AdmissionsStore**: Intake applications and student enrollment
//! - **GradebookStore**: Marks, remarks, attendance and term results
//! - **TermStore**: Academic terms, the active-term flag and mark locking
//!
//! # Database Schema
//!
//! The database uses Sea-ORM with SQLite and includes these tables:
//!
//! - `conversations`: Thread metadata and last-message preview fields
//! - `messages`: Message text, sender and store-assigned timestamps
//! - `conversation_reads`: Per-participant monotonic read pointers
//! - `users`: Profile mirror of the hosted auth accounts
//! - `students`, `teacher_assignments`: The school roster
//! - `applications`, `admission_counters`: Admissions intake
//! - `marks`, `remarks`, `attendance`, `term_results`: The gradebook
//! - `terms`: Term lifecycle and lock flags
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use aula_store::{ChatRole, ConversationStore, NewConversation};
//!
//! # async fn example() -> Result<(), aula_store::StoreError> {
//! let db = aula_store::open("aula.db").await?;
//! let store = ConversationStore::new(db);
//!
//! let created = store
//!     .create_conversation(NewConversation {
//!         student_id: "student-1".into(),
//!         parent_id: "parent-1".into(),
//!         teacher_id: "teacher-1".into(),
//!         class_id: "grade-4".into(),
//!         first_message: "When is the exam?".into(),
//!         sender_id: "parent-1".into(),
//!         sender_role: ChatRole::Parent,
//!         parent_name: "Dana Obi".into(),
//!         student_name: "Sam Obi".into(),
//!         teacher_name: "Mr. Mensah".into(),
//!     })
//!     .await?;
//! assert!(!created.already_existed);
//! # Ok(())
//! # }
//! ```

pub mod admissions_store;
pub mod conversation_store;
pub mod entities;
pub mod gradebook_store;
pub mod migration;
pub mod roster_store;
pub mod term_store;

mod error;

pub use admissions_store::{
    AdmissionsStore, Application, ApplicationStatus, EnrolledStudent, NewApplication,
};
pub use conversation_store::{
    conversation_key, ChatRole, Conversation, ConversationStatus, ConversationStore,
    CreatedConversation, Message, NewConversation, ReadMarker,
};
pub use error::StoreError;
pub use gradebook_store::{
    Attendance, AttendanceStatus, GradebookStore, Mark, NewAttendance, NewMark, NewRemark,
    NewTermResult, Remark, TermResult,
};
pub use roster_store::{RosterStore, Student, TeacherAssignment, User, UserRole};
pub use term_store::{Term, TermStatus, TermStore};

use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

/// Open (or create) the database at `db_path` and bring the schema up to
/// date. The returned connection is cheap to clone and is shared by all the
/// stores.
pub async fn open(db_path: impl AsRef<std::path::Path>) -> Result<DatabaseConnection, StoreError> {
    let db_path_str = db_path
        .as_ref()
        .to_str()
        .ok_or(StoreError::InvalidDbPath)?
        .replace('\\', "/");

    let db_url = format!("sqlite:{}?mode=rwc", db_path_str);

    let db: DatabaseConnection = Database::connect(db_url.as_str()).await?;

    migration::Migrator::up(&db, None).await?;

    info!("Aula store initialized at {}", db_path.as_ref().display());

    Ok(db)
}
