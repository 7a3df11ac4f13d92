//! Sea-ORM migrations for the Aula database schema

pub use sea_orm_migration::prelude::*;

mod m20260210_000001_create_users_table;
mod m20260210_000002_create_students_table;
mod m20260210_000003_create_teacher_assignments_table;
mod m20260211_000001_create_terms_table;
mod m20260211_000002_create_applications_table;
mod m20260211_000003_create_admission_counters_table;
mod m20260212_000001_create_marks_table;
mod m20260212_000002_create_remarks_table;
mod m20260212_000003_create_attendance_table;
mod m20260212_000004_create_term_results_table;
mod m20260215_000001_create_conversations_table;
mod m20260215_000002_create_messages_table;
mod m20260215_000003_create_conversation_reads_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260210_000001_create_users_table::Migration),
            Box::new(m20260210_000002_create_students_table::Migration),
            Box::new(m20260210_000003_create_teacher_assignments_table::Migration),
            Box::new(m20260211_000001_create_terms_table::Migration),
            Box::new(m20260211_000002_create_applications_table::Migration),
            Box::new(m20260211_000003_create_admission_counters_table::Migration),
            Box::new(m20260212_000001_create_marks_table::Migration),
            Box::new(m20260212_000002_create_remarks_table::Migration),
            Box::new(m20260212_000003_create_attendance_table::Migration),
            Box::new(m20260212_000004_create_term_results_table::Migration),
            Box::new(m20260215_000001_create_conversations_table::Migration),
            Box::new(m20260215_000002_create_messages_table::Migration),
            Box::new(m20260215_000003_create_conversation_reads_table::Migration),
        ]
    }
}
