//! Sea-ORM entities for the Aula database schema

pub mod admission_counters;
pub mod applications;
pub mod attendance;
pub mod conversation_reads;
pub mod conversations;
pub mod marks;
pub mod messages;
pub mod remarks;
pub mod students;
pub mod teacher_assignments;
pub mod term_results;
pub mod terms;
pub mod users;
