//! Gradebook store - marks, remarks, attendance and term results
//!
//! Entry screens submit whole rows of students at once, so every save here
//! takes a batch and commits it as one transaction. Marks and term results
//! are gated on the term's lock flag; remarks and attendance are not.

use crate::entities::{attendance, marks, remarks, term_results, terms};
use crate::error::StoreError;
use chrono::Utc;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Daily attendance outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }

    fn from_db(value: &str) -> Result<Self, StoreError> {
        match value {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "late" => Ok(AttendanceStatus::Late),
            other => Err(StoreError::UnknownVariant {
                field: "attendance status",
                value: other.to_string(),
            }),
        }
    }
}

/// Graded score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub id: String,
    pub student_id: String,
    pub class_name: String,
    pub subject: String,
    pub term_id: String,
    pub score: f64,
    pub out_of: f64,
    pub recorded_by: String,
    pub created_at: i64,
}

impl From<marks::Model> for Mark {
    fn from(model: marks::Model) -> Self {
        Self {
            id: model.id,
            student_id: model.student_id,
            class_name: model.class_name,
            subject: model.subject,
            term_id: model.term_id,
            score: model.score,
            out_of: model.out_of,
            recorded_by: model.recorded_by,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMark {
    pub student_id: String,
    pub class_name: String,
    pub subject: String,
    pub term_id: String,
    pub score: f64,
    pub out_of: f64,
    pub recorded_by: String,
}

/// Teacher comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Remark {
    pub id: String,
    pub student_id: String,
    pub class_name: String,
    pub term_id: String,
    pub text: String,
    pub author_id: String,
    pub created_at: i64,
}

impl From<remarks::Model> for Remark {
    fn from(model: remarks::Model) -> Self {
        Self {
            id: model.id,
            student_id: model.student_id,
            class_name: model.class_name,
            term_id: model.term_id,
            text: model.text,
            author_id: model.author_id,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewRemark {
    pub student_id: String,
    pub class_name: String,
    pub term_id: String,
    pub text: String,
    pub author_id: String,
}

/// Attendance entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: String,
    pub student_id: String,
    pub class_name: String,
    pub term_id: String,
    pub date: String,
    pub status: AttendanceStatus,
    pub recorded_by: String,
    pub created_at: i64,
}

impl TryFrom<attendance::Model> for Attendance {
    type Error = StoreError;

    fn try_from(model: attendance::Model) -> Result<Self, StoreError> {
        Ok(Self {
            status: AttendanceStatus::from_db(&model.status)?,
            id: model.id,
            student_id: model.student_id,
            class_name: model.class_name,
            term_id: model.term_id,
            date: model.date,
            recorded_by: model.recorded_by,
            created_at: model.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub student_id: String,
    pub class_name: String,
    pub term_id: String,
    pub date: String,
    pub status: AttendanceStatus,
    pub recorded_by: String,
}

/// Report-card summary for one student and term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermResult {
    pub id: String,
    pub student_id: String,
    pub class_name: String,
    pub term_id: String,
    pub average: f64,
    pub summary: serde_json::Value,
    pub created_at: i64,
}

impl TryFrom<term_results::Model> for TermResult {
    type Error = StoreError;

    fn try_from(model: term_results::Model) -> Result<Self, StoreError> {
        Ok(Self {
            summary: serde_json::from_str(&model.summary_json)?,
            id: model.id,
            student_id: model.student_id,
            class_name: model.class_name,
            term_id: model.term_id,
            average: model.average,
            created_at: model.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewTermResult {
    pub student_id: String,
    pub class_name: String,
    pub term_id: String,
    pub average: f64,
    pub summary: serde_json::Value,
}

/// Gradebook store
pub struct GradebookStore {
    db: DatabaseConnection,
}

impl GradebookStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Save a batch of marks. Rejected when any referenced term is locked.
    pub async fn save_marks(&self, batch: Vec<NewMark>) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        self.ensure_terms_unlocked(batch.iter().map(|m| m.term_id.as_str()))
            .await?;

        let now = Utc::now().timestamp_millis();
        let count = batch.len();
        let txn = self.db.begin().await?;

        for mark in batch {
            marks::ActiveModel {
                id: Set(uuid::Uuid::new_v4().to_string()),
                student_id: Set(mark.student_id),
                class_name: Set(mark.class_name),
                subject: Set(mark.subject),
                term_id: Set(mark.term_id),
                score: Set(mark.score),
                out_of: Set(mark.out_of),
                recorded_by: Set(mark.recorded_by),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        debug!("Saved {} marks", count);
        Ok(())
    }

    /// Save a batch of remarks.
    pub async fn save_remarks(&self, batch: Vec<NewRemark>) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let now = Utc::now().timestamp_millis();
        let count = batch.len();
        let txn = self.db.begin().await?;

        for remark in batch {
            remarks::ActiveModel {
                id: Set(uuid::Uuid::new_v4().to_string()),
                student_id: Set(remark.student_id),
                class_name: Set(remark.class_name),
                term_id: Set(remark.term_id),
                text: Set(remark.text),
                author_id: Set(remark.author_id),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        debug!("Saved {} remarks", count);
        Ok(())
    }

    /// Save a batch of attendance entries.
    pub async fn save_attendance(&self, batch: Vec<NewAttendance>) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let now = Utc::now().timestamp_millis();
        let count = batch.len();
        let txn = self.db.begin().await?;

        for entry in batch {
            attendance::ActiveModel {
                id: Set(uuid::Uuid::new_v4().to_string()),
                student_id: Set(entry.student_id),
                class_name: Set(entry.class_name),
                term_id: Set(entry.term_id),
                date: Set(entry.date),
                status: Set(entry.status.as_str().to_string()),
                recorded_by: Set(entry.recorded_by),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        debug!("Saved {} attendance entries", count);
        Ok(())
    }

    /// Save a batch of term results. Rejected when any referenced term is
    /// locked.
    pub async fn save_term_results(&self, batch: Vec<NewTermResult>) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        self.ensure_terms_unlocked(batch.iter().map(|r| r.term_id.as_str()))
            .await?;

        let now = Utc::now().timestamp_millis();
        let count = batch.len();
        let txn = self.db.begin().await?;

        for result in batch {
            term_results::ActiveModel {
                id: Set(uuid::Uuid::new_v4().to_string()),
                student_id: Set(result.student_id),
                class_name: Set(result.class_name),
                term_id: Set(result.term_id),
                average: Set(result.average),
                summary_json: Set(serde_json::to_string(&result.summary)?),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        debug!("Saved {} term results", count);
        Ok(())
    }

    pub async fn class_marks(
        &self,
        class_name: &str,
        term_id: &str,
    ) -> Result<Vec<Mark>, StoreError> {
        let rows = marks::Entity::find()
            .filter(marks::Column::ClassName.eq(class_name))
            .filter(marks::Column::TermId.eq(term_id))
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Mark::from).collect())
    }

    pub async fn student_marks(
        &self,
        student_id: &str,
        term_id: &str,
    ) -> Result<Vec<Mark>, StoreError> {
        let rows = marks::Entity::find()
            .filter(marks::Column::StudentId.eq(student_id))
            .filter(marks::Column::TermId.eq(term_id))
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Mark::from).collect())
    }

    pub async fn student_remarks(&self, student_id: &str) -> Result<Vec<Remark>, StoreError> {
        let rows = remarks::Entity::find()
            .filter(remarks::Column::StudentId.eq(student_id))
            .order_by_desc(remarks::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Remark::from).collect())
    }

    pub async fn student_attendance(
        &self,
        student_id: &str,
        term_id: &str,
    ) -> Result<Vec<Attendance>, StoreError> {
        attendance::Entity::find()
            .filter(attendance::Column::StudentId.eq(student_id))
            .filter(attendance::Column::TermId.eq(term_id))
            .order_by_asc(attendance::Column::Date)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Attendance::try_from)
            .collect()
    }

    pub async fn student_term_result(
        &self,
        student_id: &str,
        term_id: &str,
    ) -> Result<Option<TermResult>, StoreError> {
        term_results::Entity::find()
            .filter(term_results::Column::StudentId.eq(student_id))
            .filter(term_results::Column::TermId.eq(term_id))
            .one(&self.db)
            .await?
            .map(TermResult::try_from)
            .transpose()
    }

    /// Every distinct term in the batch must exist and be unlocked.
    async fn ensure_terms_unlocked<'a>(
        &self,
        term_ids: impl Iterator<Item = &'a str>,
    ) -> Result<(), StoreError> {
        let distinct: BTreeSet<&str> = term_ids.collect();

        for term_id in distinct {
            let term = terms::Entity::find_by_id(term_id)
                .one(&self.db)
                .await?
                .ok_or_else(|| StoreError::TermNotFound(term_id.to_string()))?;

            if term.locked {
                return Err(StoreError::TermLocked(term_id.to_string()));
            }
        }

        Ok(())
    }
}
