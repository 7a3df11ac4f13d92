//! Admissions store - intake applications and student enrollment

use crate::entities::{admission_counters, applications, students};
use crate::error::StoreError;
use chrono::{Datelike, Utc};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Counter row shared by all enrollments.
const ADMISSION_COUNTER_ID: &str = "admissions";

/// Admission application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    fn from_db(value: &str) -> Result<Self, StoreError> {
        match value {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(StoreError::UnknownVariant {
                field: "application status",
                value: other.to_string(),
            }),
        }
    }
}

/// Admission application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub parent_name: String,
    pub parent_email: String,
    pub child_first_name: String,
    pub child_last_name: String,
    pub child_birth_date: String,
    pub requested_class: String,
    pub status: ApplicationStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<applications::Model> for Application {
    type Error = StoreError;

    fn try_from(model: applications::Model) -> Result<Self, StoreError> {
        Ok(Self {
            status: ApplicationStatus::from_db(&model.status)?,
            id: model.id,
            parent_name: model.parent_name,
            parent_email: model.parent_email,
            child_first_name: model.child_first_name,
            child_last_name: model.child_last_name,
            child_birth_date: model.child_birth_date,
            requested_class: model.requested_class,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Intake form payload.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub parent_name: String,
    pub parent_email: String,
    pub child_first_name: String,
    pub child_last_name: String,
    pub child_birth_date: String,
    pub requested_class: String,
}

/// Outcome of enrolling an approved application.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrolledStudent {
    pub student_id: String,
    pub admission_no: String,
}

/// Admissions store
pub struct AdmissionsStore {
    db: DatabaseConnection,
}

impl AdmissionsStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Submit an intake application. A parent email with a pending or
    /// approved application on file cannot submit another one.
    pub async fn submit_application(&self, new: NewApplication) -> Result<String, StoreError> {
        if self
            .find_live_application(&new.parent_email)
            .await?
            .is_some()
        {
            return Err(StoreError::DuplicateApplication(new.parent_email));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().timestamp_millis();

        applications::ActiveModel {
            id: Set(id.clone()),
            parent_name: Set(new.parent_name),
            parent_email: Set(new.parent_email.clone()),
            child_first_name: Set(new.child_first_name),
            child_last_name: Set(new.child_last_name),
            child_birth_date: Set(new.child_birth_date),
            requested_class: Set(new.requested_class),
            status: Set(ApplicationStatus::Pending.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!("Received application {} from {}", id, new.parent_email);
        Ok(id)
    }

    /// The pending or approved application for a parent email, if any.
    pub async fn find_live_application(
        &self,
        parent_email: &str,
    ) -> Result<Option<Application>, StoreError> {
        applications::Entity::find()
            .filter(applications::Column::ParentEmail.eq(parent_email))
            .filter(applications::Column::Status.is_in([
                ApplicationStatus::Pending.as_str(),
                ApplicationStatus::Approved.as_str(),
            ]))
            .one(&self.db)
            .await?
            .map(Application::try_from)
            .transpose()
    }

    pub async fn get_application(&self, id: &str) -> Result<Option<Application>, StoreError> {
        applications::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Application::try_from)
            .transpose()
    }

    /// All applications in a given state, newest first.
    pub async fn applications_by_status(
        &self,
        status: ApplicationStatus,
    ) -> Result<Vec<Application>, StoreError> {
        applications::Entity::find()
            .filter(applications::Column::Status.eq(status.as_str()))
            .order_by_desc(applications::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Application::try_from)
            .collect()
    }

    pub async fn set_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<(), StoreError> {
        let model = applications::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::ApplicationNotFound(id.to_string()))?;

        let mut active: applications::ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now().timestamp_millis());
        active.update(&self.db).await?;

        debug!("Application {} status set to {}", id, status.as_str());
        Ok(())
    }

    /// Turn an approved application into a student record. Allocates the
    /// next admission number for the current year; the counter bump and the
    /// student insert commit together. `parent_id` links the student to the
    /// parent's portal account.
    pub async fn enroll_student(
        &self,
        application_id: &str,
        parent_id: &str,
    ) -> Result<EnrolledStudent, StoreError> {
        let txn = self.db.begin().await?;

        let application = applications::Entity::find_by_id(application_id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::ApplicationNotFound(application_id.to_string()))?;

        if ApplicationStatus::from_db(&application.status)? != ApplicationStatus::Approved {
            return Err(StoreError::ApplicationNotApproved(application_id.to_string()));
        }

        let admission_no = Self::next_admission_no(&txn).await?;
        let student_id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().timestamp_millis();

        students::ActiveModel {
            id: Set(student_id.clone()),
            admission_no: Set(admission_no.clone()),
            first_name: Set(application.child_first_name.clone()),
            last_name: Set(application.child_last_name.clone()),
            class_name: Set(application.requested_class.clone()),
            parent_id: Set(parent_id.to_string()),
            promoted_from: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            "Enrolled student {} ({}) from application {}",
            student_id, admission_no, application_id
        );
        Ok(EnrolledStudent {
            student_id,
            admission_no,
        })
    }

    /// Allocate the next "AULA-{year}-{seq}" number. The sequence restarts
    /// at 1 when the year rolls over.
    async fn next_admission_no<C: ConnectionTrait>(conn: &C) -> Result<String, StoreError> {
        let year = Utc::now().year();

        let counter = admission_counters::Entity::find_by_id(ADMISSION_COUNTER_ID)
            .one(conn)
            .await?;

        let seq = match &counter {
            Some(c) if c.year == year => c.last_seq + 1,
            _ => 1,
        };

        match counter {
            Some(model) => {
                let mut active: admission_counters::ActiveModel = model.into();
                active.year = Set(year);
                active.last_seq = Set(seq);
                active.update(conn).await?;
            }
            None => {
                admission_counters::ActiveModel {
                    id: Set(ADMISSION_COUNTER_ID.to_string()),
                    year: Set(year),
                    last_seq: Set(seq),
                }
                .insert(conn)
                .await?;
            }
        }

        Ok(format!("AULA-{}-{:04}", year, seq))
    }
}
