//! Roster store - user profiles, students and teacher assignments

use crate::entities::{students, teacher_assignments, users};
use crate::error::{is_unique_violation, StoreError};
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Portal role attached to a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Teacher,
    Parent,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Teacher => "teacher",
            UserRole::Parent => "parent",
        }
    }

    fn from_db(value: &str) -> Result<Self, StoreError> {
        match value {
            "admin" => Ok(UserRole::Admin),
            "teacher" => Ok(UserRole::Teacher),
            "parent" => Ok(UserRole::Parent),
            other => Err(StoreError::UnknownVariant {
                field: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// User profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub created_at: i64,
}

impl TryFrom<users::Model> for User {
    type Error = StoreError;

    fn try_from(model: users::Model) -> Result<Self, StoreError> {
        Ok(Self {
            role: UserRole::from_db(&model.role)?,
            id: model.id,
            email: model.email,
            display_name: model.display_name,
            created_at: model.created_at,
        })
    }
}

/// Student record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub admission_no: String,
    pub first_name: String,
    pub last_name: String,
    pub class_name: String,
    pub parent_id: String,
    pub promoted_from: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<students::Model> for Student {
    fn from(model: students::Model) -> Self {
        Self {
            id: model.id,
            admission_no: model.admission_no,
            first_name: model.first_name,
            last_name: model.last_name,
            class_name: model.class_name,
            parent_id: model.parent_id,
            promoted_from: model.promoted_from,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Teacher assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherAssignment {
    pub id: String,
    pub teacher_id: String,
    pub class_name: String,
    pub subject: String,
    pub created_at: i64,
}

impl From<teacher_assignments::Model> for TeacherAssignment {
    fn from(model: teacher_assignments::Model) -> Self {
        Self {
            id: model.id,
            teacher_id: model.teacher_id,
            class_name: model.class_name,
            subject: model.subject,
            created_at: model.created_at,
        }
    }
}

/// Roster store
pub struct RosterStore {
    db: DatabaseConnection,
}

impl RosterStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create or update a user profile (merge semantics).
    pub async fn upsert_user(
        &self,
        id: &str,
        email: &str,
        display_name: &str,
        role: UserRole,
    ) -> Result<(), StoreError> {
        let existing = users::Entity::find_by_id(id).one(&self.db).await?;

        if let Some(model) = existing {
            let mut active: users::ActiveModel = model.into();
            active.email = Set(email.to_string());
            active.display_name = Set(display_name.to_string());
            active.role = Set(role.as_str().to_string());
            active.update(&self.db).await?;
        } else {
            let insert = users::ActiveModel {
                id: Set(id.to_string()),
                email: Set(email.to_string()),
                display_name: Set(display_name.to_string()),
                role: Set(role.as_str().to_string()),
                created_at: Set(Utc::now().timestamp_millis()),
            }
            .insert(&self.db)
            .await;

            match insert {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    // Concurrent profile write; fall back to the update path.
                    let model = users::Entity::find_by_id(id)
                        .one(&self.db)
                        .await?
                        .ok_or_else(|| DbErr::RecordNotFound(id.to_string()))?;
                    let mut active: users::ActiveModel = model.into();
                    active.email = Set(email.to_string());
                    active.display_name = Set(display_name.to_string());
                    active.role = Set(role.as_str().to_string());
                    active.update(&self.db).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug!("Upserted user {} ({})", id, role.as_str());
        Ok(())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        users::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    pub async fn get_user_role(&self, id: &str) -> Result<Option<UserRole>, StoreError> {
        Ok(self.get_user(id).await?.map(|u| u.role))
    }

    /// All students of a class, by last then first name.
    pub async fn students_by_class(&self, class_name: &str) -> Result<Vec<Student>, StoreError> {
        let rows = students::Entity::find()
            .filter(students::Column::ClassName.eq(class_name))
            .order_by_asc(students::Column::LastName)
            .order_by_asc(students::Column::FirstName)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Student::from).collect())
    }

    /// The student linked to a parent account, if any.
    pub async fn student_for_parent(&self, parent_id: &str) -> Result<Option<Student>, StoreError> {
        let row = students::Entity::find()
            .filter(students::Column::ParentId.eq(parent_id))
            .one(&self.db)
            .await?;

        Ok(row.map(Student::from))
    }

    pub async fn get_student(&self, id: &str) -> Result<Option<Student>, StoreError> {
        let row = students::Entity::find_by_id(id).one(&self.db).await?;
        Ok(row.map(Student::from))
    }

    /// Move every student of `source_class` to `target_class` in one
    /// transaction. Returns the number of students moved.
    pub async fn promote_class(
        &self,
        source_class: &str,
        target_class: &str,
    ) -> Result<u64, StoreError> {
        let now = Utc::now().timestamp_millis();
        let txn = self.db.begin().await?;

        let result = students::Entity::update_many()
            .filter(students::Column::ClassName.eq(source_class))
            .col_expr(students::Column::ClassName, Expr::value(target_class))
            .col_expr(students::Column::PromotedFrom, Expr::value(source_class))
            .col_expr(students::Column::UpdatedAt, Expr::value(now))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(
            "Promoted {} students from {} to {}",
            result.rows_affected, source_class, target_class
        );
        Ok(result.rows_affected)
    }

    /// Record that a teacher covers a class/subject.
    pub async fn add_assignment(
        &self,
        teacher_id: &str,
        class_name: &str,
        subject: &str,
    ) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();

        teacher_assignments::ActiveModel {
            id: Set(id.clone()),
            teacher_id: Set(teacher_id.to_string()),
            class_name: Set(class_name.to_string()),
            subject: Set(subject.to_string()),
            created_at: Set(Utc::now().timestamp_millis()),
        }
        .insert(&self.db)
        .await?;

        debug!("Assigned teacher {} to {} ({})", teacher_id, class_name, subject);
        Ok(id)
    }

    pub async fn assignments_for_teacher(
        &self,
        teacher_id: &str,
    ) -> Result<Vec<TeacherAssignment>, StoreError> {
        let rows = teacher_assignments::Entity::find()
            .filter(teacher_assignments::Column::TeacherId.eq(teacher_id))
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(TeacherAssignment::from).collect())
    }

    /// Distinct teachers assigned to a class, resolved to their profiles.
    pub async fn teachers_for_class(&self, class_name: &str) -> Result<Vec<User>, StoreError> {
        let rows = teacher_assignments::Entity::find()
            .filter(teacher_assignments::Column::ClassName.eq(class_name))
            .all(&self.db)
            .await?;

        let mut teacher_ids: Vec<String> = rows.into_iter().map(|a| a.teacher_id).collect();
        teacher_ids.sort();
        teacher_ids.dedup();

        if teacher_ids.is_empty() {
            return Ok(Vec::new());
        }

        users::Entity::find()
            .filter(users::Column::Id.is_in(teacher_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips() {
        for role in [UserRole::Admin, UserRole::Teacher, UserRole::Parent] {
            assert_eq!(UserRole::from_db(role.as_str()).unwrap(), role);
        }
        assert!(UserRole::from_db("principal").is_err());
    }
}
