//! Term store - academic terms, the active-term flag and mark locking

use crate::entities::terms;
use crate::error::StoreError;
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermStatus {
    Active,
    Archived,
}

impl TermStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TermStatus::Active => "active",
            TermStatus::Archived => "archived",
        }
    }

    fn from_db(value: &str) -> Result<Self, StoreError> {
        match value {
            "active" => Ok(TermStatus::Active),
            "archived" => Ok(TermStatus::Archived),
            other => Err(StoreError::UnknownVariant {
                field: "term status",
                value: other.to_string(),
            }),
        }
    }
}

/// Academic term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub id: String,
    pub name: String,
    pub status: TermStatus,
    pub locked: bool,
    pub created_at: i64,
}

impl TryFrom<terms::Model> for Term {
    type Error = StoreError;

    fn try_from(model: terms::Model) -> Result<Self, StoreError> {
        Ok(Self {
            status: TermStatus::from_db(&model.status)?,
            id: model.id,
            name: model.name,
            locked: model.locked,
            created_at: model.created_at,
        })
    }
}

/// Term store
pub struct TermStore {
    db: DatabaseConnection,
}

impl TermStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a term. New terms start archived and unlocked; activating one
    /// is a separate step.
    pub async fn add_term(&self, name: &str) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();

        terms::ActiveModel {
            id: Set(id.clone()),
            name: Set(name.to_string()),
            status: Set(TermStatus::Archived.as_str().to_string()),
            locked: Set(false),
            created_at: Set(Utc::now().timestamp_millis()),
        }
        .insert(&self.db)
        .await?;

        info!("Created term {} ({})", name, id);
        Ok(id)
    }

    pub async fn get_term(&self, id: &str) -> Result<Option<Term>, StoreError> {
        terms::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Term::try_from)
            .transpose()
    }

    pub async fn all_terms(&self) -> Result<Vec<Term>, StoreError> {
        terms::Entity::find()
            .order_by_desc(terms::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Term::try_from)
            .collect()
    }

    /// The currently active term, if one has been activated.
    pub async fn active_term(&self) -> Result<Option<Term>, StoreError> {
        terms::Entity::find()
            .filter(terms::Column::Status.eq(TermStatus::Active.as_str()))
            .one(&self.db)
            .await?
            .map(Term::try_from)
            .transpose()
    }

    /// Make `term_id` the active term and archive every other term, as one
    /// transaction.
    pub async fn set_active(&self, term_id: &str) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;

        let term = terms::Entity::find_by_id(term_id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::TermNotFound(term_id.to_string()))?;

        terms::Entity::update_many()
            .col_expr(
                terms::Column::Status,
                Expr::value(TermStatus::Archived.as_str()),
            )
            .exec(&txn)
            .await?;

        let mut active: terms::ActiveModel = term.into();
        active.status = Set(TermStatus::Active.as_str().to_string());
        active.update(&txn).await?;

        txn.commit().await?;

        info!("Term {} is now active", term_id);
        Ok(())
    }

    /// Lock or unlock a term for mark entry.
    pub async fn set_locked(&self, term_id: &str, locked: bool) -> Result<(), StoreError> {
        let term = terms::Entity::find_by_id(term_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::TermNotFound(term_id.to_string()))?;

        let mut active: terms::ActiveModel = term.into();
        active.locked = Set(locked);
        active.update(&self.db).await?;

        debug!("Term {} locked = {}", term_id, locked);
        Ok(())
    }
}
