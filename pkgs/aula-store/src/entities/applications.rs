//! Admission application entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub parent_name: String,
    pub parent_email: String,
    pub child_first_name: String,
    pub child_last_name: String,
    pub child_birth_date: String, // "YYYY-MM-DD", free-form from the intake form
    pub requested_class: String,
    pub status: String, // "pending", "approved" or "rejected"
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
