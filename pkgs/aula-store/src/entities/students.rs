//! Student entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub admission_no: String, // "AULA-YYYY-NNNN", allocated at enrollment
    pub first_name: String,
    pub last_name: String,
    pub class_name: String,
    pub parent_id: String,
    pub promoted_from: Option<String>, // previous class after a promotion run
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
