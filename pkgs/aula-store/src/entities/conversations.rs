//! Conversation entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conversations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String, // hex sha256 of (student_id, parent_id, teacher_id)
    pub student_id: String,
    pub parent_id: String,
    pub teacher_id: String,
    pub class_id: String,
    pub parent_name: String,  // display cache, captured at creation
    pub student_name: String, // display cache, captured at creation
    pub teacher_name: String, // display cache, captured at creation
    pub status: String,       // "open" or "closed"
    pub last_message: String, // last message text for list preview
    pub last_message_at: i64, // millis, drives list ordering
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::messages::Entity")]
    Messages,
    #[sea_orm(has_many = "super::conversation_reads::Entity")]
    ConversationReads,
}

impl Related<super::messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl Related<super::conversation_reads::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConversationReads.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
