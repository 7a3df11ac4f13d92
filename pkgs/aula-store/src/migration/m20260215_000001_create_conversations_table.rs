use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Conversations {
    Table,
    Id,
    StudentId,
    ParentId,
    TeacherId,
    ClassId,
    ParentName,
    StudentName,
    TeacherName,
    Status,
    LastMessage,
    LastMessageAt,
    CreatedAt,
    UpdatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260215_000001_create_conversations_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Conversations::Table)
                    .col(
                        ColumnDef::new(Conversations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Conversations::StudentId).string().not_null())
                    .col(ColumnDef::new(Conversations::ParentId).string().not_null())
                    .col(ColumnDef::new(Conversations::TeacherId).string().not_null())
                    .col(ColumnDef::new(Conversations::ClassId).string().not_null())
                    .col(
                        ColumnDef::new(Conversations::ParentName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Conversations::StudentName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Conversations::TeacherName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Conversations::Status).string().not_null())
                    .col(
                        ColumnDef::new(Conversations::LastMessage)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Conversations::LastMessageAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Conversations::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Conversations::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_conversations_parent")
                    .table(Conversations::Table)
                    .col(Conversations::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_conversations_teacher")
                    .table(Conversations::Table)
                    .col(Conversations::TeacherId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Conversations::Table).to_owned())
            .await
    }
}
