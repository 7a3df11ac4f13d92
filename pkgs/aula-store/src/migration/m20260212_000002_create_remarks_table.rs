use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Remarks {
    Table,
    Id,
    StudentId,
    ClassName,
    TermId,
    Text,
    AuthorId,
    CreatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260212_000002_create_remarks_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Remarks::Table)
                    .col(
                        ColumnDef::new(Remarks::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Remarks::StudentId).string().not_null())
                    .col(ColumnDef::new(Remarks::ClassName).string().not_null())
                    .col(ColumnDef::new(Remarks::TermId).string().not_null())
                    .col(ColumnDef::new(Remarks::Text).string().not_null())
                    .col(ColumnDef::new(Remarks::AuthorId).string().not_null())
                    .col(ColumnDef::new(Remarks::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_remarks_student")
                    .table(Remarks::Table)
                    .col(Remarks::StudentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Remarks::Table).to_owned())
            .await
    }
}
