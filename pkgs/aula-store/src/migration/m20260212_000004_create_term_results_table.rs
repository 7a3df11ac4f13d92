use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum TermResults {
    Table,
    Id,
    StudentId,
    ClassName,
    TermId,
    Average,
    SummaryJson,
    CreatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260212_000004_create_term_results_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TermResults::Table)
                    .col(
                        ColumnDef::new(TermResults::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TermResults::StudentId).string().not_null())
                    .col(ColumnDef::new(TermResults::ClassName).string().not_null())
                    .col(ColumnDef::new(TermResults::TermId).string().not_null())
                    .col(ColumnDef::new(TermResults::Average).double().not_null())
                    .col(ColumnDef::new(TermResults::SummaryJson).string().not_null())
                    .col(
                        ColumnDef::new(TermResults::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_term_results_student_term")
                    .table(TermResults::Table)
                    .col(TermResults::StudentId)
                    .col(TermResults::TermId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TermResults::Table).to_owned())
            .await
    }
}
