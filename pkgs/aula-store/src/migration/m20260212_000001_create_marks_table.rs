use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Marks {
    Table,
    Id,
    StudentId,
    ClassName,
    Subject,
    TermId,
    Score,
    OutOf,
    RecordedBy,
    CreatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260212_000001_create_marks_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Marks::Table)
                    .col(ColumnDef::new(Marks::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Marks::StudentId).string().not_null())
                    .col(ColumnDef::new(Marks::ClassName).string().not_null())
                    .col(ColumnDef::new(Marks::Subject).string().not_null())
                    .col(ColumnDef::new(Marks::TermId).string().not_null())
                    .col(ColumnDef::new(Marks::Score).double().not_null())
                    .col(ColumnDef::new(Marks::OutOf).double().not_null())
                    .col(ColumnDef::new(Marks::RecordedBy).string().not_null())
                    .col(ColumnDef::new(Marks::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_marks_student_term")
                    .table(Marks::Table)
                    .col(Marks::StudentId)
                    .col(Marks::TermId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_marks_class_term")
                    .table(Marks::Table)
                    .col(Marks::ClassName)
                    .col(Marks::TermId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Marks::Table).to_owned())
            .await
    }
}
