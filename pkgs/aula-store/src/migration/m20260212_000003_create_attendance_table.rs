use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Attendance {
    Table,
    Id,
    StudentId,
    ClassName,
    TermId,
    Date,
    Status,
    RecordedBy,
    CreatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260212_000003_create_attendance_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attendance::Table)
                    .col(
                        ColumnDef::new(Attendance::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attendance::StudentId).string().not_null())
                    .col(ColumnDef::new(Attendance::ClassName).string().not_null())
                    .col(ColumnDef::new(Attendance::TermId).string().not_null())
                    .col(ColumnDef::new(Attendance::Date).string().not_null())
                    .col(ColumnDef::new(Attendance::Status).string().not_null())
                    .col(ColumnDef::new(Attendance::RecordedBy).string().not_null())
                    .col(
                        ColumnDef::new(Attendance::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attendance_student_term")
                    .table(Attendance::Table)
                    .col(Attendance::StudentId)
                    .col(Attendance::TermId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attendance::Table).to_owned())
            .await
    }
}
