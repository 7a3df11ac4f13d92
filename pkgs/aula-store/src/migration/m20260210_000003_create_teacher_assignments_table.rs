use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum TeacherAssignments {
    Table,
    Id,
    TeacherId,
    ClassName,
    Subject,
    CreatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260210_000003_create_teacher_assignments_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TeacherAssignments::Table)
                    .col(
                        ColumnDef::new(TeacherAssignments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TeacherAssignments::TeacherId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherAssignments::ClassName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherAssignments::Subject)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherAssignments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_teacher_assignments_teacher")
                    .table(TeacherAssignments::Table)
                    .col(TeacherAssignments::TeacherId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_teacher_assignments_class")
                    .table(TeacherAssignments::Table)
                    .col(TeacherAssignments::ClassName)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TeacherAssignments::Table).to_owned())
            .await
    }
}
