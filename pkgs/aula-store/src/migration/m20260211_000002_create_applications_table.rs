use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Applications {
    Table,
    Id,
    ParentName,
    ParentEmail,
    ChildFirstName,
    ChildLastName,
    ChildBirthDate,
    RequestedClass,
    Status,
    CreatedAt,
    UpdatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260211_000002_create_applications_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Applications::Table)
                    .col(
                        ColumnDef::new(Applications::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Applications::ParentName).string().not_null())
                    .col(
                        ColumnDef::new(Applications::ParentEmail)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Applications::ChildFirstName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Applications::ChildLastName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Applications::ChildBirthDate)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Applications::RequestedClass)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Applications::Status).string().not_null())
                    .col(
                        ColumnDef::new(Applications::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Applications::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_applications_parent_email")
                    .table(Applications::Table)
                    .col(Applications::ParentEmail)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Applications::Table).to_owned())
            .await
    }
}
