use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum AdmissionCounters {
    Table,
    Id,
    Year,
    LastSeq,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260211_000003_create_admission_counters_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdmissionCounters::Table)
                    .col(
                        ColumnDef::new(AdmissionCounters::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AdmissionCounters::Year)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdmissionCounters::LastSeq)
                            .integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdmissionCounters::Table).to_owned())
            .await
    }
}
