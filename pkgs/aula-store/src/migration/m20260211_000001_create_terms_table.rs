use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Terms {
    Table,
    Id,
    Name,
    Status,
    Locked,
    CreatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260211_000001_create_terms_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Terms::Table)
                    .col(ColumnDef::new(Terms::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Terms::Name).string().not_null())
                    .col(ColumnDef::new(Terms::Status).string().not_null())
                    .col(
                        ColumnDef::new(Terms::Locked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Terms::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Terms::Table).to_owned())
            .await
    }
}
