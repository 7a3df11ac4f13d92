use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum ConversationReads {
    Table,
    ConversationId,
    UserId,
    LastReadAt,
}

#[derive(DeriveIden)]
enum Conversations {
    Table,
    Id,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260215_000003_create_conversation_reads_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConversationReads::Table)
                    .col(
                        ColumnDef::new(ConversationReads::ConversationId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConversationReads::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConversationReads::LastReadAt)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ConversationReads::ConversationId)
                            .col(ConversationReads::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_conversation_reads_conversation")
                            .from(ConversationReads::Table, ConversationReads::ConversationId)
                            .to(Conversations::Table, Conversations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConversationReads::Table).to_owned())
            .await
    }
}
