//! Create queue table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Queue::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Queue::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Queue::OwnerId).string_len(32).not_null())
                    .col(ColumnDef::new(Queue::Open).boolean().not_null().default(false))
                    .col(ColumnDef::new(Queue::Archived).boolean().not_null().default(false))
                    .col(ColumnDef::new(Queue::MaxPending).integer())
                    .col(ColumnDef::new(Queue::Cooldown).integer().not_null().default(0))
                    .col(ColumnDef::new(Queue::AcceptM4m).boolean().not_null().default(false))
                    .col(ColumnDef::new(Queue::ModderType).string_len(16).not_null())
                    .col(ColumnDef::new(Queue::Modes).json_binary().not_null())
                    .col(ColumnDef::new(Queue::Title).string_len(256))
                    .col(ColumnDef::new(Queue::Notes).text())
                    .col(
                        ColumnDef::new(Queue::LastActionedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Queue::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Queue::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_queue_owner")
                            .from(Queue::Table, Queue::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One queue row per owner; archival is a soft flag on that row.
        manager
            .create_index(
                Index::create()
                    .name("idx_queue_owner_id")
                    .table(Queue::Table)
                    .col(Queue::OwnerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: public listing sort
        manager
            .create_index(
                Index::create()
                    .name("idx_queue_last_actioned_at")
                    .table(Queue::Table)
                    .col(Queue::LastActionedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Queue::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Queue {
    Table,
    Id,
    OwnerId,
    Open,
    Archived,
    MaxPending,
    Cooldown,
    AcceptM4m,
    ModderType,
    Modes,
    Title,
    Notes,
    LastActionedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
