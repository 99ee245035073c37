//! Create request table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Request::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Request::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Request::RequesterId).string_len(32).not_null())
                    .col(ColumnDef::new(Request::TargetId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Request::RequestDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Request::MapId).big_integer().not_null())
                    .col(ColumnDef::new(Request::MapsetId).big_integer())
                    .col(ColumnDef::new(Request::Title).string_len(512).not_null())
                    .col(ColumnDef::new(Request::Artist).string_len(512).not_null())
                    .col(ColumnDef::new(Request::Creator).string_len(128).not_null())
                    .col(ColumnDef::new(Request::Bpm).double().not_null())
                    .col(ColumnDef::new(Request::Length).string_len(16).not_null())
                    .col(ColumnDef::new(Request::Diffs).json_binary().not_null())
                    .col(ColumnDef::new(Request::ApprovalStatus).string_len(16).not_null())
                    .col(ColumnDef::new(Request::ImageUrl).string_len(1024).not_null())
                    .col(ColumnDef::new(Request::Comment).text().not_null())
                    .col(ColumnDef::new(Request::M4m).boolean().not_null().default(false))
                    .col(ColumnDef::new(Request::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Request::Feedback).text())
                    .col(ColumnDef::new(Request::Archived).boolean().not_null().default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_requester")
                            .from(Request::Table, Request::RequesterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_target")
                            .from(Request::Table, Request::TargetId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: queue page (newest first) and maintenance lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_request_target_date")
                    .table(Request::Table)
                    .col(Request::TargetId)
                    .col(Request::RequestDate)
                    .to_owned(),
            )
            .await?;

        // Index: cooldown lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_request_requester_target_date")
                    .table(Request::Table)
                    .col(Request::RequesterId)
                    .col(Request::TargetId)
                    .col(Request::RequestDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Request::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Request {
    Table,
    Id,
    RequesterId,
    TargetId,
    RequestDate,
    MapId,
    MapsetId,
    Title,
    Artist,
    Creator,
    Bpm,
    Length,
    Diffs,
    ApprovalStatus,
    ImageUrl,
    Comment,
    M4m,
    Status,
    Feedback,
    Archived,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
