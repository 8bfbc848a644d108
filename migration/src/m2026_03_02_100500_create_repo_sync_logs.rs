//! Migration to create the repo_sync_logs table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RepoSyncLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RepoSyncLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RepoSyncLogs::RepoSyncQueueId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RepoSyncLogs::LogType).text().not_null())
                    .col(ColumnDef::new(RepoSyncLogs::Message).text().not_null())
                    .col(
                        ColumnDef::new(RepoSyncLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_repo_sync_logs_queue_id")
                            .from(RepoSyncLogs::Table, RepoSyncLogs::RepoSyncQueueId)
                            .to(RepoSyncQueue::Table, RepoSyncQueue::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_repo_sync_logs_queue_id")
                    .table(RepoSyncLogs::Table)
                    .col(RepoSyncLogs::RepoSyncQueueId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_repo_sync_logs_queue_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(RepoSyncLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RepoSyncLogs {
    Table,
    Id,
    RepoSyncQueueId,
    LogType,
    Message,
    CreatedAt,
}

#[derive(DeriveIden)]
enum RepoSyncQueue {
    Table,
    Id,
}
