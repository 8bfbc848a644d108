//! Migration to create the repo_sync_queue table.
//!
//! Queue rows are append-only execution attempts. Status walks
//! QUEUED -> RUNNING -> DONE; started_at/done_at/last_keep_alive are the
//! timestamps the dequeue statement, the generation barrier, and the reaper
//! predicate join on.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RepoSyncQueue::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RepoSyncQueue::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RepoSyncQueue::RepoSyncId).uuid().not_null())
                    .col(
                        ColumnDef::new(RepoSyncQueue::Status)
                            .text()
                            .not_null()
                            .default("QUEUED"),
                    )
                    .col(
                        ColumnDef::new(RepoSyncQueue::Priority)
                            .integer()
                            .not_null()
                            .default(10),
                    )
                    .col(ColumnDef::new(RepoSyncQueue::TypeGroup).text().not_null())
                    .col(
                        ColumnDef::new(RepoSyncQueue::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(RepoSyncQueue::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RepoSyncQueue::DoneAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RepoSyncQueue::LastKeepAlive)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_repo_sync_queue_repo_sync_id")
                            .from(RepoSyncQueue::Table, RepoSyncQueue::RepoSyncId)
                            .to(RepoSyncs::Table, RepoSyncs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_repo_sync_queue_type_group")
                            .from(RepoSyncQueue::Table, RepoSyncQueue::TypeGroup)
                            .to(RepoSyncTypeGroups::Table, RepoSyncTypeGroups::Group)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Dequeue scan order: the winner is min (priority, created_at, id)
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_repo_sync_queue_dequeue \
                 ON repo_sync_queue (status, priority, created_at, id)"
                    .to_string(),
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_repo_sync_queue_repo_sync_status")
                    .table(RepoSyncQueue::Table)
                    .col(RepoSyncQueue::RepoSyncId)
                    .col(RepoSyncQueue::Status)
                    .to_owned(),
            )
            .await?;

        // Generation barrier scans unfinished rows per group
        manager
            .create_index(
                Index::create()
                    .name("idx_repo_sync_queue_group_done")
                    .table(RepoSyncQueue::Table)
                    .col(RepoSyncQueue::TypeGroup)
                    .col(RepoSyncQueue::DoneAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_repo_sync_queue_dequeue").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_repo_sync_queue_repo_sync_status")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_repo_sync_queue_group_done")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(RepoSyncQueue::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RepoSyncQueue {
    Table,
    Id,
    RepoSyncId,
    Status,
    Priority,
    TypeGroup,
    CreatedAt,
    StartedAt,
    DoneAt,
    LastKeepAlive,
}

#[derive(DeriveIden)]
enum RepoSyncs {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum RepoSyncTypeGroups {
    Table,
    Group,
}
