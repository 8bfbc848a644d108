//! Migration to create the repo_sync_type_groups table.
//!
//! A type group is a named bucket of sync types sharing one concurrency
//! ceiling: at most `concurrent_syncs` jobs of a group may be RUNNING at
//! any time, across every worker process. Seeds the default group.

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
                    .table(RepoSyncTypeGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RepoSyncTypeGroups::Group)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RepoSyncTypeGroups::ConcurrentSyncs)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(RepoSyncTypeGroups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "INSERT INTO repo_sync_type_groups (\"group\", concurrent_syncs) VALUES ('DEFAULT', 5)"
                    .to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RepoSyncTypeGroups::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RepoSyncTypeGroups {
    Table,
    Group,
    ConcurrentSyncs,
    CreatedAt,
}
