//! Migration to create the repo_syncs table.
//!
//! A repo sync binds one repo to one sync type with a scheduling priority
//! (lower runs sooner) and an on/off flag. The scheduler turns enabled
//! bindings into queue rows.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RepoSyncs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RepoSyncs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RepoSyncs::RepoId).uuid().not_null())
                    .col(ColumnDef::new(RepoSyncs::SyncType).text().not_null())
                    .col(
                        ColumnDef::new(RepoSyncs::Priority)
                            .integer()
                            .not_null()
                            .default(10),
                    )
                    .col(
                        ColumnDef::new(RepoSyncs::ScheduleEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RepoSyncs::Settings)
                            .json_binary()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(RepoSyncs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_repo_syncs_repo_id")
                            .from(RepoSyncs::Table, RepoSyncs::RepoId)
                            .to(Repos::Table, Repos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_repo_syncs_sync_type")
                            .from(RepoSyncs::Table, RepoSyncs::SyncType)
                            .to(RepoSyncTypes::Table, RepoSyncTypes::Type)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One binding per (repo, sync_type)
        manager
            .create_index(
                Index::create()
                    .name("idx_repo_syncs_repo_type_unique")
                    .table(RepoSyncs::Table)
                    .col(RepoSyncs::RepoId)
                    .col(RepoSyncs::SyncType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_repo_syncs_repo_type_unique")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(RepoSyncs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RepoSyncs {
    Table,
    Id,
    RepoId,
    SyncType,
    Priority,
    ScheduleEnabled,
    Settings,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Repos {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum RepoSyncTypes {
    Table,
    Type,
}
