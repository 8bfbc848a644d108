//! Migration to create the repo_sync_types table.
//!
//! Each sync type is a string tag naming a worker payload and belongs to a
//! type group for concurrency accounting. Seeds the GIT_BLAME type.

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
                    .table(RepoSyncTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RepoSyncTypes::Type)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RepoSyncTypes::TypeGroup).text().not_null())
                    .col(
                        ColumnDef::new(RepoSyncTypes::Description)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RepoSyncTypes::Priority)
                            .integer()
                            .not_null()
                            .default(10),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_repo_sync_types_type_group")
                            .from(RepoSyncTypes::Table, RepoSyncTypes::TypeGroup)
                            .to(RepoSyncTypeGroups::Table, RepoSyncTypeGroups::Group)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "INSERT INTO repo_sync_types (type, type_group, description) \
                 VALUES ('GIT_BLAME', 'DEFAULT', 'Latest git blame of every line in HEAD')"
                    .to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RepoSyncTypes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RepoSyncTypes {
    Table,
    Type,
    TypeGroup,
    Description,
    Priority,
}

#[derive(DeriveIden)]
enum RepoSyncTypeGroups {
    Table,
    Group,
}
