//! Migration to create the git_blame result table.
//!
//! Holds per-line authorship for every non-binary file at HEAD. A
//! successful blame job replaces a repo's whole row set in one transaction,
//! so there is no updated_at bookkeeping here.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GitBlame::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GitBlame::RepoId).uuid().not_null())
                    .col(ColumnDef::new(GitBlame::AuthorEmail).text().null())
                    .col(ColumnDef::new(GitBlame::AuthorName).text().null())
                    .col(
                        ColumnDef::new(GitBlame::AuthorWhen)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(GitBlame::CommitHash).text().null())
                    .col(ColumnDef::new(GitBlame::LineNo).integer().not_null())
                    .col(ColumnDef::new(GitBlame::Line).text().null())
                    .col(ColumnDef::new(GitBlame::Path).text().not_null())
                    .primary_key(
                        Index::create()
                            .col(GitBlame::RepoId)
                            .col(GitBlame::Path)
                            .col(GitBlame::LineNo),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_git_blame_repo_id")
                            .from(GitBlame::Table, GitBlame::RepoId)
                            .to(Repos::Table, Repos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GitBlame::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GitBlame {
    Table,
    RepoId,
    AuthorEmail,
    AuthorName,
    AuthorWhen,
    CommitHash,
    LineNo,
    Line,
    Path,
}

#[derive(DeriveIden)]
enum Repos {
    Table,
    Id,
}
