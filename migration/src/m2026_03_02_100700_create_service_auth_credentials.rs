//! Migration to create the service_auth_credentials table.
//!
//! Rows are opaque AES-256-GCM ciphertext; the resolver always picks the
//! most recently created row of a given type.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceAuthCredentials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceAuthCredentials::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServiceAuthCredentials::Type).text().not_null())
                    .col(
                        ColumnDef::new(ServiceAuthCredentials::Credentials)
                            .binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceAuthCredentials::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_auth_credentials_type_created")
                    .table(ServiceAuthCredentials::Table)
                    .col(ServiceAuthCredentials::Type)
                    .col(ServiceAuthCredentials::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_service_auth_credentials_type_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ServiceAuthCredentials::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ServiceAuthCredentials {
    Table,
    Id,
    Type,
    Credentials,
    CreatedAt,
}
