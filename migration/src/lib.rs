//! Database migrations for the repository sync service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_03_02_100000_create_repos;
mod m2026_03_02_100100_create_repo_sync_type_groups;
mod m2026_03_02_100200_create_repo_sync_types;
mod m2026_03_02_100300_create_repo_syncs;
mod m2026_03_02_100400_create_repo_sync_queue;
mod m2026_03_02_100500_create_repo_sync_logs;
mod m2026_03_02_100600_create_git_blame;
mod m2026_03_02_100700_create_service_auth_credentials;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_03_02_100000_create_repos::Migration),
            Box::new(m2026_03_02_100100_create_repo_sync_type_groups::Migration),
            Box::new(m2026_03_02_100200_create_repo_sync_types::Migration),
            Box::new(m2026_03_02_100300_create_repo_syncs::Migration),
            Box::new(m2026_03_02_100400_create_repo_sync_queue::Migration),
            Box::new(m2026_03_02_100500_create_repo_sync_logs::Migration),
            Box::new(m2026_03_02_100600_create_git_blame::Migration),
            Box::new(m2026_03_02_100700_create_service_auth_credentials::Migration),
        ]
    }
}
