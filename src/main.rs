//! # Sync Service Main Entry Point
//!
//! Runs migrations on demand and otherwise starts the scheduler, reaper,
//! and dispatcher under one shutdown token, cancelled on ctrl-c.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use reposyncd::{
    config::ConfigLoader, crypto::CryptoKey, db, reaper::Reaper,
    repositories::CredentialResolver, scheduler::SyncScheduler, telemetry,
    worker::SyncDispatcher,
};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "reposyncd")]
#[command(about = "Repository data synchronization service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = ConfigLoader::new().load()?;
    telemetry::init_tracing(&config);

    let db = db::init_pool(&config).await?;

    if let Some(command) = cli.command {
        match command {
            Commands::Migrate { action } => {
                handle_migrate_command(&db, action).await?;
                return Ok(());
            }
        }
    }

    // Run migrations automatically for local and test profiles
    if config.profile == "local" || config.profile == "test" {
        info!(profile = %config.profile, "Running migrations automatically");
        Migrator::up(&db, None).await?;
        info!("Migrations completed successfully");
    }

    if let Ok(redacted_json) = config.redacted_json() {
        info!(profile = %config.profile, configuration = %redacted_json, "Loaded configuration");
    }

    let key = CryptoKey::from_hex(&config.encryption_key_hex)
        .map_err(|err| format!("REPOSYNCD_ENCRYPTION_KEY: {}", err))?;

    let config = Arc::new(config);
    let shutdown = CancellationToken::new();

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    let scheduler = SyncScheduler::new(Arc::clone(&config), db.clone());
    let reaper = Reaper::new(Arc::clone(&config), db.clone());
    let credentials = CredentialResolver::new(db.clone(), key);
    let dispatcher = SyncDispatcher::new(Arc::clone(&config), db.clone(), credentials);

    let (scheduler_res, reaper_res, dispatcher_res) = tokio::join!(
        scheduler.run(shutdown.clone()),
        reaper.run(shutdown.clone()),
        dispatcher.run(shutdown.clone()),
    );
    scheduler_res?;
    reaper_res?;
    dispatcher_res?;

    info!("Service stopped");
    Ok(())
}

async fn handle_migrate_command(
    db: &DatabaseConnection,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        MigrateAction::Up => {
            println!("Applying migrations...");
            Migrator::up(db, None).await?;
            println!("All migrations applied successfully");
        }
        MigrateAction::Down => {
            println!("Rolling back last migration...");
            Migrator::down(db, Some(1)).await?;
            println!("Migration rolled back successfully");
        }
        MigrateAction::Status => {
            println!("Checking migration status...");
            let applied = Migrator::get_applied_migrations(db).await?;
            let pending = Migrator::get_pending_migrations(db).await?;

            if applied.is_empty() {
                println!("No migrations have been applied");
            } else {
                println!("Applied migrations: {} migration(s)", applied.len());
            }

            if pending.is_empty() {
                println!("No pending migrations");
            } else {
                println!("Pending migrations: {} migration(s)", pending.len());
            }
        }
    }
    Ok(())
}
