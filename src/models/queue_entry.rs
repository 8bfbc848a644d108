//! QueueEntry entity model
//!
//! One append-only execution attempt of a repo sync. The dequeue statement
//! flips QUEUED -> RUNNING under a row lock; the worker heartbeats
//! last_keep_alive; DONE is written either by the worker's result
//! transaction or by the reaper.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "repo_sync_queue")]
pub struct Model {
    /// Monotonically increasing queue row id (primary key)
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Repo sync binding this attempt executes
    pub repo_sync_id: Uuid,

    /// QUEUED, RUNNING, or DONE
    pub status: String,

    /// Admission priority copied from the binding; lower runs sooner
    pub priority: i32,

    /// Type group for concurrency accounting, denormalized at enqueue time
    pub type_group: String,

    /// Timestamp when the row was enqueued
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when a dispatcher claimed the row
    pub started_at: Option<DateTimeWithTimeZone>,

    /// Timestamp when the row reached DONE
    pub done_at: Option<DateTimeWithTimeZone>,

    /// Last worker heartbeat; the reaper times out rows with a stale one
    pub last_keep_alive: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repo_sync::Entity",
        from = "Column::RepoSyncId",
        to = "super::repo_sync::Column::Id"
    )]
    RepoSync,
    #[sea_orm(has_many = "super::sync_log::Entity")]
    Logs,
}

impl Related<super::repo_sync::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RepoSync.def()
    }
}

impl Related<super::sync_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Logs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
