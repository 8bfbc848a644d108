//! RepoSync entity model
//!
//! Binds one repo to one sync type. The scheduler turns enabled bindings
//! into queue rows; priority orders admission (lower runs sooner).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "repo_syncs")]
pub struct Model {
    /// Unique identifier for the binding (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Repo this binding syncs
    pub repo_id: Uuid,

    /// Sync type tag (e.g. GIT_BLAME)
    pub sync_type: String,

    /// Scheduling priority; lower runs sooner
    pub priority: i32,

    /// Whether the scheduler enqueues this binding
    pub schedule_enabled: bool,

    /// Free-form per-binding settings
    #[sea_orm(column_type = "JsonBinary")]
    pub settings: JsonValue,

    /// Timestamp when the binding was created
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repo::Entity",
        from = "Column::RepoId",
        to = "super::repo::Column::Id"
    )]
    Repo,
    #[sea_orm(has_many = "super::queue_entry::Entity")]
    QueueEntries,
}

impl Related<super::repo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repo.def()
    }
}

impl Related<super::queue_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QueueEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
