//! SyncLog entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "repo_sync_logs")]
pub struct Model {
    /// Log line id (primary key)
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Queue row this line belongs to
    pub repo_sync_queue_id: i64,

    /// INFO, WARN, or ERROR
    pub log_type: String,

    /// Log message
    pub message: String,

    /// Timestamp when the line was written
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::queue_entry::Entity",
        from = "Column::RepoSyncQueueId",
        to = "super::queue_entry::Column::Id"
    )]
    QueueEntry,
}

impl Related<super::queue_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QueueEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
