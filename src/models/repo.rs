//! Repo entity model
//!
//! A repo is a clone URL plus an optional branch ref. Rows are written by
//! importers; the sync workers treat them as read-only.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "repos")]
pub struct Model {
    /// Unique identifier for the repo (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Clone URL of the repository
    pub repo: String,

    /// Optional branch ref; None means the remote default branch
    #[sea_orm(column_name = "ref")]
    pub git_ref: Option<String>,

    /// Free-form per-repo settings
    #[sea_orm(column_type = "JsonBinary")]
    pub settings: JsonValue,

    /// Free-form tags attached by importers
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: JsonValue,

    /// Timestamp when the repo row was created
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::repo_sync::Entity")]
    RepoSyncs,
}

impl Related<super::repo_sync::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RepoSyncs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
