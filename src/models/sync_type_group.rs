//! SyncTypeGroup entity model
//!
//! A named bucket of sync types sharing one RUNNING-concurrency ceiling
//! across every worker process.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "repo_sync_type_groups")]
pub struct Model {
    /// Group name (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub group: String,

    /// Max number of RUNNING jobs of this group at any time
    pub concurrent_syncs: i32,

    /// Timestamp when the group was created
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sync_type::Entity")]
    SyncTypes,
}

impl Related<super::sync_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SyncTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
