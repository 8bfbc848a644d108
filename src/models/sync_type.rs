//! SyncType entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "repo_sync_types")]
pub struct Model {
    /// Sync type tag (primary key), e.g. GIT_BLAME
    #[sea_orm(primary_key, auto_increment = false, column_name = "type")]
    pub type_name: String,

    /// Type group this sync type is accounted under
    pub type_group: String,

    /// Human-readable description
    pub description: Option<String>,

    /// Default priority for new bindings of this type
    pub priority: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sync_type_group::Entity",
        from = "Column::TypeGroup",
        to = "super::sync_type_group::Column::Group"
    )]
    Group,
}

impl Related<super::sync_type_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
