//! GitBlame entity model
//!
//! Result rows for the blame worker. Loaded through the bulk COPY path in
//! normal operation; the entity exists for consumers and tests.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "git_blame")]
pub struct Model {
    /// Repo the line belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub repo_id: Uuid,

    /// Path of the blamed file relative to the repo root
    #[sea_orm(primary_key, auto_increment = false)]
    pub path: String,

    /// 1-based line number
    #[sea_orm(primary_key, auto_increment = false)]
    pub line_no: i32,

    /// Line content; None when the source bytes were not valid UTF-8
    pub line: Option<String>,

    /// Hash of the commit that last touched the line
    pub commit_hash: Option<String>,

    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub author_when: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
