//! ServiceCredential entity model
//!
//! Opaque AES-256-GCM ciphertext rows. The resolver always selects the
//! newest row of a type; rotation is an insert, never an update.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "service_auth_credentials")]
pub struct Model {
    /// Credential row id (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Credential type tag, e.g. GITHUB_PAT
    #[sea_orm(column_name = "type")]
    pub credential_type: String,

    /// Versioned ciphertext (version byte, nonce, ciphertext+tag)
    pub credentials: Vec<u8>,

    /// Timestamp when the credential was stored
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
