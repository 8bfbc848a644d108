//! # Credential Resolver
//!
//! Returns the current provider access token: the most recently created
//! service_auth_credentials row of the requested type, decrypted with the
//! runtime key. No caching across jobs, so a rotated token takes effect on
//! the next job.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::crypto::{CryptoKey, decrypt_credential};
use crate::error::{Result, SyncError};
use crate::models::{CREDENTIAL_TYPE_GITHUB_PAT, service_credential};

/// Resolves service credentials from the encrypted store.
#[derive(Clone)]
pub struct CredentialResolver {
    db: DatabaseConnection,
    key: CryptoKey,
}

impl CredentialResolver {
    /// Create a resolver over the given connection and decryption key.
    pub fn new(db: DatabaseConnection, key: CryptoKey) -> Self {
        Self { db, key }
    }

    /// Fetch and decrypt the newest GitHub PAT.
    pub async fn github_token(&self) -> Result<String> {
        self.latest(CREDENTIAL_TYPE_GITHUB_PAT).await
    }

    async fn latest(&self, credential_type: &str) -> Result<String> {
        let row = service_credential::Entity::find()
            .filter(service_credential::Column::CredentialType.eq(credential_type))
            .order_by_desc(service_credential::Column::CreatedAt)
            .one(&self.db)
            .await?
            .ok_or_else(|| SyncError::MissingCredential {
                credential_type: credential_type.to_string(),
            })?;

        let token = decrypt_credential(&self.key, credential_type, &row.credentials)?;
        Ok(token)
    }
}
