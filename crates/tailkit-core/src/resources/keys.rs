// ── Tailnet keys ──
//
// Keys are real remote objects with ids. The secret comes back once, on
// `create`; afterwards only `KeyMetadata` can be read. Creation is not
// idempotent: retrying a create whose response was lost mints a second key.

use chrono::Utc;
use tailkit_api::TailnetClient;
use tailkit_api::types::{
    CreateKeyRequest, CreatedKey, DeviceCreateCapabilities, DeviceKeyCapabilities,
    KeyCapabilities, KeyExpiry, KeyMetadata,
};
use tracing::{debug, info};

use crate::error::CoreError;

/// What to ask for when creating a key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeySpec {
    pub reusable: bool,
    pub ephemeral: bool,
    pub preauthorized: bool,
    pub tags: Vec<String>,
    /// `None` leaves the lifetime to the API's default.
    pub expiry: Option<KeyExpiry>,
    pub description: Option<String>,
}

impl From<&KeySpec> for CreateKeyRequest {
    fn from(spec: &KeySpec) -> Self {
        Self {
            capabilities: KeyCapabilities {
                devices: DeviceKeyCapabilities {
                    create: DeviceCreateCapabilities {
                        reusable: spec.reusable,
                        ephemeral: spec.ephemeral,
                        preauthorized: spec.preauthorized,
                        tags: spec.tags.clone(),
                    },
                },
            },
            expiry: spec.expiry,
            description: spec.description.clone(),
        }
    }
}

pub struct KeysResource {
    client: TailnetClient,
}

impl KeysResource {
    pub fn new(client: TailnetClient) -> Self {
        Self { client }
    }

    /// Mint a key. The returned [`CreatedKey`] is the only place the secret
    /// ever appears.
    pub async fn create(&self, spec: &KeySpec) -> Result<CreatedKey, CoreError> {
        for tag in &spec.tags {
            if !tag.starts_with("tag:") {
                return Err(CoreError::invalid_field(
                    "tags",
                    format!("{tag:?} must start with \"tag:\""),
                ));
            }
        }
        let created = self.client.create_key(&CreateKeyRequest::from(spec)).await?;
        info!(id = %created.metadata.id, "created key");
        Ok(created)
    }

    /// Metadata for an existing key. Never includes the secret.
    pub async fn get(&self, id: &str) -> Result<KeyMetadata, CoreError> {
        self.client
            .get_key(id)
            .await
            .map_err(|e| CoreError::from_api(e, "key", id))
    }

    pub async fn list(&self) -> Result<Vec<KeyMetadata>, CoreError> {
        Ok(self.client.list_keys().await?)
    }

    /// Revoke a key. A key that is already gone counts as deleted.
    pub async fn delete(&self, id: &str) -> Result<(), CoreError> {
        match self.client.delete_key(id).await {
            Ok(()) => {
                info!(id, "deleted key");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(id, "key already deleted");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the key still exists and can still be used.
    pub async fn is_usable(&self, id: &str) -> Result<bool, CoreError> {
        match self.get(id).await {
            Ok(meta) => Ok(meta.is_valid_at(Utc::now())),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
