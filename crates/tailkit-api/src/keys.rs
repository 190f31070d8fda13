// Tailnet key endpoints
//
// Key material comes back exactly once, from `create_key`. Every later read
// returns metadata only.

use tracing::debug;

use crate::client::TailnetClient;
use crate::error::Error;
use crate::types::{CreateKeyRequest, CreatedKey, KeyList, KeyMetadata};

impl TailnetClient {
    /// Create a new auth key.
    ///
    /// Not idempotent: a retry after a lost response creates a second key.
    ///
    /// `POST /tailnet/{tailnet}/keys`
    pub async fn create_key(&self, request: &CreateKeyRequest) -> Result<CreatedKey, Error> {
        let url = self.tailnet_url(&["keys"])?;
        debug!(
            reusable = request.capabilities.devices.create.reusable,
            ephemeral = request.capabilities.devices.create.ephemeral,
            "creating key"
        );
        self.post(url, request).await
    }

    /// `GET /tailnet/{tailnet}/keys/{id}`
    pub async fn get_key(&self, id: &str) -> Result<KeyMetadata, Error> {
        let url = self.tailnet_url(&["keys", id])?;
        debug!(id, "fetching key");
        self.get(url).await
    }

    /// `GET /tailnet/{tailnet}/keys`
    pub async fn list_keys(&self) -> Result<Vec<KeyMetadata>, Error> {
        let url = self.tailnet_url(&["keys"])?;
        debug!("listing keys");
        let list: KeyList = self.get(url).await?;
        Ok(list.keys)
    }

    /// Revoke a key.
    ///
    /// `DELETE /tailnet/{tailnet}/keys/{id}`
    pub async fn delete_key(&self, id: &str) -> Result<(), Error> {
        let url = self.tailnet_url(&["keys", id])?;
        debug!(id, "deleting key");
        self.delete(url).await
    }
}
