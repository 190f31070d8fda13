// ── Device authorization ──
//
// A flag on the device. It is never created or destroyed, only toggled.

use tailkit_api::TailnetClient;
use tracing::info;

use crate::error::CoreError;

pub struct AuthorizationResource {
    client: TailnetClient,
}

impl AuthorizationResource {
    pub fn new(client: TailnetClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, device_id: &str) -> Result<bool, CoreError> {
        self.client
            .get_device(device_id)
            .await
            .map(|d| d.authorized)
            .map_err(|e| CoreError::from_api(e, "device", device_id))
    }

    pub async fn set_authorized(&self, device_id: &str, authorized: bool) -> Result<(), CoreError> {
        self.client
            .set_device_authorized(device_id, authorized)
            .await
            .map_err(|e| CoreError::from_api(e, "device", device_id))?;
        info!(device_id, authorized, "updated device authorization");
        Ok(())
    }
}
