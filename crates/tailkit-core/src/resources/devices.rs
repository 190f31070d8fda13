// ── Devices ──
//
// Read-only lookups. Only routes and authorization are writable, through
// their own resources.

use tailkit_api::TailnetClient;
use tailkit_api::types::Device;
use tracing::debug;

use crate::error::CoreError;

pub struct DevicesResource {
    client: TailnetClient,
}

impl DevicesResource {
    pub fn new(client: TailnetClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: &str) -> Result<Device, CoreError> {
        self.client
            .get_device(id)
            .await
            .map_err(|e| CoreError::from_api(e, "device", id))
    }

    pub async fn list(&self) -> Result<Vec<Device>, CoreError> {
        Ok(self.client.list_devices().await?)
    }

    /// The device whose full name matches exactly.
    pub async fn find_by_name(&self, name: &str) -> Result<Device, CoreError> {
        self.list()
            .await?
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "device".into(),
                identifier: name.to_owned(),
            })
    }

    /// Devices whose name starts with `prefix`; an empty prefix matches all.
    pub async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<Device>, CoreError> {
        let devices: Vec<Device> = self
            .list()
            .await?
            .into_iter()
            .filter(|d| d.name.starts_with(prefix))
            .collect();
        debug!(prefix, matched = devices.len(), "filtered devices");
        Ok(devices)
    }

    /// Resolve an id or a full device name.
    pub async fn resolve(&self, id_or_name: &str) -> Result<Device, CoreError> {
        match self.get(id_or_name).await {
            Err(e) if e.is_not_found() => self.find_by_name(id_or_name).await,
            other => other,
        }
    }
}
