// Device endpoints
//
// Listing is tailnet-scoped; everything addressed by device id lives under
// `/device/{id}` with no tailnet in the path.

use tracing::debug;

use crate::client::TailnetClient;
use crate::error::Error;
use crate::types::{Device, DeviceList, DeviceRoutes, SetAuthorizedRequest, SetRoutesRequest};

impl TailnetClient {
    /// List every device with all fields populated.
    ///
    /// `GET /tailnet/{tailnet}/devices?fields=all`
    pub async fn list_devices(&self) -> Result<Vec<Device>, Error> {
        let mut url = self.tailnet_url(&["devices"])?;
        url.query_pairs_mut().append_pair("fields", "all");
        debug!("listing devices");
        let list: DeviceList = self.get(url).await?;
        Ok(list.devices)
    }

    /// `GET /device/{id}?fields=all`
    pub async fn get_device(&self, id: &str) -> Result<Device, Error> {
        let mut url = self.url(&["device", id])?;
        url.query_pairs_mut().append_pair("fields", "all");
        debug!(id, "fetching device");
        self.get(url).await
    }

    /// `GET /device/{id}/routes`
    pub async fn get_device_routes(&self, id: &str) -> Result<DeviceRoutes, Error> {
        let url = self.url(&["device", id, "routes"])?;
        debug!(id, "fetching device routes");
        self.get(url).await
    }

    /// Replace the set of enabled routes; returns the device's routes afterwards.
    ///
    /// `POST /device/{id}/routes`
    pub async fn set_device_routes(
        &self,
        id: &str,
        routes: &[String],
    ) -> Result<DeviceRoutes, Error> {
        let url = self.url(&["device", id, "routes"])?;
        debug!(id, count = routes.len(), "setting device routes");
        let body = SetRoutesRequest {
            routes: routes.to_vec(),
        };
        self.post(url, &body).await
    }

    /// `POST /device/{id}/authorized`
    pub async fn set_device_authorized(&self, id: &str, authorized: bool) -> Result<(), Error> {
        let url = self.url(&["device", id, "authorized"])?;
        debug!(id, authorized, "setting device authorization");
        self.post_no_response(url, &SetAuthorizedRequest { authorized })
            .await
    }
}
