// ── Device subnet routes ──
//
// A device advertises prefixes on its own; the tailnet decides which of
// them are enabled. Only the enabled set is writable, and it must stay a
// subset of what the device advertises. That is checked locally so a bad
// request never reaches the API.

use std::collections::BTreeSet;

use ipnet::IpNet;
use tailkit_api::TailnetClient;
use tailkit_api::types::DeviceRoutes;
use tracing::{debug, info};

use crate::error::CoreError;

pub struct SubnetRoutesResource {
    client: TailnetClient,
}

impl SubnetRoutesResource {
    pub fn new(client: TailnetClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, device_id: &str) -> Result<DeviceRoutes, CoreError> {
        self.client
            .get_device_routes(device_id)
            .await
            .map_err(|e| CoreError::from_api(e, "device", device_id))
    }

    /// Same as [`SubnetRoutesResource::update`].
    pub async fn create(
        &self,
        device_id: &str,
        routes: &[String],
    ) -> Result<DeviceRoutes, CoreError> {
        self.update(device_id, routes).await
    }

    /// Replace the enabled set.
    ///
    /// Fails with [`CoreError::ValidationFailed`] and sends nothing if any
    /// route is malformed or not advertised by the device.
    pub async fn update(
        &self,
        device_id: &str,
        routes: &[String],
    ) -> Result<DeviceRoutes, CoreError> {
        let current = self.get(device_id).await?;
        let routes = validate_routes(routes, &current.advertised_routes)?;

        if canonical_routes(&routes) == canonical_routes(&current.enabled_routes) {
            debug!(device_id, "enabled routes unchanged");
            return Ok(current);
        }
        info!(device_id, count = routes.len(), "setting enabled routes");
        self.client
            .set_device_routes(device_id, &routes)
            .await
            .map_err(|e| CoreError::from_api(e, "device", device_id))
    }

    /// Disable every route. A device that no longer exists has none.
    pub async fn delete(&self, device_id: &str) -> Result<(), CoreError> {
        match self.client.set_device_routes(device_id, &[]).await {
            Ok(_) => {
                info!(device_id, "disabled all routes");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(device_id, "device gone, nothing to disable");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Check every route against the advertised set and drop duplicates,
/// keeping first-seen order.
///
/// Prefixes are compared parsed, so `fd7a:115c:a1e0:0::/48` matches an
/// advertised `fd7a:115c:a1e0::/48`. The returned routes use the device's
/// advertised spelling.
pub fn validate_routes(routes: &[String], advertised: &[String]) -> Result<Vec<String>, CoreError> {
    let advertised: Vec<(IpNet, &String)> = advertised
        .iter()
        .filter_map(|a| a.parse::<IpNet>().ok().map(|net| (net, a)))
        .collect();

    let mut seen = BTreeSet::new();
    let mut out: Vec<String> = Vec::with_capacity(routes.len());
    for route in routes {
        let Ok(net) = route.trim().parse::<IpNet>() else {
            return Err(CoreError::invalid_field(
                "routes",
                format!("{route} is not a valid IP prefix"),
            ));
        };
        let Some((_, spelling)) = advertised.iter().find(|(a, _)| *a == net) else {
            return Err(CoreError::invalid_field(
                "routes",
                format!("{route} is not advertised by the device"),
            ));
        };
        if seen.insert(net) {
            out.push((*spelling).clone());
        }
    }
    Ok(out)
}

/// Sorted, de-duplicated routes in canonical form.
///
/// Entries that do not parse are kept verbatim so they still show up in a
/// comparison.
pub fn canonical_routes(routes: &[String]) -> Vec<String> {
    routes
        .iter()
        .map(|r| {
            r.trim()
                .parse::<IpNet>()
                .map_or_else(|_| r.clone(), |net| net.to_string())
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
