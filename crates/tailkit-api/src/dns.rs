// DNS endpoints
//
// Nameservers, search paths and preferences share one remote object.

use tracing::debug;

use crate::client::TailnetClient;
use crate::error::Error;
use crate::types::DnsConfiguration;

impl TailnetClient {
    /// `GET /tailnet/{tailnet}/dns/configuration`
    pub async fn get_dns_configuration(&self) -> Result<DnsConfiguration, Error> {
        let url = self.tailnet_url(&["dns", "configuration"])?;
        debug!("fetching DNS configuration");
        self.get(url).await
    }

    /// Replace the whole DNS configuration and return what was stored.
    ///
    /// `POST /tailnet/{tailnet}/dns/configuration`
    pub async fn set_dns_configuration(
        &self,
        config: &DnsConfiguration,
    ) -> Result<DnsConfiguration, Error> {
        let url = self.tailnet_url(&["dns", "configuration"])?;
        debug!(
            nameservers = config.nameservers.len(),
            search_paths = config.search_paths.len(),
            magic_dns = config.preferences.magic_dns,
            "replacing DNS configuration"
        );
        self.post(url, config).await
    }
}
