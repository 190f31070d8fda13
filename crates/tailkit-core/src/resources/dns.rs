// ── DNS settings ──
//
// Nameservers, search paths and preferences are three resources over one
// remote configuration object. Every write fetches the whole object,
// replaces one field and posts the whole object back, so the other two
// fields and any keys we do not model survive.
//
// The read-merge-write is not atomic. Two writers racing on the same
// tailnet can lose an update; callers must not run DNS writes for one
// tailnet concurrently.

use async_trait::async_trait;
use tailkit_api::TailnetClient;
use tailkit_api::types::{DnsConfiguration, DnsPreferences};
use tracing::debug;

use crate::error::CoreError;
use crate::resources::singleton::SingletonResource;

/// The combined configuration, or all defaults if the API has none.
async fn fetch(client: &TailnetClient) -> Result<DnsConfiguration, CoreError> {
    match client.get_dns_configuration().await {
        Ok(config) => Ok(config),
        Err(e) if e.is_not_found() => {
            debug!("no DNS configuration yet, starting from defaults");
            Ok(DnsConfiguration::default())
        }
        Err(e) => Err(e.into()),
    }
}

async fn merge_and_write(
    client: &TailnetClient,
    apply: impl FnOnce(&mut DnsConfiguration) + Send,
) -> Result<DnsConfiguration, CoreError> {
    let mut config = fetch(client).await?;
    apply(&mut config);
    Ok(client.set_dns_configuration(&config).await?)
}

fn read_error(err: tailkit_api::Error, client: &TailnetClient) -> CoreError {
    CoreError::from_api(err, "DNS configuration", client.tailnet())
}

// ── Nameservers ──────────────────────────────────────────────────────

/// Global nameservers. Default: none.
pub struct NameserversResource {
    client: TailnetClient,
}

impl NameserversResource {
    pub fn new(client: TailnetClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SingletonResource for NameserversResource {
    type Value = Vec<String>;

    fn kind(&self) -> &'static str {
        "dns_nameservers"
    }

    fn default_value(&self) -> Vec<String> {
        Vec::new()
    }

    async fn read(&self) -> Result<Vec<String>, CoreError> {
        self.client
            .get_dns_configuration()
            .await
            .map(|c| c.nameservers)
            .map_err(|e| read_error(e, &self.client))
    }

    async fn write(&self, value: &Vec<String>) -> Result<Vec<String>, CoreError> {
        let nameservers = value.clone();
        let stored = merge_and_write(&self.client, move |c| c.nameservers = nameservers).await?;
        Ok(stored.nameservers)
    }
}

// ── Search paths ─────────────────────────────────────────────────────

/// Search domains. Default: none.
pub struct SearchPathsResource {
    client: TailnetClient,
}

impl SearchPathsResource {
    pub fn new(client: TailnetClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SingletonResource for SearchPathsResource {
    type Value = Vec<String>;

    fn kind(&self) -> &'static str {
        "dns_search_paths"
    }

    fn default_value(&self) -> Vec<String> {
        Vec::new()
    }

    async fn read(&self) -> Result<Vec<String>, CoreError> {
        self.client
            .get_dns_configuration()
            .await
            .map(|c| c.search_paths)
            .map_err(|e| read_error(e, &self.client))
    }

    async fn write(&self, value: &Vec<String>) -> Result<Vec<String>, CoreError> {
        let search_paths = value.clone();
        let stored = merge_and_write(&self.client, move |c| c.search_paths = search_paths).await?;
        Ok(stored.search_paths)
    }
}

// ── Preferences ──────────────────────────────────────────────────────

/// DNS preferences. Default: MagicDNS off.
pub struct PreferencesResource {
    client: TailnetClient,
}

impl PreferencesResource {
    pub fn new(client: TailnetClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SingletonResource for PreferencesResource {
    type Value = DnsPreferences;

    fn kind(&self) -> &'static str {
        "dns_preferences"
    }

    fn default_value(&self) -> DnsPreferences {
        DnsPreferences::default()
    }

    async fn read(&self) -> Result<DnsPreferences, CoreError> {
        self.client
            .get_dns_configuration()
            .await
            .map(|c| c.preferences)
            .map_err(|e| read_error(e, &self.client))
    }

    async fn write(&self, value: &DnsPreferences) -> Result<DnsPreferences, CoreError> {
        let preferences = *value;
        let stored = merge_and_write(&self.client, move |c| c.preferences = preferences).await?;
        Ok(stored.preferences)
    }
}
