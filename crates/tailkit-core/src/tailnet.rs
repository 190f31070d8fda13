// ── Tailnet handle ──
//
// Entry point that hands out resource clients sharing one connection.

use secrecy::SecretString;
use tailkit_api::types::AclFormat;
use tailkit_api::{TailnetClient, TransportConfig};

use crate::error::CoreError;
use crate::reconcile::Reconciler;
use crate::resources::{
    AclResource, AuthorizationResource, DevicesResource, KeysResource, NameserversResource,
    PreferencesResource, SearchPathsResource, SubnetRoutesResource,
};

/// Connection to one tailnet with a fixed credential.
#[derive(Debug, Clone)]
pub struct Tailnet {
    client: TailnetClient,
}

impl Tailnet {
    pub fn connect(
        base_url: &str,
        tailnet: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            client: TailnetClient::new(base_url, tailnet, api_key, transport)?,
        })
    }

    pub fn from_client(client: TailnetClient) -> Self {
        Self { client }
    }

    pub fn name(&self) -> &str {
        self.client.tailnet()
    }

    pub fn client(&self) -> &TailnetClient {
        &self.client
    }

    pub fn acl(&self, format: AclFormat) -> AclResource {
        AclResource::new(self.client.clone(), format)
    }

    pub fn nameservers(&self) -> NameserversResource {
        NameserversResource::new(self.client.clone())
    }

    pub fn search_paths(&self) -> SearchPathsResource {
        SearchPathsResource::new(self.client.clone())
    }

    pub fn preferences(&self) -> PreferencesResource {
        PreferencesResource::new(self.client.clone())
    }

    pub fn keys(&self) -> KeysResource {
        KeysResource::new(self.client.clone())
    }

    pub fn devices(&self) -> DevicesResource {
        DevicesResource::new(self.client.clone())
    }

    pub fn routes(&self) -> SubnetRoutesResource {
        SubnetRoutesResource::new(self.client.clone())
    }

    pub fn authorization(&self) -> AuthorizationResource {
        AuthorizationResource::new(self.client.clone())
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.client.clone())
    }
}
