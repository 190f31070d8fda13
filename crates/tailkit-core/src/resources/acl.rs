// ── Policy file ──
//
// The tailnet's single policy file. Deleting it writes the allow-all policy
// back. In HuJSON mode the text is exchanged verbatim, comments included.

use async_trait::async_trait;
use tailkit_api::types::{Acl, AclFormat, AclPolicy};
use tailkit_api::{TailnetClient, Versioned};
use tracing::info;

use crate::error::CoreError;
use crate::resources::singleton::SingletonResource;

/// HuJSON rendering of [`Acl::allow_all`].
pub const DEFAULT_HUJSON_POLICY: &str = r#"// Default policy: every device may reach every other device.
{
  "acls": [
    { "action": "accept", "src": ["*"], "dst": ["*:*"] },
  ],
}
"#;

pub struct AclResource {
    client: TailnetClient,
    format: AclFormat,
}

impl AclResource {
    pub fn new(client: TailnetClient, format: AclFormat) -> Self {
        Self { client, format }
    }

    pub fn format(&self) -> AclFormat {
        self.format
    }

    /// Read the policy together with its `ETag`, for a conditional write.
    pub async fn read_versioned(&self) -> Result<Versioned<AclPolicy>, CoreError> {
        self.client
            .get_acl_policy(self.format)
            .await
            .map_err(|e| CoreError::from_api(e, "policy file", self.client.tailnet()))
    }

    /// Write only if nobody changed the policy since `etag` was read.
    ///
    /// A mismatch comes back from the API as a validation failure with
    /// status 412.
    pub async fn write_if_match(
        &self,
        policy: &AclPolicy,
        etag: &str,
    ) -> Result<Versioned<AclPolicy>, CoreError> {
        info!(etag, "writing policy file conditionally");
        Ok(self.client.set_acl_policy(policy, Some(etag)).await?)
    }
}

#[async_trait]
impl SingletonResource for AclResource {
    type Value = AclPolicy;

    fn kind(&self) -> &'static str {
        "acl"
    }

    fn default_value(&self) -> AclPolicy {
        match self.format {
            AclFormat::Json => AclPolicy::Structured(Acl::allow_all()),
            AclFormat::HuJson => AclPolicy::HuJson(DEFAULT_HUJSON_POLICY.to_owned()),
        }
    }

    async fn read(&self) -> Result<AclPolicy, CoreError> {
        Ok(self.read_versioned().await?.value)
    }

    async fn write(&self, value: &AclPolicy) -> Result<AclPolicy, CoreError> {
        Ok(self.client.set_acl_policy(value, None).await?.value)
    }
}
