// Policy file endpoints
//
// The policy file is tailnet-scoped and always exists; a new tailnet starts
// with the allow-all policy. Reads and writes are plain GET/POST on
// `/tailnet/{tailnet}/acl`, the `Accept`/`Content-Type` header picks between
// structured JSON and raw HuJSON.

use reqwest::Method;
use tracing::debug;

use crate::client::{ApiRequest, TailnetClient, Versioned};
use crate::codec;
use crate::error::Error;
use crate::types::{AclFormat, AclPolicy};

impl TailnetClient {
    /// Fetch the policy file in `format`, together with its `ETag`.
    ///
    /// `GET /tailnet/{tailnet}/acl`
    pub async fn get_acl_policy(&self, format: AclFormat) -> Result<Versioned<AclPolicy>, Error> {
        let url = self.tailnet_url(&["acl"])?;
        debug!(?format, "fetching policy file");
        let resp = self
            .execute(ApiRequest::new(Method::GET, url).with_accept(format))
            .await?;
        Ok(Versioned {
            value: codec::decode_policy(format, &resp.body)?,
            etag: resp.etag,
        })
    }

    /// Replace the policy file.
    ///
    /// With `if_match` set the API rejects the write unless the current
    /// policy still carries that `ETag`. Returns the policy as stored,
    /// in the same format it was sent.
    ///
    /// `POST /tailnet/{tailnet}/acl`
    pub async fn set_acl_policy(
        &self,
        policy: &AclPolicy,
        if_match: Option<&str>,
    ) -> Result<Versioned<AclPolicy>, Error> {
        let url = self.tailnet_url(&["acl"])?;
        let format = policy.format();
        debug!(?format, conditional = if_match.is_some(), "replacing policy file");
        let request = ApiRequest::new(Method::POST, url)
            .with_accept(format)
            .with_body(codec::encode_policy(policy)?)
            .with_if_match(if_match);
        let resp = self.execute(request).await?;

        // Some deployments answer 200 with an empty body.
        let value = if resp.body.trim().is_empty() {
            policy.clone()
        } else {
            codec::decode_policy(format, &resp.body)?
        };
        Ok(Versioned {
            value,
            etag: resp.etag,
        })
    }
}
