// HTTP client for the tailnet administration API.
//
// Base path: /api/v2/
// Auth: `Authorization: Bearer <api key>`
//
// Endpoint groups (ACL, DNS, keys, devices) are inherent methods in their
// own modules; this one only deals with URLs, requests and status mapping.

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::codec::{self, RequestBody};
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{AclFormat, ApiErrorBody};

/// Version prefix appended to the configured base URL.
pub const API_VERSION_PREFIX: &str = "/api/v2";

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.tailscale.com";

// ── Request / response ───────────────────────────────────────────────

/// A single call against the API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<RequestBody>,
    pub accept: AclFormat,
    pub if_match: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: None,
            accept: AclFormat::Json,
            if_match: None,
        }
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_accept(mut self, accept: AclFormat) -> Self {
        self.accept = accept;
        self
    }

    pub fn with_if_match(mut self, etag: Option<&str>) -> Self {
        self.if_match = etag.map(str::to_owned);
        self
    }
}

/// A successful response, body already read.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub etag: Option<String>,
    pub body: String,
}

/// A value read together with the `ETag` the API attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub etag: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for one tailnet.
///
/// The credential and tailnet are fixed at construction; there is no way to
/// change either afterwards. Every call is a single request/response, nothing
/// is retried.
#[derive(Debug, Clone)]
pub struct TailnetClient {
    http: reqwest::Client,
    base_url: Url,
    tailnet: String,
}

impl TailnetClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API key and transport config.
    ///
    /// Injects `Authorization: Bearer <key>` as a sensitive default header.
    pub fn new(
        base_url: &str,
        tailnet: impl Into<String>,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth_value =
            HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret())).map_err(
                |e| Error::InvalidApiKey {
                    message: format!("invalid API key header value: {e}"),
                },
            )?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);

        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, tailnet, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(
        base_url: &str,
        tailnet: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            tailnet: tailnet.into(),
        })
    }

    /// Append the version prefix unless the caller already did.
    ///
    /// `https://api.tailscale.com` → `https://api.tailscale.com/api/v2/`
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        let path = url.path().trim_end_matches('/').to_owned();
        if path.ends_with(API_VERSION_PREFIX) {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}{API_VERSION_PREFIX}/"));
        }

        Ok(url)
    }

    /// The tailnet every call is scoped to.
    pub fn tailnet(&self) -> &str {
        &self.tailnet
    }

    /// The normalized base URL, ending in `/api/v2/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Append path segments to the base URL, percent-encoding each one.
    pub fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `{base}/tailnet/{tailnet}/{segments...}`
    pub fn tailnet_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut all = Vec::with_capacity(segments.len() + 2);
        all.push("tailnet");
        all.push(self.tailnet.as_str());
        all.extend_from_slice(segments);
        self.url(&all)
    }

    // ── Execution ────────────────────────────────────────────────────

    /// Send one request and classify the outcome.
    ///
    /// Success statuses return the body; everything else is mapped onto the
    /// error taxonomy by [`classify_error`].
    pub async fn execute(&self, request: ApiRequest) -> Result<RawResponse, Error> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self
            .http
            .request(request.method, request.url)
            .header(header::ACCEPT, request.accept.media_type());
        if let Some(etag) = request.if_match {
            builder = builder.header(header::IF_MATCH, etag);
        }
        if let Some(body) = request.body {
            builder = builder
                .header(header::CONTENT_TYPE, body.content_type())
                .body(body.into_bytes());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let etag = resp
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = resp.text().await?;
        trace!(status = status.as_u16(), bytes = body.len(), "received response");

        if status.is_success() {
            Ok(RawResponse { status, etag, body })
        } else {
            Err(classify_error(status, body))
        }
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let resp = self.execute(ApiRequest::new(Method::GET, url)).await?;
        codec::decode_json(&resp.body)
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        let request = ApiRequest::new(Method::POST, url).with_body(codec::encode_json(body)?);
        let resp = self.execute(request).await?;
        codec::decode_json(&resp.body)
    }

    pub(crate) async fn post_no_response<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<(), Error> {
        let request = ApiRequest::new(Method::POST, url).with_body(codec::encode_json(body)?);
        self.execute(request).await.map(|_| ())
    }

    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        self.execute(ApiRequest::new(Method::DELETE, url))
            .await
            .map(|_| ())
    }
}

// ── Error classification ─────────────────────────────────────────────

/// Map a non-success status and its body onto [`Error`].
///
/// 401/403, 404 and 5xx are classified by status alone; the envelope only
/// supplies the message. Other 4xx need a decodable envelope to count as a
/// validation failure, otherwise the raw status and body are returned as
/// [`Error::Unexpected`].
pub fn classify_error(status: StatusCode, raw: String) -> Error {
    let envelope = serde_json::from_str::<ApiErrorBody>(&raw).ok();
    let code = status.as_u16();
    let message = |envelope: Option<ApiErrorBody>, raw: String| match envelope {
        Some(env) => env.message,
        None if raw.is_empty() => status.to_string(),
        None => raw,
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication {
            status: code,
            message: message(envelope, raw),
        },
        StatusCode::NOT_FOUND => Error::NotFound {
            message: message(envelope, raw),
        },
        s if s.is_server_error() => Error::Server {
            status: code,
            message: message(envelope, raw),
        },
        s if s.is_client_error() => match envelope {
            Some(env) => Error::Validation {
                status: code,
                message: env.message,
                fields: env.data,
            },
            None => Error::Unexpected {
                status: code,
                body: raw,
            },
        },
        _ => Error::Unexpected {
            status: code,
            body: raw,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> TailnetClient {
        TailnetClient::from_reqwest(base, "example.com", reqwest::Client::new()).unwrap()
    }

    #[test]
    fn base_url_gets_version_prefix() {
        assert_eq!(
            client("https://api.tailscale.com").base_url().as_str(),
            "https://api.tailscale.com/api/v2/"
        );
        assert_eq!(
            client("https://api.tailscale.com/api/v2").base_url().as_str(),
            "https://api.tailscale.com/api/v2/"
        );
        assert_eq!(
            client("http://localhost:8080/proxy/").base_url().as_str(),
            "http://localhost:8080/proxy/api/v2/"
        );
    }

    #[test]
    fn tailnet_segment_is_encoded() {
        let c = TailnetClient::from_reqwest(
            "https://api.tailscale.com",
            "my tailnet",
            reqwest::Client::new(),
        )
        .unwrap();
        assert_eq!(
            c.tailnet_url(&["acl"]).unwrap().as_str(),
            "https://api.tailscale.com/api/v2/tailnet/my%20tailnet/acl"
        );
    }

    #[test]
    fn device_urls_are_not_tailnet_scoped() {
        let c = client("https://api.tailscale.com");
        assert_eq!(
            c.url(&["device", "123", "routes"]).unwrap().as_str(),
            "https://api.tailscale.com/api/v2/device/123/routes"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        let err = TailnetClient::from_reqwest("mailto:ops@example.com", "t", reqwest::Client::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn classify_auth_and_not_found() {
        assert!(matches!(
            classify_error(StatusCode::UNAUTHORIZED, String::new()),
            Error::Authentication { status: 401, .. }
        ));
        assert!(matches!(
            classify_error(StatusCode::FORBIDDEN, r#"{"message":"no access"}"#.into()),
            Error::Authentication { status: 403, ref message } if message == "no access"
        ));
        assert!(matches!(
            classify_error(StatusCode::NOT_FOUND, String::new()),
            Error::NotFound { .. }
        ));
    }

    #[test]
    fn classify_validation_requires_envelope() {
        let err = classify_error(
            StatusCode::BAD_REQUEST,
            r#"{"message":"invalid","data":[{"field":"routes","detail":"bad"}]}"#.into(),
        );
        match err {
            Error::Validation {
                status,
                message,
                fields,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid");
                assert_eq!(fields[0].field, "routes");
            }
            other => panic!("expected Validation, got: {other:?}"),
        }

        let err = classify_error(StatusCode::BAD_REQUEST, "<html>nope</html>".into());
        assert!(matches!(
            err,
            Error::Unexpected { status: 400, ref body } if body == "<html>nope</html>"
        ));
    }

    #[test]
    fn classify_server_keeps_raw_body() {
        let err = classify_error(StatusCode::BAD_GATEWAY, "upstream down".into());
        assert!(matches!(
            err,
            Error::Server { status: 502, ref message } if message == "upstream down"
        ));
    }
}
