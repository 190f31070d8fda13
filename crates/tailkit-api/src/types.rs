//! Wire types for the tailnet administration API (v2).
//!
//! Field names follow the API's camelCase via `#[serde(rename_all = "camelCase")]`.
//! Every optional or collection field carries `#[serde(default)]` so an
//! absent field decodes to a defined default rather than an error.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// ── Error envelope ───────────────────────────────────────────────────

/// Error body returned by the API on non-success responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<FieldError>,
}

/// Field-level detail attached to a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub detail: String,
}

// ── ACL ──────────────────────────────────────────────────────────────

/// Which representation of the policy file to exchange with the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclFormat {
    /// Structured JSON. Comments and formatting are lost.
    #[default]
    Json,
    /// Raw HuJSON text, preserved verbatim.
    HuJson,
}

impl AclFormat {
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::HuJson => "application/hujson",
        }
    }
}

/// A tailnet policy file in either of its two representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclPolicy {
    Structured(Acl),
    #[serde(rename = "hujson")]
    HuJson(String),
}

impl AclPolicy {
    pub fn format(&self) -> AclFormat {
        match self {
            Self::Structured(_) => AclFormat::Json,
            Self::HuJson(_) => AclFormat::HuJson,
        }
    }
}

/// Structured policy file.
///
/// Sections the model does not know about are kept in `extra` so a
/// read-modify-write never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acl {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acls: Vec<AclRule>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hosts: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tag_owners: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_approvers: Option<AutoApprovers>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssh: Vec<SshRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_attrs: Vec<NodeAttrGrant>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<AclTest>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Acl {
    /// The policy a new tailnet starts with: everyone may reach everything.
    pub fn allow_all() -> Self {
        Self {
            acls: vec![AclRule::accept(["*"], ["*:*"])],
            ..Self::default()
        }
    }
}

/// One `acls` entry. Older policy files spell `src`/`dst` as `users`/`ports`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRule {
    pub action: String,
    #[serde(default, alias = "users")]
    pub src: Vec<String>,
    #[serde(default, alias = "ports")]
    pub dst: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proto: Option<String>,
}

impl AclRule {
    pub fn accept<S, D>(src: S, dst: D) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            action: "accept".into(),
            src: src.into_iter().map(Into::into).collect(),
            dst: dst.into_iter().map(Into::into).collect(),
            proto: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoApprovers {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub routes: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exit_node: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshRule {
    pub action: String,
    #[serde(default)]
    pub src: Vec<String>,
    #[serde(default)]
    pub dst: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttrGrant {
    #[serde(default)]
    pub target: Vec<String>,
    #[serde(default)]
    pub attr: Vec<String>,
}

/// Policy test case: `src` must reach every `accept` and none of `deny`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclTest {
    #[serde(alias = "user")]
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proto: Option<String>,
    #[serde(default, alias = "allow", skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<String>,
}

// ── DNS ──────────────────────────────────────────────────────────────

/// The tailnet's combined DNS configuration.
///
/// Nameservers, search paths and preferences are managed as three separate
/// resources but live in this one remote object. Unknown keys (split DNS,
/// future settings) are carried through `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsConfiguration {
    #[serde(default)]
    pub nameservers: Vec<String>,
    #[serde(default)]
    pub search_paths: Vec<String>,
    #[serde(default)]
    pub preferences: DnsPreferences,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsPreferences {
    #[serde(rename = "magicDNS", default)]
    pub magic_dns: bool,
}

// ── Keys ─────────────────────────────────────────────────────────────

/// Lifetime requested for a new key.
///
/// On the wire `Never` is `null` and `Seconds(n)` is the integer `n`. An
/// absent `expirySeconds` field (modelled as `Option::None` around this
/// type) asks the API for its default lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExpiry {
    Never,
    Seconds(u64),
}

impl Serialize for KeyExpiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Never => serializer.serialize_none(),
            Self::Seconds(secs) => serializer.serialize_u64(*secs),
        }
    }
}

impl<'de> Deserialize<'de> for KeyExpiry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map_or(Self::Never, Self::Seconds))
    }
}

impl fmt::Display for KeyExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("never"),
            Self::Seconds(secs) => write!(f, "{secs}s"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCapabilities {
    #[serde(default)]
    pub devices: DeviceKeyCapabilities,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceKeyCapabilities {
    #[serde(default)]
    pub create: DeviceCreateCapabilities,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct DeviceCreateCapabilities {
    #[serde(default)]
    pub reusable: bool,
    #[serde(default)]
    pub ephemeral: bool,
    #[serde(default)]
    pub preauthorized: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Body of `POST /tailnet/{tailnet}/keys`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeyRequest {
    pub capabilities: KeyCapabilities,
    #[serde(
        rename = "expirySeconds",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub expiry: Option<KeyExpiry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Everything the API will ever tell us about an existing key.
///
/// There is deliberately no field for the key material: it is only
/// returned once, on [`CreatedKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetadata {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub revoked: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invalid: bool,
    #[serde(default)]
    pub capabilities: KeyCapabilities,
}

impl KeyMetadata {
    pub fn reusable(&self) -> bool {
        self.capabilities.devices.create.reusable
    }

    pub fn ephemeral(&self) -> bool {
        self.capabilities.devices.create.ephemeral
    }

    /// Whether the key can still be used to join a device at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.invalid && self.revoked.is_none() && self.expires.is_none_or(|exp| exp > now)
    }
}

/// Result of key creation: metadata plus the one-time key material.
#[derive(Debug, Clone)]
pub struct CreatedKey {
    pub metadata: KeyMetadata,
    pub key: SecretString,
}

impl<'de> Deserialize<'de> for CreatedKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Wire {
            #[serde(flatten)]
            metadata: KeyMetadata,
            key: String,
        }

        let wire = Wire::deserialize(deserializer)?;
        Ok(Self {
            metadata: wire.metadata,
            key: SecretString::from(wire.key),
        })
    }
}

/// `GET /tailnet/{tailnet}/keys` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyList {
    #[serde(default)]
    pub keys: Vec<KeyMetadata>,
}

// ── Devices ──────────────────────────────────────────────────────────

/// A machine on the tailnet, as returned with `fields=all`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct Device {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub client_version: String,
    #[serde(default)]
    pub authorized: bool,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default)]
    pub key_expiry_disabled: bool,
    #[serde(default)]
    pub update_available: bool,
    #[serde(default)]
    pub blocks_incoming_connections: bool,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub advertised_routes: Vec<String>,
    #[serde(default)]
    pub enabled_routes: Vec<String>,
}

/// `GET /tailnet/{tailnet}/devices` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// Subnet routes of one device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRoutes {
    /// Prefixes the device itself announces. Read only.
    #[serde(default)]
    pub advertised_routes: Vec<String>,
    /// Subset of `advertised_routes` the tailnet has approved.
    #[serde(default)]
    pub enabled_routes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRoutesRequest {
    pub routes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAuthorizedRequest {
    pub authorized: bool,
}

// ── Serde helpers ────────────────────────────────────────────────────

/// Distinguishes a present-but-null field from an absent one: absent stays
/// `None` via `#[serde(default)]`, anything present goes through `T`.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Timestamps arrive as RFC 3339, as `""` for unknown, or as the zero time
/// `0001-01-01T00:00:00Z` for "never". The latter two decode to `None`.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let parsed = DateTime::parse_from_rfc3339(&raw)
        .map_err(serde::de::Error::custom)?
        .with_timezone(&Utc);
    if parsed.timestamp() <= ZERO_TIME_SECS {
        Ok(None)
    } else {
        Ok(Some(parsed))
    }
}

/// Unix seconds of `0001-01-01T00:00:00Z`.
const ZERO_TIME_SECS: i64 = -62_135_596_800;
