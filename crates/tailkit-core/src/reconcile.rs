//! Drift detection against last-applied state.
//!
//! The reconciler never writes. It reads each managed resource, compares
//! the result with what was last applied and reports the differences; the
//! caller decides whether to re-apply.

use std::collections::BTreeSet;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tailkit_api::TailnetClient;
use tailkit_api::types::{AclPolicy, DnsPreferences, KeyMetadata};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::diagnostic::{AttributePath, Diagnostic, PathStep};
use crate::error::CoreError;
use crate::resources::{
    AclResource, AuthorizationResource, KeysResource, NameserversResource, PreferencesResource,
    SearchPathsResource, Singleton, SingletonResource, SubnetRoutesResource, canonical_routes,
};

// ── Identity ─────────────────────────────────────────────────────────

/// Local identifier for a singleton. The API has none, so one is generated
/// when the resource is first applied and kept in state from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Uuid);

impl ResourceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    Acl,
    DnsNameservers,
    DnsSearchPaths,
    DnsPreferences,
    DeviceSubnetRoutes,
    DeviceAuthorization,
    TailnetKey,
}

// ── Structural diff ──────────────────────────────────────────────────

/// One differing leaf. `None` means the value is absent on that side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub path: AttributePath,
    pub applied: Option<Value>,
    pub observed: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Drift {
    pub changes: Vec<FieldChange>,
}

impl Drift {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Compare two values through their JSON form.
///
/// Objects are compared key by key and equal-length arrays element by
/// element. Arrays whose length changed are reported as one change.
pub fn detect_drift<T: Serialize + ?Sized>(applied: &T, observed: &T) -> Result<Drift, CoreError> {
    let applied = to_value(applied)?;
    let observed = to_value(observed)?;
    let mut drift = Drift::default();
    diff(
        &mut AttributePath::root(),
        Some(&applied),
        Some(&observed),
        &mut drift.changes,
    );
    Ok(drift)
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, CoreError> {
    serde_json::to_value(value).map_err(|e| CoreError::Api {
        message: format!("could not encode value for comparison: {e}"),
        status: None,
    })
}

fn diff(
    path: &mut AttributePath,
    applied: Option<&Value>,
    observed: Option<&Value>,
    out: &mut Vec<FieldChange>,
) {
    match (applied, observed) {
        (Some(Value::Object(a)), Some(Value::Object(o))) => {
            let keys: BTreeSet<&String> = a.keys().chain(o.keys()).collect();
            for key in keys {
                let step = step_for_key(path, key);
                path.push(step);
                diff(path, a.get(key), o.get(key), out);
                path.pop();
            }
        }
        (Some(Value::Array(a)), Some(Value::Array(o))) if a.len() == o.len() => {
            for (idx, (av, ov)) in a.iter().zip(o).enumerate() {
                path.push(PathStep::Index(idx));
                diff(path, Some(av), Some(ov), out);
                path.pop();
            }
        }
        (a, o) if a != o => out.push(FieldChange {
            path: path.clone(),
            applied: a.cloned(),
            observed: o.cloned(),
        }),
        _ => {}
    }
}

/// Top-level and identifier-like keys read as attributes; anything else
/// (group names, hostnames) as map keys.
fn step_for_key(path: &AttributePath, key: &str) -> PathStep {
    let ident = key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if path.is_root() || ident {
        PathStep::Attribute(key.to_owned())
    } else {
        PathStep::Key(key.to_owned())
    }
}

// ── Planning ─────────────────────────────────────────────────────────

/// What to send to bring a singleton to the desired value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction<T> {
    NoOp,
    Write(T),
    Reset,
}

/// Decide how to move a singleton from `observed` to `desired`.
///
/// `desired == None` means the resource should not be managed, i.e. it
/// should be at its default.
pub fn plan_singleton<T: Clone + PartialEq>(
    desired: Option<&T>,
    observed: &Singleton<T>,
    default: &T,
) -> PlanAction<T> {
    match (desired, observed) {
        (None, Singleton::Default) => PlanAction::NoOp,
        (None, Singleton::Present(_)) => PlanAction::Reset,
        (Some(want), Singleton::Default) if want == default => PlanAction::NoOp,
        (Some(want), Singleton::Present(have)) if want == have => PlanAction::NoOp,
        (Some(want), _) => PlanAction::Write(want.clone()),
    }
}

// ── Applied state ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Managed<T> {
    pub id: ResourceId,
    pub value: T,
}

impl<T> Managed<T> {
    pub fn new(value: T) -> Self {
        Self {
            id: ResourceId::generate(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRoutes {
    pub device_id: String,
    pub routes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedAuthorization {
    pub device_id: String,
    pub authorized: bool,
}

/// The attributes of a key that can drift. The secret is not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppliedKey {
    pub id: String,
    #[serde(default)]
    pub reusable: bool,
    #[serde(default)]
    pub ephemeral: bool,
    #[serde(default)]
    pub preauthorized: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<&KeyMetadata> for AppliedKey {
    fn from(meta: &KeyMetadata) -> Self {
        let create = &meta.capabilities.devices.create;
        Self {
            id: meta.id.clone(),
            reusable: create.reusable,
            ephemeral: create.ephemeral,
            preauthorized: create.preauthorized,
            tags: create.tags.clone(),
        }
    }
}

/// Snapshot of everything that was last applied to one tailnet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<Managed<AclPolicy>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_nameservers: Option<Managed<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_search_paths: Option<Managed<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_preferences: Option<Managed<DnsPreferences>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnet_routes: Vec<AppliedRoutes>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub device_authorizations: Vec<AppliedAuthorization>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<AppliedKey>,
}

// ── Report ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DriftStatus {
    InSync,
    Drifted { drift: Drift },
    /// The remote object no longer exists or can no longer be used.
    Gone { reason: String },
    /// The refresh itself failed.
    Failed { diagnostic: Diagnostic },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftEntry {
    pub kind: ResourceKind,
    pub id: String,
    #[serde(flatten)]
    pub status: DriftStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DriftReport {
    pub entries: Vec<DriftEntry>,
}

impl DriftReport {
    /// Whether anything differs from what was applied.
    pub fn has_drift(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.status, DriftStatus::Drifted { .. } | DriftStatus::Gone { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.status, DriftStatus::Failed { .. }))
    }

    pub fn entry(&self, kind: ResourceKind, id: &str) -> Option<&DriftEntry> {
        self.entries.iter().find(|e| e.kind == kind && e.id == id)
    }

    /// One diagnostic per entry that is not in sync.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.entries
            .iter()
            .filter_map(|e| match &e.status {
                DriftStatus::InSync => None,
                DriftStatus::Drifted { drift } => Some(Diagnostic::warning(
                    format!("{} {} has drifted", e.kind, e.id),
                    drift
                        .changes
                        .iter()
                        .map(|c| c.path.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                )),
                DriftStatus::Gone { reason } => Some(Diagnostic::warning(
                    format!("{} {} no longer exists", e.kind, e.id),
                    reason.clone(),
                )),
                DriftStatus::Failed { diagnostic } => Some(diagnostic.clone()),
            })
            .collect()
    }
}

// ── Reconciler ───────────────────────────────────────────────────────

/// Refreshes every resource in an [`AppliedState`], one at a time.
pub struct Reconciler {
    client: TailnetClient,
}

impl Reconciler {
    pub fn new(client: TailnetClient) -> Self {
        Self { client }
    }

    pub async fn check(&self, state: &AppliedState) -> DriftReport {
        let mut report = DriftReport::default();

        if let Some(acl) = &state.acl {
            let resource = AclResource::new(self.client.clone(), acl.value.format());
            report
                .entries
                .push(singleton_entry(&resource, ResourceKind::Acl, acl).await);
        }
        if let Some(ns) = &state.dns_nameservers {
            let resource = NameserversResource::new(self.client.clone());
            report
                .entries
                .push(singleton_entry(&resource, ResourceKind::DnsNameservers, ns).await);
        }
        if let Some(sp) = &state.dns_search_paths {
            let resource = SearchPathsResource::new(self.client.clone());
            report
                .entries
                .push(singleton_entry(&resource, ResourceKind::DnsSearchPaths, sp).await);
        }
        if let Some(prefs) = &state.dns_preferences {
            let resource = PreferencesResource::new(self.client.clone());
            report
                .entries
                .push(singleton_entry(&resource, ResourceKind::DnsPreferences, prefs).await);
        }

        let routes = SubnetRoutesResource::new(self.client.clone());
        for applied in &state.subnet_routes {
            report.entries.push(routes_entry(&routes, applied).await);
        }

        let auth = AuthorizationResource::new(self.client.clone());
        for applied in &state.device_authorizations {
            report.entries.push(authorization_entry(&auth, applied).await);
        }

        let keys = KeysResource::new(self.client.clone());
        for applied in &state.keys {
            report.entries.push(key_entry(&keys, applied).await);
        }

        info!(
            checked = report.entries.len(),
            drifted = report.has_drift(),
            "drift check finished"
        );
        report
    }
}

#[derive(Serialize)]
struct Routes {
    routes: Vec<String>,
}

#[derive(Serialize)]
struct Authorized {
    authorized: bool,
}

async fn singleton_entry<R: SingletonResource>(
    resource: &R,
    kind: ResourceKind,
    applied: &Managed<R::Value>,
) -> DriftEntry {
    let status = match resource.current().await {
        Ok(observed) => drift_status(detect_drift(&applied.value, &observed)),
        Err(e) => failed(&e, kind, &applied.id.to_string()),
    };
    DriftEntry {
        kind,
        id: applied.id.to_string(),
        status,
    }
}

async fn routes_entry(
    resource: &SubnetRoutesResource,
    applied: &AppliedRoutes,
) -> DriftEntry {
    let status = match resource.get(&applied.device_id).await {
        Ok(observed) => {
            let want = canonical_routes(&applied.routes);
            let have = canonical_routes(&observed.enabled_routes);
            drift_status(detect_drift(
                &Routes { routes: want },
                &Routes { routes: have },
            ))
        }
        Err(e) if e.is_not_found() => gone(&e),
        Err(e) => failed(&e, ResourceKind::DeviceSubnetRoutes, &applied.device_id),
    };
    debug!(device_id = %applied.device_id, "checked subnet routes");
    DriftEntry {
        kind: ResourceKind::DeviceSubnetRoutes,
        id: applied.device_id.clone(),
        status,
    }
}

async fn authorization_entry(
    resource: &AuthorizationResource,
    applied: &AppliedAuthorization,
) -> DriftEntry {
    let kind = ResourceKind::DeviceAuthorization;
    let status = match resource.get(&applied.device_id).await {
        Ok(authorized) => drift_status(detect_drift(
            &Authorized {
                authorized: applied.authorized,
            },
            &Authorized { authorized },
        )),
        Err(e) if e.is_not_found() => gone(&e),
        Err(e) => failed(&e, kind, &applied.device_id),
    };
    DriftEntry {
        kind,
        id: applied.device_id.clone(),
        status,
    }
}

async fn key_entry(resource: &KeysResource, applied: &AppliedKey) -> DriftEntry {
    let kind = ResourceKind::TailnetKey;
    let status = match resource.get(&applied.id).await {
        Ok(meta) if meta.invalid || meta.revoked.is_some() => DriftStatus::Gone {
            reason: "key has been revoked or invalidated".into(),
        },
        Ok(meta) if !meta.is_valid_at(Utc::now()) => DriftStatus::Gone {
            reason: "key has expired".into(),
        },
        Ok(meta) => drift_status(detect_drift(applied, &AppliedKey::from(&meta))),
        Err(e) if e.is_not_found() => gone(&e),
        Err(e) => failed(&e, kind, &applied.id),
    };
    DriftEntry {
        kind,
        id: applied.id.clone(),
        status,
    }
}

fn drift_status(result: Result<Drift, CoreError>) -> DriftStatus {
    match result {
        Ok(drift) if drift.is_empty() => DriftStatus::InSync,
        Ok(drift) => DriftStatus::Drifted { drift },
        Err(e) => DriftStatus::Failed {
            diagnostic: Diagnostic::error(&e, "failed to compare state"),
        },
    }
}

fn gone(err: &CoreError) -> DriftStatus {
    DriftStatus::Gone {
        reason: err.to_string(),
    }
}

fn failed(err: &CoreError, kind: ResourceKind, id: &str) -> DriftStatus {
    warn!(%kind, id, error = %err, "refresh failed");
    DriftStatus::Failed {
        diagnostic: Diagnostic::error(err, format!("failed to refresh {kind} {id}")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tailkit_api::types::{Acl, AclRule};

    use super::*;

    #[test]
    fn identical_values_have_no_drift() {
        let acl = Acl::allow_all();
        assert!(detect_drift(&acl, &acl).unwrap().is_empty());
    }

    #[test]
    fn nested_change_is_located() {
        let applied = Acl::allow_all();
        let mut observed = Acl::allow_all();
        observed.acls[0] = AclRule::accept(["group:eng"], ["*:*"]);

        let drift = detect_drift(&applied, &observed).unwrap();
        assert_eq!(drift.changes.len(), 1);
        assert_eq!(drift.changes[0].path.to_string(), "acls[0].src[0]");
        assert_eq!(drift.changes[0].applied, Some(json!("*")));
        assert_eq!(drift.changes[0].observed, Some(json!("group:eng")));
    }

    #[test]
    fn added_and_removed_keys_are_reported() {
        let applied = json!({ "groups": { "group:eng": ["a@example.com"] } });
        let observed = json!({ "hosts": { "db": "100.64.0.9" } });

        let drift = detect_drift(&applied, &observed).unwrap();
        let paths: Vec<String> = drift.changes.iter().map(|c| c.path.to_string()).collect();
        assert_eq!(paths, vec!["groups", "hosts"]);
        assert_eq!(drift.changes[1].applied, None);
    }

    #[test]
    fn resized_array_is_one_change() {
        let drift = detect_drift(&json!({ "nameservers": ["8.8.8.8"] }), &json!({
            "nameservers": ["8.8.8.8", "1.1.1.1"]
        }))
        .unwrap();
        assert_eq!(drift.changes.len(), 1);
        assert_eq!(drift.changes[0].path.to_string(), "nameservers");
    }

    #[test]
    fn map_keys_with_punctuation_are_quoted() {
        let drift = detect_drift(
            &json!({ "groups": { "group:eng": ["a"] } }),
            &json!({ "groups": { "group:eng": ["b"] } }),
        )
        .unwrap();
        assert_eq!(drift.changes[0].path.to_string(), "groups[\"group:eng\"][0]");
    }

    #[test]
    fn plan_covers_every_transition() {
        let default: Vec<String> = Vec::new();
        let want = vec!["8.8.8.8".to_owned()];

        assert_eq!(plan_singleton(None, &Singleton::Default, &default), PlanAction::NoOp);
        assert_eq!(
            plan_singleton(None, &Singleton::Present(want.clone()), &default),
            PlanAction::Reset
        );
        assert_eq!(
            plan_singleton(Some(&want), &Singleton::Default, &default),
            PlanAction::Write(want.clone())
        );
        assert_eq!(
            plan_singleton(Some(&want), &Singleton::Present(want.clone()), &default),
            PlanAction::NoOp
        );
        assert_eq!(
            plan_singleton(Some(&default), &Singleton::Default, &default),
            PlanAction::NoOp
        );
        assert_eq!(
            plan_singleton(
                Some(&want),
                &Singleton::Present(vec!["1.1.1.1".to_owned()]),
                &default
            ),
            PlanAction::Write(want)
        );
    }

    #[test]
    fn applied_state_parses_minimal_document() {
        let state: AppliedState = serde_json::from_value(json!({
            "dns_nameservers": {
                "id": "5f0c6f0e-8f5e-4a4f-9d55-8d1d3c3a9f11",
                "value": ["8.8.8.8"]
            },
            "keys": [{ "id": "k1", "reusable": true }]
        }))
        .unwrap();

        assert_eq!(state.dns_nameservers.unwrap().value, vec!["8.8.8.8".to_owned()]);
        assert!(state.acl.is_none());
        assert!(state.keys[0].reusable);
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(ResourceId::generate(), ResourceId::generate());
    }
}
