// tailkit-core: Resource clients, singleton semantics and drift detection
//
// Sits between a declarative tool (or the `tailkit` CLI) and `tailkit-api`.
// Resource clients give every resource type a create/get/update/delete
// shape, substituting "reset to default" where the API has no delete.

pub mod diagnostic;
pub mod error;
pub mod reconcile;
pub mod resources;
pub mod tailnet;

pub use diagnostic::{AttributePath, Diagnostic, PathStep, Severity};
pub use error::CoreError;
pub use reconcile::{
    AppliedState, Drift, DriftEntry, DriftReport, DriftStatus, FieldChange, PlanAction,
    Reconciler, ResourceId, ResourceKind, detect_drift, plan_singleton,
};
pub use resources::{Singleton, SingletonResource};
pub use tailnet::Tailnet;

// Wire types callers need alongside the resource clients.
pub use tailkit_api::types;
pub use tailkit_api::{DEFAULT_BASE_URL, TlsMode, TransportConfig};
