// Resource clients: one per resource type, built on `TailnetClient`.

pub mod acl;
pub mod authorization;
pub mod devices;
pub mod dns;
pub mod keys;
pub mod routes;
pub mod singleton;

pub use acl::AclResource;
pub use authorization::AuthorizationResource;
pub use devices::DevicesResource;
pub use dns::{NameserversResource, PreferencesResource, SearchPathsResource};
pub use keys::{KeySpec, KeysResource};
pub use routes::{SubnetRoutesResource, canonical_routes, validate_routes};
pub use singleton::{Singleton, SingletonResource};
