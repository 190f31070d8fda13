// tailkit-api: Async Rust client for the tailnet administration API (v2)

pub mod acl;
pub mod client;
pub mod codec;
pub mod devices;
pub mod dns;
pub mod error;
pub mod keys;
pub mod transport;
pub mod types;

pub use client::{ApiRequest, DEFAULT_BASE_URL, RawResponse, TailnetClient, Versioned};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
