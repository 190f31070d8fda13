// ── Singleton resources ──
//
// A singleton always exists exactly once per tailnet: the policy file and
// each DNS setting. The API only offers get and replace, so create and
// update are the same write, and delete writes the documented default back.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::CoreError;

/// Observed state of a singleton.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Singleton<T> {
    /// Never configured, reset, or not found remotely.
    Default,
    /// Configured to something other than the default.
    Present(T),
}

impl<T> Singleton<T> {
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// The effective value, substituting `default` for [`Singleton::Default`].
    pub fn into_value(self, default: T) -> T {
        match self {
            Self::Default => default,
            Self::Present(value) => value,
        }
    }
}

/// A resource with get/replace semantics only.
///
/// Implementors supply `read`, `write` and the default value; the CRUD
/// surface is derived from them.
#[async_trait]
pub trait SingletonResource: Send + Sync {
    type Value: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync;

    /// Name used in logs and error messages.
    fn kind(&self) -> &'static str;

    /// The value the remote side holds when nothing was ever configured.
    fn default_value(&self) -> Self::Value;

    /// Fetch the remote value. A 404 surfaces as [`CoreError::NotFound`].
    async fn read(&self) -> Result<Self::Value, CoreError>;

    /// Replace the remote value, returning what was stored.
    async fn write(&self, value: &Self::Value) -> Result<Self::Value, CoreError>;

    /// Current state. A 404 or a value equal to the default is reported as
    /// [`Singleton::Default`]. Creating the default value therefore reads
    /// back as `Default`; use [`SingletonResource::current`] to see it.
    async fn get(&self) -> Result<Singleton<Self::Value>, CoreError> {
        match self.read().await {
            Ok(value) if value == self.default_value() => Ok(Singleton::Default),
            Ok(value) => Ok(Singleton::Present(value)),
            Err(CoreError::NotFound { .. }) => {
                warn!(kind = self.kind(), "remote returned 404, treating as default");
                Ok(Singleton::Default)
            }
            Err(e) => Err(e),
        }
    }

    /// The effective value, whether configured or default.
    async fn current(&self) -> Result<Self::Value, CoreError> {
        Ok(self.get().await?.into_value(self.default_value()))
    }

    /// Identical to [`SingletonResource::update`]; creating twice is harmless.
    async fn create(&self, value: &Self::Value) -> Result<Self::Value, CoreError> {
        self.update(value).await
    }

    async fn update(&self, value: &Self::Value) -> Result<Self::Value, CoreError> {
        info!(kind = self.kind(), "writing configuration");
        self.write(value).await
    }

    /// Restore the default. Writing the default over itself is a no-op
    /// remotely, so repeated deletes succeed.
    async fn delete(&self) -> Result<(), CoreError> {
        info!(kind = self.kind(), "resetting to default");
        self.write(&self.default_value()).await.map(|stored| {
            if stored != self.default_value() {
                debug!(kind = self.kind(), "remote normalized the default value");
            }
        })
    }
}
