//! Datasource name resolution.
//!
//! [`DatasourceResolver`] turns a datasource name into a
//! [`DatasourceDescriptor`] (proxy base path plus backend kind). Descriptors
//! are kept in an [`ExpiringLruCache`] owned by the resolver, so repeated
//! lookups of the same name within the TTL never reach the backend.
//! Failures are never cached.

mod cache;
mod clock;
mod lookup;

pub use cache::{CachePolicy, DEFAULT_MAX_ENTRIES, DEFAULT_TTL, ExpiringLruCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use lookup::{DatasourceLookup, FixedKindLookup, HttpDatasourceLookup, LookupError, YamlDatasourceLookup};

use std::sync::{Arc, Mutex, MutexGuard};

use dashprobe_api::{InvalidNameError, proxy_base_path, validate_datasource_name};
use dashprobe_types::DatasourceDescriptor;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error(transparent)]
    InvalidName(#[from] InvalidNameError),

    #[error("cannot resolve datasource '{name}': {source}")]
    Lookup {
        name: String,
        #[source]
        source: LookupError,
    },

    #[error("datasource '{name}' does not declare spec.plugin.kind")]
    MissingPluginKind { name: String },
}

/// Resolves datasource names through a [`DatasourceLookup`] backend and a
/// bounded, expiring cache.
pub struct DatasourceResolver {
    lookup: Arc<dyn DatasourceLookup>,
    cache: Mutex<ExpiringLruCache<String, DatasourceDescriptor>>,
}

impl DatasourceResolver {
    /// Resolver with the default cache policy and the system clock.
    pub fn new(lookup: Arc<dyn DatasourceLookup>) -> Self {
        Self::with_cache(lookup, ExpiringLruCache::new(CachePolicy::default()))
    }

    pub fn with_cache(lookup: Arc<dyn DatasourceLookup>, cache: ExpiringLruCache<String, DatasourceDescriptor>) -> Self {
        Self {
            lookup,
            cache: Mutex::new(cache),
        }
    }

    /// Resolve `datasource_name` to its descriptor.
    ///
    /// A fresh cache hit returns without calling the backend. On a miss the
    /// backend document is fetched, `spec.plugin.kind` is read and the proxy
    /// base path is derived from the name; only then is the cache populated.
    pub async fn resolve(&self, datasource_name: &str) -> Result<DatasourceDescriptor, ResolutionError> {
        let cached = self.lock_cache().get(datasource_name);
        if let Some(descriptor) = cached {
            debug!(datasource = datasource_name, "datasource served from cache");
            return Ok(descriptor);
        }

        validate_datasource_name(datasource_name)?;

        let datasource = self
            .lookup
            .lookup(datasource_name)
            .await
            .map_err(|source| ResolutionError::Lookup {
                name: datasource_name.to_string(),
                source,
            })?;

        let data_source_type = datasource
            .plugin_kind()
            .ok_or_else(|| ResolutionError::MissingPluginKind {
                name: datasource_name.to_string(),
            })?;

        let descriptor = DatasourceDescriptor::new(proxy_base_path(datasource_name), data_source_type);
        self.lock_cache()
            .insert(datasource_name.to_string(), descriptor.clone());

        info!(
            datasource = datasource_name,
            kind = %descriptor.data_source_type,
            backend = %self.lookup.describe(),
            "datasource resolved"
        );
        Ok(descriptor)
    }

    /// Forget a cached resolution so the next call goes to the backend.
    pub fn invalidate(&self, datasource_name: &str) {
        self.lock_cache().remove(datasource_name);
    }

    pub fn cached_entries(&self) -> usize {
        self.lock_cache().len()
    }

    // The guard is never held across an await point.
    fn lock_cache(&self) -> MutexGuard<'_, ExpiringLruCache<String, DatasourceDescriptor>> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
