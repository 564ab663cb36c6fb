//! Persistent resource cache
//!
//! Key-addressed JSON entries stored flat under one cache root, used to skip
//! re-fetching or re-computing data across runs. There is no expiry and no
//! eviction: an entry exists until it is overwritten, deleted, or the whole
//! root is wiped.
//!
//! # Usage
//!
//! ```rust,ignore
//! let cache = Cache::new(CacheOptions::new(root))?;
//!
//! let watchlist = cache.user_resource::<Vec<Movie>>("watchlist", &user_id)?;
//! if let Some(movies) = watchlist.load().await {
//!     show(movies);
//! }
//! watchlist.save_on_success(&api.fetch_watchlist().await);
//! ```
//!
//! # Failure Model
//!
//! | Failure | Outcome |
//! |---------|---------|
//! | Entry missing | `load` returns `None` |
//! | Read or decode error | logged, `load` returns `None` |
//! | Encode or write error | logged, previous entry kept |
//! | Root creation race | ignored |
//! | Wipe error | logged and returned from `wipe_all` |

pub mod handle;
pub mod path;
pub mod registry;
pub mod resource;
pub mod store;

pub use handle::CacheHandle;
pub use path::PathResolver;
pub use registry::{Access, Completion, ExecutionContext, KeyRegistry};
pub use resource::ResourceId;
pub use store::{CacheEntryInfo, WriteMode};

use crate::config::{Config, ConfigManager};
use crate::error::{RescacheError, RescacheResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Where and how a [`Cache`] stores its entries
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Cache root directory, created on first write
    pub root: PathBuf,

    /// How entries are written
    pub write_mode: WriteMode,
}

impl CacheOptions {
    /// Options for `root` with atomic writes
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_mode: WriteMode::Atomic,
        }
    }

    /// Override the write mode
    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    /// Options described by a loaded configuration
    pub fn from_config(config: &Config) -> Self {
        let write_mode = if config.cache.atomic_writes {
            WriteMode::Atomic
        } else {
            WriteMode::Direct
        };
        Self::new(ConfigManager::cache_root(config)).with_write_mode(write_mode)
    }
}

/// Cache root manager and handle factory
///
/// Cloning is cheap; clones share one [`KeyRegistry`], so handles created
/// from any clone are ordered against each other.
#[derive(Debug, Clone)]
pub struct Cache {
    resolver: PathResolver,
    registry: Arc<KeyRegistry>,
    write_mode: WriteMode,
}

impl Cache {
    /// Create a cache; must be called from within a tokio runtime
    pub fn new(options: CacheOptions) -> RescacheResult<Self> {
        Ok(Self {
            resolver: PathResolver::new(options.root),
            registry: Arc::new(KeyRegistry::new()?),
            write_mode: options.write_mode,
        })
    }

    /// Create a cache from a loaded configuration
    pub fn from_config(config: &Config) -> RescacheResult<Self> {
        Self::new(CacheOptions::from_config(config))
    }

    /// The cache root directory
    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    /// The registry of per-resource execution contexts
    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    /// Entry path for a resource
    pub fn path_for(&self, id: &ResourceId) -> PathBuf {
        self.resolver.path_for(id)
    }

    /// Handle for an already-built resource id
    pub fn handle<T>(&self, id: ResourceId) -> CacheHandle<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        CacheHandle::new(id, &self.registry, &self.resolver, self.write_mode)
    }

    /// Handle for a global resource
    pub fn resource<T>(&self, name: &str) -> RescacheResult<CacheHandle<T>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        Ok(self.handle(ResourceId::new(name)?))
    }

    /// Handle for a resource scoped to one user or session
    pub fn user_resource<T>(&self, name: &str, user_id: &str) -> RescacheResult<CacheHandle<T>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        Ok(self.handle(ResourceId::scoped(name, user_id)?))
    }

    /// Remove the whole cache root
    ///
    /// Not atomic and not ordered against in-flight writes; whatever it
    /// leaves behind still loads correctly or as a miss. An absent root is
    /// a successful no-op.
    pub async fn wipe_all(&self) -> RescacheResult<()> {
        let root = self.resolver.root();
        match store::remove_root(root).await {
            Ok(true) => {
                info!("Wiped cache directory {}", root.display());
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => {
                warn!("Failed to wipe cache directory {}: {}", root.display(), e);
                Err(RescacheError::CacheWipe {
                    path: root.to_path_buf(),
                    source: e,
                })
            }
        }
    }

    /// Entry files currently under the cache root
    pub async fn entries(&self) -> RescacheResult<Vec<CacheEntryInfo>> {
        store::list_entries(self.resolver.root()).await
    }

    /// Total size of all entries in bytes
    pub async fn disk_usage(&self) -> RescacheResult<u64> {
        Ok(self.entries().await?.iter().map(|e| e.size).sum())
    }
}
