//! Typed cache handle
//!
//! A [`CacheHandle`] is bound to one resource id and one payload type. All
//! its operations run on the id's execution context and never return
//! errors: read failures look like a miss, write failures are logged and
//! dropped. Callers must tolerate an entry silently disappearing, e.g. after
//! the payload type changes shape.

use super::path::PathResolver;
use super::registry::{Access, Completion, ExecutionContext, KeyRegistry};
use super::resource::ResourceId;
use super::store::{self, WriteMode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Front-end for one cached resource of type `T`
pub struct CacheHandle<T> {
    id: ResourceId,
    path: Arc<PathBuf>,
    context: Arc<ExecutionContext>,
    mode: WriteMode,
    _payload: PhantomData<fn() -> T>,
}

impl<T> CacheHandle<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// Bind a handle to `id`, sharing the id's context from `registry`
    pub fn new(
        id: ResourceId,
        registry: &KeyRegistry,
        resolver: &PathResolver,
        mode: WriteMode,
    ) -> Self {
        let context = registry.get_or_create(&id);
        let path = Arc::new(resolver.path_for(&id));
        Self {
            id,
            path,
            context,
            mode,
            _payload: PhantomData,
        }
    }

    /// Load the cached value, or `None` on a miss or any failure
    pub async fn load(&self) -> Option<T> {
        let id = self.id.clone();
        let path = Arc::clone(&self.path);
        let (found, value) = oneshot::channel();

        let _ = self.context.submit(Access::Read, async move {
            let _ = found.send(read_value::<T>(&id, &path).await);
        });

        value.await.ok().flatten()
    }

    /// Store `value`, or delete the entry when `None`
    ///
    /// Returns immediately; the write is ordered after every earlier
    /// operation on this resource and before every later one. Await the
    /// returned [`Completion`] to wait for it.
    pub fn save(&self, value: Option<&T>) -> Completion {
        let Some(value) = value else {
            return self.delete();
        };

        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(
                    "Failed to encode {} for {}: {}",
                    type_name::<T>(),
                    self.id,
                    e
                );
                return Completion::ready();
            }
        };

        let id = self.id.clone();
        let path = Arc::clone(&self.path);
        let mode = self.mode;
        self.context.submit(Access::Write, async move {
            debug!("Saving {} ({} bytes)", id, bytes.len());
            if let Err(e) = store::write_entry(&path, &bytes, mode).await {
                warn!("Failed to save {}: {}", id, e);
            }
        })
    }

    /// Store the value of a successful result; a failure keeps the old entry
    pub fn save_on_success<E>(&self, result: &Result<T, E>) -> Completion {
        match result {
            Ok(value) => self.save(Some(value)),
            Err(_) => {
                debug!("Refresh of {} failed, keeping cached value", self.id);
                Completion::ready()
            }
        }
    }

    /// Remove the entry; a missing entry is not an error
    pub fn delete(&self) -> Completion {
        let id = self.id.clone();
        let path = Arc::clone(&self.path);
        self.context.submit(Access::Write, async move {
            match store::remove_entry(&path).await {
                Ok(true) => debug!("Deleted {}", id),
                Ok(false) => {}
                Err(e) => warn!("Failed to delete {}: {}", id, e),
            }
        })
    }

    /// Wait until every operation submitted so far on this resource is done
    pub async fn flush(&self) {
        self.context.submit(Access::Write, async {}).wait().await;
    }
}

impl<T> CacheHandle<T> {
    /// Resource id this handle is bound to
    pub fn resource(&self) -> &ResourceId {
        &self.id
    }

    /// Entry file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Clone for CacheHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            path: Arc::clone(&self.path),
            context: Arc::clone(&self.context),
            mode: self.mode,
            _payload: PhantomData,
        }
    }
}

impl<T> fmt::Debug for CacheHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHandle")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("payload", &type_name::<T>())
            .finish()
    }
}

async fn read_value<T: DeserializeOwned>(id: &ResourceId, path: &Path) -> Option<T> {
    let bytes = match store::read_entry(path).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            debug!("Cache miss for {}", id);
            return None;
        }
        Err(e) => {
            warn!("Failed to load {}: {}", id, e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                "Discarding cached {} as {}: {}",
                id,
                type_name::<T>(),
                e
            );
            None
        }
    }
}
