//! Read-through caching in front of a [`ContentProvider`]

use std::sync::Arc;

use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};

use crate::cache::{decode, encode, ContentCache, Namespace};
use crate::collision::Mesh;
use crate::world::{ContentOrigin, ContentProvider, Partition};

/// Provider that answers from the cache first and stores what it had to load
///
/// Cache hits are looked up in the baseline content namespace, then in the
/// added one. Misses are loaded from the inner provider and queued into the
/// content namespace of their origin. Collision geometry is passed through.
pub struct CachedContent<P> {
    inner: P,
    cache: Arc<ContentCache>,
}

impl<P: ContentProvider> CachedContent<P> {
    /// Wrap `inner` with `cache`
    pub fn new(inner: P, cache: Arc<ContentCache>) -> Self {
        Self { inner, cache }
    }

    /// Wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Backing cache
    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    fn lookup_namespaces(&self) -> &'static [Namespace] {
        if self.cache.config().cache_added_content {
            &[Namespace::BaselineContent, Namespace::AddedContent]
        } else {
            &[Namespace::BaselineContent]
        }
    }

    fn cached<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        if !self.cache.config().cache_content {
            return None;
        }
        let (namespace, bytes) = match self.cache.get_first(path, self.lookup_namespaces()) {
            Ok(hit) => hit?,
            Err(error) => {
                warn!("Cache lookup of {path} failed: {error}");
                return None;
            }
        };
        match decode(&bytes) {
            Ok(value) => Some(value),
            Err(error) => {
                debug!("Ignoring undecodable cache entry {path} in {namespace:?}: {error}");
                None
            }
        }
    }

    fn store<T: Serialize>(&self, path: &str, value: &T) {
        let config = self.cache.config();
        if !config.cache_content {
            return;
        }
        let origin = self.inner.origin_of(path);
        if origin == ContentOrigin::Added && !config.cache_added_content {
            return;
        }
        let queued = encode(value)
            .and_then(|bytes| self.cache.enqueue_write(path, bytes, Namespace::content(origin)));
        if let Err(error) = queued {
            warn!("Could not queue {path} for caching: {error}");
        }
    }
}

impl<P: ContentProvider> ContentProvider for CachedContent<P> {
    fn partition(&self, path: &str) -> Option<Arc<Partition>> {
        if let Some(partition) = self.cached::<Partition>(path) {
            return Some(Arc::new(partition));
        }
        let partition = self.inner.partition(path)?;
        self.store(path, partition.as_ref());
        Some(partition)
    }

    fn mesh(&self, path: &str) -> Option<Arc<Mesh>> {
        if let Some(mesh) = self.cached::<Mesh>(path) {
            return Some(Arc::new(mesh));
        }
        let mesh = self.inner.mesh(path)?;
        self.store(path, mesh.as_ref());
        Some(mesh)
    }

    fn collision_mesh(&self, partition_hash: u64, shape_hash: u64) -> Option<Arc<Mesh>> {
        self.inner.collision_mesh(partition_hash, shape_hash)
    }

    fn partition_paths(&self, origin: ContentOrigin) -> Vec<String> {
        self.inner.partition_paths(origin)
    }

    fn origin_of(&self, path: &str) -> ContentOrigin {
        self.inner.origin_of(path)
    }
}
