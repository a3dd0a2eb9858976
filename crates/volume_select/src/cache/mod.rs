//! Persistent content cache
//!
//! Four namespaces (baseline/added content, baseline/added bounds) live in
//! one cache directory next to a `metadata.json` version stamp. Reads are
//! synchronous lookups against an in-memory key index; writes go through a
//! queue drained by a background thread (see [`writer`]).
//!
//! ```rust,no_run
//! use volume_select::cache::{ContentCache, Namespace};
//! use volume_select::config::CacheConfig;
//!
//! # fn main() -> Result<(), volume_select::cache::CacheError> {
//! let cache = ContentCache::open(CacheConfig::at("cache"))?;
//! let _listening = cache.listen()?;
//! cache.enqueue_write("base\\a.streamingsector", vec![1, 2, 3], Namespace::BaselineBounds)?;
//! # Ok(())
//! # }
//! ```

pub mod content;
pub mod metadata;
pub mod namespace;
pub mod store;
pub mod writer;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};

use log::{info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::{CacheConfig, ConfigError};
use crate::geometry::AABB;

pub use content::CachedContent;
pub use metadata::CacheMetadata;
pub use namespace::{normalize_key, Namespace};
pub use store::LogStats;
pub use writer::{DrainReport, WriteDrain, WriteRequest};

use store::Store;

/// Rough on-disk size of one bounds entry, used for size estimates
pub const ESTIMATED_BOUNDS_ENTRY_BYTES: u64 = 116;

const BOUNDS_DUMP_MAGIC: &[u8; 4] = b"VSBD";
const BOUNDS_DUMP_VERSION: u32 = 1;

/// Cache errors
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// Filesystem failure
    #[error("cache I/O error: {0}")]
    Io(#[from] io::Error),

    /// A value could not be encoded or decoded
    #[error("cache value codec error: {0}")]
    Codec(#[from] postcard::Error),

    /// `metadata.json` could not be read or written
    #[error("cache metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// A file failed its integrity checks
    #[error("{path} is corrupt: {reason}")]
    Corrupt {
        /// Offending file
        path: PathBuf,
        /// What failed
        reason: String,
    },

    /// A bounds dump belongs to other versions than the cache
    #[error("bounds dump is for content {found_content} / tool {found_tool}, cache is content {expected_content} / tool {expected_tool}")]
    VersionMismatch {
        /// Content version of the dump
        found_content: String,
        /// Tool version of the dump
        found_tool: String,
        /// Content version of the cache
        expected_content: String,
        /// Tool version of the cache
        expected_tool: String,
    },

    /// The operation needs the write drain to be stopped
    #[error("cache is busy: {0}")]
    Busy(&'static str),

    /// The write queue has no receiver
    #[error("cache write queue is closed")]
    QueueClosed,

    /// The drain thread panicked
    #[error("cache write drain panicked")]
    DrainPanicked,

    /// A lock was poisoned by a panicking thread
    #[error("cache lock poisoned")]
    Poisoned,

    /// Invalid cache configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Encode a cache value
pub fn encode<T: Serialize>(value: &T) -> CacheResult<Vec<u8>> {
    Ok(postcard::to_stdvec(value)?)
}

/// Decode a cache value
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CacheResult<T> {
    Ok(postcard::from_bytes(bytes)?)
}

/// Entry counts and sizes of one namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceStats {
    /// Namespace described
    pub namespace: Namespace,
    /// Log sizes
    pub log: LogStats,
}

impl NamespaceStats {
    /// Size estimate: fixed per entry for bounds, measured for content
    pub fn estimated_bytes(&self) -> u64 {
        if self.namespace.is_bounds() {
            self.log.entries as u64 * ESTIMATED_BOUNDS_ENTRY_BYTES
        } else {
            self.log.live_bytes
        }
    }
}

/// Sizes of every namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// One entry per namespace, in [`Namespace::ALL`] order
    pub namespaces: Vec<NamespaceStats>,
}

impl CacheStats {
    /// Stats of `namespace`
    pub fn get(&self, namespace: Namespace) -> Option<&NamespaceStats> {
        self.namespaces.iter().find(|stats| stats.namespace == namespace)
    }

    /// Bytes on disk over all namespaces
    pub fn total_file_bytes(&self) -> u64 {
        self.namespaces.iter().map(|stats| stats.log.file_bytes).sum()
    }
}

#[derive(Serialize, Deserialize)]
struct BoundsDump {
    content_version: String,
    tool_version: String,
    partitions: Vec<(String, AABB)>,
}

/// The persistent cache of parsed content and partition bounds
pub struct ContentCache {
    config: CacheConfig,
    store: Arc<RwLock<Store>>,
    metadata: Mutex<CacheMetadata>,
    drain: WriteDrain,
}

impl ContentCache {
    /// Open the cache directory named by `config`
    ///
    /// A directory stamped with other versions than the configured ones, or
    /// holding entries without any stamp, is cleared before use.
    pub fn open(config: CacheConfig) -> CacheResult<Self> {
        config.validate()?;
        let mut store = Store::open(&config.directory)?;
        let metadata = Self::validated_metadata(&config, &mut store)?;
        info!(
            "Opened cache at {} (content {}, tool {})",
            config.directory.display(),
            metadata.content_version,
            metadata.tool_version
        );

        Ok(Self {
            drain: WriteDrain::new(config.write_queue_capacity, config.drain_interval()),
            store: Arc::new(RwLock::new(store)),
            metadata: Mutex::new(metadata),
            config,
        })
    }

    fn validated_metadata(config: &CacheConfig, store: &mut Store) -> CacheResult<CacheMetadata> {
        let existing = match CacheMetadata::load(&config.directory) {
            Ok(existing) => existing,
            Err(error) => {
                warn!("Unreadable cache metadata ({error}), treating the cache as stale");
                None
            }
        };

        match existing {
            Some(metadata) if metadata.matches(&config.content_version, &config.tool_version) => Ok(metadata),
            stale => {
                if !store.is_empty() {
                    match &stale {
                        Some(old) => warn!(
                            "Cache was built for content {} / tool {}, clearing it",
                            old.content_version, old.tool_version
                        ),
                        None => warn!("Cache has entries but no metadata, clearing it"),
                    }
                    for namespace in Namespace::ALL {
                        store.log_mut(namespace).reset()?;
                    }
                }
                let fresh = CacheMetadata::new(&config.content_version, &config.tool_version);
                fresh.save(&config.directory)?;
                Ok(fresh)
            }
        }
    }

    /// Settings the cache was opened with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Directory of the cache
    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    fn read_store(&self) -> CacheResult<RwLockReadGuard<'_, Store>> {
        self.store.read().map_err(|_| CacheError::Poisoned)
    }

    /// Raw value of `key` in `namespace`
    pub fn get(&self, key: &str, namespace: Namespace) -> CacheResult<Option<Vec<u8>>> {
        let key = normalize_key(key);
        Ok(self.read_store()?.log(namespace).get(&key)?)
    }

    /// First hit for `key` among `namespaces`, in the given order
    pub fn get_first(
        &self,
        key: &str,
        namespaces: &[Namespace],
    ) -> CacheResult<Option<(Namespace, Vec<u8>)>> {
        let key = normalize_key(key);
        let store = self.read_store()?;
        for namespace in namespaces {
            if let Some(value) = store.log(*namespace).get(&key)? {
                return Ok(Some((*namespace, value)));
            }
        }
        Ok(None)
    }

    /// Decoded value of `key` in `namespace`
    pub fn get_decoded<T: DeserializeOwned>(&self, key: &str, namespace: Namespace) -> CacheResult<Option<T>> {
        self.get(key, namespace)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Every entry of `namespace`
    pub fn get_all(&self, namespace: Namespace) -> CacheResult<Vec<(String, Vec<u8>)>> {
        Ok(self.read_store()?.log(namespace).entries()?)
    }

    /// Every key of `namespace`, sorted
    pub fn keys(&self, namespace: Namespace) -> CacheResult<Vec<String>> {
        Ok(self.read_store()?.log(namespace).keys())
    }

    /// Whether `key` has an entry in `namespace`
    pub fn contains(&self, key: &str, namespace: Namespace) -> CacheResult<bool> {
        Ok(self.read_store()?.log(namespace).contains(&normalize_key(key)))
    }

    /// Every partition bound stored in `namespace`; undecodable entries are skipped
    pub fn bounds(&self, namespace: Namespace) -> CacheResult<Vec<(String, AABB)>> {
        let entries = self.get_all(namespace)?;
        let mut bounds = Vec::with_capacity(entries.len());
        for (key, bytes) in entries {
            match decode::<AABB>(&bytes) {
                Ok(aabb) => bounds.push((key, aabb)),
                Err(error) => warn!("Skipping undecodable bounds of {key} in {namespace:?}: {error}"),
            }
        }
        Ok(bounds)
    }

    /// Queue a raw write; it becomes visible once drained
    pub fn enqueue_write(&self, key: &str, value: Vec<u8>, namespace: Namespace) -> CacheResult<()> {
        let request = WriteRequest {
            key: normalize_key(key),
            value,
            namespace,
        };
        self.drain.enqueue(request, &self.store)
    }

    /// Encode and queue a write
    pub fn enqueue_encoded<T: Serialize>(&self, key: &str, value: &T, namespace: Namespace) -> CacheResult<()> {
        self.enqueue_write(key, encode(value)?, namespace)
    }

    /// Start the drain thread; returns `false` if it was already running
    pub fn start_listening(&self) -> CacheResult<bool> {
        self.drain.start(Arc::clone(&self.store))
    }

    /// Stop the drain thread after it has written everything queued
    pub fn stop_listening(&self) -> CacheResult<DrainReport> {
        self.drain.stop()
    }

    /// Whether the drain thread is running
    pub fn is_listening(&self) -> bool {
        self.drain.is_listening()
    }

    /// Listen for the lifetime of the returned guard
    ///
    /// If the drain was already running the guard leaves it running on drop.
    pub fn listen(&self) -> CacheResult<ListeningGuard<'_>> {
        let started = self.start_listening()?;
        Ok(ListeningGuard { cache: self, started })
    }

    /// Commit every queued write on the calling thread
    pub fn flush(&self) -> DrainReport {
        self.drain.flush(&self.store)
    }

    /// Current metadata
    pub fn metadata(&self) -> CacheResult<CacheMetadata> {
        Ok(self.metadata.lock().map_err(|_| CacheError::Poisoned)?.clone())
    }

    /// Record whether bounds exist for every baseline partition
    pub fn set_baseline_bounds_built(&self, built: bool) -> CacheResult<()> {
        let mut metadata = self.metadata.lock().map_err(|_| CacheError::Poisoned)?;
        metadata.baseline_bounds_built = built;
        metadata.save(&self.config.directory)
    }

    /// Drop every entry of `namespace`, optionally compacting the store afterwards
    pub fn clear(&self, namespace: Namespace, resize: bool) -> CacheResult<()> {
        {
            let mut store = self.store.write().map_err(|_| CacheError::Poisoned)?;
            store.log_mut(namespace).reset()?;
        }
        info!("Cleared cache namespace {namespace:?}");
        if namespace == Namespace::BaselineBounds {
            self.set_baseline_bounds_built(false)?;
        }
        if resize {
            self.resize()?;
        }
        Ok(())
    }

    /// Drop every entry of every namespace
    pub fn clear_all(&self) -> CacheResult<()> {
        for namespace in Namespace::ALL {
            self.clear(namespace, false)?;
        }
        Ok(())
    }

    /// Entry counts and sizes per namespace
    pub fn stats(&self) -> CacheResult<CacheStats> {
        let store = self.read_store()?;
        Ok(CacheStats {
            namespaces: Namespace::ALL
                .iter()
                .map(|namespace| NamespaceStats {
                    namespace: *namespace,
                    log: store.log(*namespace).stats(),
                })
                .collect(),
        })
    }

    /// Whether `namespace` has grown large enough, relative to free disk space, to compact
    pub fn should_resize(&self, namespace: Namespace, available_disk_bytes: u64) -> CacheResult<bool> {
        let estimated = self
            .stats()?
            .get(namespace)
            .map_or(0, NamespaceStats::estimated_bytes) as f64;
        Ok(estimated >= available_disk_bytes as f64 * self.config.resize_free_space_ratio)
    }

    /// Rebuild the store in a fresh directory holding only live entries
    ///
    /// Live entries and the metadata are copied into a sibling
    /// `temp_cache_<uuid>` directory, the old directory is deleted and the new
    /// one is moved into its place. A crash between the delete and the move
    /// leaves the cache under the temporary name.
    pub fn resize(&self) -> CacheResult<()> {
        if self.is_listening() {
            return Err(CacheError::Busy("stop listening before resizing"));
        }
        self.flush();

        let mut store = self.store.write().map_err(|_| CacheError::Poisoned)?;
        let root = self.config.directory.clone();
        let parent = root
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let temp_root = parent.join(format!("temp_cache_{}", uuid::Uuid::new_v4()));

        {
            let mut fresh = Store::open(&temp_root)?;
            for namespace in Namespace::ALL {
                let entries = store.log(namespace).entries()?;
                fresh.log_mut(namespace).append(&entries)?;
            }
        }
        let metadata_path = root.join(metadata::METADATA_FILE);
        if metadata_path.exists() {
            std::fs::copy(&metadata_path, temp_root.join(metadata::METADATA_FILE))?;
        }

        let before = store.log(Namespace::BaselineContent).stats().file_bytes;
        std::fs::remove_dir_all(&root)?;
        std::fs::rename(&temp_root, &root)?;
        *store = Store::open(&root)?;
        info!(
            "Resized cache at {} (baseline content {} -> {} bytes)",
            root.display(),
            before,
            store.log(Namespace::BaselineContent).stats().file_bytes
        );
        Ok(())
    }

    /// Write every baseline bound to `path` with the cache's version stamp
    pub fn export_bounds(&self, path: &Path) -> CacheResult<usize> {
        let metadata = self.metadata()?;
        let dump = BoundsDump {
            content_version: metadata.content_version,
            tool_version: metadata.tool_version,
            partitions: self.bounds(Namespace::BaselineBounds)?,
        };
        let payload = encode(&dump)?;
        let payload_len = u32::try_from(payload.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "bounds dump too large"))?;

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            writer.write_all(BOUNDS_DUMP_MAGIC)?;
            writer.write_all(&BOUNDS_DUMP_VERSION.to_le_bytes())?;
            writer.write_all(&payload_len.to_le_bytes())?;
            writer.write_all(&crc32fast::hash(&payload).to_le_bytes())?;
            writer.write_all(&payload)?;
            writer.flush()?;
            let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, path)?;
        info!("Dumped {} partition bounds to {}", dump.partitions.len(), path.display());
        Ok(dump.partitions.len())
    }

    /// Replace the baseline bounds with those of a dump written by [`Self::export_bounds`]
    pub fn import_bounds(&self, path: &Path) -> CacheResult<usize> {
        let dump: BoundsDump = read_bounds_dump(path)?;
        let metadata = self.metadata()?;
        if !metadata.matches(&dump.content_version, &dump.tool_version) {
            return Err(CacheError::VersionMismatch {
                found_content: dump.content_version,
                found_tool: dump.tool_version,
                expected_content: metadata.content_version,
                expected_tool: metadata.tool_version,
            });
        }

        let mut entries = Vec::with_capacity(dump.partitions.len());
        for (key, aabb) in &dump.partitions {
            entries.push((normalize_key(key), encode(aabb)?));
        }
        {
            let mut store = self.store.write().map_err(|_| CacheError::Poisoned)?;
            let log = store.log_mut(Namespace::BaselineBounds);
            log.reset()?;
            log.append(&entries)?;
        }
        self.set_baseline_bounds_built(true)?;
        info!("Loaded {} partition bounds from {}", entries.len(), path.display());
        Ok(entries.len())
    }
}

fn read_bounds_dump(path: &Path) -> CacheResult<BoundsDump> {
    let corrupt = |reason: &str| CacheError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let mut reader = BufReader::new(File::open(path)?);
    let mut header = [0u8; 16];
    reader.read_exact(&mut header).map_err(|_| corrupt("truncated header"))?;
    if &header[0..4] != BOUNDS_DUMP_MAGIC {
        return Err(corrupt("not a bounds dump"));
    }
    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != BOUNDS_DUMP_VERSION {
        return Err(corrupt("unsupported bounds dump version"));
    }
    let payload_len = u32::from_le_bytes([header[8], header[9], header[10], header[11]]) as usize;
    let checksum = u32::from_le_bytes([header[12], header[13], header[14], header[15]]);

    let mut payload = vec![0u8; payload_len];
    reader.read_exact(&mut payload).map_err(|_| corrupt("truncated payload"))?;
    if crc32fast::hash(&payload) != checksum {
        return Err(corrupt("checksum mismatch"));
    }
    decode(&payload)
}

/// Keeps the write drain running while alive
pub struct ListeningGuard<'a> {
    cache: &'a ContentCache,
    started: bool,
}

impl ListeningGuard<'_> {
    /// Stop now and report what was written
    pub fn finish(mut self) -> CacheResult<DrainReport> {
        if !self.started {
            return Ok(DrainReport::default());
        }
        self.started = false;
        self.cache.stop_listening()
    }
}

impl Drop for ListeningGuard<'_> {
    fn drop(&mut self) {
        if self.started {
            if let Err(error) = self.cache.stop_listening() {
                warn!("Stopping the cache write drain failed: {error}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use tempfile::tempdir;

    fn config(root: &Path) -> CacheConfig {
        CacheConfig {
            content_version: "1.0".to_string(),
            tool_version: "test".to_string(),
            ..CacheConfig::at(root.join("cache"))
        }
    }

    fn unit_bounds(offset: f32) -> AABB {
        AABB::new(Vec3::repeat(offset), Vec3::repeat(offset + 1.0))
    }

    #[test]
    fn test_enqueued_writes_are_readable_after_stop() {
        let dir = tempdir().expect("temp dir");
        let cache = ContentCache::open(config(dir.path())).expect("open");

        let guard = cache.listen().expect("listen");
        cache
            .enqueue_encoded("Base\\A.streamingsector", &unit_bounds(0.0), Namespace::BaselineBounds)
            .expect("enqueue");
        let report = guard.finish().expect("finish");

        assert_eq!(report.written, 1);
        let stored: Option<AABB> = cache
            .get_decoded("base/a.streamingsector", Namespace::BaselineBounds)
            .expect("get");
        assert_eq!(stored, Some(unit_bounds(0.0)));
    }

    #[test]
    fn test_reopen_keeps_entries_and_version_change_clears() {
        let dir = tempdir().expect("temp dir");
        {
            let cache = ContentCache::open(config(dir.path())).expect("open");
            cache.enqueue_write("k", vec![7], Namespace::AddedContent).expect("enqueue");
            cache.flush();
        }
        {
            let cache = ContentCache::open(config(dir.path())).expect("reopen");
            assert_eq!(cache.get("k", Namespace::AddedContent).expect("get"), Some(vec![7]));
        }

        let mut newer = config(dir.path());
        newer.content_version = "2.0".to_string();
        let cache = ContentCache::open(newer).expect("open newer");
        assert_eq!(cache.get("k", Namespace::AddedContent).expect("get"), None);
        assert_eq!(cache.metadata().expect("metadata").content_version, "2.0");
    }

    #[test]
    fn test_get_first_follows_namespace_order() {
        let dir = tempdir().expect("temp dir");
        let cache = ContentCache::open(config(dir.path())).expect("open");
        cache.enqueue_write("k", vec![1], Namespace::AddedContent).expect("enqueue");
        cache.enqueue_write("k", vec![2], Namespace::BaselineContent).expect("enqueue");
        cache.flush();

        let hit = cache
            .get_first("k", &[Namespace::BaselineContent, Namespace::AddedContent])
            .expect("get");
        assert_eq!(hit, Some((Namespace::BaselineContent, vec![2])));
        let added_only = cache.get_first("k", &[Namespace::AddedContent]).expect("get");
        assert_eq!(added_only, Some((Namespace::AddedContent, vec![1])));
    }

    #[test]
    fn test_clear_resets_bounds_flag_and_stats() {
        let dir = tempdir().expect("temp dir");
        let cache = ContentCache::open(config(dir.path())).expect("open");
        for index in 0..3 {
            cache
                .enqueue_encoded(&format!("p{index}"), &unit_bounds(index as f32), Namespace::BaselineBounds)
                .expect("enqueue");
        }
        cache.flush();
        cache.set_baseline_bounds_built(true).expect("flag");

        let stats = cache.stats().expect("stats");
        let bounds_stats = stats.get(Namespace::BaselineBounds).copied();
        assert_eq!(bounds_stats.map(|stats| stats.log.entries), Some(3));
        assert_eq!(bounds_stats.map(|stats| stats.estimated_bytes()), Some(3 * ESTIMATED_BOUNDS_ENTRY_BYTES));

        cache.clear(Namespace::BaselineBounds, false).expect("clear");
        assert!(cache.keys(Namespace::BaselineBounds).expect("keys").is_empty());
        assert!(!cache.metadata().expect("metadata").baseline_bounds_built);
    }

    #[test]
    fn test_resize_preserves_live_entries() {
        let dir = tempdir().expect("temp dir");
        let cache = ContentCache::open(config(dir.path())).expect("open");
        for round in 0..3u8 {
            cache.enqueue_write("same", vec![round; 64], Namespace::BaselineContent).expect("enqueue");
            cache.flush();
        }
        cache.enqueue_write("other", vec![9], Namespace::AddedBounds).expect("enqueue");
        cache.flush();
        let before = cache.stats().expect("stats").total_file_bytes();

        cache.resize().expect("resize");

        assert!(cache.stats().expect("stats").total_file_bytes() < before);
        assert_eq!(cache.get("same", Namespace::BaselineContent).expect("get"), Some(vec![2; 64]));
        assert_eq!(cache.get("other", Namespace::AddedBounds).expect("get"), Some(vec![9]));
        assert_eq!(cache.metadata().expect("metadata").content_version, "1.0");
        let leftovers = std::fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("temp_cache_"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_resize_refused_while_listening() {
        let dir = tempdir().expect("temp dir");
        let cache = ContentCache::open(config(dir.path())).expect("open");
        let _guard = cache.listen().expect("listen");
        assert!(matches!(cache.resize(), Err(CacheError::Busy(_))));
    }

    #[test]
    fn test_should_resize_compares_against_free_space() {
        let dir = tempdir().expect("temp dir");
        let cache = ContentCache::open(config(dir.path())).expect("open");
        for index in 0..10 {
            cache
                .enqueue_encoded(&format!("p{index}"), &unit_bounds(0.0), Namespace::BaselineBounds)
                .expect("enqueue");
        }
        cache.flush();

        let estimated = 10 * ESTIMATED_BOUNDS_ENTRY_BYTES;
        assert!(cache.should_resize(Namespace::BaselineBounds, estimated).expect("check"));
        assert!(!cache.should_resize(Namespace::BaselineBounds, estimated * 100).expect("check"));
        assert!(!cache.should_resize(Namespace::AddedBounds, estimated).expect("check"));
    }

    #[test]
    fn test_bounds_dump_round_trip_and_version_guard() {
        let dir = tempdir().expect("temp dir");
        let dump_path = dir.path().join("dumps").join("bounds.bin");
        {
            let cache = ContentCache::open(config(dir.path())).expect("open");
            cache.enqueue_encoded("p0", &unit_bounds(0.0), Namespace::BaselineBounds).expect("enqueue");
            cache.enqueue_encoded("p1", &unit_bounds(5.0), Namespace::BaselineBounds).expect("enqueue");
            cache.flush();
            assert_eq!(cache.export_bounds(&dump_path).expect("export"), 2);
            cache.clear(Namespace::BaselineBounds, false).expect("clear");

            assert_eq!(cache.import_bounds(&dump_path).expect("import"), 2);
            let stored: Option<AABB> = cache.get_decoded("p1", Namespace::BaselineBounds).expect("get");
            assert_eq!(stored, Some(unit_bounds(5.0)));
            assert!(cache.metadata().expect("metadata").baseline_bounds_built);
        }

        let mut other = config(dir.path());
        other.tool_version = "other".to_string();
        let cache = ContentCache::open(other).expect("open other");
        assert!(matches!(
            cache.import_bounds(&dump_path),
            Err(CacheError::VersionMismatch { .. })
        ));

        let mut bytes = std::fs::read(&dump_path).expect("read dump");
        let last = bytes.len() - 1;
        bytes[last] ^= 0x55;
        std::fs::write(&dump_path, bytes).expect("write dump");
        assert!(matches!(cache.import_bounds(&dump_path), Err(CacheError::Corrupt { .. })));
    }
}
