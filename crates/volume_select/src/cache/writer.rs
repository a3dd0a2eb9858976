//! Write queue and the background drain that commits it
//!
//! Producers push [`WriteRequest`]s onto a crossbeam channel from any
//! thread. While listening, a dedicated thread wakes every interval, takes
//! everything queued, groups it by namespace and commits the batch under a
//! single store write lock. The thread keeps going until listening has been
//! switched off *and* the queue is empty, so nothing enqueued before
//! [`WriteDrain::stop`] is lost.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use log::{debug, error, info};

use crate::cache::namespace::Namespace;
use crate::cache::store::Store;
use crate::cache::CacheError;

/// One pending cache write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    /// Normalized key
    pub key: String,
    /// Serialized value
    pub value: Vec<u8>,
    /// Target namespace
    pub namespace: Namespace,
}

/// Totals of one drain session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Entries committed
    pub written: usize,
    /// Entries that failed to commit
    pub failed: usize,
    /// Commit cycles that found work
    pub cycles: usize,
}

impl DrainReport {
    fn absorb(&mut self, other: Self) {
        self.written += other.written;
        self.failed += other.failed;
        self.cycles += other.cycles;
    }
}

/// Owner of the write queue and the drain thread's lifecycle
pub struct WriteDrain {
    sender: Sender<WriteRequest>,
    receiver: Receiver<WriteRequest>,
    listening: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<DrainReport>>>,
    interval: Duration,
}

impl WriteDrain {
    /// Queue with an optional bound; a full bounded queue blocks producers
    pub fn new(capacity: Option<usize>, interval: Duration) -> Self {
        let (sender, receiver) = match capacity {
            Some(capacity) => bounded(capacity),
            None => unbounded(),
        };
        Self {
            sender,
            receiver,
            listening: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
            interval,
        }
    }

    /// Whether the drain thread is running
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Number of queued writes
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Queue a write
    ///
    /// When the queue is bounded and full and nobody is draining, the
    /// backlog is committed on the calling thread first.
    pub fn enqueue(&self, mut request: WriteRequest, store: &RwLock<Store>) -> Result<(), CacheError> {
        loop {
            match self.sender.try_send(request) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Disconnected(_)) => return Err(CacheError::QueueClosed),
                Err(TrySendError::Full(returned)) => {
                    if self.is_listening() {
                        return self
                            .sender
                            .send(returned)
                            .map_err(|_| CacheError::QueueClosed);
                    }
                    self.flush(store);
                    request = returned;
                }
            }
        }
    }

    /// Commit everything queued right now on the calling thread
    pub fn flush(&self, store: &RwLock<Store>) -> DrainReport {
        let batch: Vec<WriteRequest> = self.receiver.try_iter().collect();
        commit(store, batch)
    }

    /// Spawn the drain thread; returns `false` if it was already running
    pub fn start(&self, store: Arc<RwLock<Store>>) -> Result<bool, CacheError> {
        let mut worker = self.worker.lock().map_err(|_| CacheError::Poisoned)?;
        if worker.is_some() {
            return Ok(false);
        }

        self.listening.store(true, Ordering::SeqCst);
        let listening = Arc::clone(&self.listening);
        let receiver = self.receiver.clone();
        let interval = self.interval;
        let handle = thread::Builder::new()
            .name("cache-drain".to_string())
            .spawn(move || drain_loop(&store, &receiver, &listening, interval))?;
        *worker = Some(handle);
        debug!("Cache write drain started");
        Ok(true)
    }

    /// Stop listening and wait until the queue has been drained
    pub fn stop(&self) -> Result<DrainReport, CacheError> {
        let handle = self
            .worker
            .lock()
            .map_err(|_| CacheError::Poisoned)?
            .take();
        self.listening.store(false, Ordering::SeqCst);
        let Some(handle) = handle else {
            return Ok(DrainReport::default());
        };
        let report = handle.join().map_err(|_| CacheError::DrainPanicked)?;
        debug!(
            "Cache write drain stopped: {} written, {} failed in {} cycles",
            report.written, report.failed, report.cycles
        );
        Ok(report)
    }
}

impl Drop for WriteDrain {
    fn drop(&mut self) {
        if let Err(error) = self.stop() {
            error!("Cache write drain did not shut down cleanly: {error}");
        }
    }
}

fn drain_loop(
    store: &RwLock<Store>,
    receiver: &Receiver<WriteRequest>,
    listening: &AtomicBool,
    interval: Duration,
) -> DrainReport {
    let mut report = DrainReport::default();
    let mut announced_tail = false;
    loop {
        thread::sleep(interval);
        let still_listening = listening.load(Ordering::SeqCst);
        let batch: Vec<WriteRequest> = receiver.try_iter().collect();
        if batch.is_empty() {
            if still_listening {
                continue;
            }
            break;
        }
        if !still_listening && !announced_tail {
            info!("Writing {} queued cache entries after the drain was stopped", batch.len() + receiver.len());
            announced_tail = true;
        }
        report.absorb(commit(store, batch));
    }
    report
}

/// Group a batch by namespace and commit it under one write lock
fn commit(store: &RwLock<Store>, batch: Vec<WriteRequest>) -> DrainReport {
    if batch.is_empty() {
        return DrainReport::default();
    }

    let mut grouped: BTreeMap<Namespace, Vec<(String, Vec<u8>)>> = BTreeMap::new();
    for request in batch {
        grouped
            .entry(request.namespace)
            .or_default()
            .push((request.key, request.value));
    }

    let mut report = DrainReport {
        cycles: 1,
        ..DrainReport::default()
    };
    let mut store = match store.write() {
        Ok(store) => store,
        Err(poisoned) => poisoned.into_inner(),
    };
    for (namespace, entries) in grouped {
        match store.log_mut(namespace).append(&entries) {
            Ok(()) => report.written += entries.len(),
            Err(write_error) => {
                for (key, _) in &entries {
                    error!("Failed to write cache entry {key} to {namespace:?}: {write_error}");
                }
                report.failed += entries.len();
            }
        }
    }
    report
}
