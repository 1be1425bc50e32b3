//! The per-request recording state machine.
//!
//! One [`RequestRecorder`] exists per middleware instance; it owns the
//! configuration, key builder, store handle, and persistence predicate.
//! [`RequestRecorder::begin`] creates a [`RequestLog`] for one request and
//! starts its lifecycle: asynchronous ID acquisition, the delayed pending
//! write, and finally the authoritative completion write.
//!
//! Store I/O for one record is serialized by a per-record write mutex, so
//! at most one write is in flight and a stale key is always deleted before
//! its replacement is set, never after.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Mutex as WriteMutex, watch};
use tokio::time::Instant;
use tracing::{debug, warn};

use reqlog_core::config::RecorderConfig;
use reqlog_core::result::LogResult;
use reqlog_core::traits::store::LogStore;
use reqlog_core::types::LogType;
use reqlog_store::handle::StoreHandle;
use reqlog_store::keys::KeyBuilder;

use crate::record::{RecordInfo, classify, round_sig_figs};

/// Predicate deciding whether a record may be persisted under a type.
///
/// Consulted before every individual write; returning `false` skips that
/// one write without discarding the record.
pub type MustLog = Arc<dyn Fn(LogType, &RecordInfo) -> bool + Send + Sync>;

/// Outcome of the asynchronous record-ID acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdState {
    Pending,
    Acquired(i64),
    Failed,
}

/// Per-middleware recorder: configuration, keys, store, and predicate.
pub struct RequestRecorder {
    config: RecorderConfig,
    keys: KeyBuilder,
    store: StoreHandle,
    must_log: MustLog,
}

impl RequestRecorder {
    /// Create a recorder from configuration.
    ///
    /// Fails fast on an invalid project name; the store connection itself
    /// is opened lazily on first use.
    pub fn new(config: RecorderConfig) -> LogResult<Self> {
        let keys = KeyBuilder::new(&config.project, config.environment)?;
        let store = StoreHandle::new(config.store.clone(), config.environment);
        Ok(Self::assemble(config, keys, store))
    }

    /// Create a recorder over an existing store provider (for testing).
    pub fn with_store(config: RecorderConfig, store: Arc<dyn LogStore>) -> LogResult<Self> {
        let keys = KeyBuilder::new(&config.project, config.environment)?;
        Ok(Self::assemble(config, keys, StoreHandle::from_store(store)))
    }

    fn assemble(config: RecorderConfig, keys: KeyBuilder, store: StoreHandle) -> Self {
        let allowed = config.log_types.clone();
        let must_log: MustLog = Arc::new(move |ty, _info| allowed.contains(&ty));
        Self {
            config,
            keys,
            store,
            must_log,
        }
    }

    /// Replace the persistence predicate.
    ///
    /// The default predicate checks the configured `log_types` allow-list.
    pub fn with_must_log(
        mut self,
        predicate: impl Fn(LogType, &RecordInfo) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.must_log = Arc::new(predicate);
        self
    }

    /// The recorder's configuration.
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Start recording one request.
    ///
    /// Spawns the ID acquisition and delayed pending write; returns the
    /// handle that handlers and the middleware use from here on.
    pub fn begin(self: &Arc<Self>, info: RecordInfo) -> RequestLog {
        let (id_tx, id_rx) = watch::channel(IdState::Pending);

        let inner = Arc::new(RecordInner {
            recorder: Arc::clone(self),
            started: Instant::now(),
            state: Mutex::new(RecordState {
                id: None,
                info,
                write_scheduled: true,
                discarded: false,
                completed: false,
                last_written: None,
            }),
            write_lock: WriteMutex::new(()),
            id_rx,
        });

        let task = Arc::clone(&inner);
        tokio::spawn(async move {
            task.acquire_and_schedule(id_tx).await;
        });

        RequestLog { inner }
    }
}

impl std::fmt::Debug for RequestRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRecorder")
            .field("project", &self.config.project)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

/// Mutable per-record state, guarded by a short-lived sync lock.
struct RecordState {
    /// Store-assigned record ID; immutable once set.
    id: Option<i64>,
    /// The record payload.
    info: RecordInfo,
    /// Whether the delayed pending write is still outstanding.
    write_scheduled: bool,
    /// Set by `ignore()` or a failed ID acquisition; permanent.
    discarded: bool,
    /// Set once completion handling has run.
    completed: bool,
    /// Type of the most recent persisted entry, for stale-key cleanup.
    last_written: Option<LogType>,
}

struct RecordInner {
    recorder: Arc<RequestRecorder>,
    /// Monotonic request start, for duration measurement.
    started: Instant,
    state: Mutex<RecordState>,
    /// Serializes store writes for this record.
    write_lock: WriteMutex<()>,
    id_rx: watch::Receiver<IdState>,
}

impl RecordInner {
    fn lock(&self) -> std::sync::MutexGuard<'_, RecordState> {
        self.state.lock().expect("record state lock")
    }

    /// Acquire the record ID, then run the delayed pending write.
    async fn acquire_and_schedule(&self, id_tx: watch::Sender<IdState>) {
        let counter = self.recorder.keys.counter();
        let id = match self.recorder.store.incr(&counter).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Failed to acquire record id; request goes unlogged");
                let mut state = self.lock();
                state.discarded = true;
                state.write_scheduled = false;
                drop(state);
                let _ = id_tx.send(IdState::Failed);
                return;
            }
        };

        self.lock().id = Some(id);
        let _ = id_tx.send(IdState::Acquired(id));

        tokio::time::sleep(self.recorder.config.pending_delay()).await;
        self.scheduled_write().await;
    }

    /// The delayed pending write, if the record is still live.
    async fn scheduled_write(&self) {
        let _guard = self.write_lock.lock().await;
        {
            let mut state = self.lock();
            if state.discarded || state.completed || !state.write_scheduled {
                return;
            }
            state.write_scheduled = false;
        }
        self.persist(LogType::Pending).await;
    }

    /// Completion handling: cancel the scheduled write, stamp duration and
    /// status, classify, and perform the authoritative final write.
    async fn complete(&self, status: u16, elapsed: Duration) {
        // The record is unusable until ID acquisition resolves.
        let mut id_rx = self.id_rx.clone();
        let acquired = match id_rx.wait_for(|s| *s != IdState::Pending).await {
            Ok(state) => matches!(*state, IdState::Acquired(_)),
            Err(_) => false,
        };
        if !acquired {
            return;
        }

        let _guard = self.write_lock.lock().await;
        let ty = {
            let mut state = self.lock();
            if state.discarded || state.completed {
                return;
            }
            state.completed = true;
            state.write_scheduled = false;
            state.info.duration = Some(round_sig_figs(elapsed.as_secs_f64(), 3));
            state.info.status = Some(status);
            classify(&state.info, self.recorder.config.slow_time_seconds)
        };
        self.persist(ty).await;
    }

    /// Re-classify and re-write, unless a scheduled write will pick the
    /// mutations up anyway.
    async fn update(&self) {
        let _guard = self.write_lock.lock().await;
        let ty = {
            let state = self.lock();
            if state.discarded || state.write_scheduled || state.id.is_none() {
                return;
            }
            classify(&state.info, self.recorder.config.slow_time_seconds)
        };
        self.persist(ty).await;
    }

    /// Persist the record under `ty`. Caller must hold `write_lock`.
    ///
    /// A stale entry under a different type is deleted before the new key
    /// is set. All store errors are logged and swallowed.
    async fn persist(&self, ty: LogType) {
        let (id, previous, payload) = {
            let state = self.lock();
            let Some(id) = state.id else { return };
            if !(self.recorder.must_log)(ty, &state.info) {
                debug!(id, log_type = %ty, "Write suppressed by predicate");
                return;
            }
            let payload = match serde_json::to_string(&state.info) {
                Ok(json) => json,
                Err(e) => {
                    warn!(id, error = %e, "Failed to serialize record");
                    return;
                }
            };
            (id, state.last_written, payload)
        };

        if let Some(old) = previous.filter(|p| *p != ty) {
            let old_key = self.recorder.keys.entry(old, id);
            if let Err(e) = self.recorder.store.delete(&old_key).await {
                warn!(key = %old_key, error = %e, "Failed to delete stale record key");
            }
        }

        let key = self.recorder.keys.entry(ty, id);
        let ttl = self.recorder.config.ttl.for_type(ty);
        match self.recorder.store.set(&key, &payload, ttl).await {
            Ok(()) => {
                self.lock().last_written = Some(ty);
                debug!(key = %key, ttl_seconds = ttl.as_secs(), "Record written");
            }
            Err(e) => warn!(key = %key, error = %e, "Failed to write record"),
        }
    }
}

/// Handle to one request's record, attached to the request and response
/// extensions by the middleware.
///
/// Cloning is cheap; all clones refer to the same record.
#[derive(Clone)]
pub struct RequestLog {
    inner: Arc<RecordInner>,
}

impl RequestLog {
    /// Mutate the record payload.
    ///
    /// Mutations made while the pending write is still scheduled are
    /// picked up by that write; afterwards, call [`update`](Self::update)
    /// to re-persist.
    pub fn with_info<R>(&self, f: impl FnOnce(&mut RecordInfo) -> R) -> R {
        f(&mut self.inner.lock().info)
    }

    /// A snapshot of the current record payload.
    pub fn info(&self) -> RecordInfo {
        self.inner.lock().info.clone()
    }

    /// The store-assigned record ID, once acquired.
    pub fn id(&self) -> Option<i64> {
        self.inner.lock().id
    }

    /// Re-evaluate the record's classification and write it again.
    ///
    /// Fire-and-forget. No-op while the initial write is still scheduled
    /// (the scheduled write picks up any `info` mutations) and after
    /// [`ignore`](Self::ignore).
    pub fn update(&self) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.update().await;
        });
    }

    /// Discard the record: cancel the scheduled write and suppress every
    /// future write, including the completion write.
    ///
    /// An entry already persisted before this call is left in the store
    /// to expire by its TTL; `ignore` never deletes.
    pub fn ignore(&self) {
        let mut state = self.inner.lock();
        state.discarded = true;
        state.write_scheduled = false;
    }

    /// Record the response outcome and trigger the final write.
    ///
    /// Called by the middleware when the response head is ready;
    /// fire-and-forget so the response is never delayed by store I/O.
    pub fn finish(&self, status: u16) {
        let elapsed = self.inner.started.elapsed();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.complete(status, elapsed).await;
        });
    }
}

impl std::fmt::Debug for RequestLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("RequestLog")
            .field("id", &state.id)
            .field("discarded", &state.discarded)
            .field("completed", &state.completed)
            .field("last_written", &state.last_written)
            .finish_non_exhaustive()
    }
}
