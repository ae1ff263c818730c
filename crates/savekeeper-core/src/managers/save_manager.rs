//! Active profile lifecycle: load-or-create, score submission, persistence.
//!
//! One `SaveManager` is constructed per application and handed to whoever
//! needs it; clones share the same active profile.
//!
//! # Failure Semantics
//!
//! Nothing here returns an error or panics on I/O trouble. Every failure is
//! reported to the `LogSink` and ends in a safe default (a fresh profile) or a
//! no-op (`false` / `None`).

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::SaveConfig;
use crate::event_bus::{SaveEvent, SaveEventBus};
use crate::interaction::InteractionGate;
use crate::logging::{LogSink, Severity};
use crate::persistence::{
    CipherAdapter, CodecError, ProfileCodec, ProfileStore, ProgressData, StoreError, WriteReport,
};

use super::scores::ScoreAggregator;

/// Profile name used when a host needs a profile before the player has
/// entered one.
pub const DEFAULT_PROFILE_NAME: &str = "Default";

#[derive(Error, Debug)]
enum PersistError {
    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Codec(#[from] CodecError),
}

/// Completion handle for a background persist started by
/// [`SaveManager::submit_score`].
///
/// Dropping it does not cancel the persist.
pub struct PersistHandle {
    task: JoinHandle<bool>,
}

impl PersistHandle {
    /// Wait for the persist to finish. `true` if the write succeeded.
    pub async fn wait(self) -> bool {
        self.task.await.unwrap_or(false)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[derive(Clone)]
pub struct SaveManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: ProfileStore,
    codec: ProfileCodec,
    gate: InteractionGate,
    sink: Arc<dyn LogSink>,
    events: SaveEventBus,
    active: Mutex<Option<ProgressData>>,
    /// Held for the whole of a physical write so writes never interleave.
    write_lock: tokio::sync::Mutex<()>,
}

impl SaveManager {
    pub fn new(
        store: ProfileStore,
        codec: ProfileCodec,
        gate: InteractionGate,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                codec,
                gate,
                sink,
                events: SaveEventBus::new(),
                active: Mutex::new(None),
                write_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// A file system backed manager configured from `config`.
    ///
    /// `gate` is shared with the host, which opens it on the first user
    /// interaction.
    pub fn from_config(config: &SaveConfig, gate: InteractionGate, sink: Arc<dyn LogSink>) -> Self {
        let store = ProfileStore::from_config(config, sink.clone());
        let codec = ProfileCodec::new(CipherAdapter::aes(config.ciphering_enabled), sink.clone());
        Self::new(store, codec, gate, sink)
    }

    /// An aggregator reading the same directory with the same codec and gate.
    pub fn score_aggregator(&self) -> ScoreAggregator {
        ScoreAggregator::new(
            self.inner.store.clone(),
            self.inner.codec.clone(),
            self.inner.gate.clone(),
            self.inner.sink.clone(),
        )
    }

    pub fn store(&self) -> &ProfileStore {
        &self.inner.store
    }

    pub fn gate(&self) -> &InteractionGate {
        &self.inner.gate
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SaveEvent> {
        self.inner.events.subscribe()
    }

    /// Snapshot of the active profile.
    pub fn active_profile(&self) -> Option<ProgressData> {
        self.lock_active().clone()
    }

    // ------------------------------------------------------------------------
    // Profile lifecycle
    // ------------------------------------------------------------------------

    /// Make `profile_name` the active profile.
    ///
    /// Loads its save file if one exists and decodes. Otherwise, including
    /// when the file is corrupt, a fresh profile becomes active and is written
    /// over whatever was there.
    pub async fn load_or_create(&self, profile_name: &str) {
        if let Err(e) = self.inner.store.path_for(profile_name) {
            self.report(&e.to_string(), Severity::Error);
            return;
        }

        let loaded = self
            .inner
            .store
            .read_profile_text(profile_name)
            .and_then(|text| self.inner.codec.from_stored(&text));

        match loaded {
            Some(data) => {
                log::info!(
                    "loaded profile {} with {} metrics",
                    data.profile_name,
                    data.progress_metrics.len()
                );
                *self.lock_active() = Some(data);
                self.inner.events.emit(SaveEvent::ProfileLoaded {
                    profile_name: profile_name.to_string(),
                });
            }
            None => {
                log::info!("creating profile {profile_name}");
                *self.lock_active() = Some(ProgressData::new(profile_name));
                self.inner.events.emit(SaveEvent::ProfileCreated {
                    profile_name: profile_name.to_string(),
                });
                self.persist().await;
            }
        }
    }

    /// Load or create the [`DEFAULT_PROFILE_NAME`] profile.
    pub async fn load_default_profile(&self) {
        self.load_or_create(DEFAULT_PROFILE_NAME).await;
    }

    /// Drop the active profile. Storage is untouched.
    pub fn unload(&self) {
        if let Some(data) = self.lock_active().take() {
            self.inner.events.emit(SaveEvent::ProfileUnloaded {
                profile_name: data.profile_name,
            });
        }
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Write the active profile to storage.
    ///
    /// Waits for the interaction gate first. Returns `false` if there is no
    /// active profile or the write failed; the in-memory profile is never
    /// modified here.
    pub async fn persist(&self) -> bool {
        self.persist_snapshot(None).await
    }

    /// Persist `submitted`, or the active profile when there is none.
    ///
    /// A submitted snapshot is replaced by the active profile only while that
    /// profile is still active, so an unload or switch in the meantime never
    /// drops the submitted update.
    async fn persist_snapshot(&self, submitted: Option<ProgressData>) -> bool {
        if !self.inner.gate.is_open() {
            self.report("Save delayed - waiting for user interaction", Severity::Warning);
            self.inner.gate.wait().await;
        }

        let _write = self.inner.write_lock.lock().await;

        // Snapshot under the write lock so the last write carries the newest state.
        let data = match (submitted, self.active_profile()) {
            (Some(submitted), Some(active)) if active.profile_name == submitted.profile_name => {
                active
            }
            (Some(submitted), _) => submitted,
            (None, Some(active)) => active,
            (None, None) => {
                self.report("Profile not loaded", Severity::Error);
                return false;
            }
        };

        match self.write_profile(&data).await {
            Ok(report) => {
                log::debug!("saved profile {} ({report:?})", data.profile_name);
                self.inner.events.emit(SaveEvent::ProfileSaved {
                    profile_name: data.profile_name,
                    report,
                });
                true
            }
            Err(e) => {
                let message = format!("Could not save locally {e}");
                self.report(&message, Severity::Error);
                self.inner.events.emit(SaveEvent::SaveFailed {
                    profile_name: data.profile_name,
                    message,
                });
                false
            }
        }
    }

    async fn write_profile(&self, data: &ProgressData) -> Result<WriteReport, PersistError> {
        let location = self.inner.store.path_for(&data.profile_name)?;
        let text = self.inner.codec.to_stored(data)?;
        Ok(self.inner.store.try_write_text(&location, &text).await?)
    }

    /// Record a time for a level on the active profile and persist in the
    /// background.
    ///
    /// The in-memory update happens before this returns, so updates apply in
    /// call order. The returned handle may be awaited or dropped. `None` when
    /// no profile is active, `time` is not finite, or there is no tokio
    /// runtime to persist on.
    pub fn submit_score(&self, level_id: i32, time: f64) -> Option<PersistHandle> {
        // JSON has no encoding for NaN or infinity.
        if !time.is_finite() {
            self.report(
                &format!("Invalid time {time} for level {level_id}"),
                Severity::Error,
            );
            return None;
        }

        let snapshot = {
            let mut active = self.lock_active();
            let Some(data) = active.as_mut() else {
                self.report("Profile not loaded", Severity::Error);
                return None;
            };
            data.record_time(level_id, time);
            data.clone()
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                self.report(&format!("Could not save locally {e}"), Severity::Error);
                return None;
            }
        };

        let manager = self.clone();
        Some(PersistHandle {
            task: runtime.spawn(async move { manager.persist_snapshot(Some(snapshot)).await }),
        })
    }

    // ------------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------------

    /// Record a user-driven interaction, releasing any deferred writes.
    pub fn notify_interaction(&self) {
        self.inner.gate.open();
    }

    /// Window focus callback; gaining focus counts as an interaction.
    pub fn on_focus_changed(&self, focused: bool) {
        if focused {
            self.notify_interaction();
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ProgressData>> {
        self.inner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn report(&self, message: &str, severity: Severity) {
        self.inner.sink.send(message, severity);
    }
}

// ============================================================================
// TESTS
// ============================================================================
