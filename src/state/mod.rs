//! Debate domain core and the shared application state.

/// Live session tasks.
pub mod live;
/// Capture binding for speaking turns.
pub mod recording;
/// Formats, round types and the round generator.
pub mod rounds;
/// Evaluation rubrics.
pub mod rubric;
/// Score sheets and winner determination.
pub mod scoring;
/// Session state machine.
pub mod state_machine;
/// Turn countdown.
pub mod timer;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{audio_files::AudioVault, debate_store::DebateStore},
    error::ServiceError,
};

pub use self::live::LiveHandle;

/// [`AppState`] as handed to axum handlers.
pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, degraded flag, live sessions and audio vault.
pub struct AppState {
    config: AppConfig,
    debate_store: RwLock<Option<Arc<dyn DebateStore>>>,
    degraded: watch::Sender<bool>,
    live: DashMap<Uuid, LiveHandle>,
    audio: AudioVault,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let audio = AudioVault::new(config.upload_dir.clone());
        Arc::new(Self {
            config,
            debate_store: RwLock::new(None),
            degraded: degraded_tx,
            live: DashMap::new(),
            audio,
        })
    }

    /// Configuration the server started with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current debate store, if one is installed.
    pub async fn debate_store(&self) -> Option<Arc<dyn DebateStore>> {
        let guard = self.debate_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_debate_store(&self) -> Result<Arc<dyn DebateStore>, ServiceError> {
        self.debate_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new debate store implementation and leave degraded mode.
    pub async fn install_debate_store(&self, store: Arc<dyn DebateStore>) {
        {
            let mut guard = self.debate_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current debate store and enter degraded mode.
    pub async fn clear_debate_store(&self) {
        {
            let mut guard = self.debate_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.debate_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Live sessions keyed by debate id.
    pub fn live_sessions(&self) -> &DashMap<Uuid, LiveHandle> {
        &self.live
    }

    /// Disk store for uploaded audio.
    pub fn audio(&self) -> &AudioVault {
        &self.audio
    }

    /// Broadcast the degraded flag only when the value changes.
    fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::debate_store::memory::MemoryDebateStore;

    #[tokio::test]
    async fn degraded_flag_follows_store_installation() {
        let state = AppState::new(AppConfig::default());
        let watcher = state.degraded_watcher();
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_debate_store().await,
            Err(ServiceError::Degraded)
        ));

        state
            .install_debate_store(Arc::new(MemoryDebateStore::new()))
            .await;
        assert!(!state.is_degraded().await);
        assert!(!*watcher.borrow());

        state.clear_debate_store().await;
        assert!(state.is_degraded().await);
        assert!(*watcher.borrow());
    }
}
