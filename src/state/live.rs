//! Live debate sessions hosted by the server.
//!
//! Each session runs as one tokio task that owns the [`DebateSession`] and its
//! [`RecordingBinding`]. Commands arrive on a single mpsc queue and the clock ticks on an
//! interval, so every mutation is serialized through the task. Subscribers follow the
//! session through a `watch` channel of [`SessionSnapshot`]s.
//!
//! A finished session stays reachable for a grace period, then the task removes its own
//! entry from [`AppState::live_sessions`] and stops.

use std::{sync::Weak, time::Duration};

use thiserror::Error;
use time::OffsetDateTime;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Instant, MissedTickBehavior, interval_at, sleep_until},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::DebateStatus,
    state::{
        AppState,
        recording::{BindingEvent, RecordingBinding, TimingCapture},
        rounds::DebateConfig,
        state_machine::{
            DebatePhase, DebateSession, SessionAction, SessionSnapshot, TickOutcome,
            TransitionError,
        },
    },
};

const COMMAND_BUFFER: usize = 32;

/// Errors returned to callers of a [`LiveHandle`].
#[derive(Debug, Error)]
pub enum LiveError {
    /// The state machine rejected the action.
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// The session task has stopped.
    #[error("live session closed")]
    Closed,
}

enum LiveCommand {
    Apply {
        action: SessionAction,
        reply: oneshot::Sender<Result<SessionSnapshot, TransitionError>>,
    },
    Close {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Cloneable handle to a running live session.
#[derive(Debug, Clone)]
pub struct LiveHandle {
    debate_id: Uuid,
    /// Distinguishes this task from a later session opened for the same debate.
    instance: Uuid,
    commands: mpsc::Sender<LiveCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl LiveHandle {
    /// Spawn the session task for `debate_id`, ticking every `tick`.
    ///
    /// `state` is used to mark the stored debate completed once the session finishes and
    /// to drop the session `finished_grace` after that.
    pub fn spawn(
        debate_id: Uuid,
        config: DebateConfig,
        tick: Duration,
        finished_grace: Duration,
        state: Weak<AppState>,
    ) -> Self {
        let instance = Uuid::new_v4();
        let session = DebateSession::new(config);
        let (snapshot_tx, snapshots) = watch::channel(session.snapshot());
        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);

        let actor = LiveActor {
            debate_id,
            instance,
            session,
            binding: RecordingBinding::new(TimingCapture::for_debate(debate_id)),
            snapshots: snapshot_tx,
            state,
            completion_recorded: false,
            finished_grace,
            evict_at: None,
        };
        tokio::spawn(actor.run(command_rx, tick));
        info!(%debate_id, tick_ms = tick.as_millis() as u64, "live session opened");

        Self {
            debate_id,
            instance,
            commands,
            snapshots,
        }
    }

    /// Debate this session belongs to.
    pub fn debate_id(&self) -> Uuid {
        self.debate_id
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that yields every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Queue `action` and wait for the resulting snapshot.
    pub async fn apply(&self, action: SessionAction) -> Result<SessionSnapshot, LiveError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(LiveCommand::Apply { action, reply })
            .await
            .map_err(|_| LiveError::Closed)?;
        let result = response.await.map_err(|_| LiveError::Closed)?;
        Ok(result?)
    }

    /// Stop the session task, releasing any active capture. Returns the final snapshot.
    pub async fn close(&self) -> Result<SessionSnapshot, LiveError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(LiveCommand::Close { reply })
            .await
            .map_err(|_| LiveError::Closed)?;
        response.await.map_err(|_| LiveError::Closed)
    }
}

struct LiveActor {
    debate_id: Uuid,
    instance: Uuid,
    session: DebateSession,
    binding: RecordingBinding<TimingCapture>,
    snapshots: watch::Sender<SessionSnapshot>,
    state: Weak<AppState>,
    completion_recorded: bool,
    finished_grace: Duration,
    /// Set once the session finishes.
    evict_at: Option<Instant>,
}

impl LiveActor {
    async fn run(mut self, mut commands: mpsc::Receiver<LiveCommand>, tick: Duration) {
        let mut ticker = interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let evict_at = self.evict_at;
            tokio::select! {
                command = commands.recv() => match command {
                    Some(LiveCommand::Apply { action, reply }) => {
                        let result = self.apply(action).await;
                        let _ = reply.send(result);
                    }
                    Some(LiveCommand::Close { reply }) => {
                        let _ = reply.send(self.shutdown());
                        break;
                    }
                    None => {
                        self.shutdown();
                        break;
                    }
                },
                _ = ticker.tick() => self.tick().await,
                _ = sleep_until(evict_at.unwrap_or_else(Instant::now)), if evict_at.is_some() => {
                    self.evict();
                    break;
                }
            }
        }

        info!(debate_id = %self.debate_id, "live session closed");
    }

    async fn apply(&mut self, action: SessionAction) -> Result<SessionSnapshot, TransitionError> {
        if let Err(err) = self.session.apply(action) {
            debug!(debate_id = %self.debate_id, ?action, error = %err, "live action rejected");
            return Err(err);
        }
        self.after_mutation().await;
        Ok(self.session.snapshot())
    }

    async fn tick(&mut self) {
        match self.session.tick() {
            TickOutcome::Idle => return,
            TickOutcome::Ticked => {}
            TickOutcome::Expired => {
                debug!(
                    debate_id = %self.debate_id,
                    round = self.session.current_index(),
                    "turn time expired"
                );
            }
            TickOutcome::Finished => {
                info!(debate_id = %self.debate_id, "last turn expired; debate finished");
            }
        }
        self.after_mutation().await;
    }

    async fn after_mutation(&mut self) {
        let events = self.binding.observe(&mut self.session);
        self.log_events(events);
        if self.session.phase() == DebatePhase::Finished {
            self.record_completion().await;
            if self.evict_at.is_none() {
                self.evict_at = Some(Instant::now() + self.finished_grace);
            }
        }
        self.publish();
    }

    /// Drop this session's map entry unless a newer session took the slot.
    fn evict(&mut self) {
        self.shutdown();
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let removed = state
            .live_sessions()
            .remove_if(&self.debate_id, |_, handle| handle.instance == self.instance);
        if removed.is_some() {
            info!(debate_id = %self.debate_id, "finished live session dropped");
        }
    }

    fn shutdown(&mut self) -> SessionSnapshot {
        let events = self.binding.release(&mut self.session);
        self.log_events(events);
        self.publish();
        self.session.snapshot()
    }

    fn publish(&self) {
        let snapshot = self.session.snapshot();
        self.snapshots.send_if_modified(|current| {
            if current.version == snapshot.version {
                return false;
            }
            *current = snapshot;
            true
        });
    }

    fn log_events(&self, events: Vec<BindingEvent>) {
        for event in events {
            match event {
                BindingEvent::Started(round) => {
                    debug!(debate_id = %self.debate_id, order = round.order, "capture started");
                }
                BindingEvent::Stopped(recording) => {
                    info!(
                        debate_id = %self.debate_id,
                        order = recording.order,
                        duration = recording.duration,
                        artifact = %recording.artifact,
                        "turn captured"
                    );
                }
                BindingEvent::Failed { round, error } => {
                    warn!(debate_id = %self.debate_id, order = round.order, %error, "capture failed");
                }
            }
        }
    }

    /// Persist the completed status once. Failures are logged, never retried.
    async fn record_completion(&mut self) {
        if self.completion_recorded {
            return;
        }
        self.completion_recorded = true;

        let Some(state) = self.state.upgrade() else {
            return;
        };
        let Some(store) = state.debate_store().await else {
            warn!(debate_id = %self.debate_id, "storage unavailable; completion not persisted");
            return;
        };
        match store
            .update_status(self.debate_id, DebateStatus::Completed, OffsetDateTime::now_utc())
            .await
        {
            Ok(true) => info!(debate_id = %self.debate_id, "debate marked completed"),
            Ok(false) => warn!(debate_id = %self.debate_id, "debate vanished before completion"),
            Err(err) => warn!(debate_id = %self.debate_id, error = %err, "failed to mark debate completed"),
        }
    }
}
