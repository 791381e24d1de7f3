//! Binds one audio capture to each speaking turn of a [`DebateSession`].
//!
//! The binding is observed after every session mutation. It starts a capture when the
//! clock runs, stops it when the turn ends or is interrupted, and appends the captured
//! artifact to the session tagged with the round that was live when capture began.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    rounds::{DebateRound, RoundType, Team},
    state_machine::{DebatePhase, DebateSession},
};

/// Opaque reference to captured audio (blob key, file path or URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ArtifactRef(pub String);

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One captured speaking turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AudioRecording {
    /// Identifier of this capture.
    pub id: Uuid,
    /// Team that held the floor.
    pub team: Team,
    /// Round the capture began in.
    pub round_type: RoundType,
    /// 1-based position of that round.
    pub order: u8,
    /// When the capture began.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Captured length in seconds.
    pub duration: u32,
    /// Where the captured audio lives.
    pub artifact: ArtifactRef,
    /// Text attached after the fact, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
}

/// Output of a completed capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedClip {
    /// Reference to the stored audio.
    pub artifact: ArtifactRef,
    /// Captured length, whole seconds.
    pub duration_secs: u32,
}

/// Errors reported by a capture device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The device could not be opened.
    #[error("capture device unavailable: {0}")]
    Unavailable(String),
    /// The device failed while finalizing a capture.
    #[error("capture failed: {0}")]
    Failed(String),
}

/// Capture backend. Handles are consumed on every stop path, so a device is released
/// exactly once per started capture.
pub trait CaptureDevice: Send {
    /// Token for one in-flight capture.
    type Handle: Send;

    /// Open the device and begin capturing.
    fn start(&mut self) -> Result<Self::Handle, CaptureError>;

    /// Finish the capture and return its artifact.
    fn stop(&mut self, handle: Self::Handle) -> Result<CapturedClip, CaptureError>;

    /// Release the capture without producing an artifact.
    fn abort(&mut self, handle: Self::Handle);
}

/// Server-side capture that only measures each speaking window. Audio bytes arrive
/// separately through the upload endpoint.
#[derive(Debug, Default)]
pub struct TimingCapture {
    debate_id: Option<Uuid>,
    captured: u32,
}

impl TimingCapture {
    /// Capture whose artifacts are keyed under `debate_id`.
    pub fn for_debate(debate_id: Uuid) -> Self {
        Self {
            debate_id: Some(debate_id),
            captured: 0,
        }
    }
}

impl CaptureDevice for TimingCapture {
    type Handle = Instant;

    fn start(&mut self) -> Result<Self::Handle, CaptureError> {
        Ok(Instant::now())
    }

    fn stop(&mut self, handle: Self::Handle) -> Result<CapturedClip, CaptureError> {
        self.captured += 1;
        let elapsed = handle.elapsed().as_secs();
        let artifact = match self.debate_id {
            Some(id) => format!("timing://{id}/{}", self.captured),
            None => format!("timing://local/{}", self.captured),
        };
        Ok(CapturedClip {
            artifact: ArtifactRef(artifact),
            duration_secs: u32::try_from(elapsed).unwrap_or(u32::MAX),
        })
    }

    fn abort(&mut self, _handle: Self::Handle) {}
}

/// Notifications produced by [`RecordingBinding::observe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingEvent {
    /// A capture began for the round.
    Started(DebateRound),
    /// A capture finished and was appended to the session.
    Stopped(AudioRecording),
    /// The device reported an error; round advancement is unaffected.
    Failed {
        /// Round the capture belonged to.
        round: DebateRound,
        /// Device error message.
        error: String,
    },
}

enum CaptureSlot<H> {
    Idle,
    Capturing {
        round: DebateRound,
        handle: H,
        started_at: OffsetDateTime,
    },
    /// Latched after a failed start until the next stop condition.
    Unavailable {
        round: DebateRound,
    },
}

/// Drives a [`CaptureDevice`] from session observations. At most one capture is active.
pub struct RecordingBinding<D: CaptureDevice> {
    device: D,
    slot: CaptureSlot<D::Handle>,
    last_error: Option<String>,
}

impl<D: CaptureDevice> RecordingBinding<D> {
    /// Idle binding over `device`.
    pub fn new(device: D) -> Self {
        Self {
            device,
            slot: CaptureSlot::Idle,
            last_error: None,
        }
    }

    /// Whether a capture is currently in flight.
    pub fn is_capturing(&self) -> bool {
        matches!(self.slot, CaptureSlot::Capturing { .. })
    }

    /// Most recent device error, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reconcile the capture slot with the session's current state.
    pub fn observe(&mut self, session: &mut DebateSession) -> Vec<BindingEvent> {
        let mut events = Vec::new();
        let current = session.current_round().clone();
        let should_stop = session.time_remaining() == 0
            || session.phase() != DebatePhase::Running
            || !session.is_timer_running();

        let slot = std::mem::replace(&mut self.slot, CaptureSlot::Idle);
        self.slot = match slot {
            CaptureSlot::Capturing {
                round,
                handle,
                started_at,
            } if should_stop || round != current => {
                self.finish_capture(session, round, handle, started_at, &mut events);
                CaptureSlot::Idle
            }
            CaptureSlot::Unavailable { round } if should_stop || round != current => {
                CaptureSlot::Idle
            }
            other => other,
        };

        if matches!(self.slot, CaptureSlot::Idle) && !should_stop {
            self.begin_capture(current, &mut events);
        }

        events
    }

    /// Stop any active capture and record it, regardless of session state.
    pub fn release(&mut self, session: &mut DebateSession) -> Vec<BindingEvent> {
        let mut events = Vec::new();
        if let CaptureSlot::Capturing {
            round,
            handle,
            started_at,
        } = std::mem::replace(&mut self.slot, CaptureSlot::Idle)
        {
            self.finish_capture(session, round, handle, started_at, &mut events);
        }
        events
    }

    fn begin_capture(&mut self, round: DebateRound, events: &mut Vec<BindingEvent>) {
        match self.device.start() {
            Ok(handle) => {
                debug!(order = round.order, team = %round.team, "capture started");
                events.push(BindingEvent::Started(round.clone()));
                self.slot = CaptureSlot::Capturing {
                    round,
                    handle,
                    started_at: OffsetDateTime::now_utc(),
                };
            }
            Err(err) => {
                warn!(order = round.order, error = %err, "capture could not start");
                let error = err.to_string();
                self.last_error = Some(error.clone());
                events.push(BindingEvent::Failed {
                    round: round.clone(),
                    error,
                });
                self.slot = CaptureSlot::Unavailable { round };
            }
        }
    }

    fn finish_capture(
        &mut self,
        session: &mut DebateSession,
        round: DebateRound,
        handle: D::Handle,
        started_at: OffsetDateTime,
        events: &mut Vec<BindingEvent>,
    ) {
        match self.device.stop(handle) {
            Ok(clip) => {
                let recording = AudioRecording {
                    id: Uuid::new_v4(),
                    team: round.team,
                    round_type: round.round_type,
                    order: round.order,
                    timestamp: started_at,
                    duration: clip.duration_secs,
                    artifact: clip.artifact,
                    transcription: None,
                };
                debug!(order = round.order, duration = recording.duration, "capture stopped");
                session.add_recording(recording.clone());
                events.push(BindingEvent::Stopped(recording));
            }
            Err(err) => {
                warn!(order = round.order, error = %err, "capture failed on stop");
                let error = err.to_string();
                self.last_error = Some(error.clone());
                events.push(BindingEvent::Failed { round, error });
            }
        }
    }
}

impl<D: CaptureDevice> Drop for RecordingBinding<D> {
    fn drop(&mut self) {
        if let CaptureSlot::Capturing { handle, .. } =
            std::mem::replace(&mut self.slot, CaptureSlot::Idle)
        {
            self.device.abort(handle);
        }
    }
}

impl<D: CaptureDevice> fmt::Debug for RecordingBinding<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = match &self.slot {
            CaptureSlot::Idle => "idle".to_owned(),
            CaptureSlot::Capturing {
                round, started_at, ..
            } => format!("capturing round {} since {started_at}", round.order),
            CaptureSlot::Unavailable { round } => format!("unavailable (round {})", round.order),
        };
        f.debug_struct("RecordingBinding")
            .field("slot", &slot)
            .field("last_error", &self.last_error)
            .finish()
    }
}
