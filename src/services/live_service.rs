//! Opening, driving and closing server-hosted live sessions.

use std::{sync::Arc, time::Duration};

use dashmap::mapref::entry::Entry;
use tokio::{sync::watch, time::timeout};
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::live::{LiveSessionResponse, parse_action},
    error::{ErrorCode, ServiceError},
    services::debate_service::{parse_id, require_debate},
    state::{
        LiveHandle, SharedState,
        live::LiveError,
        rounds::Team,
        state_machine::{SessionAction, SessionSnapshot},
    },
};

/// Upper bound on waiting for the session task to answer a command.
pub const LIVE_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

fn live_not_found(id: Uuid) -> ServiceError {
    ServiceError::not_found(
        ErrorCode::LiveSessionNotFound,
        format!("No live session for debate {id}"),
    )
}

fn response(debate_id: Uuid, snapshot: SessionSnapshot) -> LiveSessionResponse {
    LiveSessionResponse {
        debate_id,
        snapshot,
    }
}

fn handle_for(state: &SharedState, raw_id: &str) -> Result<LiveHandle, ServiceError> {
    let id = parse_id(raw_id, ErrorCode::LiveSessionNotFound, "Live session")?;
    // Clone out of the map so no shard lock is held across an await.
    state
        .live_sessions()
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| live_not_found(id))
}

/// Start hosting a live session for a stored debate.
pub async fn open_session(
    state: &SharedState,
    raw_id: &str,
) -> Result<LiveSessionResponse, ServiceError> {
    let id = parse_id(raw_id, ErrorCode::DebateNotFound, "Debate")?;
    let store = state.require_debate_store().await?;
    let debate = require_debate(&store, id).await?;

    match state.live_sessions().entry(id) {
        Entry::Occupied(_) => Err(ServiceError::conflict(
            ErrorCode::LiveSessionExists,
            format!("Debate {id} already has a live session"),
        )),
        Entry::Vacant(slot) => {
            let handle = LiveHandle::spawn(
                id,
                debate.debate.config,
                state.config().live_tick,
                state.config().finished_grace,
                Arc::downgrade(state),
            );
            let snapshot = handle.snapshot();
            slot.insert(handle);
            Ok(response(id, snapshot))
        }
    }
}

/// Snapshot of the debate's live session.
pub fn get_session(state: &SharedState, raw_id: &str) -> Result<LiveSessionResponse, ServiceError> {
    let handle = handle_for(state, raw_id)?;
    Ok(response(handle.debate_id(), handle.snapshot()))
}

async fn send(handle: &LiveHandle, action: SessionAction) -> Result<SessionSnapshot, ServiceError> {
    match timeout(LIVE_REPLY_TIMEOUT, handle.apply(action)).await {
        Ok(Ok(snapshot)) => Ok(snapshot),
        Ok(Err(LiveError::Transition(err))) => Err(err.into()),
        Ok(Err(LiveError::Closed)) => Err(live_not_found(handle.debate_id())),
        Err(_) => Err(ServiceError::Timeout),
    }
}

/// Apply a named action (`start`, `pause`, `resume`, `finish`, `next`, `skip`, `previous`).
pub async fn apply_action(
    state: &SharedState,
    raw_id: &str,
    raw_action: &str,
) -> Result<LiveSessionResponse, ServiceError> {
    let action = parse_action(raw_action).ok_or_else(|| {
        ServiceError::invalid(
            ErrorCode::InvalidInput,
            format!("unknown live action `{raw_action}`"),
        )
    })?;
    let handle = handle_for(state, raw_id)?;
    let snapshot = send(&handle, action).await?;
    Ok(response(handle.debate_id(), snapshot))
}

/// Jump to the next turn held by `raw_team`.
pub async fn advance_to_team(
    state: &SharedState,
    raw_id: &str,
    raw_team: &str,
) -> Result<LiveSessionResponse, ServiceError> {
    let team: Team = raw_team
        .parse()
        .map_err(|_| ServiceError::invalid(ErrorCode::InvalidTeam, "Team must be A or B"))?;
    let handle = handle_for(state, raw_id)?;
    let snapshot = send(&handle, SessionAction::AdvanceToNextTurn(team)).await?;
    Ok(response(handle.debate_id(), snapshot))
}

/// Stop hosting the session and return its final snapshot.
pub async fn close_session(
    state: &SharedState,
    raw_id: &str,
) -> Result<LiveSessionResponse, ServiceError> {
    let id = parse_id(raw_id, ErrorCode::LiveSessionNotFound, "Live session")?;
    let (_, handle) = state
        .live_sessions()
        .remove(&id)
        .ok_or_else(|| live_not_found(id))?;

    let snapshot = match timeout(LIVE_REPLY_TIMEOUT, handle.close()).await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(LiveError::Closed)) | Ok(Err(LiveError::Transition(_))) => handle.snapshot(),
        Err(_) => return Err(ServiceError::Timeout),
    };
    info!(debate_id = %id, recordings = snapshot.recordings.len(), "live session removed");
    Ok(response(id, snapshot))
}

/// Debate id and snapshot receiver for the SSE stream.
pub fn subscribe(
    state: &SharedState,
    raw_id: &str,
) -> Result<(Uuid, watch::Receiver<SessionSnapshot>), ServiceError> {
    let handle = handle_for(state, raw_id)?;
    Ok((handle.debate_id(), handle.subscribe()))
}
