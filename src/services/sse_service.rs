use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::state_machine::SessionSnapshot;

/// SSE event name carrying a serialized [`SessionSnapshot`].
pub const SNAPSHOT_EVENT: &str = "session.snapshot";

/// Stream the current snapshot, then every change, until the session closes.
pub fn snapshot_stream(
    debate_id: Uuid,
    receiver: watch::Receiver<SessionSnapshot>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        let mut snapshots = WatchStream::new(receiver);
        while let Some(snapshot) = snapshots.next().await {
            match Event::default().event(SNAPSHOT_EVENT).json_data(&snapshot) {
                Ok(event) => yield Ok::<_, Infallible>(event),
                Err(err) => warn!(%debate_id, error = %err, "failed to encode snapshot"),
            }
        }
        info!(%debate_id, "live SSE stream ended");
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
