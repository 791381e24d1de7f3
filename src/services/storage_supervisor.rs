use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{debate_store::DebateStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Keep a storage backend installed, reconnecting with exponential backoff and keeping the
/// shared state in degraded mode while it is unreachable. Never returns.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn DebateStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        if let Some(store) = state.debate_store().await {
            match store.health_check().await {
                Ok(()) => {
                    delay = INITIAL_DELAY;
                    sleep(HEALTH_POLL_INTERVAL).await;
                }
                Err(err) => {
                    warn!(error = %err, "storage health check failed; entering degraded mode");
                    state.clear_debate_store().await;
                    sleep(delay).await;
                    delay = (delay * 2).min(MAX_DELAY);
                }
            }
            continue;
        }

        match connect().await {
            Ok(store) => {
                info!("storage connection established; leaving degraded mode");
                state.install_debate_store(store).await;
                delay = INITIAL_DELAY;
            }
            Err(err) => {
                warn!(error = %err, retry_in_ms = delay.as_millis() as u64, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::{config::AppConfig, dao::debate_store::memory::MemoryDebateStore, state::AppState};

    #[tokio::test(start_paused = true)]
    async fn retries_with_backoff_until_connected() {
        let state = AppState::new(AppConfig::default());
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let supervisor = tokio::spawn(run(state.clone(), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StorageError::unavailable(
                        "connection refused".into(),
                        std::io::Error::other("refused"),
                    ))
                } else {
                    Ok(Arc::new(MemoryDebateStore::new()) as Arc<dyn DebateStore>)
                }
            }
        }));

        // Failures at t=0 and t=1s, success after the 2s backoff.
        sleep(Duration::from_millis(2_500)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(state.is_degraded().await);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(!state.is_degraded().await);

        supervisor.abort();
    }
}
