//! ciceron-back binary entrypoint wiring configuration, storage and the REST/SSE layers.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use ciceron_back::{
    build_router,
    config::AppConfig,
    dao::debate_store::{DebateStore, memory::MemoryDebateStore},
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let port = config.port;
    let app_state = AppState::new(config);

    start_storage(&app_state).await;
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the in-memory store, or supervise a PostgreSQL connection when a URL is set.
async fn start_storage(state: &SharedState) {
    let Some(url) = state.config().database_url.clone() else {
        info!("no DATABASE_URL configured; using in-memory storage");
        state
            .install_debate_store(Arc::new(MemoryDebateStore::new()))
            .await;
        return;
    };

    #[cfg(feature = "postgres-store")]
    {
        use ciceron_back::{
            dao::{
                debate_store::postgres::{PostgresConfig, PostgresDebateStore},
                storage::StorageError,
            },
            services::storage_supervisor,
        };

        let pg_config = PostgresConfig::from_url(url);
        tokio::spawn(storage_supervisor::run(state.clone(), move || {
            let pg_config = pg_config.clone();
            async move {
                let store = PostgresDebateStore::connect(&pg_config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn DebateStore>)
            }
        }));
    }

    #[cfg(not(feature = "postgres-store"))]
    {
        let _ = url;
        warn!("DATABASE_URL set but postgres-store is disabled; using in-memory storage");
        state
            .install_debate_store(Arc::new(MemoryDebateStore::new()))
            .await;
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
