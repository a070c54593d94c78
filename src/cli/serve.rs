use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::search::{
    create_embedder, ArtifactPaths, Embedder, EmbeddingClient, IndexLoader, IndexStore,
    PollPolicy, Searcher,
};
use crate::server::{router, AppState};

/// Serves the search API immediately; queries get `not_ready` until the
/// background loader publishes the index.
pub async fn run_search_server(config: &Config) -> Result<()> {
    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedder)?);
    if let Err(e) = embedder.health_check().await {
        warn!(error = %e, "embedding provider check failed; queries will fail until it is reachable");
    }

    let store = Arc::new(IndexStore::new());
    let loader = IndexLoader::new(
        ArtifactPaths::new(&config.index.dir),
        PollPolicy::from(&config.loader),
    )
    .with_expected_model(embedder.model())
    .with_expected_dimensions(embedder.dimensions());

    let loader_store = Arc::clone(&store);
    tokio::spawn(async move {
        if let Err(e) = loader.run(&loader_store).await {
            error!(kind = %e.kind(), error = %e, "search index never became ready");
        }
    });

    let client = EmbeddingClient::new(embedder, 1, 1);
    let searcher = Arc::new(Searcher::new(store, client).with_max_k(config.server.max_k));
    let app = router(AppState::new(searcher, config.server.default_k));

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, index_dir = %config.index.dir.display(), "temis-retriever listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
