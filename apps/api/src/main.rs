mod config;
mod dialogue;
mod errors;
mod llm_client;
mod matching;
mod profile;
mod routes;
mod scoring;
mod state;
mod store;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::dialogue::DialogueEngine;
use crate::llm_client::LlmClient;
use crate::matching::{EmbeddingCache, SemanticMatcher};
use crate::profile::ProfileExtractor;
use crate::routes::build_router;
use crate::scoring::WeightedScorer;
use crate::state::AppState;
use crate::store::{InMemoryStore, KvStore, RedisStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // Sessions and embeddings share one store
    let store: Arc<dyn KvStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisStore::connect(url).await?),
        None => {
            info!("REDIS_URL not set, using in-process store");
            Arc::new(InMemoryStore::new())
        }
    };

    // Initialize LLM client (completion + embeddings)
    let llm = Arc::new(LlmClient::new(config.llm_settings())?);
    info!(
        "LLM client initialized (model: {}, embeddings: {} x{})",
        llm.model(),
        config.embedding_model,
        config.embedding_dimensions
    );

    let cache = Arc::new(EmbeddingCache::new(
        llm.clone(),
        store.clone(),
        config.embedding_timeout,
    ));
    let matcher = SemanticMatcher::new(cache, config.similarity_threshold);
    info!(
        "Scoring: similarity threshold {}, weights {:?}",
        matcher.threshold(),
        config.scoring_weights
    );
    let scorer = Arc::new(WeightedScorer::new(matcher, config.scoring_weights));

    let dialogue = Arc::new(DialogueEngine::new(
        llm.clone(),
        store,
        config.dialogue_config(),
    ));
    info!(
        "Dialogue: max {} turns, alternative below {}%",
        config.max_turns, config.alternative_threshold
    );

    // Build app state
    let state = AppState {
        dialogue,
        scorer,
        extractor: ProfileExtractor::new(llm),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the careers-page widget host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
