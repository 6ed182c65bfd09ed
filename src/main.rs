use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use impostor::{config::ServerConfig, lexicon::Lexicon, state::AppState, store::MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "impostor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting impostor server...");

    let config = ServerConfig::from_env();

    let lexicon = match &config.lexicon_path {
        Some(path) => {
            tracing::info!("Loading word list from {}", path.display());
            Lexicon::from_file(path)?
        }
        None => Lexicon::builtin()?,
    };
    tracing::info!(categories = lexicon.categories().len(), "Word list ready");

    let state = Arc::new(AppState::new(
        Arc::new(MemoryStore::new()),
        lexicon,
        config.game.clone(),
    ));

    let app = impostor::router(state);

    tracing::info!("Listening on http://{}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
