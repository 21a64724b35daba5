//! Lorekeeper Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lorekeeper_engine::app::App;
use lorekeeper_engine::infrastructure::config::ProvidersConfig;
use lorekeeper_engine::infrastructure::gateway::ProviderGateway;
use lorekeeper_engine::infrastructure::memory::InMemoryStore;
use lorekeeper_engine::infrastructure::resilient_llm::RetryConfig;
use lorekeeper_engine::{api, infrastructure::ports};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine is usually run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lorekeeper_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lorekeeper Engine");

    // Load configuration
    let providers = ProvidersConfig::from_env();
    let configured = providers.configured();
    if configured.is_empty() {
        tracing::warn!(
            "No generation backend configured; set GROK_API_KEY, OPENAI_API_KEY or OLLAMA_BASE_URL"
        );
    } else {
        tracing::info!(providers = ?configured, "Generation backends configured");
    }
    let server_host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let server_port: u16 = std::env::var("SERVER_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .unwrap_or(3000);

    let retry_config = RetryConfig::default();
    tracing::info!(
        "Generation clients configured with retry: max_retries={}, base_delay_ms={}",
        retry_config.max_retries,
        retry_config.base_delay_ms
    );
    let gateway = Arc::new(ProviderGateway::new(&providers, retry_config));

    let store = Arc::new(InMemoryStore::new());
    let games: Arc<dyn ports::GameRepo> = store.clone();
    let party: Arc<dyn ports::PartyRepo> = store.clone();
    let turns: Arc<dyn ports::TurnRepo> = store.clone();
    let items: Arc<dyn ports::ItemRepo> = store;

    // Create application
    let app = Arc::new(App::new(games, party, turns, items, gateway));

    let router = api::http::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{server_host}:{server_port}").parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
