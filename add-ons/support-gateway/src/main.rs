//! Axum-based API gateway for the support assistant. Config-driven via CoreConfig.

mod handlers;

use axum::{routing::{get, post}, Router};
use std::sync::Arc;
use support_core::{
    Assistant, ConversationStore, CoreConfig, KnowledgeBase, MemoryConversationStore, SledConversationStore,
    StorageBackend,
};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) assistant: Assistant,
    pub(crate) store: Arc<dyn ConversationStore>,
}

fn open_store(config: &CoreConfig) -> Result<Arc<dyn ConversationStore>, String> {
    match config.storage_backend {
        StorageBackend::Sled => {
            let path = config.conversation_store_path();
            let store = SledConversationStore::open_path(&path)
                .map_err(|e| format!("conversation store at {} LOCKED or inaccessible: {}", path.display(), e))?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => Ok(Arc::new(MemoryConversationStore::new())),
    }
}

/// Pre-flight check: config loads, conversation store opens, port is free.
fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    print!("Checking conversation store ({:?})... ", config.storage_backend);
    let store = open_store(&config)?;
    store
        .find_by_session("__verify__")
        .map_err(|e| format!("conversation store read failed: {}", e))?;
    drop(store);
    println!("OK");

    print!("Checking knowledge base... ");
    let kb = KnowledgeBase::default();
    if kb.is_empty() {
        return Err("knowledge base has no entries".to_string());
    }
    println!("OK ({} entries)", kb.len());

    let port = config.port;
    print!("Checking port {}... ", port);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    match std::net::TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => {
            return Err(format!("Port {} BLOCKED: {}", port, e));
        }
    }

    println!("\nSUCCESS: All systems GO. Ready to start gateway.");
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[support-gateway] .env not loaded: {} (using system environment)", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CoreConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            tracing::error!("Config load failed: {}", e);
            std::process::exit(1);
        }
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let knowledge = Arc::new(KnowledgeBase::default());
    tracing::info!(entries = knowledge.len(), "Knowledge base loaded");

    let app = build_app(AppState {
        config: Arc::clone(&config),
        assistant: Assistant::new(knowledge),
        store,
    });

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("{} listening on {}", config.app_name, addr);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn build_app(state: AppState) -> Router {
    // Widget may be embedded on any origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/v1/chat", post(handlers::chat::chat))
        .with_state(state)
        .layer(cors)
}

/// GET / – welcome banner.
async fn root() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "message": "Welcome to Customer Service Chatbot API" }))
}

/// GET /health – liveness check for load balancers and scripts.
async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok", "service": state.config.app_name }))
}
