mod chat;
mod config;
mod error;
mod llm;
mod nav;
mod pages;
mod render;
mod routes;
mod services;
mod state;
mod theme;

use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 8501;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = match std::env::var("PORT") {
        Ok(raw) => match raw.parse::<u16>() {
            Ok(port) => port,
            Err(e) => exit_with("invalid PORT", &e),
        },
        Err(_) => DEFAULT_PORT,
    };

    let config = config::ConfigStore::from_env();
    let settings = match config.load() {
        Ok(settings) => settings,
        Err(e) => exit_with("config load failed", &e),
    };
    tracing::info!(dir = %config.dir().display(), "config loaded");

    let registry = pages::PageRegistry::builtin();
    if registry.is_empty() {
        exit_with("page registry", &"no pages registered");
    }
    for key in registry.rejected() {
        tracing::warn!(%key, "page rejected at registration");
    }
    tracing::info!(pages = registry.len(), "page registry built");
    let archive = chat::ChatArchive::from_env();
    match archive.cleanup_empty(services::assistant::ASSISTANT_NAME).await {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "removed empty chat files"),
        Err(e) => tracing::warn!(error = %e, "chat archive cleanup failed"),
    }

    // LLM client is optional: the chat page reports why it is unavailable.
    let state = state::AppState::new(
        config,
        settings,
        registry,
        chat::SessionStore::from_env(),
        archive,
        llm::config::LlmTimeouts::from_env(),
    );

    let app = routes::app(state);
    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(e) => exit_with("failed to bind", &e),
    };

    tracing::info!(%port, "multipage listening");
    if let Err(e) = axum::serve(listener, app).await {
        exit_with("server failed", &e);
    }
}

fn exit_with(context: &str, err: &dyn std::fmt::Display) -> ! {
    tracing::error!(error = %err, "{context}");
    std::process::exit(1);
}
