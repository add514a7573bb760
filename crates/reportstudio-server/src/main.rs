//! HTTP backend for LLM-assisted report generation and document export.
//!
//! Routes:
//! - POST /api/generate        — prompt to Mermaid diagram source
//! - POST /api/generate-report — meeting notes to structured Markdown
//! - POST /api/generate-pdf    — project to themed, paginated PDF
//! - POST /api/generate-docx   — project to themed DOCX
//! - GET/POST /api/settings, /api/ai/* — provider configuration
//! - GET /health

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handlers;
mod llm;
mod mermaid;
mod prompts;

use config::{Config, SettingsStore};
use handlers::AppState;
use llm::LlmClient;
use reportstudio_engine::pdf::load_fonts;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    info!("Starting reportstudio-server v{}", env!("CARGO_PKG_VERSION"));
    info!("  Host: {}", config.host);
    info!("  Port: {}", config.port);
    info!("  Settings file: {}", config.settings_file.display());

    let settings = SettingsStore::load(&config.settings_file);
    info!("  Active provider: {}", settings.active_provider().as_str());

    let pdf_fonts = match load_fonts(&config.fonts_dir, &config.font_family) {
        Ok(fonts) => {
            info!("  PDF fonts: {} from {}", config.font_family, config.fonts_dir.display());
            Some(fonts)
        }
        Err(err) => {
            warn!("  PDF output DISABLED: {err}");
            warn!(
                "  Place {}-Regular.ttf (+Bold/Italic/BoldItalic) under {}",
                config.font_family,
                config.fonts_dir.display()
            );
            None
        }
    };
    let mono_fonts = load_fonts(&config.fonts_dir, &config.mono_font_family).ok();
    if mono_fonts.is_none() {
        warn!("  Monospace fonts unavailable, code blocks use the body font");
    }

    let state = AppState {
        settings: Arc::new(RwLock::new(settings)),
        llm: LlmClient::new(),
        pdf_fonts,
        mono_fonts,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/settings", get(handlers::get_settings))
        .route("/api/ai/settings", post(handlers::save_ai_settings))
        .route("/api/ai/test", post(handlers::test_ai_provider))
        .route("/api/ai/models", get(handlers::get_ai_models))
        .route("/api/generate", post(handlers::generate_diagram))
        .route("/api/generate-report", post(handlers::generate_report))
        .route("/api/generate-pdf", post(handlers::generate_pdf))
        .route("/api/generate-docx", post(handlers::generate_docx))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, initiating shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
        info!("Received SIGTERM, initiating shutdown");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
