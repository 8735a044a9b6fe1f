//! Sitepulse analytics server - binary entry point

use std::sync::{Arc, Mutex};

use sitepulse::analytics::{AnalyticsEngine, EngineConfig};
use sitepulse::api::http::create_router;
use sitepulse::api::state::AppState;
use sitepulse::utils::cleanup_temp_files;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = EngineConfig::from_env();

    // Remove partial files left behind by an interrupted snapshot write
    if let Ok(cleaned) = cleanup_temp_files(config.store.snapshots_dir()) {
        if cleaned > 0 {
            println!("Cleaned {} leftover temp file(s)", cleaned);
        }
    }

    let engine = Arc::new(AnalyticsEngine::with_config(config)?);
    let state = Arc::new(AppState::new(engine.clone()));
    let app = create_router(state);

    // Ctrl+C / SIGTERM triggers graceful shutdown
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown_tx = Mutex::new(Some(shutdown_tx));
    ctrlc::set_handler(move || {
        if let Some(tx) = shutdown_tx.lock().unwrap().take() {
            let _ = tx.send(());
        }
    })?;

    let addr = std::env::var("SITEPULSE_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!(
        "sitepulse-server v{} listening on {} ({} sessions loaded)",
        sitepulse::VERSION,
        addr,
        engine.session_count()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
            println!("Shutting down...");
        })
        .await?;

    // Persist a final snapshot so the next start skips the full replay
    engine.flush_snapshot()?;
    println!("Shutdown complete");

    Ok(())
}
