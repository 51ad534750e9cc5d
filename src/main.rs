use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod speech;
mod video;
mod vendor;

use api::routes::{create_router, AppState};
use config::Config;
use speech::SpeechService;
use vendor::{HttpTransport, VendorTransport};
use video::VideoService;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Media generation server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Starting server on http://{}", config.addr);
    tracing::info!("Output directory: {}", config.output_dir.display());

    // One HTTP client shared by both vendors
    let transport: Arc<dyn VendorTransport> = Arc::new(HttpTransport::new());

    let state = Arc::new(AppState {
        speech: SpeechService::new(config.speech.clone(), Arc::clone(&transport)),
        video: VideoService::new(config.video.clone(), transport),
        output_dir: config.output_dir.clone(),
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
