use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use crate::speech::SpeechService;
use crate::video::VideoService;

pub struct AppState {
    pub speech: SpeechService,
    pub video: VideoService,
    pub output_dir: PathBuf,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let video_routes = Router::new()
        .route("/generate-custom", post(handlers::generate_custom_video))
        .route("/status/:job_id", get(handlers::video_status));

    Router::new()
        .route("/generate-audio", post(handlers::generate_audio))
        .route(
            "/generate-modulated-audio",
            post(handlers::generate_modulated_audio),
        )
        .route("/list-voices", get(handlers::list_voices))
        .route("/generate-in-language", post(handlers::generate_in_language))
        .route("/generate-with-ambience", post(handlers::generate_with_ambience))
        .route("/health", get(handlers::health))
        .nest("/video", video_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
