use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::{
    AmbienceRequest, AudioRequest, HealthResponse, LanguageRequest, SavedAudioResponse,
    VideoGenerateRequest, VoicesResponse,
};
use crate::api::routes::AppState;
use crate::error::AppError;
use crate::speech::{AmbienceOptions, AudioArtifact, SynthesisRequest, DEFAULT_AMBIENCE_DB};
use crate::video::{Background, VideoJob, VideoProgress, VideoRequest};

/// Raw bytes, or a JSON pointer to the saved file when `save` was requested.
async fn deliver(
    state: &AppState,
    artifact: AudioArtifact,
    save: bool,
) -> Result<Response, AppError> {
    if save {
        let path = artifact.save_to(&state.output_dir).await?;
        return Ok(Json(SavedAudioResponse {
            message: "Audio generated successfully".to_string(),
            path,
        })
        .into_response());
    }

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, artifact.content_type)],
        artifact.bytes,
    )
        .into_response())
}

pub async fn generate_audio(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AudioRequest>,
) -> Result<Response, AppError> {
    let synthesis = SynthesisRequest::new(request.text.clone())
        .voice(request.voice_id.clone())
        .model(request.model_id.clone())
        .settings(request.optional_settings())
        .format(request.output_format.unwrap_or_default());

    let artifact = state.speech.generate_simple(synthesis).await?;
    deliver(&state, artifact, request.save).await
}

pub async fn generate_modulated_audio(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AudioRequest>,
) -> Result<Response, AppError> {
    let synthesis = SynthesisRequest::new(request.text.clone())
        .voice(request.voice_id.clone())
        .model(request.model_id.clone())
        .settings(request.explicit_settings())
        .format(request.output_format.unwrap_or_default());

    let artifact = state.speech.generate_modulated(synthesis).await?;
    deliver(&state, artifact, request.save).await
}

pub async fn list_voices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VoicesResponse>, AppError> {
    let voices = state.speech.list_voices().await?;
    Ok(Json(VoicesResponse { voices }))
}

pub async fn generate_in_language(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LanguageRequest>,
) -> Result<Response, AppError> {
    let artifact = state
        .speech
        .generate_in_language(
            &request.text,
            &request.language_tag,
            &request.labels,
            request.output_format.unwrap_or_default(),
        )
        .await?;
    deliver(&state, artifact, request.save).await
}

pub async fn generate_with_ambience(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AmbienceRequest>,
) -> Result<Response, AppError> {
    let synthesis = SynthesisRequest::new(request.text)
        .voice(request.voice_id)
        .model(request.model_id);

    let options = AmbienceOptions {
        track_ref: request.ambience_track_ref,
        speech_volume_db: request.speech_volume_db.unwrap_or(0.0),
        ambience_volume_db: request.ambience_volume_db.unwrap_or(DEFAULT_AMBIENCE_DB),
    };

    let artifact = state
        .speech
        .generate_with_ambience(synthesis, &options)
        .await?;
    deliver(&state, artifact, request.save).await
}

pub async fn generate_custom_video(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VideoGenerateRequest>,
) -> Result<Json<VideoJob>, AppError> {
    let background = request
        .background
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .map(Background::parse)
        .transpose()?;

    let job = state
        .video
        .generate_custom(VideoRequest {
            script: request.script,
            title: request.title,
            model_id: request.model_id,
            background,
            subtitles_enabled: request.subtitles,
            music_url: request.music_url.filter(|u| !u.trim().is_empty()),
        })
        .await?;
    Ok(Json(job))
}

pub async fn video_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<VideoProgress>, AppError> {
    let progress = state.video.check_status(&job_id).await?;
    Ok(Json(progress))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
