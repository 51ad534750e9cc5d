//! Deep Brain AI avatar-video facade.

pub mod request;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::VideoConfig;
use crate::error::AppError;
use crate::vendor::{VendorRequest, VendorResponse, VendorTransport};

pub use request::{Background, VideoProgress, VideoRequest};
use request::{CreatedVideo, Envelope};

/// Reference to a queued render job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoJob {
    pub job_id: String,
    pub title: String,
}

pub struct VideoService {
    config: VideoConfig,
    transport: Arc<dyn VendorTransport>,
}

impl VideoService {
    pub fn new(config: VideoConfig, transport: Arc<dyn VendorTransport>) -> Self {
        Self { config, transport }
    }

    pub async fn generate_custom(&self, request: VideoRequest) -> Result<VideoJob, AppError> {
        request.validate()?;

        let payload = request.to_payload(&self.config.default_model);
        let title = payload.title.clone();
        let url = format!("{}/api/odin/v3/editor/video", self.config.base_url);

        tracing::info!("Requesting avatar video '{}'", title);

        let response = self
            .transport
            .send(
                VendorRequest::post(url, serde_json::to_value(&payload)?)
                    .header("Authorization", &self.config.api_key),
            )
            .await?;

        let created: CreatedVideo = unwrap_envelope(response)?;
        tracing::info!("Video job {} queued", created.key);

        Ok(VideoJob {
            job_id: created.key,
            title,
        })
    }

    pub async fn check_status(&self, job_id: &str) -> Result<VideoProgress, AppError> {
        request::validate_job_key(job_id)?;

        let url = format!(
            "{}/api/odin/v3/editor/progress/{}",
            self.config.base_url, job_id
        );
        let response = self
            .transport
            .send(VendorRequest::get(url).header("Authorization", &self.config.api_key))
            .await?;

        unwrap_envelope(response)
    }
}

/// Deep Brain may report failure either through the HTTP status or through
/// `success: false` on a 200; both become [`AppError::Upstream`].
fn unwrap_envelope<T: DeserializeOwned>(response: VendorResponse) -> Result<T, AppError> {
    let status = response.status;
    let envelope: Option<Envelope<T>> = serde_json::from_slice(&response.body).ok();

    match envelope {
        Some(Envelope {
            success: true,
            data: Some(data),
            ..
        }) if response.is_success() => Ok(data),
        Some(Envelope {
            error: Some(fault), ..
        }) => Err(AppError::Upstream {
            status,
            vendor_code: fault.code,
            message: fault.message.unwrap_or_else(|| response.text()),
        }),
        _ => Err(AppError::upstream(status, response.text())),
    }
}
