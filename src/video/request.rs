use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

lazy_static! {
    static ref HEX_COLOR: Regex = Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap();
    static ref JOB_KEY: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,128}$").unwrap();
}

const TITLE_FROM_SCRIPT_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Color(String),
    ImageUrl(String),
}

impl Background {
    /// Accepts `#RGB`/`#RRGGBB` colors or an http(s) image URL.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        let value = value.trim();
        if HEX_COLOR.is_match(value) {
            Ok(Background::Color(value.to_uppercase()))
        } else if is_http_url(value) {
            Ok(Background::ImageUrl(value.to_string()))
        } else {
            Err(AppError::InvalidInput(format!(
                "background must be a hex color or an http(s) image URL, got '{}'",
                value
            )))
        }
    }
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.contains(char::is_whitespace))
}

pub fn validate_job_key(key: &str) -> Result<(), AppError> {
    if JOB_KEY.is_match(key) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!("Invalid video job id '{}'", key)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoRequest {
    pub script: String,
    pub title: Option<String>,
    pub model_id: Option<String>,
    pub background: Option<Background>,
    pub subtitles_enabled: bool,
    pub music_url: Option<String>,
}

impl VideoRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.script.trim().is_empty() {
            return Err(AppError::InvalidInput("Script cannot be empty".into()));
        }
        if let Some(url) = &self.music_url {
            if !is_http_url(url.trim()) {
                return Err(AppError::InvalidInput(format!(
                    "musicUrl must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }
        Ok(())
    }

    pub fn resolved_title(&self) -> String {
        match &self.title {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => self
                .script
                .trim()
                .chars()
                .take(TITLE_FROM_SCRIPT_CHARS)
                .collect(),
        }
    }

    pub fn to_payload(&self, default_model: &str) -> ProjectPayload {
        let model = self
            .model_id
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_model.to_string());

        let background = self.background.as_ref().map(|bg| match bg {
            Background::Color(c) => BackgroundPayload {
                kind: "color",
                value: c.clone(),
            },
            Background::ImageUrl(u) => BackgroundPayload {
                kind: "image",
                value: u.clone(),
            },
        });

        ProjectPayload {
            title: self.resolved_title(),
            scenes: vec![ScenePayload {
                clips: vec![ClipPayload {
                    kind: "aiModel",
                    script: self.script.trim().to_string(),
                    model,
                }],
                background,
            }],
            subtitle: SubtitlePayload {
                enabled: self.subtitles_enabled,
            },
            music: self
                .music_url
                .as_ref()
                .map(|url| MusicPayload { url: url.trim().to_string() }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectPayload {
    pub title: String,
    pub scenes: Vec<ScenePayload>,
    pub subtitle: SubtitlePayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music: Option<MusicPayload>,
}

#[derive(Debug, Serialize)]
pub struct ScenePayload {
    pub clips: Vec<ClipPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundPayload>,
}

#[derive(Debug, Serialize)]
pub struct ClipPayload {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub script: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct BackgroundPayload {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SubtitlePayload {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct MusicPayload {
    pub url: String,
}

/// Deep Brain wraps every reply in `{success, data | error}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<VendorFault>,
}

#[derive(Debug, Deserialize)]
pub struct VendorFault {
    pub code: Option<i64>,
    #[serde(alias = "msg")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedVideo {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoProgress {
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}
