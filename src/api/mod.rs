pub mod handlers;
pub mod routes;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::speech::{OutputFormat, VoiceDescriptor, VoiceSettings};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "voice_id")]
    pub voice_id: Option<String>,
    #[serde(default, alias = "model_id")]
    pub model_id: Option<String>,
    #[serde(default)]
    pub stability: Option<f32>,
    #[serde(default, alias = "similarity_boost")]
    pub similarity_boost: Option<f32>,
    #[serde(default, alias = "output_format")]
    pub output_format: Option<OutputFormat>,
    #[serde(default)]
    pub save: bool,
}

impl AudioRequest {
    /// Settings when either knob is present, missing half defaulted.
    pub fn optional_settings(&self) -> Option<VoiceSettings> {
        if self.stability.is_none() && self.similarity_boost.is_none() {
            return None;
        }
        let defaults = VoiceSettings::default();
        Some(VoiceSettings {
            stability: self.stability.unwrap_or(defaults.stability),
            similarity_boost: self.similarity_boost.unwrap_or(defaults.similarity_boost),
        })
    }

    /// Settings only when both knobs are present.
    pub fn explicit_settings(&self) -> Option<VoiceSettings> {
        match (self.stability, self.similarity_boost) {
            (Some(stability), Some(similarity_boost)) => Some(VoiceSettings {
                stability,
                similarity_boost,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "language_tag", alias = "language")]
    pub language_tag: String,
    #[serde(default, alias = "language_labels")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, alias = "output_format")]
    pub output_format: Option<OutputFormat>,
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbienceRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "voice_id")]
    pub voice_id: Option<String>,
    #[serde(default, alias = "model_id")]
    pub model_id: Option<String>,
    #[serde(default, alias = "ambience_track_ref", alias = "ambience_file", alias = "ambienceFile")]
    pub ambience_track_ref: String,
    #[serde(default, alias = "speech_volume")]
    pub speech_volume_db: Option<f32>,
    #[serde(default, alias = "ambience_volume")]
    pub ambience_volume_db: Option<f32>,
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGenerateRequest {
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "model_id")]
    pub model_id: Option<String>,
    #[serde(default, alias = "background_color", alias = "backgroundColor")]
    pub background: Option<String>,
    #[serde(default, alias = "subtitles_enabled", alias = "subtitlesEnabled")]
    pub subtitles: bool,
    #[serde(default, alias = "music_url")]
    pub music_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct SavedAudioResponse {
    pub message: String,
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
