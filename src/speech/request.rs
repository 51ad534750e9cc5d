use serde::Serialize;

use super::audio::OutputFormat;
use crate::error::AppError;

pub const DEFAULT_STABILITY: f32 = 0.5;
pub const DEFAULT_SIMILARITY_BOOST: f32 = 0.75;

/// Modulation forwarded to ElevenLabs as `voice_settings`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: DEFAULT_STABILITY,
            similarity_boost: DEFAULT_SIMILARITY_BOOST,
        }
    }
}

impl VoiceSettings {
    pub fn new(stability: f32, similarity_boost: f32) -> Result<Self, AppError> {
        check_unit("stability", stability)?;
        check_unit("similarityBoost", similarity_boost)?;
        Ok(Self {
            stability,
            similarity_boost,
        })
    }
}

fn check_unit(name: &str, value: f32) -> Result<(), AppError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
    pub settings: Option<VoiceSettings>,
    pub output_format: OutputFormat,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: None,
            model_id: None,
            settings: None,
            output_format: OutputFormat::default(),
        }
    }

    pub fn voice(mut self, voice_id: Option<String>) -> Self {
        self.voice_id = voice_id.filter(|v| !v.trim().is_empty());
        self
    }

    pub fn model(mut self, model_id: Option<String>) -> Self {
        self.model_id = model_id.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn settings(mut self, settings: Option<VoiceSettings>) -> Self {
        self.settings = settings;
        self
    }

    pub fn format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.text.trim().is_empty() {
            return Err(AppError::InvalidInput("Text cannot be empty".into()));
        }
        if let Some(settings) = &self.settings {
            VoiceSettings::new(settings.stability, settings.similarity_boost)?;
        }
        Ok(())
    }
}

/// JSON body of `POST /v1/text-to-speech/{voice_id}`.
#[derive(Debug, Serialize)]
pub struct TextToSpeechBody<'a> {
    pub text: &'a str,
    pub model_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_settings: Option<VoiceSettings>,
}
