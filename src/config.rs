use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const DEFAULT_OUTPUT_DIR: &str = "/tmp/api_outputs";
pub const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEEPBRAIN_BASE_URL: &str = "https://app.aistudios.com";
pub const MONOLINGUAL_MODEL_ID: &str = "eleven_monolingual_v1";
pub const MULTILINGUAL_MODEL_ID: &str = "eleven_multilingual_v2";
pub const DEFAULT_AVATAR_MODEL: &str = "M000004017";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

/// ElevenLabs settings used by the speech facade.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_voice_id: String,
    pub monolingual_model_id: String,
    pub multilingual_model_id: String,
}

/// Deep Brain AI settings used by the video facade.
#[derive(Debug, Clone)]
pub struct VideoConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub output_dir: PathBuf,
    pub speech: SpeechConfig,
    pub video: VideoConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let host = or("HOST", "0.0.0.0");
        let port_raw = or("PORT", "8000");
        let port: u16 = port_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "PORT",
            value: port_raw.clone(),
        })?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "HOST",
                value: host.clone(),
            })?;

        let eleven_key = get("ELEVEN_API_KEY")
            .or_else(|| get("ELEVENLABS_API_KEY"))
            .ok_or(ConfigError::Missing("ELEVEN_API_KEY"))?;
        let deepbrain_key =
            get("DEEPBRAIN_API_KEY").ok_or(ConfigError::Missing("DEEPBRAIN_API_KEY"))?;

        Ok(Self {
            addr,
            output_dir: PathBuf::from(or("OUTPUT_DIR", DEFAULT_OUTPUT_DIR)),
            speech: SpeechConfig {
                api_key: eleven_key,
                base_url: trim_base(&or("ELEVENLABS_BASE_URL", ELEVENLABS_BASE_URL)),
                default_voice_id: or("DEFAULT_VOICE_ID", DEFAULT_VOICE_ID),
                monolingual_model_id: or("MONOLINGUAL_MODEL_ID", MONOLINGUAL_MODEL_ID),
                multilingual_model_id: or("MULTILINGUAL_MODEL_ID", MULTILINGUAL_MODEL_ID),
            },
            video: VideoConfig {
                api_key: deepbrain_key,
                base_url: trim_base(&or("DEEPBRAIN_BASE_URL", DEEPBRAIN_BASE_URL)),
                default_model: or("DEFAULT_AVATAR_MODEL", DEFAULT_AVATAR_MODEL),
            },
        })
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
