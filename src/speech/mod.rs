pub mod audio;
pub mod language;
pub mod request;
pub mod voice;

use std::collections::BTreeMap;
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::config::SpeechConfig;
use crate::error::AppError;
use crate::vendor::{VendorRequest, VendorTransport};

pub use audio::{AudioArtifact, OutputFormat, Track};
pub use language::{classify_text, ModelSelection};
pub use request::{SynthesisRequest, TextToSpeechBody, VoiceSettings};
pub use voice::{VoiceDescriptor, VoicesPayload};

pub const DEFAULT_AMBIENCE_DB: f32 = -10.0;
pub const MAX_AMBIENCE_BYTES: usize = 32 * 1024 * 1024;

/// Where the background bed comes from and how loud each layer is.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbienceOptions {
    pub track_ref: String,
    pub speech_volume_db: f32,
    pub ambience_volume_db: f32,
}

impl AmbienceOptions {
    pub fn new(track_ref: impl Into<String>) -> Self {
        Self {
            track_ref: track_ref.into(),
            speech_volume_db: 0.0,
            ambience_volume_db: DEFAULT_AMBIENCE_DB,
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.track_ref.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "ambienceTrackRef cannot be empty".into(),
            ));
        }
        if !self.speech_volume_db.is_finite() || !self.ambience_volume_db.is_finite() {
            return Err(AppError::InvalidInput("Volume must be a finite dB value".into()));
        }
        Ok(())
    }
}

/// ElevenLabs facade. Every operation issues at most one synthesis call.
pub struct SpeechService {
    config: SpeechConfig,
    transport: Arc<dyn VendorTransport>,
}

impl SpeechService {
    pub fn new(config: SpeechConfig, transport: Arc<dyn VendorTransport>) -> Self {
        Self { config, transport }
    }

    /// Caller's model unless the text needs the multilingual one.
    pub fn resolve_model(&self, request: &SynthesisRequest) -> String {
        match classify_text(&request.text) {
            ModelSelection::Multilingual => self.config.multilingual_model_id.clone(),
            ModelSelection::Monolingual => request
                .model_id
                .clone()
                .unwrap_or_else(|| self.config.monolingual_model_id.clone()),
        }
    }

    pub async fn generate_simple(
        &self,
        request: SynthesisRequest,
    ) -> Result<AudioArtifact, AppError> {
        request.validate()?;
        self.synthesize(&request).await
    }

    pub async fn generate_modulated(
        &self,
        request: SynthesisRequest,
    ) -> Result<AudioArtifact, AppError> {
        if request.settings.is_none() {
            return Err(AppError::InvalidInput(
                "stability and similarityBoost are required".into(),
            ));
        }
        self.generate_simple(request).await
    }

    pub async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, AppError> {
        let url = format!("{}/v1/voices", self.config.base_url);
        let response = self
            .transport
            .send(VendorRequest::get(url).header("xi-api-key", &self.config.api_key))
            .await?
            .error_for_status()?;

        let payload: VoicesPayload = serde_json::from_slice(&response.body).map_err(|e| {
            AppError::upstream(response.status, format!("Unexpected voices payload: {}", e))
        })?;

        tracing::info!("Fetched {} voices", payload.voices.len());
        Ok(payload.voices)
    }

    pub async fn generate_in_language(
        &self,
        text: &str,
        language_tag: &str,
        extra_labels: &BTreeMap<String, String>,
        output_format: OutputFormat,
    ) -> Result<AudioArtifact, AppError> {
        let request = SynthesisRequest::new(text).format(output_format);
        request.validate()?;
        if language_tag.trim().is_empty() {
            return Err(AppError::InvalidInput("languageTag cannot be empty".into()));
        }

        let voices = self.list_voices().await?;
        let voice = voice::find_voice(&voices, language_tag, extra_labels)
            .ok_or_else(|| AppError::NoMatchingVoice(language_tag.to_string()))?;

        tracing::info!(
            "Using voice '{}' ({}) for language '{}'",
            voice.name,
            voice.id,
            language_tag
        );

        self.generate_simple(request.voice(Some(voice.id.clone())))
            .await
    }

    pub async fn generate_with_ambience(
        &self,
        request: SynthesisRequest,
        ambience: &AmbienceOptions,
    ) -> Result<AudioArtifact, AppError> {
        request.validate()?;
        ambience.validate()?;

        // Bed is loaded and decoded before synthesis.
        let bed = self.load_ambience(&ambience.track_ref).await?;

        let format =
            OutputFormat::pcm_for_rate(bed.sample_rate).unwrap_or(OutputFormat::Pcm44100);
        let speech = self.generate_simple(request.format(format)).await?;
        let speech = audio::decode_wav(&speech.bytes)?;

        let mixed = audio::overlay(
            &speech,
            &bed,
            ambience.speech_volume_db,
            ambience.ambience_volume_db,
        );
        tracing::info!(
            "Mixed {:.2}s of speech over '{}'",
            mixed.duration_secs(),
            ambience.track_ref
        );

        Ok(AudioArtifact::wav(audio::track_to_wav(&mixed)?))
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioArtifact, AppError> {
        let voice_id = request
            .voice_id
            .as_deref()
            .unwrap_or(&self.config.default_voice_id);
        let model_id = self.resolve_model(request);
        let format = request.output_format;

        tracing::info!(
            "Synthesizing {} chars with voice {} and model {}",
            request.text.chars().count(),
            voice_id,
            model_id
        );

        let url = format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.config.base_url,
            utf8_percent_encode(voice_id, NON_ALPHANUMERIC),
            format.query_value()
        );
        let body = serde_json::to_value(TextToSpeechBody {
            text: &request.text,
            model_id: &model_id,
            voice_settings: request.settings,
        })?;

        let response = self
            .transport
            .send(
                VendorRequest::post(url, body)
                    .header("xi-api-key", &self.config.api_key)
                    .header("accept", format.accept_header()),
            )
            .await?
            .error_for_status()?;

        if response.body.is_empty() {
            return Err(AppError::upstream(
                response.status,
                "Vendor returned an empty audio body",
            ));
        }
        if let Some(content_type) = response.content_type.as_deref() {
            if !is_audio_content_type(content_type) {
                return Err(AppError::upstream(
                    response.status,
                    format!(
                        "Expected audio but vendor sent {}: {}",
                        content_type,
                        response.text()
                    ),
                ));
            }
        }

        match format.pcm_rate() {
            Some(rate) => {
                let track = audio::pcm16_to_track(&response.body, rate);
                Ok(AudioArtifact::wav(audio::track_to_wav(&track)?))
            }
            None => Ok(AudioArtifact::mp3(response.body)),
        }
    }

    async fn load_ambience(&self, track_ref: &str) -> Result<Track, AppError> {
        let track_ref = track_ref.trim();
        let bytes = if track_ref.starts_with("http://") || track_ref.starts_with("https://") {
            let response = self
                .transport
                .send(VendorRequest::get(track_ref).limit_body(MAX_AMBIENCE_BYTES))
                .await
                .map_err(|e| match e {
                    AppError::TooLarge(_) => e,
                    other => AppError::AssetNotFound(format!("{}: {}", track_ref, other)),
                })?;
            if !response.is_success() {
                return Err(AppError::AssetNotFound(format!(
                    "{}: HTTP {}",
                    track_ref, response.status
                )));
            }
            response.body
        } else {
            let metadata = tokio::fs::metadata(track_ref)
                .await
                .map_err(|e| AppError::AssetNotFound(format!("{}: {}", track_ref, e)))?;
            if metadata.len() > MAX_AMBIENCE_BYTES as u64 {
                return Err(AppError::TooLarge(format!(
                    "{} is larger than {} bytes",
                    track_ref, MAX_AMBIENCE_BYTES
                )));
            }
            tokio::fs::read(track_ref)
                .await
                .map_err(|e| AppError::AssetNotFound(format!("{}: {}", track_ref, e)))?
        };

        let track = audio::decode_wav(&bytes).map_err(|e| {
            AppError::AssetNotFound(format!("{} is not a readable WAV track ({})", track_ref, e))
        })?;
        if track.sample_rate == 0 {
            return Err(AppError::AssetNotFound(format!(
                "{} declares a zero sample rate",
                track_ref
            )));
        }
        Ok(track)
    }
}

fn is_audio_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.starts_with("audio/") || mime == "application/octet-stream"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendor::fake::FakeVendor;
    use crate::vendor::{HttpMethod, VendorResponse};

    const VOICES: &str = r#"{"voices":[
        {"voice_id":"v-en","name":"Rachel","labels":{"language":"en","accent":"american"}},
        {"voice_id":"v-fr","name":"Amelie","labels":{"language":"fr"}},
        {"voice_id":"v-none","name":"Plain","labels":null}
    ]}"#;

    fn config() -> SpeechConfig {
        SpeechConfig {
            api_key: "test-key".into(),
            base_url: "http://eleven.test".into(),
            default_voice_id: "default-voice".into(),
            monolingual_model_id: "mono".into(),
            multilingual_model_id: "multi".into(),
        }
    }

    fn service(fake: &Arc<FakeVendor>) -> SpeechService {
        SpeechService::new(config(), fake.clone())
    }

    fn tts_ok() -> FakeVendor {
        FakeVendor::new().reply(
            HttpMethod::Post,
            "/v1/text-to-speech/",
            200,
            b"ID3-audio".to_vec(),
        )
    }

    fn wav_file(dir: &std::path::Path, rate: u32, samples: &[f32]) -> String {
        let path = dir.join("bed.wav");
        let bytes = audio::track_to_wav(&Track {
            sample_rate: rate,
            samples: samples.to_vec(),
        })
        .unwrap();
        std::fs::write(&path, bytes).unwrap();
        path.to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn simple_uses_default_voice_and_monolingual_model() {
        let fake = Arc::new(tts_ok());
        let artifact = service(&fake)
            .generate_simple(SynthesisRequest::new("Hello there"))
            .await
            .unwrap();

        assert_eq!(artifact.bytes, b"ID3-audio");
        assert_eq!(artifact.content_type, "audio/mpeg");

        let sent = &fake.requests()[0];
        assert_eq!(
            sent.url,
            "http://eleven.test/v1/text-to-speech/default-voice?output_format=mp3_44100_128"
        );
        assert_eq!(sent.header_value("xi-api-key"), Some("test-key"));
        let body = sent.body.as_ref().unwrap();
        assert_eq!(body["text"], "Hello there");
        assert_eq!(body["model_id"], "mono");
        assert!(body.get("voice_settings").is_none());
    }

    #[tokio::test]
    async fn mixed_language_text_forces_multilingual_model() {
        let fake = Arc::new(tts_ok());
        service(&fake)
            .generate_simple(
                SynthesisRequest::new("Hello, ça va?")
                    .voice(Some("mine".into()))
                    .model(Some("caller-model".into())),
            )
            .await
            .unwrap();

        let sent = &fake.requests()[0];
        assert!(sent.url.contains("/text-to-speech/mine?"));
        assert_eq!(sent.body.as_ref().unwrap()["model_id"], "multi");
    }

    #[tokio::test]
    async fn caller_model_kept_for_ascii_text() {
        let fake = Arc::new(tts_ok());
        service(&fake)
            .generate_simple(SynthesisRequest::new("plain").model(Some("turbo".into())))
            .await
            .unwrap();
        assert_eq!(fake.requests()[0].body.as_ref().unwrap()["model_id"], "turbo");
    }

    #[tokio::test]
    async fn empty_text_is_rejected_without_vendor_call() {
        let fake = Arc::new(tts_ok());
        let err = service(&fake)
            .generate_simple(SynthesisRequest::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn vendor_failure_surfaces_status_and_message() {
        let fake = Arc::new(FakeVendor::new().reply(
            HttpMethod::Post,
            "/v1/text-to-speech/",
            401,
            br#"{"detail":{"status":"invalid_api_key"}}"#.to_vec(),
        ));
        let err = service(&fake)
            .generate_simple(SynthesisRequest::new("hi"))
            .await
            .unwrap_err();
        match err {
            AppError::Upstream {
                status, message, ..
            } => {
                assert_eq!(status, 401);
                assert!(message.contains("invalid_api_key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_vendor_body_is_an_upstream_error() {
        let fake = Arc::new(FakeVendor::new().reply(
            HttpMethod::Post,
            "/v1/text-to-speech/",
            200,
            Vec::new(),
        ));
        let err = service(&fake)
            .generate_simple(SynthesisRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: 200, .. }));
    }

    #[tokio::test]
    async fn voice_id_is_percent_encoded_in_path() {
        let fake = Arc::new(tts_ok());
        service(&fake)
            .generate_simple(
                SynthesisRequest::new("hi").voice(Some("abc?output_format=pcm_16000&x=".into())),
            )
            .await
            .unwrap();

        assert_eq!(
            fake.requests()[0].url,
            "http://eleven.test/v1/text-to-speech/abc%3Foutput%5Fformat%3Dpcm%5F16000%26x%3D\
             ?output_format=mp3_44100_128"
        );
    }

    #[tokio::test]
    async fn json_reply_with_success_status_is_rejected() {
        let fake = Arc::new(FakeVendor::new().on(
            HttpMethod::Post,
            "/v1/text-to-speech/",
            |_| VendorResponse {
                status: 200,
                content_type: Some("application/json".into()),
                body: br#"{"detail":"quota exceeded"}"#.to_vec(),
            },
        ));
        let err = service(&fake)
            .generate_simple(SynthesisRequest::new("hi"))
            .await
            .unwrap_err();
        match err {
            AppError::Upstream {
                status, message, ..
            } => {
                assert_eq!(status, 200);
                assert!(message.contains("application/json"));
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn audio_content_types_are_recognised() {
        assert!(is_audio_content_type("audio/mpeg"));
        assert!(is_audio_content_type("Audio/PCM; rate=16000"));
        assert!(is_audio_content_type("application/octet-stream"));
        assert!(!is_audio_content_type("application/json; charset=utf-8"));
        assert!(!is_audio_content_type("text/html"));
    }

    #[tokio::test]
    async fn pcm_output_is_wrapped_as_wav() {
        let fake = Arc::new(FakeVendor::new().reply(
            HttpMethod::Post,
            "/v1/text-to-speech/",
            200,
            vec![0u8; 200],
        ));
        let artifact = service(&fake)
            .generate_simple(SynthesisRequest::new("hi").format(OutputFormat::Pcm16000))
            .await
            .unwrap();
        assert_eq!(artifact.content_type, "audio/wav");
        assert!(artifact.bytes.starts_with(b"RIFF"));
        assert!(fake.requests()[0].url.ends_with("output_format=pcm_16000"));
        let track = audio::decode_wav(&artifact.bytes).unwrap();
        assert_eq!(track.sample_rate, 16000);
        assert_eq!(track.samples.len(), 100);
    }

    #[tokio::test]
    async fn modulated_forwards_settings_verbatim() {
        let fake = Arc::new(tts_ok());
        service(&fake)
            .generate_modulated(
                SynthesisRequest::new("Wow!")
                    .settings(Some(VoiceSettings::new(0.25, 0.5).unwrap())),
            )
            .await
            .unwrap();
        let body = fake.requests()[0].body.clone().unwrap();
        assert_eq!(body["voice_settings"]["stability"], 0.25);
        assert_eq!(body["voice_settings"]["similarity_boost"], 0.5);
    }

    #[tokio::test]
    async fn modulated_requires_settings() {
        let fake = Arc::new(tts_ok());
        let err = service(&fake)
            .generate_modulated(SynthesisRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn modulated_rejects_out_of_range_values() {
        let fake = Arc::new(tts_ok());
        let svc = service(&fake);
        for (stability, boost) in [(1.5, 0.5), (0.5, -0.1), (-3.0, 7.0)] {
            let request = SynthesisRequest::new("hi").settings(Some(VoiceSettings {
                stability,
                similarity_boost: boost,
            }));
            let err = svc.generate_modulated(request).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn list_voices_passes_vendor_list_through() {
        let fake = Arc::new(FakeVendor::new().reply(HttpMethod::Get, "/v1/voices", 200, VOICES));
        let voices = service(&fake).list_voices().await.unwrap();

        assert_eq!(voices.len(), 3);
        assert_eq!(voices[0].id, "v-en");
        assert_eq!(voices[0].name, "Rachel");
        assert_eq!(voices[0].labels.get("accent").map(String::as_str), Some("american"));
        assert_eq!(voices[1].labels.len(), 1);
        assert!(voices[2].labels.is_empty());
        assert_eq!(fake.requests()[0].url, "http://eleven.test/v1/voices");
    }

    #[tokio::test]
    async fn list_voices_surfaces_vendor_error() {
        let fake = Arc::new(FakeVendor::new().reply(HttpMethod::Get, "/v1/voices", 500, "boom"));
        let err = service(&fake).list_voices().await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: 500, .. }));
    }

    #[tokio::test]
    async fn in_language_resolves_labelled_voice() {
        let fake = Arc::new(
            tts_ok().reply(HttpMethod::Get, "/v1/voices", 200, VOICES),
        );
        let artifact = service(&fake)
            .generate_in_language("hello", "fr", &BTreeMap::new(), OutputFormat::default())
            .await
            .unwrap();
        assert!(!artifact.bytes.is_empty());

        let requests = fake.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].url.contains("/text-to-speech/v-fr?"));
    }

    #[tokio::test]
    async fn in_language_without_candidate_fails() {
        let fake = Arc::new(tts_ok().reply(HttpMethod::Get, "/v1/voices", 200, VOICES));
        let err = service(&fake)
            .generate_in_language("hallo", "de", &BTreeMap::new(), OutputFormat::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoMatchingVoice(tag) if tag == "de"));
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn ambience_missing_file_fails_before_vendor_call() {
        let fake = Arc::new(tts_ok());
        let err = service(&fake)
            .generate_with_ambience(
                SynthesisRequest::new("News tonight"),
                &AmbienceOptions::new("/definitely/not/here.wav"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AssetNotFound(_)));
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn ambience_unreadable_file_fails_before_vendor_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bed.mp3");
        std::fs::write(&path, b"not audio").unwrap();

        let fake = Arc::new(tts_ok());
        let err = service(&fake)
            .generate_with_ambience(
                SynthesisRequest::new("News tonight"),
                &AmbienceOptions::new(path.to_string_lossy()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AssetNotFound(_)));
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn ambience_is_mixed_to_speech_length() {
        let dir = tempfile::tempdir().unwrap();
        let bed = wav_file(dir.path(), 22050, &[0.2; 10]);

        // 300 samples of silence as 16-bit PCM
        let fake = Arc::new(FakeVendor::new().reply(
            HttpMethod::Post,
            "/v1/text-to-speech/",
            200,
            vec![0u8; 600],
        ));
        let mut options = AmbienceOptions::new(bed);
        options.ambience_volume_db = 0.0;

        let artifact = service(&fake)
            .generate_with_ambience(SynthesisRequest::new("News tonight"), &options)
            .await
            .unwrap();

        assert_eq!(artifact.content_type, "audio/wav");
        assert!(fake.requests()[0].url.ends_with("output_format=pcm_22050"));

        let mixed = audio::decode_wav(&artifact.bytes).unwrap();
        assert_eq!(mixed.sample_rate, 22050);
        assert_eq!(mixed.samples.len(), 300);
        assert!(mixed.samples.iter().all(|s| (s - 0.2).abs() < 0.001));
    }

    #[tokio::test]
    async fn ambience_at_unsupported_rate_uses_44100() {
        let dir = tempfile::tempdir().unwrap();
        let bed = wav_file(dir.path(), 48000, &[0.0; 48]);
        let fake = Arc::new(FakeVendor::new().reply(
            HttpMethod::Post,
            "/v1/text-to-speech/",
            200,
            vec![0u8; 882],
        ));

        let artifact = service(&fake)
            .generate_with_ambience(SynthesisRequest::new("hi"), &AmbienceOptions::new(bed))
            .await
            .unwrap();
        assert!(fake.requests()[0].url.ends_with("output_format=pcm_44100"));
        assert_eq!(audio::decode_wav(&artifact.bytes).unwrap().samples.len(), 441);
    }

    #[tokio::test]
    async fn ambience_can_be_fetched_remotely() {
        let bed = audio::track_to_wav(&Track {
            sample_rate: 16000,
            samples: vec![0.1; 4],
        })
        .unwrap();
        let fake = Arc::new(
            FakeVendor::new()
                .reply(HttpMethod::Get, "assets.test/bed.wav", 200, bed)
                .reply(HttpMethod::Post, "/v1/text-to-speech/", 200, vec![0u8; 16]),
        );

        let artifact = service(&fake)
            .generate_with_ambience(
                SynthesisRequest::new("hi"),
                &AmbienceOptions::new("https://assets.test/bed.wav"),
            )
            .await
            .unwrap();

        let requests = fake.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].header_value("xi-api-key"), None);
        assert_eq!(audio::decode_wav(&artifact.bytes).unwrap().samples.len(), 8);
    }

    #[tokio::test]
    async fn remote_ambience_404_is_asset_not_found() {
        let fake = Arc::new(tts_ok().reply(HttpMethod::Get, "assets.test", 404, "missing"));
        let err = service(&fake)
            .generate_with_ambience(
                SynthesisRequest::new("hi"),
                &AmbienceOptions::new("https://assets.test/gone.wav"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AssetNotFound(_)));
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn oversized_remote_ambience_is_rejected_before_synthesis() {
        let fake = Arc::new(tts_ok().reply(
            HttpMethod::Get,
            "assets.test",
            200,
            vec![0u8; MAX_AMBIENCE_BYTES + 1],
        ));
        let err = service(&fake)
            .generate_with_ambience(
                SynthesisRequest::new("hi"),
                &AmbienceOptions::new("https://assets.test/huge.wav"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TooLarge(_)));
        let requests = fake.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_body_bytes, Some(MAX_AMBIENCE_BYTES));
    }

    #[tokio::test]
    async fn oversized_local_ambience_is_rejected_without_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.wav");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_AMBIENCE_BYTES as u64 + 1).unwrap();

        let fake = Arc::new(tts_ok());
        let err = service(&fake)
            .generate_with_ambience(
                SynthesisRequest::new("hi"),
                &AmbienceOptions::new(path.to_string_lossy()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TooLarge(_)));
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn one_hertz_ambience_mixes_at_speech_length() {
        let dir = tempfile::tempdir().unwrap();
        let bed = wav_file(dir.path(), 1, &[0.25; 3]);
        // 100 silent samples at the 44100 Hz fallback rate
        let fake = Arc::new(FakeVendor::new().reply(
            HttpMethod::Post,
            "/v1/text-to-speech/",
            200,
            vec![0u8; 200],
        ));
        let mut options = AmbienceOptions::new(bed);
        options.ambience_volume_db = 0.0;

        let artifact = service(&fake)
            .generate_with_ambience(SynthesisRequest::new("hi"), &options)
            .await
            .unwrap();

        assert!(fake.requests()[0].url.ends_with("output_format=pcm_44100"));
        let mixed = audio::decode_wav(&artifact.bytes).unwrap();
        assert_eq!(mixed.sample_rate, 44100);
        assert_eq!(mixed.samples.len(), 100);
        assert!(mixed.samples.iter().all(|s| (s - 0.25).abs() < 0.001));
    }

    #[tokio::test]
    async fn concurrent_requests_do_not_share_parameters() {
        let fake = Arc::new(FakeVendor::new().on(
            HttpMethod::Post,
            "/v1/text-to-speech/",
            |req| {
                let text = req.body.as_ref().unwrap()["text"].as_str().unwrap().to_string();
                VendorResponse {
                    status: 200,
                    content_type: Some("audio/mpeg".into()),
                    body: text.into_bytes(),
                }
            },
        ));
        let svc = service(&fake);

        let (a, b) = tokio::join!(
            svc.generate_simple(SynthesisRequest::new("first text").voice(Some("va".into()))),
            svc.generate_simple(SynthesisRequest::new("second text").voice(Some("vb".into()))),
        );

        assert_eq!(a.unwrap().bytes, b"first text");
        assert_eq!(b.unwrap().bytes, b"second text");

        let requests = fake.requests();
        assert_eq!(requests.len(), 2);
        for req in requests {
            let text = req.body.as_ref().unwrap()["text"].as_str().unwrap().to_string();
            let expected_voice = if text == "first text" { "/va?" } else { "/vb?" };
            assert!(req.url.contains(expected_voice));
        }
    }
}
