use std::io::Cursor;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::Deserialize;

use crate::error::AppError;

/// ElevenLabs `output_format` values this service asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "mp3_44100_128")]
    Mp3_44100_128,
    #[serde(rename = "pcm_16000")]
    Pcm16000,
    #[serde(rename = "pcm_22050")]
    Pcm22050,
    #[serde(rename = "pcm_24000")]
    Pcm24000,
    #[serde(rename = "pcm_44100")]
    Pcm44100,
}

impl OutputFormat {
    pub fn query_value(self) -> &'static str {
        match self {
            OutputFormat::Mp3_44100_128 => "mp3_44100_128",
            OutputFormat::Pcm16000 => "pcm_16000",
            OutputFormat::Pcm22050 => "pcm_22050",
            OutputFormat::Pcm24000 => "pcm_24000",
            OutputFormat::Pcm44100 => "pcm_44100",
        }
    }

    /// Sample rate of raw PCM output; `None` for compressed formats.
    pub fn pcm_rate(self) -> Option<u32> {
        match self {
            OutputFormat::Mp3_44100_128 => None,
            OutputFormat::Pcm16000 => Some(16_000),
            OutputFormat::Pcm22050 => Some(22_050),
            OutputFormat::Pcm24000 => Some(24_000),
            OutputFormat::Pcm44100 => Some(44_100),
        }
    }

    pub fn pcm_for_rate(rate: u32) -> Option<Self> {
        [
            OutputFormat::Pcm16000,
            OutputFormat::Pcm22050,
            OutputFormat::Pcm24000,
            OutputFormat::Pcm44100,
        ]
        .into_iter()
        .find(|f| f.pcm_rate() == Some(rate))
    }

    pub fn accept_header(self) -> &'static str {
        match self {
            OutputFormat::Mp3_44100_128 => "audio/mpeg",
            _ => "audio/pcm",
        }
    }
}

/// Playable audio produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl AudioArtifact {
    pub fn mp3(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: "audio/mpeg",
        }
    }

    pub fn wav(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: "audio/wav",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self.content_type {
            "audio/wav" => "wav",
            _ => "mp3",
        }
    }

    /// Writes the artifact under `dir` with a fresh unique name.
    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}.{}", uuid::Uuid::new_v4(), self.extension()));
        tokio::fs::write(&path, &self.bytes).await?;
        tracing::info!("Saved {} bytes to {}", self.bytes.len(), path.display());
        Ok(path)
    }
}

/// Mono track normalised to [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl Track {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Interpret raw 16-bit little-endian mono PCM as returned by ElevenLabs.
pub fn pcm16_to_track(pcm: &[u8], sample_rate: u32) -> Track {
    let samples = pcm
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect();
    Track {
        sample_rate,
        samples,
    }
}

/// Decode a WAV file, downmixing every channel to mono.
pub fn decode_wav(bytes: &[u8]) -> Result<Track, AppError> {
    let mut reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| AppError::Audio(format!("Unreadable WAV data: {}", e)))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AppError::Audio(format!("Corrupt WAV samples: {}", e)))?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| AppError::Audio(format!("Corrupt WAV samples: {}", e)))?
        }
    };

    let samples = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    Ok(Track {
        sample_rate: spec.sample_rate,
        samples,
    })
}

/// Encode a mono track as 16-bit WAV.
pub fn track_to_wav(track: &Track) -> Result<Vec<u8>, AppError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: track.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Vec::new();
    {
        let cursor = Cursor::new(&mut buffer);
        let mut writer = WavWriter::new(cursor, spec)
            .map_err(|e| AppError::Audio(format!("Failed to create WAV writer: {}", e)))?;

        for sample in &track.samples {
            let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(scaled)
                .map_err(|e| AppError::Audio(format!("Failed to write sample: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| AppError::Audio(format!("Failed to finalize WAV: {}", e)))?;
    }

    Ok(buffer)
}

/// Reads `track` as an endless loop at `target_rate`, interpolating
/// linearly between neighbouring samples. Nothing is materialised, so the
/// cost is per output sample whatever the source rate.
pub struct LoopedSampler<'a> {
    samples: &'a [f32],
    step: f64,
}

impl<'a> LoopedSampler<'a> {
    pub fn new(track: &'a Track, target_rate: u32) -> Self {
        let step = if track.sample_rate == 0 || target_rate == 0 {
            0.0
        } else {
            track.sample_rate as f64 / target_rate as f64
        };
        Self {
            samples: &track.samples,
            step,
        }
    }

    pub fn at(&self, index: usize) -> f32 {
        let len = self.samples.len();
        if len == 0 {
            return 0.0;
        }
        let pos = (index as f64 * self.step) % len as f64;
        let idx = (pos.floor() as usize).min(len - 1);
        let frac = (pos - idx as f64) as f32;
        let a = self.samples[idx];
        let b = self.samples[(idx + 1) % len];
        a + (b - a) * frac
    }
}

pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Additive mix of `ambience` under `speech`. The ambience is read at the
/// speech rate and looped or truncated, so the result is always exactly as
/// long as the speech.
pub fn overlay(speech: &Track, ambience: &Track, speech_db: f32, ambience_db: f32) -> Track {
    let bed = LoopedSampler::new(ambience, speech.sample_rate);
    let speech_gain = db_to_gain(speech_db);
    let ambience_gain = db_to_gain(ambience_db);

    let samples = speech
        .samples
        .iter()
        .enumerate()
        .map(|(i, s)| (s * speech_gain + bed.at(i) * ambience_gain).clamp(-1.0, 1.0))
        .collect();

    Track {
        sample_rate: speech.sample_rate,
        samples,
    }
}
