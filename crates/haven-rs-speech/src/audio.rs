//! WAV decoding and simple signal measurements.

use crate::error::SpeechError;
use std::io::Cursor;
use std::path::Path;

/// Sample rate whisper models expect.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Mono samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Linear-interpolated copy at `target_rate`.
    pub fn resampled(&self, target_rate: u32) -> DecodedAudio {
        if self.sample_rate == target_rate || self.samples.is_empty() || self.sample_rate == 0 {
            return DecodedAudio {
                samples: self.samples.clone(),
                sample_rate: target_rate,
            };
        }
        let ratio = self.sample_rate as f64 / target_rate as f64;
        let out_len = ((self.samples.len() as f64) / ratio).floor() as usize;
        let last = self.samples.len() - 1;
        let samples = (0..out_len)
            .map(|i| {
                let pos = i as f64 * ratio;
                let idx = pos.floor() as usize;
                let frac = (pos - idx as f64) as f32;
                let a = self.samples[idx.min(last)];
                let b = self.samples[(idx + 1).min(last)];
                a + (b - a) * frac
            })
            .collect();
        DecodedAudio {
            samples,
            sample_rate: target_rate,
        }
    }
}

/// Decode a WAV file, downmixing to mono.
pub fn decode_wav(path: &Path) -> Result<DecodedAudio, SpeechError> {
    let reader = hound::WavReader::open(path)
        .map_err(|err| SpeechError::InvalidAudio(format!("{}: {err}", path.display())))?;
    decode_reader(reader)
}

fn decode_reader<R: std::io::Read>(
    reader: hound::WavReader<R>,
) -> Result<DecodedAudio, SpeechError> {
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;
    let invalid = |err: hound::Error| SpeechError::InvalidAudio(err.to_string());
    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(invalid)?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(invalid)?
        }
    };
    let samples = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Encode mono samples as 16-bit PCM WAV bytes.
pub fn encode_wav(audio: &DecodedAudio) -> Result<Vec<u8>, SpeechError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let backend = |err: hound::Error| SpeechError::Backend(err.to_string());
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(backend)?;
        for sample in &audio.samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(value).map_err(backend)?;
        }
        writer.finalize().map_err(backend)?;
    }
    Ok(cursor.into_inner())
}

/// Root-mean-square level; zero for empty input.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}
