//! WAV fixtures.

use std::path::Path;

const SAMPLE_RATE: u32 = 16_000;

/// Write `secs` of digital silence as 16-bit mono PCM.
pub fn write_silence(path: &Path, secs: f32) -> hound::Result<()> {
    write_samples(path, secs, |_| 0.0)
}

/// Write a 440 Hz sine tone at `amplitude` (0..=1) as 16-bit mono PCM.
pub fn write_tone(path: &Path, secs: f32, amplitude: f32) -> hound::Result<()> {
    write_samples(path, secs, |i| {
        let t = i as f32 / SAMPLE_RATE as f32;
        amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
    })
}

fn write_samples(path: &Path, secs: f32, sample: impl Fn(usize) -> f32) -> hound::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    let count = (secs * SAMPLE_RATE as f32) as usize;
    for i in 0..count {
        let value = sample(i).clamp(-1.0, 1.0);
        writer.write_sample((value * i16::MAX as f32) as i16)?;
    }
    writer.finalize()
}
