//! Audio I/O utilities for loading and saving waveforms.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

/// Audio buffer holding raw waveform data.
///
/// Samples are stored as 32-bit floats in the range \[-1.0, 1.0\].
///
/// # Example
///
/// ```rust,ignore
/// let audio = AudioBuffer::load("input.wav")?;
/// println!("Duration: {:.2}s", audio.duration());
///
/// let samples = engine.inv_spectrogram(&spec);
/// AudioBuffer::new(samples, 22050).save("output.wav")?;
/// ```
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono audio samples in \[-1.0, 1.0\] range
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a new audio buffer
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Save to WAV file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_wav(path, &self.samples, self.sample_rate)
    }

    /// Load from WAV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_wav(path)
    }

    /// Peak-normalize audio to [-1.0, 1.0] range
    pub fn normalize(&mut self) {
        let max_abs = self.samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        if max_abs > 0.0 && max_abs != 1.0 {
            for sample in &mut self.samples {
                *sample /= max_abs;
            }
        }
    }
}

/// Load a WAV file into an AudioBuffer
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            // 1u64: a plain 1 << 31 wraps to i32::MIN for 32-bit WAVs
            let max_val = (1u64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    // Convert to mono by averaging channels
    let mono_samples = if channels > 1 {
        samples
            .chunks(channels)
            .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    Ok(AudioBuffer::new(mono_samples, sample_rate))
}

/// Load a WAV file for training, enforcing the configured sample rate.
///
/// The waveform is peak-normalized after load. A file whose embedded sample
/// rate differs from `expected_rate` yields `Ok(None)` — the entry is skipped,
/// never resampled.
pub fn load_for_training<P: AsRef<Path>>(
    path: P,
    expected_rate: u32,
) -> Result<Option<AudioBuffer>> {
    let path = path.as_ref();
    let mut audio = load_wav(path)?;

    if audio.sample_rate != expected_rate {
        tracing::warn!(
            "Skipping {}: sample rate {} does not match configured {}",
            path.display(),
            audio.sample_rate,
            expected_rate
        );
        return Ok(None);
    }

    audio.normalize();
    Ok(Some(audio))
}

/// Save samples to a WAV file
pub fn save_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    let path = path.as_ref();
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    for &sample in samples {
        // Clamp to [-1.0, 1.0] and convert to i16
        let clamped = sample.clamp(-1.0, 1.0);
        let scaled = (clamped * 32767.0) as i16;
        writer.write_sample(scaled)?;
    }

    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_audio_buffer_new() {
        let samples = vec![0.1, 0.2, 0.3];
        let buffer = AudioBuffer::new(samples.clone(), 16000);
        assert_eq!(buffer.samples, samples);
        assert_eq!(buffer.sample_rate, 16000);
    }

    #[test]
    fn test_audio_buffer_duration() {
        let buffer = AudioBuffer::new(vec![0.0; 22050], 22050);
        assert!((buffer.duration() - 1.0).abs() < 1e-6);

        let buffer2 = AudioBuffer::new(vec![0.0; 44100], 22050);
        assert!((buffer2.duration() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_audio_buffer_len_and_empty() {
        let buffer = AudioBuffer::new(vec![0.0; 100], 22050);
        assert_eq!(buffer.len(), 100);
        assert!(!buffer.is_empty());

        let empty_buffer = AudioBuffer::new(vec![], 22050);
        assert_eq!(empty_buffer.len(), 0);
        assert!(empty_buffer.is_empty());
    }

    #[test]
    fn test_normalize() {
        let mut buffer = AudioBuffer::new(vec![0.5, -0.25, 0.1], 22050);
        buffer.normalize();
        assert!((buffer.samples[0] - 1.0).abs() < 1e-6);
        assert!((buffer.samples[1] - (-0.5)).abs() < 1e-6);
        assert!((buffer.samples[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_silence() {
        let mut buffer = AudioBuffer::new(vec![0.0, 0.0, 0.0], 22050);
        buffer.normalize();
        // Should not panic, samples remain zero
        assert!((buffer.samples[0]).abs() < 1e-6);
    }

    #[test]
    fn test_save_and_load_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wav");

        let original = AudioBuffer::new(vec![0.1, 0.2, -0.3, 0.4, -0.5], 22050);
        original.save(&path).unwrap();

        let loaded = AudioBuffer::load(&path).unwrap();
        assert_eq!(loaded.sample_rate, 22050);
        assert_eq!(loaded.samples.len(), 5);

        for (a, b) in original.samples.iter().zip(loaded.samples.iter()) {
            assert!((a - b).abs() < 1e-4, "sample mismatch: {a} vs {b}");
        }
    }

    #[test]
    fn test_load_32bit_int_wav_keeps_sign() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("int32.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 32,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for &v in &[i32::MAX / 2, -(i32::MAX / 4), 0] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let audio = load_wav(&path).unwrap();
        assert!((audio.samples[0] - 0.5).abs() < 1e-3);
        assert!((audio.samples[1] + 0.25).abs() < 1e-3);
        assert!((audio.samples[2]).abs() < 1e-6);
    }

    #[test]
    fn test_load_for_training_matching_rate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("match.wav");
        save_wav(&path, &[0.5, -0.25, 0.1], 22050).unwrap();

        let loaded = load_for_training(&path, 22050).unwrap();
        let audio = loaded.expect("matching sample rate should load");
        // Peak-normalized on load
        let max_abs = audio.samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        assert!((max_abs - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_load_for_training_rate_mismatch_skips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mismatch.wav");
        save_wav(&path, &[0.1, 0.2, 0.3], 16000).unwrap();

        let loaded = load_for_training(&path, 22050).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_wav("/nonexistent/path/to/file.wav");
        assert!(result.is_err());
    }
}
