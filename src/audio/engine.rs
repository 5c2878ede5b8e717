//! Spectrogram engine: forward and inverse pipelines.
//!
//! Forward: pre-emphasis → STFT → magnitude → dB → [0, 1] normalization,
//! optionally through the mel filterbank. Inverse: denormalization →
//! dB-to-amplitude → Griffin-Lim → inverse pre-emphasis.
//!
//! Spectrograms are frame-major `Vec<Vec<f32>>`: `spec[frame][bin]`.
//! Normalized values live in [0, 1]; denormalized values are raw dB. The
//! two forms never mix without an explicit normalize/denormalize call.

use anyhow::Result;
use num_complex::Complex;

use crate::config::Config;

use super::griffin_lim::GriffinLim;
use super::mel::MelFilterbank;
use super::preemphasis::{inv_preemphasis, preemphasis};
use super::stft::Stft;

/// Magnitude floor before the log — keeps silence out of `-inf`
const AMP_FLOOR: f32 = 1e-5;

/// Composes the transform primitives into the full analysis/synthesis
/// pipelines.
///
/// Holds only the read-only config and the precomputed window/filterbank;
/// every method is a pure function of its input, so one engine can be
/// shared by reference across worker threads.
pub struct SpectrogramEngine {
    config: Config,
    stft: Stft,
    mel: MelFilterbank,
}

impl SpectrogramEngine {
    /// Build an engine from a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let stft = Stft::new(config.n_fft(), config.frame_shift, config.frame_length);
        let mel = MelFilterbank::new(
            config.sample_rate,
            config.n_fft(),
            config.num_mels,
            config.fmin,
            config.fmax,
        );
        Ok(Self { config, stft, mel })
    }

    /// The engine's configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Normalized log-magnitude linear spectrogram,
    /// `spec[frame][num_freq]`, values in [0, 1].
    pub fn spectrogram(&self, y: &[f32]) -> Vec<Vec<f32>> {
        let emphasized = preemphasis(y, self.config.preemphasis);
        let frames = self.stft.stft(&emphasized);
        let mag = magnitude(&frames);
        self.to_normalized_db(&mag)
    }

    /// Normalized log-magnitude mel spectrogram,
    /// `spec[frame][num_mels]`, values in [0, 1].
    pub fn melspectrogram(&self, y: &[f32]) -> Vec<Vec<f32>> {
        let emphasized = preemphasis(y, self.config.preemphasis);
        let frames = self.stft.stft(&emphasized);
        let mel = self.mel.linear_to_mel(&magnitude(&frames));
        self.to_normalized_db(&mel)
    }

    /// Invert a normalized linear spectrogram back to a waveform with
    /// unseeded (non-deterministic) Griffin-Lim phases.
    pub fn inv_spectrogram(&self, spec: &[Vec<f32>]) -> Vec<f32> {
        self.inv_spectrogram_seeded(spec, None)
    }

    /// [`Self::inv_spectrogram`] with an explicit phase seed for
    /// reproducible output.
    pub fn inv_spectrogram_seeded(&self, spec: &[Vec<f32>], seed: Option<u64>) -> Vec<f32> {
        let amp = self.to_amplitude(spec);
        let sharpened = self.sharpen(&amp);
        let gl = GriffinLim::new(&self.stft, self.config.gl_iters);
        inv_preemphasis(&gl.reconstruct(&sharpened, seed), self.config.preemphasis)
    }

    /// Invert a normalized mel spectrogram back to a waveform through the
    /// filterbank's pseudo-inverse.
    pub fn inv_melspectrogram(&self, spec: &[Vec<f32>]) -> Result<Vec<f32>> {
        self.inv_melspectrogram_seeded(spec, None)
    }

    /// [`Self::inv_melspectrogram`] with an explicit phase seed.
    pub fn inv_melspectrogram_seeded(
        &self,
        spec: &[Vec<f32>],
        seed: Option<u64>,
    ) -> Result<Vec<f32>> {
        let amp = self.to_amplitude(spec);
        let linear = self.mel.mel_to_linear(&amp)?;
        let sharpened = self.sharpen(&linear);
        let gl = GriffinLim::new(&self.stft, self.config.gl_iters);
        Ok(inv_preemphasis(
            &gl.reconstruct(&sharpened, seed),
            self.config.preemphasis,
        ))
    }

    /// amplitude → normalized dB, elementwise over a spectrogram
    fn to_normalized_db(&self, frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
        map_frames(frames, |v| {
            self.normalize(amp_to_db(v) - self.config.ref_level_db)
        })
    }

    /// normalized dB → amplitude, elementwise over a spectrogram
    fn to_amplitude(&self, frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
        map_frames(frames, |v| {
            db_to_amp(self.denormalize(v) + self.config.ref_level_db)
        })
    }

    /// Raise amplitudes to the configured power exponent; sharpens spectral
    /// peaks and reduces Griffin-Lim artifacts
    fn sharpen(&self, frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
        map_frames(frames, |v| v.powf(self.config.power))
    }

    /// Rescale dB into [0, 1], saturating outside the configured range
    fn normalize(&self, db: f32) -> f32 {
        ((db - self.config.min_level_db) / -self.config.min_level_db).clamp(0.0, 1.0)
    }

    /// Inverse of [`Self::normalize`] on the clipped domain
    fn denormalize(&self, s: f32) -> f32 {
        s.clamp(0.0, 1.0) * -self.config.min_level_db + self.config.min_level_db
    }
}

/// Magnitudes of a complex spectrogram
fn magnitude(frames: &[Vec<Complex<f32>>]) -> Vec<Vec<f32>> {
    frames
        .iter()
        .map(|frame| frame.iter().map(|c| c.norm()).collect())
        .collect()
}

fn map_frames(frames: &[Vec<f32>], f: impl Fn(f32) -> f32) -> Vec<Vec<f32>> {
    frames
        .iter()
        .map(|frame| frame.iter().map(|&v| f(v)).collect())
        .collect()
}

/// `20 * log10(max(x, 1e-5))`
fn amp_to_db(x: f32) -> f32 {
    20.0 * x.max(AMP_FLOOR).log10()
}

/// `10^(x / 20)`
fn db_to_amp(x: f32) -> f32 {
    10.0f32.powf(x * 0.05)
}
