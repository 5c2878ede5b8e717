//! Preprocessing configuration

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Full preprocessing configuration.
///
/// Deserialized from a JSON document; every field has a default matching the
/// LJSpeech / Tacotron2 recipe, so a partial (or empty) document is valid.
/// Call [`Config::validate`] before handing the config to any component —
/// the spectrogram engine does this for you in its constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Expected sample rate of input audio in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Number of linear frequency bins; FFT size is `(num_freq - 1) * 2`
    #[serde(default = "default_num_freq")]
    pub num_freq: usize,

    /// Hop length between analysis frames, in samples
    #[serde(default = "default_frame_shift")]
    pub frame_shift: usize,

    /// Analysis window length, in samples
    #[serde(default = "default_frame_length")]
    pub frame_length: usize,

    /// Number of mel bands
    #[serde(default = "default_num_mels")]
    pub num_mels: usize,

    /// Minimum frequency for the mel filterbank, in Hz
    #[serde(default = "default_fmin")]
    pub fmin: f32,

    /// Maximum frequency for the mel filterbank, in Hz
    #[serde(default = "default_fmax")]
    pub fmax: f32,

    /// Pre-emphasis filter coefficient, in [0, 1)
    #[serde(default = "default_preemphasis")]
    pub preemphasis: f32,

    /// Reference level subtracted from spectrograms, in dB
    #[serde(default = "default_ref_level_db")]
    pub ref_level_db: f32,

    /// Minimum level used for [0, 1] normalization, in dB (must be negative)
    #[serde(default = "default_min_level_db")]
    pub min_level_db: f32,

    /// Magnitude exponent applied before Griffin-Lim (sharpens peaks)
    #[serde(default = "default_power")]
    pub power: f32,

    /// Number of Griffin-Lim refinement iterations
    #[serde(default = "default_gl_iters")]
    pub gl_iters: usize,

    /// Text cleaner names applied by the tokenizer, in order
    #[serde(default = "default_text_cleaners")]
    pub text_cleaners: Vec<String>,

    /// When true, the dataset assembler eagerly computes (tokens, mel) pairs
    #[serde(default)]
    pub prep: bool,

    /// Output path for the serialized preprocessed corpus
    #[serde(default)]
    pub pth: Option<PathBuf>,
}

fn default_sample_rate() -> u32 {
    22050
}

fn default_num_freq() -> usize {
    1025
}

fn default_frame_shift() -> usize {
    256
}

fn default_frame_length() -> usize {
    1024
}

fn default_num_mels() -> usize {
    80
}

fn default_fmin() -> f32 {
    125.0
}

fn default_fmax() -> f32 {
    7600.0
}

fn default_preemphasis() -> f32 {
    0.97
}

fn default_ref_level_db() -> f32 {
    20.0
}

fn default_min_level_db() -> f32 {
    -100.0
}

fn default_power() -> f32 {
    1.5
}

fn default_gl_iters() -> usize {
    30
}

fn default_text_cleaners() -> Vec<String> {
    vec!["basic_cleaners".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            num_freq: default_num_freq(),
            frame_shift: default_frame_shift(),
            frame_length: default_frame_length(),
            num_mels: default_num_mels(),
            fmin: default_fmin(),
            fmax: default_fmax(),
            preemphasis: default_preemphasis(),
            ref_level_db: default_ref_level_db(),
            min_level_db: default_min_level_db(),
            power: default_power(),
            gl_iters: default_gl_iters(),
            text_cleaners: default_text_cleaners(),
            prep: false,
            pth: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file and validate it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// FFT size derived from the number of linear frequency bins
    pub fn n_fft(&self) -> usize {
        (self.num_freq - 1) * 2
    }

    /// Check every numeric constraint the DSP pipeline relies on.
    ///
    /// A config that passes validation cannot produce `-inf`/`NaN` in the
    /// normalization paths; a config that fails is rejected up front rather
    /// than propagating non-finite values silently.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            bail!("sample_rate must be positive");
        }
        if self.num_freq < 2 {
            bail!("num_freq must be at least 2, got {}", self.num_freq);
        }
        if self.frame_shift == 0 {
            bail!("frame_shift must be positive");
        }
        if self.frame_length == 0 {
            bail!("frame_length must be positive");
        }
        if self.frame_length > self.n_fft() {
            bail!(
                "frame_length ({}) must not exceed n_fft ({})",
                self.frame_length,
                self.n_fft()
            );
        }
        if self.num_mels == 0 {
            bail!("num_mels must be positive");
        }
        if self.fmin < 0.0 {
            bail!("fmin must be non-negative, got {}", self.fmin);
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        if self.fmax > nyquist {
            bail!("fmax ({}) exceeds Nyquist frequency ({})", self.fmax, nyquist);
        }
        if self.fmax <= self.fmin {
            bail!("fmax ({}) must exceed fmin ({})", self.fmax, self.fmin);
        }
        if !(0.0..1.0).contains(&self.preemphasis) {
            bail!(
                "preemphasis must be in [0, 1), got {}",
                self.preemphasis
            );
        }
        if self.min_level_db >= 0.0 {
            bail!(
                "min_level_db must be negative, got {}",
                self.min_level_db
            );
        }
        if self.power <= 0.0 {
            bail!("power must be positive, got {}", self.power);
        }
        Ok(())
    }
}
