//! # tacotron-prep
//!
//! Audio preprocessing for Tacotron2-style text-to-speech training:
//! converts raw waveforms into normalized log-magnitude spectrograms
//! (linear or mel) and reconstructs waveforms from magnitude-only spectra
//! via Griffin-Lim.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tacotron_prep::{AudioBuffer, Config, SpectrogramEngine};
//!
//! let config = Config::from_file("config.json")?;
//! let engine = SpectrogramEngine::new(config)?;
//!
//! let audio = AudioBuffer::load("speech.wav")?;
//! let mel = engine.melspectrogram(&audio.samples);
//!
//! // Round-trip a linear spectrogram back to audio
//! let spec = engine.spectrogram(&audio.samples);
//! let recon = engine.inv_spectrogram(&spec);
//! AudioBuffer::new(recon, engine.config().sample_rate).save("recon.wav")?;
//! ```
//!
//! ## Pipeline
//!
//! Forward: waveform → pre-emphasis → STFT → magnitude (optionally mel
//! projected) → dB conversion → [0, 1] normalization.
//!
//! Inverse: denormalization → dB-to-amplitude → power sharpening →
//! Griffin-Lim phase reconstruction → inverse pre-emphasis.
//!
//! Spectrograms are frame-major `Vec<Vec<f32>>` (`spec[frame][bin]`). Every
//! operation returns a fresh buffer; the engine holds only read-only state
//! (config, window, filterbank) and can be shared across threads.
//!
//! ## Corpus preprocessing
//!
//! [`dataset::DatasetAssembler`] reads an LJSpeech-style `metadata.csv`,
//! tokenizes transcripts, computes mel spectrograms, and optionally
//! serializes the (tokens, mel) pairs to a binary cache for training.

pub mod audio;
pub mod config;
pub mod dataset;
pub mod text;

pub use audio::{
    inv_preemphasis, load_for_training, load_wav, preemphasis, save_wav, AudioBuffer,
    GriffinLim, MelFilterbank, SpectrogramEngine, Stft,
};
pub use config::Config;
pub use dataset::{load_corpus, CorpusEntry, DatasetAssembler};
pub use text::TextTokenizer;
