//! Audio DSP core for TTS preprocessing
//!
//! This module provides:
//! - WAV file I/O with sample-rate enforcement
//! - STFT analysis and overlap-add synthesis
//! - Pre-emphasis filtering and its inverse
//! - Mel filterbank projection and pseudo-inverse
//! - Griffin-Lim phase reconstruction
//! - The spectrogram engine composing the above

mod engine;
mod griffin_lim;
mod io;
mod mel;
mod preemphasis;
mod stft;

pub use engine::SpectrogramEngine;
pub use griffin_lim::{GriffinLim, PhaseRng};
pub use io::{load_for_training, load_wav, save_wav, AudioBuffer};
pub use mel::MelFilterbank;
pub use preemphasis::{inv_preemphasis, preemphasis};
pub use stft::Stft;
