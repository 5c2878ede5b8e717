//! Griffin-Lim phase reconstruction.
//!
//! Recovers a plausible phase for a magnitude-only spectrogram by repeated
//! STFT analysis/synthesis: each round keeps the phase of the current
//! waveform estimate and snaps the magnitude back to the fixed input. The
//! result is approximate by design — exact phase is not recoverable from
//! magnitude alone.

use num_complex::Complex;
use std::f32::consts::PI;

use super::stft::Stft;

/// RNG for the random initial phases.
///
/// When created with a seed, the same seed produces identical output across
/// runs and threads. Without a seed, uses system entropy.
pub struct PhaseRng {
    /// PCG state (only used when seeded)
    state: u64,
    /// Whether we're in seeded mode
    seeded: bool,
    /// Counter for unseeded fallback
    counter: u64,
}

impl PhaseRng {
    /// Create a new phase RNG with an optional seed
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => {
                // Mix seed with PCG increment to avoid degenerate states
                let state = s
                    .wrapping_mul(2685821657736338717)
                    .wrapping_add(1442695040888963407);
                Self {
                    state,
                    seeded: true,
                    counter: 0,
                }
            }
            None => Self {
                state: 0,
                seeded: false,
                counter: 0,
            },
        }
    }

    /// Generate a random f32 in [0, 1).
    fn rand_f32(&mut self) -> f32 {
        if !self.seeded {
            use std::time::{SystemTime, UNIX_EPOCH};

            let seed = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos() as u64;
            let count = self.counter;
            self.counter += 1;

            // LCG with seed and counter
            let state = seed
                .wrapping_add(count)
                .wrapping_mul(1103515245)
                .wrapping_add(12345);
            return (state as f32) / (u64::MAX as f32);
        }

        // PCG XSH RR 64/32
        let old_state = self.state;
        self.state = old_state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);

        let xorshifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        let output = xorshifted.rotate_right(rot);

        (output as f32) / (u32::MAX as f32)
    }

    /// Random phase angle in [0, 2π)
    fn rand_angle(&mut self) -> f32 {
        self.rand_f32() * 2.0 * PI
    }
}

/// Iterative magnitude-to-waveform reconstructor.
///
/// Holds no state across calls; every reconstruction starts from fresh
/// random phases.
pub struct GriffinLim<'a> {
    stft: &'a Stft,
    iterations: usize,
}

impl<'a> GriffinLim<'a> {
    /// Create a reconstructor running `iterations` refinement rounds
    pub fn new(stft: &'a Stft, iterations: usize) -> Self {
        Self { stft, iterations }
    }

    /// Reconstruct a waveform from a frame-major magnitude spectrogram.
    ///
    /// With `iterations == 0` this returns the initial random-phase
    /// estimate. Output length depends only on the frame count and framing,
    /// never on the iteration count.
    pub fn reconstruct(&self, magnitude: &[Vec<f32>], seed: Option<u64>) -> Vec<f32> {
        if magnitude.is_empty() {
            return Vec::new();
        }

        let mut rng = PhaseRng::new(seed);
        let mut complex: Vec<Vec<Complex<f32>>> = magnitude
            .iter()
            .map(|frame| {
                frame
                    .iter()
                    .map(|&m| Complex::from_polar(m, rng.rand_angle()))
                    .collect()
            })
            .collect();

        let mut estimate = self.stft.istft(&complex);

        for _ in 0..self.iterations {
            let analyzed = self.stft.stft(&estimate);
            for (out_frame, (mag_frame, est_frame)) in complex
                .iter_mut()
                .zip(magnitude.iter().zip(analyzed.iter()))
            {
                for (out, (&m, est)) in out_frame
                    .iter_mut()
                    .zip(mag_frame.iter().zip(est_frame.iter()))
                {
                    *out = Complex::from_polar(m, est.arg());
                }
            }
            estimate = self.stft.istft(&complex);
        }

        estimate
    }
}
