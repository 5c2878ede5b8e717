//! Mel filterbank projection and its pseudo-inverse.

use anyhow::{bail, Result};
use std::sync::OnceLock;

/// Linear-to-mel projection matrix built once per configuration.
///
/// The basis has `num_mels` rows of `num_freq` columns (the STFT's positive
/// frequency bins). Filters use the HTK mel scale, matching the reference
/// preprocessing. The Moore-Penrose pseudo-inverse used by
/// [`MelFilterbank::mel_to_linear`] is computed lazily and cached.
pub struct MelFilterbank {
    n_mels: usize,
    n_freqs: usize,
    basis: Vec<Vec<f32>>,
    pinv: OnceLock<Vec<Vec<f32>>>,
}

impl MelFilterbank {
    /// Build triangular mel filters spaced between `fmin` and `fmax`.
    pub fn new(
        sample_rate: u32,
        n_fft: usize,
        n_mels: usize,
        fmin: f32,
        fmax: f32,
    ) -> Self {
        let n_freqs = n_fft / 2 + 1;

        // Linearly spaced points on the mel scale, then back to Hz
        let mel_min = hz_to_mel(fmin);
        let mel_max = hz_to_mel(fmax);
        let hz_points: Vec<f32> = (0..=n_mels + 1)
            .map(|i| mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32)
            .map(mel_to_hz)
            .collect();

        // FFT bin center frequencies
        let fft_freqs: Vec<f32> = (0..n_freqs)
            .map(|i| i as f32 * sample_rate as f32 / n_fft as f32)
            .collect();

        let mut basis = vec![vec![0.0f32; n_freqs]; n_mels];
        for i in 0..n_mels {
            let f_lower = hz_points[i];
            let f_center = hz_points[i + 1];
            let f_upper = hz_points[i + 2];

            for (j, &freq) in fft_freqs.iter().enumerate() {
                if freq >= f_lower && freq <= f_center && f_center > f_lower {
                    basis[i][j] = (freq - f_lower) / (f_center - f_lower);
                } else if freq > f_center && freq <= f_upper && f_upper > f_center {
                    basis[i][j] = (f_upper - freq) / (f_upper - f_center);
                }
            }
        }

        Self {
            n_mels,
            n_freqs,
            basis,
            pinv: OnceLock::new(),
        }
    }

    /// Number of mel bands
    pub fn n_mels(&self) -> usize {
        self.n_mels
    }

    /// Number of linear frequency bins
    pub fn n_freqs(&self) -> usize {
        self.n_freqs
    }

    /// Project a frame-major linear magnitude spectrogram onto mel bands.
    ///
    /// Input frames have `n_freqs` bins, output frames have `n_mels`.
    pub fn linear_to_mel(&self, frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
        frames
            .iter()
            .map(|frame| {
                self.basis
                    .iter()
                    .map(|filter| filter.iter().zip(frame.iter()).map(|(f, m)| f * m).sum())
                    .collect()
            })
            .collect()
    }

    /// Approximate inverse of [`Self::linear_to_mel`].
    ///
    /// Multiplies by the pseudo-inverse of the mel basis and clamps the
    /// result to a small positive floor; the basis is rank-deficient, so
    /// this is lossy by construction but always finite and non-negative.
    pub fn mel_to_linear(&self, frames: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        let pinv = self.pseudo_inverse()?;
        Ok(frames
            .iter()
            .map(|frame| {
                pinv.iter()
                    .map(|row| {
                        let v: f32 = row.iter().zip(frame.iter()).map(|(p, m)| p * m).sum();
                        v.max(1e-10)
                    })
                    .collect()
            })
            .collect())
    }

    /// Pseudo-inverse `Bᵀ(BBᵀ)⁻¹` of the basis, `n_freqs` rows of `n_mels`
    /// columns, built on first use.
    fn pseudo_inverse(&self) -> Result<&[Vec<f32>]> {
        if let Some(pinv) = self.pinv.get() {
            return Ok(pinv);
        }
        let pinv = self.compute_pseudo_inverse()?;
        Ok(self.pinv.get_or_init(|| pinv))
    }

    fn compute_pseudo_inverse(&self) -> Result<Vec<Vec<f32>>> {
        let n = self.n_mels;

        // Gram matrix B·Bᵀ, in f64 for the elimination
        let mut gram = vec![vec![0.0f64; n]; n];
        for i in 0..n {
            for j in i..n {
                let dot: f64 = self.basis[i]
                    .iter()
                    .zip(self.basis[j].iter())
                    .map(|(a, b)| *a as f64 * *b as f64)
                    .sum();
                gram[i][j] = dot;
                gram[j][i] = dot;
            }
        }

        let gram_inv = invert_matrix(&gram)?;

        // Bᵀ · (BBᵀ)⁻¹
        let mut pinv = vec![vec![0.0f32; n]; self.n_freqs];
        for (f, row) in pinv.iter_mut().enumerate() {
            for m in 0..n {
                let mut acc = 0.0f64;
                for k in 0..n {
                    acc += self.basis[k][f] as f64 * gram_inv[k][m];
                }
                row[m] = acc as f32;
            }
        }

        Ok(pinv)
    }
}

/// Convert frequency in Hz to the HTK mel scale
fn hz_to_mel(f: f32) -> f32 {
    2595.0 * (1.0 + f / 700.0).log10()
}

/// Convert an HTK mel value back to Hz
fn mel_to_hz(m: f32) -> f32 {
    700.0 * (10.0f32.powf(m / 2595.0) - 1.0)
}

/// Gauss-Jordan inversion with partial pivoting.
///
/// Fails when the matrix is singular, which for a mel Gram matrix means a
/// filter captured no FFT bins at all (too many mel bands for the
/// configured frequency range).
fn invert_matrix(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut aug: Vec<Vec<f64>> = matrix
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut r = row.clone();
            r.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            r
        })
        .collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| aug[a][col].abs().partial_cmp(&aug[b][col].abs()).unwrap())
            .unwrap();
        if aug[pivot_row][col].abs() < 1e-12 {
            bail!(
                "mel basis is singular: filter {} captures no FFT bins \
                 (reduce num_mels or widen the fmin..fmax range)",
                col
            );
        }
        aug.swap(col, pivot_row);

        let pivot = aug[col][col];
        for v in aug[col].iter_mut() {
            *v /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[row][col];
                if factor != 0.0 {
                    for k in 0..2 * n {
                        aug[row][k] -= factor * aug[col][k];
                    }
                }
            }
        }
    }

    Ok(aug.into_iter().map(|row| row[n..].to_vec()).collect())
}
