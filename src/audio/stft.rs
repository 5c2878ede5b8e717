//! Short-time Fourier transform analysis and synthesis.
//!
//! Framing convention: frames are left-aligned (no centering) and the input
//! is zero-padded at the tail so a short buffer still yields one frame. The
//! inverse uses the identical convention, so `istft(stft(y))` reconstructs
//! interior samples up to floating-point tolerance as long as the hop
//! satisfies the overlap-add constraint (hop <= win_length / 2 for Hann).

use num_complex::Complex;
use rustfft::{num_complex::Complex as FftComplex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// STFT analyzer/synthesizer with fixed FFT size, hop, and window.
pub struct Stft {
    n_fft: usize,
    hop_length: usize,
    /// Analysis/synthesis window, zero-padded to `n_fft` when the
    /// configured window is shorter
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl Stft {
    /// Create a new STFT with a Hann window of `win_length` samples,
    /// centered inside the `n_fft` FFT buffer.
    pub fn new(n_fft: usize, hop_length: usize, win_length: usize) -> Self {
        debug_assert!(win_length <= n_fft);

        let hann = hann_window(win_length);
        let offset = (n_fft - win_length) / 2;
        let mut window = vec![0.0f32; n_fft];
        window[offset..offset + win_length].copy_from_slice(&hann);

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(n_fft);
        let inverse = planner.plan_fft_inverse(n_fft);

        Self {
            n_fft,
            hop_length,
            window,
            forward,
            inverse,
        }
    }

    /// FFT size
    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Hop length between frames
    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Number of frequency bins per frame (`n_fft / 2 + 1`)
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of frames produced for an input of `len` samples
    pub fn num_frames(&self, len: usize) -> usize {
        (len.max(self.n_fft) - self.n_fft) / self.hop_length + 1
    }

    /// Length of the waveform `istft` produces for `n_frames` frames
    pub fn output_len(&self, n_frames: usize) -> usize {
        (n_frames.saturating_sub(1)) * self.hop_length + self.n_fft
    }

    /// Forward transform: windowed FFT per hop.
    ///
    /// Returns frame-major output: `result[frame][bin]`, positive
    /// frequencies only.
    pub fn stft(&self, samples: &[f32]) -> Vec<Vec<Complex<f32>>> {
        let n_fft = self.n_fft;
        let n_frames = self.num_frames(samples.len());
        let mut result = Vec::with_capacity(n_frames);

        for i in 0..n_frames {
            let start = i * self.hop_length;

            // Apply window; samples past the input tail read as zero
            let mut buffer: Vec<FftComplex<f32>> = (0..n_fft)
                .map(|j| {
                    let sample = if start + j < samples.len() {
                        samples[start + j] * self.window[j]
                    } else {
                        0.0
                    };
                    FftComplex::new(sample, 0.0)
                })
                .collect();

            self.forward.process(&mut buffer);

            let frame: Vec<Complex<f32>> = buffer
                .iter()
                .take(self.n_bins())
                .map(|c| Complex::new(c.re, c.im))
                .collect();

            result.push(frame);
        }

        result
    }

    /// Inverse transform: overlap-add synthesis.
    ///
    /// Each frame's negative frequencies are rebuilt by Hermitian symmetry,
    /// and the overlap-added output is normalized by the sum of squared
    /// windows to cancel amplitude ripple at frame boundaries.
    pub fn istft(&self, frames: &[Vec<Complex<f32>>]) -> Vec<f32> {
        let n_fft = self.n_fft;
        let n_frames = frames.len();
        if n_frames == 0 {
            return Vec::new();
        }

        let out_len = self.output_len(n_frames);
        let mut audio = vec![0.0f32; out_len];
        let mut window_sum = vec![0.0f32; out_len];
        let ifft_scale = 1.0 / n_fft as f32;

        let mut buffer = vec![FftComplex::new(0.0f32, 0.0); n_fft];
        for (i, frame) in frames.iter().enumerate() {
            buffer[0] = FftComplex::new(frame[0].re, frame[0].im);
            for bin in 1..n_fft / 2 {
                let c = frame[bin];
                buffer[bin] = FftComplex::new(c.re, c.im);
                buffer[n_fft - bin] = FftComplex::new(c.re, -c.im);
            }
            let nyq = frame[n_fft / 2];
            buffer[n_fft / 2] = FftComplex::new(nyq.re, nyq.im);

            self.inverse.process(&mut buffer);

            let start = i * self.hop_length;
            for j in 0..n_fft {
                audio[start + j] += buffer[j].re * ifft_scale * self.window[j];
                window_sum[start + j] += self.window[j] * self.window[j];
            }
        }

        for (sample, &ws) in audio.iter_mut().zip(window_sum.iter()) {
            if ws > 1e-10 {
                *sample /= ws;
            }
        }

        audio
    }
}

/// Periodic Hann window
fn hann_window(length: usize) -> Vec<f32> {
    (0..length)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / length as f32).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_hann_window() {
        let window = hann_window(4);
        assert_eq!(window.len(), 4);
        assert!((window[0] - 0.0).abs() < 1e-6);
        assert!((window[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_hann_window_symmetric_interior() {
        let window = hann_window(256);
        assert_eq!(window.len(), 256);
        assert!(window[0] < 0.01);
        assert!(window[128] > 0.99);
        assert!((window[1] - window[255]).abs() < 0.01);
        assert!((window[64] - window[192]).abs() < 0.01);
    }

    #[test]
    fn test_frame_count() {
        let stft = Stft::new(512, 128, 512);
        // (2048 - 512) / 128 + 1 = 13
        assert_eq!(stft.num_frames(2048), 13);
        // Shorter than n_fft still gives one frame
        assert_eq!(stft.num_frames(100), 1);
        assert_eq!(stft.output_len(13), 12 * 128 + 512);
    }

    #[test]
    fn test_stft_shape() {
        let stft = Stft::new(512, 128, 512);
        let samples = sine(440.0, 22050, 2048);
        let frames = stft.stft(&samples);
        assert_eq!(frames.len(), 13);
        assert_eq!(frames[0].len(), 257);
    }

    #[test]
    fn test_stft_sine_peak_bin() {
        let sample_rate = 22050;
        let stft = Stft::new(2048, 256, 1024);
        let samples = sine(440.0, sample_rate, 22050);
        let frames = stft.stft(&samples);

        // Middle frame's peak bin should sit within one bin of 440 Hz
        let mid = &frames[frames.len() / 2];
        let peak_bin = mid
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().partial_cmp(&b.1.norm()).unwrap())
            .unwrap()
            .0;
        let bin_hz = sample_rate as f32 / 2048.0;
        let peak_hz = peak_bin as f32 * bin_hz;
        assert!(
            (peak_hz - 440.0).abs() <= bin_hz,
            "peak at {peak_hz} Hz, expected near 440 Hz"
        );
    }

    #[test]
    fn test_round_trip_interior_samples() {
        let stft = Stft::new(512, 128, 512);
        let samples = sine(440.0, 22050, 4096);
        let frames = stft.stft(&samples);
        let recon = stft.istft(&frames);

        assert!(recon.len() >= samples.len());
        // Boundary frames are under-covered by the window; compare interior
        for i in 512..samples.len() - 512 {
            assert!(
                (samples[i] - recon[i]).abs() < 1e-3,
                "sample {i}: {} vs {}",
                samples[i],
                recon[i]
            );
        }
    }

    #[test]
    fn test_round_trip_with_short_window() {
        // win_length < n_fft exercises the zero-centered window path
        let stft = Stft::new(2048, 256, 1024);
        let samples = sine(880.0, 22050, 8192);
        let frames = stft.stft(&samples);
        let recon = stft.istft(&frames);

        for i in 2048..samples.len() - 2048 {
            assert!(
                (samples[i] - recon[i]).abs() < 1e-3,
                "sample {i}: {} vs {}",
                samples[i],
                recon[i]
            );
        }
    }

    #[test]
    fn test_istft_empty_input() {
        let stft = Stft::new(512, 128, 512);
        let recon = stft.istft(&[]);
        assert!(recon.is_empty());
    }
}
