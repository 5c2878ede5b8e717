//! Pre-emphasis filtering.
//!
//! The forward filter is the first-order high-pass `y[n] = x[n] - c*x[n-1]`;
//! the inverse is the exact IIR counterpart `y[n] = x[n] + c*y[n-1]`, so the
//! pair round-trips to the original signal up to floating-point tolerance.

/// Apply the pre-emphasis high-pass filter, boosting high frequencies to
/// flatten the spectral envelope before analysis.
pub fn preemphasis(x: &[f32], coeff: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(x.len());
    let mut prev = 0.0f32;
    for &sample in x {
        out.push(sample - coeff * prev);
        prev = sample;
    }
    out
}

/// Invert [`preemphasis`], restoring the original spectral tilt.
pub fn inv_preemphasis(x: &[f32], coeff: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(x.len());
    let mut prev = 0.0f32;
    for &sample in x {
        let y = sample + coeff * prev;
        out.push(y);
        prev = y;
    }
    out
}
