//! In-place analysis windows.
//!
//! Coefficients use the symmetric form (denominator `len - 1`), so index 0
//! and index `len - 1` carry the same endpoint attenuation.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowKind {
    Hamming,
    Hann,
    Blackman,
}

impl WindowKind {
    /// Coefficient at index `i` of a `len`-point window.
    ///
    /// A 1-point window uses denominator 1, i.e. the index-0 value.
    pub fn coefficient(self, i: usize, len: usize) -> f32 {
        let denom = len.saturating_sub(1).max(1) as f32;
        let phase = 2.0 * PI * i as f32 / denom;
        match self {
            WindowKind::Hamming => 0.54 - 0.46 * phase.cos(),
            WindowKind::Hann => 0.5 * (1.0 - phase.cos()),
            WindowKind::Blackman => 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos(),
        }
    }
}

/// Multiply `signal` by the `kind` window of the same length.
pub fn apply_window(signal: &mut [f32], kind: WindowKind) {
    let len = signal.len();
    for (i, s) in signal.iter_mut().enumerate() {
        *s *= kind.coefficient(i, len);
    }
}

pub fn hamming_window(signal: &mut [f32]) {
    apply_window(signal, WindowKind::Hamming);
}

pub fn hann_window(signal: &mut [f32]) {
    apply_window(signal, WindowKind::Hann);
}

pub fn blackman_window(signal: &mut [f32]) {
    apply_window(signal, WindowKind::Blackman);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn windowed(kind: WindowKind, len: usize, amplitude: f32) -> Vec<f32> {
        let mut v = vec![amplitude; len];
        apply_window(&mut v, kind);
        v
    }

    #[test]
    fn endpoint_attenuation_matches_closed_form() {
        let cases = [
            (WindowKind::Hamming, 0.08f32),
            (WindowKind::Hann, 0.0),
            (WindowKind::Blackman, 0.0),
        ];
        for (kind, endpoint) in cases {
            let v = windowed(kind, 256, 2.0);
            assert_abs_diff_eq!(v[0], 2.0 * endpoint, epsilon = 1e-5);
            assert_abs_diff_eq!(v[255], 2.0 * endpoint, epsilon = 1e-5);
        }
    }

    #[test]
    fn odd_length_peaks_at_centre() {
        for kind in [WindowKind::Hamming, WindowKind::Hann, WindowKind::Blackman] {
            let v = windowed(kind, 257, 1.0);
            assert_abs_diff_eq!(v[128], 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn named_helpers_match_dispatch() {
        let mut a = vec![1.0f32; 32];
        let mut b = vec![1.0f32; 32];
        hann_window(&mut a);
        apply_window(&mut b, WindowKind::Hann);
        assert_eq!(a, b);

        hamming_window(&mut a);
        blackman_window(&mut b);
        assert!(a.iter().zip(&b).any(|(x, y)| x != y));
    }

    #[test]
    fn degenerate_lengths() {
        let mut empty: [f32; 0] = [];
        apply_window(&mut empty, WindowKind::Hann);

        let one = windowed(WindowKind::Hamming, 1, 1.0);
        assert_abs_diff_eq!(one[0], 0.08, epsilon = 1e-6);
    }
}
