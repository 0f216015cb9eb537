//! Sample arithmetic that DSP stages can run in either `f32` or `Q15`.
//!
//! Stages written against `DspSample` compile once per representation; which
//! one a host uses is decided by [`crate::config::Arithmetic`].

use super::Q15;

pub trait DspSample: Copy + Default + std::fmt::Debug + Send + 'static {
    fn from_f32(f: f32) -> Self;
    fn to_f32(self) -> f32;
    fn dsp_mul(self, other: Self) -> Self;
    fn dsp_add(self, other: Self) -> Self;
    fn dsp_sub(self, other: Self) -> Self;
}

impl DspSample for f32 {
    fn from_f32(f: f32) -> Self {
        f
    }

    fn to_f32(self) -> f32 {
        self
    }

    fn dsp_mul(self, other: Self) -> Self {
        self * other
    }

    fn dsp_add(self, other: Self) -> Self {
        self + other
    }

    fn dsp_sub(self, other: Self) -> Self {
        self - other
    }
}

impl DspSample for Q15 {
    fn from_f32(f: f32) -> Self {
        Q15::from_f32(f)
    }

    fn to_f32(self) -> f32 {
        Q15::to_f32(self)
    }

    fn dsp_mul(self, other: Self) -> Self {
        self.mul(other)
    }

    fn dsp_add(self, other: Self) -> Self {
        self.add_sat(other)
    }

    fn dsp_sub(self, other: Self) -> Self {
        self.sub_sat(other)
    }
}

/// Multiply every sample of `frame` by `gain`.
pub fn scale_in_place<S: DspSample>(frame: &mut [S], gain: S) {
    for s in frame.iter_mut() {
        *s = s.dsp_mul(gain);
    }
}

/// `dst[i] += src[i]`.
pub fn mix_in_place<S: DspSample>(dst: &mut [S], src: &[S]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = d.dsp_add(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn run_gain<S: DspSample>(input: &[f32], gain: f32) -> Vec<f32> {
        let mut frame: Vec<S> = input.iter().map(|&f| S::from_f32(f)).collect();
        scale_in_place(&mut frame, S::from_f32(gain));
        frame.into_iter().map(DspSample::to_f32).collect()
    }

    #[test]
    fn float_and_fixed_agree_within_grid() {
        let input = [0.5f32, -0.25, 0.75, -0.9, 0.0];
        let float = run_gain::<f32>(&input, 0.5);
        let fixed = run_gain::<Q15>(&input, 0.5);
        for (f, q) in float.iter().zip(&fixed) {
            assert_abs_diff_eq!(*f, *q, epsilon = 2.0 / 32768.0);
        }
    }

    #[test]
    fn fixed_mix_saturates_where_float_does_not() {
        let mut fixed = [Q15::from_f32(0.75)];
        mix_in_place(&mut fixed, &[Q15::from_f32(0.75)]);
        assert_eq!(fixed[0], Q15::MAX);

        let mut float = [0.75f32];
        mix_in_place(&mut float, &[0.75]);
        assert_abs_diff_eq!(float[0], 1.5);
    }

    #[test]
    fn sub_is_saturating_for_q15() {
        assert_eq!(Q15::MIN.dsp_sub(Q15::MAX), Q15::MIN);
        assert_abs_diff_eq!(0.25f32.dsp_sub(0.5), -0.25);
    }
}
