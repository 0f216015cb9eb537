//! Generic backend: a packed real-to-complex primitive plus unpacking.
//!
//! ## Packed layout (`n` values)
//!
//! | Index        | Content                 |
//! |--------------|-------------------------|
//! | `0`          | DC (real)               |
//! | `1`          | Nyquist bin `n/2` (real)|
//! | `2k`, `2k+1` | re, im of bin `k`, `1 <= k < n/2` |
//!
//! Imaginary parts follow the rdft sign, `im[k] = sum(x[j] * sin(2πjk/n))`,
//! i.e. the conjugate of an `e^{-iωt}` transform.
//!
//! The primitive's inverse is unnormalised: it returns the time signal
//! multiplied by [`RealTransform::inverse_gain`] (`n/2` for the rustfft
//! primitive, the rdft convention). `PackedBackend` divides by that gain, so a
//! primitive with a different normalisation only needs to report its own.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::{mirror_conjugate, SpectralBackend};
use crate::error::{try_alloc, Result};

/// A real-input transform working in the packed layout above.
pub trait RealTransform: Send + 'static {
    fn name(&self) -> &'static str;

    fn len(&self) -> usize;

    /// Time samples in `data[..n]` → packed spectrum in place.
    fn forward_packed(&mut self, data: &mut [f64]);

    /// Packed spectrum in `data[..n]` → time samples times `inverse_gain()`.
    fn inverse_packed(&mut self, data: &mut [f64]);

    fn inverse_gain(&self) -> f64;
}

/// Packed real transform on top of a full-length rustfft plan.
pub struct RustFftReal {
    n: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    buf: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl RustFftReal {
    /// Plan both directions and allocate working buffers for length `n`
    /// (even, already validated by the caller).
    pub fn new(n: usize) -> Result<Self> {
        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        let zero = Complex::new(0.0, 0.0);

        Ok(Self {
            n,
            forward,
            inverse,
            buf: try_alloc(n, zero, "rustfft work buffer")?,
            scratch: try_alloc(scratch_len, zero, "rustfft scratch")?,
        })
    }
}

impl RealTransform for RustFftReal {
    fn name(&self) -> &'static str {
        "packed-rustfft"
    }

    fn len(&self) -> usize {
        self.n
    }

    fn forward_packed(&mut self, data: &mut [f64]) {
        let n = self.n;
        for (c, &x) in self.buf.iter_mut().zip(data.iter()) {
            *c = Complex::new(x, 0.0);
        }
        self.forward.process_with_scratch(&mut self.buf, &mut self.scratch);

        // rustfft uses e^{-iωt}; rdft's sine sign is its conjugate.
        data[0] = self.buf[0].re;
        data[1] = self.buf[n / 2].re;
        for k in 1..n / 2 {
            data[2 * k] = self.buf[k].re;
            data[2 * k + 1] = -self.buf[k].im;
        }
    }

    fn inverse_packed(&mut self, data: &mut [f64]) {
        let n = self.n;
        self.buf[0] = Complex::new(data[0], 0.0);
        self.buf[n / 2] = Complex::new(data[1], 0.0);
        for k in 1..n / 2 {
            let bin = Complex::new(data[2 * k], -data[2 * k + 1]);
            self.buf[k] = bin;
            self.buf[n - k] = bin.conj();
        }
        self.inverse.process_with_scratch(&mut self.buf, &mut self.scratch);

        // rustfft returns n * x; the rdft convention is (n / 2) * x.
        for (x, c) in data.iter_mut().zip(self.buf.iter()) {
            *x = c.re * 0.5;
        }
    }

    fn inverse_gain(&self) -> f64 {
        self.n as f64 / 2.0
    }
}

/// Adapts any [`RealTransform`] to the full-spectrum backend contract.
pub struct PackedBackend<P: RealTransform> {
    primitive: P,
    work: Vec<f64>,
}

impl<P: RealTransform> PackedBackend<P> {
    pub fn new(primitive: P) -> Result<Self> {
        let work = try_alloc(primitive.len(), 0.0f64, "packed transform work buffer")?;
        Ok(Self { primitive, work })
    }
}

impl<P: RealTransform> SpectralBackend for PackedBackend<P> {
    fn name(&self) -> &'static str {
        self.primitive.name()
    }

    fn len(&self) -> usize {
        self.primitive.len()
    }

    fn forward(&mut self, real: &mut [f32], imag: &mut [f32]) {
        let n = self.primitive.len();
        for (w, &x) in self.work.iter_mut().zip(real.iter()) {
            *w = x as f64;
        }
        self.primitive.forward_packed(&mut self.work);

        real[0] = self.work[0] as f32;
        imag[0] = 0.0;
        for k in 1..n / 2 {
            real[k] = self.work[2 * k] as f32;
            imag[k] = self.work[2 * k + 1] as f32;
        }
        real[n / 2] = self.work[1] as f32;
        imag[n / 2] = 0.0;

        mirror_conjugate(real, imag, n);
    }

    fn inverse(&mut self, real: &mut [f32], imag: &[f32]) {
        let n = self.primitive.len();
        self.work[0] = real[0] as f64;
        self.work[1] = real[n / 2] as f64;
        for k in 1..n / 2 {
            self.work[2 * k] = real[k] as f64;
            self.work[2 * k + 1] = imag[k] as f64;
        }
        self.primitive.inverse_packed(&mut self.work);

        let scale = 1.0 / self.primitive.inverse_gain();
        for (x, &w) in real.iter_mut().zip(self.work.iter()) {
            *x = (w * scale) as f32;
        }
    }
}
