//! Accelerated backend: iterative radix-2 FFT driven by precomputed tables.
//!
//! All trigonometry happens once in `new` (twiddles for `n/2` angles plus the
//! bit-reversal permutation), the same split a vendor DSP library makes
//! between its table init and its per-frame kernel. The per-frame path is
//! table lookups, multiplies and adds only.

use std::f64::consts::PI;

use super::{mirror_conjugate, SpectralBackend};
use crate::error::{try_alloc, Result};

pub struct Radix2Backend {
    n: usize,
    /// `cos(2πk/n)` for `k < n/2`.
    cos: Vec<f32>,
    /// `sin(2πk/n)` for `k < n/2`.
    sin: Vec<f32>,
    bit_reverse: Vec<u16>,
    re: Vec<f32>,
    im: Vec<f32>,
}

impl Radix2Backend {
    /// Build tables for length `n` (a power of two, at most 2^16).
    pub fn new(n: usize) -> Result<Self> {
        debug_assert!(n.is_power_of_two() && n <= 1 << 16);
        let half = n / 2;
        let bits = n.trailing_zeros();

        let mut cos = try_alloc(half, 0.0f32, "radix-2 cosine table")?;
        let mut sin = try_alloc(half, 0.0f32, "radix-2 sine table")?;
        for k in 0..half {
            let angle = 2.0 * PI * k as f64 / n as f64;
            cos[k] = angle.cos() as f32;
            sin[k] = angle.sin() as f32;
        }

        let mut bit_reverse = try_alloc(n, 0u16, "radix-2 bit-reversal table")?;
        for (i, slot) in bit_reverse.iter_mut().enumerate() {
            *slot = reverse_bits(i, bits) as u16;
        }

        Ok(Self {
            n,
            cos,
            sin,
            bit_reverse,
            re: try_alloc(n, 0.0f32, "radix-2 work buffer")?,
            im: try_alloc(n, 0.0f32, "radix-2 work buffer")?,
        })
    }

    /// In-place DFT of `self.re` / `self.im` with the `e^{+iωt}` kernel.
    ///
    /// For real input this yields the rdft sign: `im[k] = sum(x[j] * sin(2πjk/n))`.
    fn transform(&mut self) {
        let n = self.n;

        for i in 0..n {
            let j = self.bit_reverse[i] as usize;
            if i < j {
                self.re.swap(i, j);
                self.im.swap(i, j);
            }
        }

        let mut size = 2;
        while size <= n {
            let half = size / 2;
            let stride = n / size;
            for start in (0..n).step_by(size) {
                for k in 0..half {
                    let wr = self.cos[k * stride];
                    let wi = self.sin[k * stride];
                    let a = start + k;
                    let b = a + half;
                    let tr = self.re[b] * wr - self.im[b] * wi;
                    let ti = self.re[b] * wi + self.im[b] * wr;
                    self.re[b] = self.re[a] - tr;
                    self.im[b] = self.im[a] - ti;
                    self.re[a] += tr;
                    self.im[a] += ti;
                }
            }
            size <<= 1;
        }
    }
}

fn reverse_bits(i: usize, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    i.reverse_bits() >> (usize::BITS - bits)
}

impl SpectralBackend for Radix2Backend {
    fn name(&self) -> &'static str {
        "radix2-table"
    }

    fn len(&self) -> usize {
        self.n
    }

    fn forward(&mut self, real: &mut [f32], imag: &mut [f32]) {
        let n = self.n;
        self.re.copy_from_slice(&real[..n]);
        self.im.fill(0.0);
        self.transform();

        real[..=n / 2].copy_from_slice(&self.re[..=n / 2]);
        imag[..=n / 2].copy_from_slice(&self.im[..=n / 2]);
        imag[0] = 0.0;
        imag[n / 2] = 0.0;
        mirror_conjugate(real, imag, n);
    }

    fn inverse(&mut self, real: &mut [f32], imag: &[f32]) {
        // x = Re(K(conj(X))) / n with K the same e^{+iωt} kernel.
        let n = self.n;
        self.re[0] = real[0];
        self.im[0] = 0.0;
        self.re[n / 2] = real[n / 2];
        self.im[n / 2] = 0.0;
        for k in 1..n / 2 {
            self.re[k] = real[k];
            self.im[k] = -imag[k];
            self.re[n - k] = real[k];
            self.im[n - k] = imag[k];
        }
        self.transform();

        let scale = 1.0 / n as f32;
        for (x, &r) in real[..n].iter_mut().zip(self.re.iter()) {
            *x = r * scale;
        }
    }
}
