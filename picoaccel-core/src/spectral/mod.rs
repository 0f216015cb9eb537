//! Real-valued forward/inverse spectral transform with swappable backends.
//!
//! ## Contract
//!
//! ```text
//! forward:  real[0..n] (time)  ──►  real[0..n], imag[0..n] (full spectrum)
//! inverse:  real[0..n], imag[0..n]  ──►  real[0..n] (time)
//! ```
//!
//! Imaginary parts carry the rdft sign, `imag[k] = sum(x[j] * sin(2πjk/n))`,
//! so a sine at bin 1 has `imag[1] == +n/2`.
//!
//! The forward output is always the full-length spectrum: `imag[0]` and
//! `imag[n/2]` are exactly zero and the upper half mirrors the lower
//! (`real[n-i] == real[i]`, `imag[n-i] == -imag[i]`). The inverse reads only
//! bins `0..=n/2`; the upper half is redundant and never trusted.
//!
//! The `SpectralBackend` trait is the extensibility point: the generic
//! backend wraps a packed real-transform primitive, the accelerated backend
//! runs a table-driven radix-2 kernel. Callers see no difference beyond
//! [`SpectralContext::initialize`].
//!
//! ## Lifecycle
//!
//! ```text
//! SpectralContext::default()      → Uninitialized (every op fails)
//! SpectralContext::initialize()   → Initialized
//!     └─► forward / inverse (repeatedly, no allocation)
//!         └─► deallocate()        → Deallocated (idempotent; every op fails)
//! ```

pub mod analysis;
pub mod packed;
pub mod radix2;
pub mod window;

pub use analysis::{magnitude, power};
pub use packed::{PackedBackend, RealTransform, RustFftReal};
pub use radix2::Radix2Backend;
pub use window::{apply_window, blackman_window, hamming_window, hann_window, WindowKind};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AccelError, Result};

/// Transform lengths the synthesizer uses.
pub const SUPPORTED_LENGTHS: [u16; 2] = [256, 512];

/// Validate `len` against [`SUPPORTED_LENGTHS`].
///
/// # Errors
/// `AccelError::UnsupportedLength` for anything else.
pub fn validate_length(len: u16) -> Result<usize> {
    if SUPPORTED_LENGTHS.contains(&len) {
        Ok(len as usize)
    } else {
        Err(AccelError::UnsupportedLength { len: len as usize })
    }
}

/// Which engine computes the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackendKind {
    /// Packed real-transform primitive (rustfft underneath).
    #[default]
    Generic,
    /// Precomputed twiddle/bit-reversal tables, radix-2 kernel.
    Accelerated,
}

impl BackendKind {
    /// The backend this build prefers: `Accelerated` only with the
    /// `dsp-accel` feature on a DSP-capable target, `Generic` otherwise.
    pub fn for_build() -> Self {
        let dsp_target = cfg!(any(
            target_arch = "arm",
            target_arch = "xtensa",
            target_arch = "riscv32"
        ));
        if cfg!(feature = "dsp-accel") && dsp_target {
            BackendKind::Accelerated
        } else {
            BackendKind::Generic
        }
    }
}

/// Contract for transform engines.
///
/// Implementors own every buffer they need; `forward`/`inverse` must not
/// allocate. Slices passed in are at least `len()` long (checked by the
/// context).
pub trait SpectralBackend: Send + 'static {
    fn name(&self) -> &'static str;

    fn len(&self) -> usize;

    /// Overwrite `real[..n]` and `imag[..n]` with the full spectrum of `real[..n]`.
    fn forward(&mut self, real: &mut [f32], imag: &mut [f32]);

    /// Overwrite `real[..n]` with the time signal of bins `0..=n/2`.
    fn inverse(&mut self, real: &mut [f32], imag: &[f32]);
}

/// Build the backend for `kind` at length `len`.
pub fn build_backend(kind: BackendKind, len: u16) -> Result<Box<dyn SpectralBackend>> {
    let n = validate_length(len)?;
    Ok(match kind {
        BackendKind::Generic => Box::new(PackedBackend::new(RustFftReal::new(n)?)?),
        BackendKind::Accelerated => Box::new(Radix2Backend::new(n)?),
    })
}

#[derive(Default)]
enum ContextState {
    #[default]
    Uninitialized,
    Initialized(Box<dyn SpectralBackend>),
    Deallocated,
}

/// An exclusively owned transform context.
#[derive(Default)]
pub struct SpectralContext {
    len: u16,
    state: ContextState,
}

impl SpectralContext {
    /// Create a context for `len` using `kind`.
    ///
    /// # Errors
    /// - `AccelError::UnsupportedLength` if `len` is not 256 or 512.
    /// - `AccelError::OutOfMemory` if backend tables cannot be allocated.
    pub fn initialize(kind: BackendKind, len: u16) -> Result<Self> {
        let backend = build_backend(kind, len)?;
        info!(len, backend = backend.name(), "spectral context initialized");
        Ok(Self {
            len,
            state: ContextState::Initialized(backend),
        })
    }

    /// Wrap an externally built backend.
    ///
    /// # Errors
    /// `AccelError::UnsupportedLength` if the backend's length is not supported.
    pub fn with_backend(backend: Box<dyn SpectralBackend>) -> Result<Self> {
        let len = u16::try_from(backend.len())
            .ok()
            .filter(|len| SUPPORTED_LENGTHS.contains(len))
            .ok_or(AccelError::UnsupportedLength { len: backend.len() })?;
        info!(len, backend = backend.name(), "spectral context initialized");
        Ok(Self {
            len,
            state: ContextState::Initialized(backend),
        })
    }

    /// Forward transform of `real[..n]` into `real[..n]` / `imag[..n]`.
    ///
    /// # Errors
    /// - `AccelError::Uninitialized` / `AccelError::Deallocated` on a dead context.
    /// - `AccelError::BufferTooShort` if either buffer is shorter than `n`.
    pub fn forward(&mut self, real: &mut [f32], imag: &mut [f32]) -> Result<()> {
        let backend = self.backend_mut()?;
        let n = backend.len();
        check_len(n, real.len())?;
        check_len(n, imag.len())?;
        backend.forward(real, imag);
        Ok(())
    }

    /// Inverse transform of bins `0..=n/2` into `real[..n]`, scaled so that
    /// `inverse(forward(x)) == x` up to rounding.
    ///
    /// # Errors
    /// Same as [`SpectralContext::forward`].
    pub fn inverse(&mut self, real: &mut [f32], imag: &[f32]) -> Result<()> {
        let backend = self.backend_mut()?;
        let n = backend.len();
        check_len(n, real.len())?;
        check_len(n, imag.len())?;
        backend.inverse(real, imag);
        Ok(())
    }

    /// Release backend tables. Safe to call more than once.
    pub fn deallocate(&mut self) {
        if let ContextState::Initialized(backend) = std::mem::take(&mut self.state) {
            debug!(len = self.len, backend = backend.name(), "spectral context deallocated");
        }
        self.state = ContextState::Deallocated;
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.state, ContextState::Initialized(_))
    }

    /// Transform length, or 0 unless the context is initialized.
    pub fn len(&self) -> u16 {
        match self.state {
            ContextState::Initialized(_) => self.len,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        match &self.state {
            ContextState::Initialized(b) => Some(b.name()),
            _ => None,
        }
    }

    fn backend_mut(&mut self) -> Result<&mut dyn SpectralBackend> {
        match &mut self.state {
            ContextState::Initialized(b) => Ok(b.as_mut()),
            ContextState::Uninitialized => Err(AccelError::Uninitialized),
            ContextState::Deallocated => Err(AccelError::Deallocated),
        }
    }
}

impl std::fmt::Debug for SpectralContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralContext")
            .field("len", &self.len)
            .field("backend", &self.backend_name())
            .finish()
    }
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if actual < expected {
        return Err(AccelError::BufferTooShort { expected, actual });
    }
    Ok(())
}

/// Copy the conjugate of bins `1..n/2` into `n/2+1..n`.
pub(crate) fn mirror_conjugate(real: &mut [f32], imag: &mut [f32], n: usize) {
    for i in n / 2 + 1..n {
        real[i] = real[n - i];
        imag[i] = -imag[n - i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_supported_lengths_initialize() {
        for &len in &SUPPORTED_LENGTHS {
            assert!(SpectralContext::initialize(BackendKind::Generic, len).is_ok());
        }
        for len in [0u16, 128, 300, 1024] {
            let err = SpectralContext::initialize(BackendKind::Generic, len).unwrap_err();
            assert!(matches!(
                err,
                AccelError::UnsupportedLength { len: l } if l == len as usize
            ));
            assert!(!err.is_resource_exhaustion());
        }
    }

    #[test]
    fn default_context_is_uninitialized() {
        let mut ctx = SpectralContext::default();
        assert!(!ctx.is_valid());
        assert_eq!(ctx.len(), 0);
        let mut re = [0.0f32; 256];
        let mut im = [0.0f32; 256];
        assert!(matches!(ctx.forward(&mut re, &mut im), Err(AccelError::Uninitialized)));
        assert!(matches!(ctx.inverse(&mut re, &im), Err(AccelError::Uninitialized)));
    }

    #[test]
    fn deallocate_is_idempotent_and_blocks_use() {
        let mut ctx = SpectralContext::initialize(BackendKind::Accelerated, 256).unwrap();
        assert!(ctx.is_valid());
        assert_eq!(ctx.backend_name(), Some("radix2-table"));
        ctx.deallocate();
        ctx.deallocate();
        assert!(!ctx.is_valid());
        assert_eq!(ctx.backend_name(), None);
        assert_eq!(ctx.len(), 0);
        assert!(ctx.is_empty());

        let mut re = [0.0f32; 256];
        let mut im = [0.0f32; 256];
        assert!(matches!(ctx.forward(&mut re, &mut im), Err(AccelError::Deallocated)));
    }

    #[test]
    fn short_buffers_are_rejected() {
        let mut ctx = SpectralContext::initialize(BackendKind::Generic, 512).unwrap();
        let mut re = vec![0.0f32; 512];
        let mut im = vec![0.0f32; 100];
        let err = ctx.forward(&mut re, &mut im).unwrap_err();
        assert!(matches!(
            err,
            AccelError::BufferTooShort {
                expected: 512,
                actual: 100
            }
        ));
    }

    #[test]
    fn with_backend_accepts_prebuilt_engine() {
        let backend = build_backend(BackendKind::Generic, 256).unwrap();
        let ctx = SpectralContext::with_backend(backend).unwrap();
        assert_eq!(ctx.len(), 256);
        assert_eq!(ctx.backend_name(), Some("packed-rustfft"));
    }

    #[test]
    fn sine_at_bin_one_has_positive_imaginary_part() {
        for kind in [BackendKind::Generic, BackendKind::Accelerated] {
            for len in SUPPORTED_LENGTHS {
                let n = len as usize;
                let mut ctx = SpectralContext::initialize(kind, len).unwrap();
                let mut re: Vec<f32> = (0..n)
                    .map(|j| (2.0 * std::f32::consts::PI * j as f32 / n as f32).sin())
                    .collect();
                let mut im = vec![0.0f32; n];
                ctx.forward(&mut re, &mut im).unwrap();

                let half = n as f32 / 2.0;
                assert!((im[1] - half).abs() < 1e-2, "{kind:?} n={n} im[1]={}", im[1]);
                assert!((im[n - 1] + half).abs() < 1e-2);
                assert!(re[1].abs() < 1e-2);

                ctx.inverse(&mut re, &im).unwrap();
                let quarter = (2.0 * std::f32::consts::PI * (n / 4) as f32 / n as f32).sin();
                assert!((re[n / 4] - quarter).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn length_reads_zero_once_released() {
        let mut ctx = SpectralContext::initialize(BackendKind::Generic, 512).unwrap();
        assert_eq!(ctx.len(), 512);
        assert!(!ctx.is_empty());
        ctx.deallocate();
        assert_eq!(ctx.len(), 0);
        assert_eq!(SpectralContext::default().len(), 0);
    }

    #[test]
    fn with_backend_reports_the_real_unsupported_length() {
        let backend = Box::new(Radix2Backend::new(1024).unwrap());
        let err = SpectralContext::with_backend(backend).unwrap_err();
        assert!(matches!(err, AccelError::UnsupportedLength { len: 1024 }));
    }

    #[test]
    fn build_preference_is_generic_on_host() {
        if !cfg!(feature = "dsp-accel") {
            assert_eq!(BackendKind::for_build(), BackendKind::Generic);
        }
    }
}
