//! # picoaccel-core
//!
//! Acceleration primitives for an embedded speech-synthesis pipeline.
//!
//! ## Architecture
//!
//! ```text
//! decision-tree walker ──► context fingerprint ──► DtCache ──hit──► result index
//!                                                     │
//!                                                   miss ──► tree walk ──► insert
//!
//! waveform synthesizer ──► frame ──► window ──► SpectralContext ──► magnitude / power
//!                                                   │
//!                                      SpectralBackend (generic | accelerated)
//!
//!            fixed:: Q15 / Q31 arithmetic used by DSP stages on FPU-less targets
//! ```
//!
//! Allocation happens only in `initialize`/`new`. Lookups, inserts and
//! per-frame transforms never allocate, block or lock.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod error;
pub mod fixed;
pub mod spectral;
pub mod stage;

// Convenience re-exports for downstream crates
pub use cache::{
    context_fingerprint, extended_fingerprint, CacheStats, DesktopDtCache, DtCache,
    EmbeddedDtCache, PhonemeContext, SharedDtCache,
};
pub use config::{AccelConfig, Arithmetic, TargetProfile};
pub use error::{AccelError, Result};
pub use fixed::{recip_approx, sqrt_approx, DspSample, Q15, Q31};
pub use spectral::{BackendKind, SpectralBackend, SpectralContext, WindowKind};
pub use stage::AccelStage;
