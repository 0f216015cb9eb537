//! `AccelStage`: one explicitly owned bundle of cache and transform context.
//!
//! ## Lifecycle
//!
//! ```text
//! AccelStage::new(config)
//!     ├─► memoize()                 decision-tree walker, once per lookup
//!     ├─► frame_power_spectrum()    synthesizer, once per frame
//!     ├─► scale_frame()             synthesizer, float or Q15 per config
//!     └─► release()                 transform tables dropped; cache stays readable
//! ```
//!
//! There is no global instance. A host that wants one wires it up itself.

use tracing::{info, warn};

use crate::{
    cache::{CacheStats, DtCache, DESKTOP_CAPACITY},
    config::{AccelConfig, Arithmetic},
    error::{try_alloc, AccelError, Result},
    fixed::{dsp::scale_in_place, DspSample, Q15},
    spectral::{apply_window, power, SpectralContext, WindowKind},
};

pub struct AccelStage<const N: usize = DESKTOP_CAPACITY> {
    config: AccelConfig,
    cache: DtCache<N>,
    spectral: SpectralContext,
    re: Vec<f32>,
    im: Vec<f32>,
}

impl<const N: usize> AccelStage<N> {
    /// Allocate the cache and the transform context described by `config`.
    ///
    /// # Errors
    /// - `AccelError::OutOfMemory` if any table cannot be allocated.
    /// - `AccelError::UnsupportedLength` is never returned: the length is
    ///   normalised first.
    pub fn new(mut config: AccelConfig) -> Result<Self> {
        config.normalize();
        if config.profile.cache_capacity() != N {
            warn!(
                profile = ?config.profile,
                capacity = N,
                "cache capacity differs from the profile's default"
            );
        }

        let mut cache = DtCache::<N>::initialize()?;
        cache.set_enabled(config.cache_enabled);
        let spectral = SpectralContext::initialize(config.backend, config.transform_len)?;
        let n = config.transform_len as usize;

        info!(
            profile = ?config.profile,
            arithmetic = ?config.arithmetic,
            backend = ?config.backend,
            transform_len = n,
            "acceleration stage ready"
        );

        Ok(Self {
            config,
            cache,
            spectral,
            re: try_alloc(n, 0.0f32, "stage frame buffer")?,
            im: try_alloc(n, 0.0f32, "stage frame buffer")?,
        })
    }

    pub fn config(&self) -> &AccelConfig {
        &self.config
    }

    /// Cached result for `(fingerprint, tree_id)`, computing and caching it on a miss.
    pub fn memoize<F>(&mut self, fingerprint: u32, tree_id: u16, compute: F) -> u16
    where
        F: FnOnce() -> u16,
    {
        self.cache.get_or_insert_with(fingerprint, tree_id, compute)
    }

    pub fn cache(&self) -> &DtCache<N> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut DtCache<N> {
        &mut self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn spectral_mut(&mut self) -> &mut SpectralContext {
        &mut self.spectral
    }

    /// Window `frame[..n]`, transform it and write its power spectrum to `out[..n]`.
    ///
    /// `frame` is left untouched; windowing happens on an internal copy.
    ///
    /// # Errors
    /// - `AccelError::BufferTooShort` if `frame` or `out` is shorter than `n`.
    /// - `AccelError::Deallocated` after [`AccelStage::release`].
    pub fn frame_power_spectrum(
        &mut self,
        frame: &[f32],
        window: Option<WindowKind>,
        out: &mut [f32],
    ) -> Result<()> {
        let n = self.re.len();
        for actual in [frame.len(), out.len()] {
            if actual < n {
                return Err(AccelError::BufferTooShort {
                    expected: n,
                    actual,
                });
            }
        }

        self.re.copy_from_slice(&frame[..n]);
        if let Some(kind) = window {
            apply_window(&mut self.re, kind);
        }
        self.spectral.forward(&mut self.re, &mut self.im)?;
        power(&self.re, &self.im, &mut out[..n]);
        Ok(())
    }

    /// Multiply `frame` by `gain` in the configured arithmetic.
    ///
    /// With `Arithmetic::FixedQ15` samples pass through the Q15 grid and
    /// saturate at ±1.0, exactly as they would on an FPU-less target.
    pub fn scale_frame(&self, frame: &mut [f32], gain: f32) {
        match self.config.arithmetic {
            Arithmetic::Float => scale_in_place(frame, gain),
            Arithmetic::FixedQ15 => {
                let g = Q15::from_f32(gain);
                for s in frame.iter_mut() {
                    *s = DspSample::to_f32(Q15::from_f32(*s).dsp_mul(g));
                }
            }
        }
    }

    /// Drop the transform tables. The cache and its statistics stay available.
    pub fn release(&mut self) {
        self.spectral.deallocate();
        info!(
            hit_rate = self.cache.hit_rate(),
            "acceleration stage released"
        );
    }
}

impl<const N: usize> std::fmt::Debug for AccelStage<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccelStage")
            .field("config", &self.config)
            .field("capacity", &N)
            .field("spectral", &self.spectral)
            .finish_non_exhaustive()
    }
}
