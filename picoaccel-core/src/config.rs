//! Build/startup configuration.
//!
//! Target profile, arithmetic and backend choice are resolved once, when an
//! [`crate::AccelStage`] is built. Nothing is renegotiated afterwards.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::{DESKTOP_CAPACITY, EMBEDDED_CAPACITY};
use crate::spectral::{BackendKind, SUPPORTED_LENGTHS};

/// Memory/performance profile of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetProfile {
    /// Microcontroller-class: small cache, Q15 arithmetic.
    Embedded,
    #[default]
    Desktop,
}

impl TargetProfile {
    pub fn for_build() -> Self {
        let mcu = cfg!(any(
            target_arch = "arm",
            target_arch = "xtensa",
            target_arch = "riscv32"
        ));
        if cfg!(feature = "embedded") || mcu {
            TargetProfile::Embedded
        } else {
            TargetProfile::Desktop
        }
    }

    /// Decision-tree cache capacity this profile is sized for.
    pub fn cache_capacity(self) -> usize {
        match self {
            TargetProfile::Embedded => EMBEDDED_CAPACITY,
            TargetProfile::Desktop => DESKTOP_CAPACITY,
        }
    }
}

/// Sample arithmetic used by DSP helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Arithmetic {
    #[default]
    Float,
    FixedQ15,
}

impl Arithmetic {
    pub fn for_profile(profile: TargetProfile) -> Self {
        if cfg!(feature = "fixed-point") || profile == TargetProfile::Embedded {
            Arithmetic::FixedQ15
        } else {
            Arithmetic::Float
        }
    }
}

/// Configuration for [`crate::AccelStage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct AccelConfig {
    pub profile: TargetProfile,
    pub arithmetic: Arithmetic,
    pub backend: BackendKind,
    /// Spectral transform length. Must be one of 256 / 512.
    pub transform_len: u16,
    /// Whether the decision-tree cache starts enabled.
    pub cache_enabled: bool,
}

impl AccelConfig {
    /// The configuration this build would pick with no overrides.
    pub fn for_build() -> Self {
        let profile = TargetProfile::for_build();
        Self {
            profile,
            arithmetic: Arithmetic::for_profile(profile),
            backend: BackendKind::for_build(),
            transform_len: SUPPORTED_LENGTHS[0],
            cache_enabled: true,
        }
    }

    /// Snap `transform_len` to the nearest supported length.
    pub fn normalize(&mut self) {
        if SUPPORTED_LENGTHS.contains(&self.transform_len) {
            return;
        }
        let nearest = SUPPORTED_LENGTHS
            .iter()
            .copied()
            .min_by_key(|&l| (l as i32 - self.transform_len as i32).abs())
            .unwrap_or(SUPPORTED_LENGTHS[0]);
        warn!(
            requested = self.transform_len,
            using = nearest,
            "unsupported transform length in config"
        );
        self.transform_len = nearest;
    }
}

impl Default for AccelConfig {
    fn default() -> Self {
        Self::for_build()
    }
}
