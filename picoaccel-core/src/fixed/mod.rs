//! Q15 / Q31 fixed-point substrate for FPU-less targets.
//!
//! ## Formats
//!
//! | Type  | Storage | Fractional bits | Range          |
//! |-------|---------|-----------------|----------------|
//! | `Q15` | `i16`   | 15              | [-1.0, 1.0)    |
//! | `Q31` | `i32`   | 31              | [-1.0, 1.0)    |
//!
//! Every public operation saturates instead of wrapping. Products are formed
//! in a type at least twice as wide as the operands and shifted down by the
//! fractional-bit count (truncating). Accumulating helpers return a wide
//! Q15-scaled `i32` so a caller narrows exactly once with
//! [`Q15::from_wide_sat`].

pub mod dsp;
pub mod newton;
pub mod vector;

pub use dsp::DspSample;
pub use newton::{recip_approx, sqrt_approx};

/// Signed Q1.15 value: `raw / 32768`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Q15(pub i16);

impl Q15 {
    pub const SHIFT: u32 = 15;
    /// 1.0 on the Q15 grid. Not representable in `i16`; used for wide math.
    pub const ONE_WIDE: i32 = 1 << Self::SHIFT;
    pub const MIN: Q15 = Q15(i16::MIN);
    pub const MAX: Q15 = Q15(i16::MAX);
    pub const ZERO: Q15 = Q15(0);

    /// Convert from float. Values `>= 1.0` or `<= -1.0` saturate.
    pub fn from_f32(f: f32) -> Self {
        if f >= 1.0 {
            return Self::MAX;
        }
        if f <= -1.0 {
            return Self::MIN;
        }
        Q15((f * Self::ONE_WIDE as f32) as i16)
    }

    /// Exact conversion back to float.
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / Self::ONE_WIDE as f32
    }

    pub fn raw(self) -> i16 {
        self.0
    }

    /// Clamp a wide Q15-scaled value into range.
    pub fn from_wide_sat(wide: i32) -> Self {
        Q15(wide.clamp(i16::MIN as i32, i16::MAX as i32) as i16)
    }

    /// `(a * b) >> 15` through a 32-bit intermediate.
    pub fn mul(self, other: Q15) -> Q15 {
        Self::from_wide_sat((self.0 as i32 * other.0 as i32) >> Self::SHIFT)
    }

    /// `acc + (a * b) >> 15` where `acc` is a Q15-scaled 32-bit accumulator.
    ///
    /// The product is not narrowed before it is added, so a run of MACs loses
    /// nothing until the caller narrows the final sum.
    pub fn mac(acc: i32, a: Q15, b: Q15) -> i32 {
        acc.saturating_add((a.0 as i32 * b.0 as i32) >> Self::SHIFT)
    }

    pub fn add_sat(self, other: Q15) -> Q15 {
        Self::from_wide_sat(self.0 as i32 + other.0 as i32)
    }

    pub fn sub_sat(self, other: Q15) -> Q15 {
        Self::from_wide_sat(self.0 as i32 - other.0 as i32)
    }
}

/// Signed Q1.31 value: `raw / 2^31`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Q31(pub i32);

impl Q31 {
    pub const SHIFT: u32 = 31;
    pub const ONE_WIDE: i64 = 1 << Self::SHIFT;
    pub const MIN: Q31 = Q31(i32::MIN);
    pub const MAX: Q31 = Q31(i32::MAX);
    pub const ZERO: Q31 = Q31(0);

    /// Convert from float. Values `>= 1.0` or `<= -1.0` saturate.
    pub fn from_f32(f: f32) -> Self {
        if f >= 1.0 {
            return Self::MAX;
        }
        if f <= -1.0 {
            return Self::MIN;
        }
        Q31((f as f64 * Self::ONE_WIDE as f64) as i32)
    }

    pub fn to_f32(self) -> f32 {
        (self.0 as f64 / Self::ONE_WIDE as f64) as f32
    }

    pub fn raw(self) -> i32 {
        self.0
    }

    pub fn from_wide_sat(wide: i64) -> Self {
        Q31(wide.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }

    /// `(a * b) >> 31` through a 64-bit intermediate.
    pub fn mul(self, other: Q31) -> Q31 {
        Self::from_wide_sat((self.0 as i64 * other.0 as i64) >> Self::SHIFT)
    }

    pub fn add_sat(self, other: Q31) -> Q31 {
        Self::from_wide_sat(self.0 as i64 + other.0 as i64)
    }

    pub fn sub_sat(self, other: Q31) -> Q31 {
        Self::from_wide_sat(self.0 as i64 - other.0 as i64)
    }
}

impl From<Q15> for Q31 {
    fn from(q: Q15) -> Self {
        Q31((q.0 as i32) << (Q31::SHIFT - Q15::SHIFT))
    }
}
