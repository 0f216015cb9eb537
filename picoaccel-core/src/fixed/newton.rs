//! Newton-Raphson square root and reciprocal on the Q15 grid.
//!
//! The iteration counts (4 for sqrt, 3 for reciprocal) are part of the
//! accuracy contract: results are checked against `f32` references to within
//! 1 % for inputs in `[0.2, 1.0)`. Changing them changes the output.

use super::Q15;

const SQRT_ITERATIONS: usize = 4;
const RECIP_ITERATIONS: usize = 3;

/// Approximate `sqrt(x)` for non-negative `x`.
///
/// Seeded from `x / 2`; each step is `g = (g + (x << 15) / g) / 2` in 32-bit.
/// Zero and negative inputs return zero. `Q15::MAX` (the saturated 1.0)
/// returns itself.
pub fn sqrt_approx(x: Q15) -> Q15 {
    if x.0 <= 0 {
        return Q15::ZERO;
    }
    if x == Q15::MAX {
        return Q15::MAX;
    }

    let x_scaled = (x.0 as i32) << Q15::SHIFT;
    let mut guess = (x.0 as i32) >> 1;
    for _ in 0..SQRT_ITERATIONS {
        // guess stays >= 1 for any positive x: the mean of two positives.
        let div = x_scaled / guess.max(1);
        guess = (guess + div) >> 1;
    }

    Q15::from_wide_sat(guess)
}

/// Approximate `1 / x`.
///
/// `|1/x| >= 1` for every Q15 input, so the result is returned as a 32-bit
/// integer carrying 15 fractional bits (`Q15::ONE_WIDE` is 1.0). Zero input
/// returns `i32::MAX` rather than dividing. `Q15::MAX` returns exactly 1.0.
///
/// Seeded from `(1 << 30) / x`; each step is `g = g * (2 - x * g)` with every
/// product formed in 64-bit and shifted down by 15.
pub fn recip_approx(x: Q15) -> i32 {
    if x.0 == 0 {
        return i32::MAX;
    }
    if x == Q15::MAX {
        return Q15::ONE_WIDE;
    }

    let one_scaled = (Q15::ONE_WIDE as i64) << Q15::SHIFT;
    let xi = x.0 as i64;
    let mut guess = if xi > 0 {
        one_scaled / xi
    } else {
        -(one_scaled / -xi)
    };

    let two = 2i64 << Q15::SHIFT;
    for _ in 0..RECIP_ITERATIONS {
        let prod = (xi * guess) >> Q15::SHIFT;
        let diff = two - prod;
        guess = (guess * diff) >> Q15::SHIFT;
    }

    guess.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
