//! Q15 vector helpers built from the scalar primitives.
//!
//! Slices of different lengths are processed up to the shortest one.

use super::Q15;

/// `sum(a[i] * b[i])` as a Q15-scaled 32-bit value.
///
/// Raw Q30 products are summed in 64-bit and shifted down once at the end,
/// so rounding does not compound per term.
pub fn dot_product(a: &[Q15], b: &[Q15]) -> i32 {
    let acc: i64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| x.0 as i64 * y.0 as i64)
        .sum();
    (acc >> Q15::SHIFT).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// `out[i] = input[i] * scale`.
pub fn vector_scale(input: &[Q15], scale: Q15, out: &mut [Q15]) {
    for (o, &x) in out.iter_mut().zip(input) {
        *o = x.mul(scale);
    }
}

/// `out[i] = a[i] + b[i]`, saturating.
pub fn vector_add(a: &[Q15], b: &[Q15], out: &mut [Q15]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x.add_sat(y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(v: f32) -> Q15 {
        Q15::from_f32(v)
    }

    #[test]
    fn dot_product_of_halves() {
        let a = vec![q(0.5); 4];
        let b = vec![q(0.5); 4];
        // 4 * 0.25 = 1.0
        assert_eq!(dot_product(&a, &b), Q15::ONE_WIDE);
    }

    #[test]
    fn dot_product_long_vector_does_not_overflow() {
        let a = vec![Q15::MAX; 512];
        let b = vec![Q15::MAX; 512];
        let got = dot_product(&a, &b);
        // each term is just under 1.0
        assert!(got > 511 * Q15::ONE_WIDE && got < 512 * Q15::ONE_WIDE, "got={got}");
    }

    #[test]
    fn dot_product_shifts_once() {
        // 3 * (1 * 16384) = 49152 raw; per-term shifting would give 0 + 0 + 0.
        let a = vec![Q15(1); 3];
        let b = vec![Q15(16384); 3];
        assert_eq!(dot_product(&a, &b), 1);
    }

    #[test]
    fn scale_and_add_elementwise() {
        let input = [q(0.5), q(-0.5), q(0.25)];
        let mut out = [Q15::ZERO; 3];
        vector_scale(&input, q(0.5), &mut out);
        assert_eq!(out, [q(0.25), q(-0.25), q(0.125)]);

        let mut sum = [Q15::ZERO; 3];
        vector_add(&[Q15::MAX, q(0.25), Q15::MIN], &[Q15::MAX, q(0.25), Q15::MIN], &mut sum);
        assert_eq!(sum, [Q15::MAX, q(0.5), Q15::MIN]);
    }

    #[test]
    fn mismatched_lengths_use_shortest() {
        let mut out = [Q15(7); 4];
        vector_add(&[Q15(1), Q15(2)], &[Q15(1); 4], &mut out);
        assert_eq!(out, [Q15(2), Q15(3), Q15(7), Q15(7)]);
        assert_eq!(dot_product(&[Q15(1)], &[]), 0);
    }
}
