//! Magnitude and power spectra. Pure functions, no context needed.
//!
//! All slices are processed up to the shortest one.

/// `mag[i] = sqrt(real[i]^2 + imag[i]^2)`.
pub fn magnitude(real: &[f32], imag: &[f32], mag: &mut [f32]) {
    for ((m, &r), &i) in mag.iter_mut().zip(real).zip(imag) {
        *m = (r * r + i * i).sqrt();
    }
}

/// `power[i] = real[i]^2 + imag[i]^2`.
pub fn power(real: &[f32], imag: &[f32], power: &mut [f32]) {
    for ((p, &r), &i) in power.iter_mut().zip(real).zip(imag) {
        *p = r * r + i * i;
    }
}
