//! LPC analysis: windowed autocorrelation, spectral smoothing, and the
//! Levinson-Durbin recursion.
//!
//! The analysis runs once per frame over the last 160 preprocessed samples
//! with an asymmetric window. Autocorrelations are accumulated at 64-bit
//! width and block-normalized, so no overflow rescaling loop is needed.

use crate::constants::*;
use crate::math::*;
use crate::tables::{ANALYSIS_WINDOW, BW_EXPAND, LAG_WINDOW};

/// Windowed autocorrelation of the analysis buffer.
///
/// `x` is the most recent `WINDOW_SIZE` samples. Returns r[0..=LPC_ORDER]
/// block-normalized so that r[0] uses the full positive i32 range.
pub fn autocorr(x: &[i16; WINDOW_SIZE]) -> [i32; LPC_ORDER + 1] {
    let mut wx = [0i16; WINDOW_SIZE];
    for n in 0..WINDOW_SIZE {
        wx[n] = mult_r(x[n], ANALYSIS_WINDOW[n]);
    }

    let mut acc = [0i64; LPC_ORDER + 1];
    for (k, a) in acc.iter_mut().enumerate() {
        let mut s = 0i64;
        for n in k..WINDOW_SIZE {
            s += wx[n] as i64 * wx[n - k] as i64;
        }
        *a = s;
    }

    // block normalization against r[0]
    let mut r = [0i32; LPC_ORDER + 1];
    if acc[0] == 0 {
        r[0] = 1;
        return r;
    }
    let headroom = acc[0].leading_zeros() as i32 - 33; // target r[0] < 2^30
    for (k, a) in acc.iter().enumerate() {
        let v = if headroom >= 0 {
            *a << headroom
        } else {
            *a >> -headroom
        };
        r[k] = v.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    }
    r
}

/// Apply the white-noise correction and Gaussian lag window to `r` in place.
pub fn spectral_smoothing(r: &mut [i32; LPC_ORDER + 1]) {
    r[0] = l_add(r[0], l_shr(r[0], 9));
    for k in 1..=LPC_ORDER {
        r[k] = mpy_32_16(r[k], LAG_WINDOW[k - 1]);
    }
}

/// Levinson-Durbin recursion producing Q12 predictor coefficients.
///
/// On an ill-conditioned recursion (reflection coefficient at or above one,
/// or non-positive prediction error) the previous frame's coefficients in
/// `old_a` are reused. On success `old_a` is refreshed with the new set.
pub fn levinson(
    r: &[i32; LPC_ORDER + 1],
    old_a: &mut [i16; LPC_ORDER + 1],
) -> [i16; LPC_ORDER + 1] {
    const ONE: i64 = 1 << 27; // coefficient scale during the recursion

    if r[0] <= 0 {
        return *old_a;
    }

    let mut a = [0i64; LPC_ORDER + 1];
    a[0] = ONE;
    let mut alpha = r[0] as i64;

    for i in 1..=LPC_ORDER {
        let mut acc = (r[i] as i64) << 27;
        for j in 1..i {
            acc += a[j] * r[i - j] as i64;
        }
        let k = -(acc / alpha); // Q27 reflection coefficient
        if k.abs() >= ONE {
            return *old_a;
        }

        let mut new_a = a;
        for j in 1..i {
            new_a[j] = a[j] + ((k * a[i - j]) >> 27);
        }
        new_a[i] = k;
        a = new_a;

        alpha -= (((k * k) >> 27) * alpha) >> 27;
        if alpha <= 0 {
            return *old_a;
        }
    }

    let mut out = [0i16; LPC_ORDER + 1];
    for (i, &c) in a.iter().enumerate() {
        // Q27 -> Q12 with rounding
        let v = (c + (1 << 14)) >> 15;
        out[i] = v.clamp(i16::MIN as i64, i16::MAX as i64) as i16;
    }
    *old_a = out;
    out
}

/// Bandwidth-expand the predictor: a[i] *= 0.96^i.
pub fn bandwidth_expand(a: &mut [i16; LPC_ORDER + 1]) {
    for i in 1..=LPC_ORDER {
        a[i] = mult_r(BW_EXPAND[i - 1], a[i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ar1_signal(rho: f64) -> [i16; WINDOW_SIZE] {
        // deterministic AR(1) driven by a fixed pseudo-noise sequence
        let mut seed = 12345u32;
        let mut prev = 0.0f64;
        let mut x = [0i16; WINDOW_SIZE];
        for s in x.iter_mut() {
            seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
            let noise = (seed >> 16) as f64 / 65536.0 - 0.5;
            prev = rho * prev + 2000.0 * noise;
            *s = prev as i16;
        }
        x
    }

    #[test]
    fn test_autocorr_of_ar1() {
        let x = ar1_signal(0.8);
        let r = autocorr(&x);
        assert!(r[0] > 0);
        // r[1]/r[0] should be near the AR coefficient (window tapers it some)
        let ratio = r[1] as f64 / r[0] as f64;
        assert!(ratio > 0.55 && ratio < 0.95, "ratio {ratio}");
    }

    #[test]
    fn test_autocorr_silence() {
        let x = [0i16; WINDOW_SIZE];
        let r = autocorr(&x);
        assert_eq!(r[0], 1);
        assert!(r[1..].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_smoothing_shrinks_tail() {
        let x = ar1_signal(0.9);
        let mut r = autocorr(&x);
        let r8_before = r[LPC_ORDER];
        spectral_smoothing(&mut r);
        assert!(r[0] > 0);
        assert!(r[LPC_ORDER].abs() <= r8_before.abs());
    }

    #[test]
    fn test_levinson_recovers_ar1() {
        let x = ar1_signal(0.8);
        let mut r = autocorr(&x);
        spectral_smoothing(&mut r);
        let mut old_a = [0i16; LPC_ORDER + 1];
        old_a[0] = Q12_ONE;
        let a = levinson(&r, &mut old_a);
        assert_eq!(a[0], Q12_ONE);
        // a[1] approximates -rho in Q12
        let a1 = a[1] as f64 / 4096.0;
        assert!(a1 < -0.5 && a1 > -1.0, "a1 {a1}");
        // old_a refreshed on success
        assert_eq!(old_a, a);
    }

    #[test]
    fn test_levinson_fallback_on_bad_input() {
        let mut old_a = [0i16; LPC_ORDER + 1];
        old_a[0] = Q12_ONE;
        old_a[1] = -1000;
        let r = [0i32; LPC_ORDER + 1];
        let a = levinson(&r, &mut old_a);
        assert_eq!(a, old_a);
    }

    #[test]
    fn test_bandwidth_expand() {
        let mut a = [0i16; LPC_ORDER + 1];
        a[0] = Q12_ONE;
        a[1] = -3000;
        a[8] = 1000;
        bandwidth_expand(&mut a);
        assert_eq!(a[0], Q12_ONE);
        assert!(a[1] > -3000 && a[1] < -2700);
        assert!(a[8] < 1000 && a[8] > 600);
    }
}
