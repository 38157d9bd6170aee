//! Saturating fixed-point arithmetic primitives.
//!
//! All narrowing operations saturate to the i16 or i32 range instead of
//! wrapping. Shifts that can overflow have checked variants returning a
//! saturation flag; the synthesis loop uses the flag to retry a frame at a
//! lower exponent instead of consulting global state.

/// Saturate an i32 to the i16 range.
#[inline]
pub fn saturate(x: i32) -> i16 {
    x.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Saturating 16-bit addition.
#[inline]
pub fn add(a: i16, b: i16) -> i16 {
    a.saturating_add(b)
}

/// Saturating 16-bit subtraction.
#[inline]
pub fn sub(a: i16, b: i16) -> i16 {
    a.saturating_sub(b)
}

/// Saturating absolute value (`abs(-32768)` returns 32767).
#[inline]
pub fn abs_s(a: i16) -> i16 {
    a.saturating_abs()
}

/// Saturating 16-bit left shift. Negative `n` shifts right.
pub fn shl(a: i16, n: i32) -> i16 {
    if n < 0 {
        return shr(a, -n);
    }
    if n >= 15 {
        return match a.signum() {
            1 => i16::MAX,
            -1 => i16::MIN,
            _ => 0,
        };
    }
    saturate((a as i32) << n)
}

/// Arithmetic 16-bit right shift. Negative `n` shifts left with saturation.
pub fn shr(a: i16, n: i32) -> i16 {
    if n < 0 {
        return shl(a, -n);
    }
    if n >= 15 {
        return if a < 0 { -1 } else { 0 };
    }
    a >> n
}

/// Saturating 16-bit left shift, reporting whether saturation occurred.
pub fn shl_checked(a: i16, n: i32) -> (i16, bool) {
    if n < 0 {
        return (shr(a, -n), false);
    }
    if a == 0 {
        return (0, false);
    }
    if n >= 15 {
        return (if a > 0 { i16::MAX } else { i16::MIN }, true);
    }
    let wide = (a as i32) << n;
    if wide > i16::MAX as i32 {
        (i16::MAX, true)
    } else if wide < i16::MIN as i32 {
        (i16::MIN, true)
    } else {
        (wide as i16, false)
    }
}

/// Arithmetic 16-bit right shift; a negative `n` shifts left and reports
/// whether the left shift saturated.
pub fn shr_checked(a: i16, n: i32) -> (i16, bool) {
    if n < 0 {
        shl_checked(a, -n)
    } else {
        (shr(a, n), false)
    }
}

/// Q15 multiply: `(a * b) >> 15` with saturation.
#[inline]
pub fn mult(a: i16, b: i16) -> i16 {
    saturate((a as i32 * b as i32) >> 15)
}

/// Q15 multiply with rounding.
#[inline]
pub fn mult_r(a: i16, b: i16) -> i16 {
    saturate((a as i32 * b as i32 + 0x4000) >> 15)
}

/// 16x16 -> 32 multiply with a one-bit left shift (fractional multiply).
#[inline]
pub fn l_mult(a: i16, b: i16) -> i32 {
    let p = a as i32 * b as i32;
    if p == 0x4000_0000 {
        i32::MAX
    } else {
        p << 1
    }
}

/// 16x16 -> 32 integer multiply, no shift.
#[inline]
pub fn l_mult0(a: i16, b: i16) -> i32 {
    a as i32 * b as i32
}

/// Saturating 32-bit addition.
#[inline]
pub fn l_add(a: i32, b: i32) -> i32 {
    a.saturating_add(b)
}

/// Saturating 32-bit subtraction.
#[inline]
pub fn l_sub(a: i32, b: i32) -> i32 {
    a.saturating_sub(b)
}

/// Multiply-accumulate: `acc + (a * b << 1)` with saturation.
#[inline]
pub fn l_mac(acc: i32, a: i16, b: i16) -> i32 {
    l_add(acc, l_mult(a, b))
}

/// Multiply-accumulate without the fractional shift.
#[inline]
pub fn l_mac0(acc: i32, a: i16, b: i16) -> i32 {
    l_add(acc, l_mult0(a, b))
}

/// Multiply-subtract: `acc - (a * b << 1)` with saturation.
#[inline]
pub fn l_msu(acc: i32, a: i16, b: i16) -> i32 {
    l_sub(acc, l_mult(a, b))
}

/// Saturating 32-bit left shift. Negative `n` shifts right.
pub fn l_shl(a: i32, n: i32) -> i32 {
    l_shl_checked(a, n).0
}

/// Saturating 32-bit left shift, reporting whether saturation occurred.
pub fn l_shl_checked(a: i32, n: i32) -> (i32, bool) {
    if n <= 0 {
        return (l_shr(a, -n), false);
    }
    if a == 0 {
        return (0, false);
    }
    if n >= 31 {
        return (if a > 0 { i32::MAX } else { i32::MIN }, true);
    }
    let wide = (a as i64) << n;
    if wide > i32::MAX as i64 {
        (i32::MAX, true)
    } else if wide < i32::MIN as i64 {
        (i32::MIN, true)
    } else {
        (wide as i32, false)
    }
}

/// Arithmetic 32-bit right shift. Negative `n` shifts left with saturation.
pub fn l_shr(a: i32, n: i32) -> i32 {
    if n < 0 {
        return l_shl(a, -n);
    }
    if n >= 31 {
        return if a < 0 { -1 } else { 0 };
    }
    a >> n
}

/// Round the high 16 bits of an i32 (adds 0x8000 with saturation first).
#[inline]
pub fn round(a: i32) -> i16 {
    (l_add(a, 0x8000) >> 16) as i16
}

/// High 16 bits of an i32.
#[inline]
pub fn extract_h(a: i32) -> i16 {
    (a >> 16) as i16
}

/// Low 16 bits of an i32.
#[inline]
pub fn extract_l(a: i32) -> i16 {
    a as i16
}

/// Place a 16-bit value in the high word of an i32.
#[inline]
pub fn l_deposit_h(a: i16) -> i32 {
    (a as i32) << 16
}

/// Sign-extend a 16-bit value into an i32.
#[inline]
pub fn l_deposit_l(a: i16) -> i32 {
    a as i32
}

/// Number of left shifts needed to normalize a 16-bit value.
pub fn norm_s(a: i16) -> i32 {
    if a == 0 {
        return 0;
    }
    let x = if a < 0 { !a } else { a };
    if x == 0 {
        // a == -1
        return 15;
    }
    (x.leading_zeros() as i32) - 1
}

/// Number of left shifts needed to normalize a 32-bit value.
pub fn norm_l(a: i32) -> i32 {
    if a == 0 {
        return 0;
    }
    let x = if a < 0 { !a } else { a };
    if x == 0 {
        // a == -1
        return 31;
    }
    (x.leading_zeros() as i32) - 1
}

/// Fractional division `num / den` in Q15. Requires `0 <= num <= den`
/// and `den > 0`; saturates to Q15 one when `num == den`.
pub fn div_s(num: i16, den: i16) -> i16 {
    debug_assert!(den > 0 && num >= 0 && num <= den);
    if num >= den {
        return i16::MAX;
    }
    (((num as i32) << 15) / den as i32) as i16
}

/// 32x16 fractional multiply: `(a * c) >> 15` with saturation.
#[inline]
pub fn mpy_32_16(a: i32, c: i16) -> i32 {
    let p = (a as i64 * c as i64) >> 15;
    p.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Square root of a Q15 fraction, result in Q15.
///
/// Exact integer square root of `x << 15`, so `sqrt_q15(16384) == 23170`.
pub fn sqrt_q15(x: i16) -> i16 {
    if x <= 0 {
        return 0;
    }
    let v = (x as u32) << 15;
    let mut root = 0u32;
    let mut rem = v;
    let mut bit = 1u32 << 30;
    while bit > v {
        bit >>= 2;
    }
    while bit != 0 {
        if rem >= root + bit {
            rem -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    root as i16
}

/// Base-2 logarithm of a positive i32 treated as an integer.
///
/// Returns `(exponent, fraction)` with the fraction in Q15, so that
/// `x ~= 2^(exponent + fraction / 32768)`. Non-positive input yields (0, 0).
pub fn log2_fx(x: i32) -> (i16, i16) {
    if x <= 0 {
        return (0, 0);
    }
    let n = norm_l(x);
    let exp = (30 - n) as i16;
    let norm_x = x << n; // [2^30, 2^31)

    // Polynomial fit of log2(1+f) over [0, 1)
    let f = (norm_x - 0x4000_0000) >> 15; // Q15
    let c1 = 23637i32; // 1.4427 in Q14
    let c2 = -11086i32; // -0.6784 in Q14
    let c3 = 3952i32; // 0.2416 in Q14

    let f2 = (f * f) >> 15;
    let f3 = (f2 * f) >> 15;
    let frac = ((c1 * f) >> 14) + ((c2 * f2) >> 14) + ((c3 * f3) >> 14);

    (exp, saturate(frac))
}

/// 2 raised to `exponent + fraction / 32768`, rounded to an i32.
///
/// The fraction is Q15 in [0, 1). Saturates on overflow.
pub fn pow2_fx(exponent: i16, fraction: i16) -> i32 {
    // Polynomial fit of 2^f over [0, 1), evaluated in Q15
    let f = fraction as i32;
    let c1 = 22713i32; // 0.6931 in Q15
    let c2 = 7912i32; // 0.2416 in Q15
    let c3 = 1735i32; // 0.0530 in Q15

    let f2 = (f * f) >> 15;
    let f3 = (f2 * f) >> 15;
    let p = 32767 + ((c1 * f) >> 15) + ((c2 * f2) >> 15) + ((c3 * f3) >> 15); // Q15

    let n = exponent as i32 - 15;
    if n >= 0 {
        l_shl(p, n)
    } else if n >= -31 {
        // round on the way down
        let r = p + (1 << (-n - 1));
        r >> -n
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturation_edges() {
        assert_eq!(add(30000, 30000), i16::MAX);
        assert_eq!(sub(-30000, 30000), i16::MIN);
        assert_eq!(abs_s(i16::MIN), i16::MAX);
        assert_eq!(l_mult(i16::MIN, i16::MIN), i32::MAX);
        assert_eq!(saturate(100_000), i16::MAX);
        assert_eq!(saturate(-100_000), i16::MIN);
    }

    #[test]
    fn test_shifts() {
        assert_eq!(shl(1000, 3), 8000);
        assert_eq!(shl(20000, 2), i16::MAX);
        assert_eq!(shr(-8, 2), -2);
        assert_eq!(shr(7, 20), 0);
        assert_eq!(shr(-7, 20), -1);
        assert_eq!(l_shl(1 << 20, 10), 1 << 30);
        assert_eq!(l_shl(1 << 20, 12), i32::MAX);
        assert_eq!(l_shl(-(1 << 20), 12), i32::MIN);
    }

    #[test]
    fn test_checked_shift_reports_saturation() {
        assert_eq!(l_shl_checked(12345, 2), (49380, false));
        let (v, sat) = l_shl_checked(0x2000_0000, 3);
        assert_eq!(v, i32::MAX);
        assert!(sat);
        let (_, sat) = l_shl_checked(-1, 31);
        assert!(sat);
    }

    #[test]
    fn test_norms() {
        assert_eq!(norm_s(0), 0);
        assert_eq!(norm_s(1), 14);
        assert_eq!(norm_s(0x4000), 0);
        assert_eq!(norm_s(-1), 15);
        assert_eq!(norm_s(i16::MIN), 0);
        assert_eq!(norm_l(0), 0);
        assert_eq!(norm_l(1), 30);
        assert_eq!(norm_l(0x4000_0000), 0);
        assert_eq!(norm_l(-1), 31);
        assert_eq!(norm_l(i32::MIN), 0);
    }

    #[test]
    fn test_div_s() {
        assert_eq!(div_s(1, 2), 16384);
        assert_eq!(div_s(3, 4), 24576);
        assert_eq!(div_s(5, 5), i16::MAX);
        assert_eq!(div_s(0, 9), 0);
    }

    #[test]
    fn test_log2_pow2_consistency() {
        for &x in &[1i32, 40, 1000, 65536, 123_456_789] {
            let (e, f) = log2_fx(x);
            let back = pow2_fx(e, f);
            let err = (back - x).abs() as f64 / x as f64;
            assert!(err < 0.002, "x={x} back={back}");
        }
    }

    #[test]
    fn test_log2_exact_powers() {
        assert_eq!(log2_fx(1), (0, 0));
        assert_eq!(log2_fx(1 << 20).0, 20);
        assert_eq!(log2_fx(1 << 20).1, 0);
        assert_eq!(pow2_fx(10, 0), 1024);
    }

    #[test]
    fn test_sqrt_q15() {
        assert_eq!(sqrt_q15(0), 0);
        assert_eq!(sqrt_q15(-5), 0);
        assert_eq!(sqrt_q15(16384), 23170); // sqrt(0.5)
        assert_eq!(sqrt_q15(8192), 16384); // sqrt(0.25)
        assert_eq!(sqrt_q15(32767), 32767);
    }

    #[test]
    fn test_mpy_32_16() {
        // 0.5 (Q31-ish scale) times 0.5 in Q15
        assert_eq!(mpy_32_16(1 << 20, 16384), 1 << 19);
        assert_eq!(mpy_32_16(-(1 << 20), 16384), -(1 << 19));
    }
}
