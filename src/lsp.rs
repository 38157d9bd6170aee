//! LPC <-> line spectral pair conversion.
//!
//! LSPs are kept as Q15 normalized frequencies in (0, 1). The root search
//! for `a_to_lsp` runs in the cosine domain along [`COS_TABLE`], evaluating
//! the sum and difference polynomials with a Clenshaw recurrence and
//! bisecting each sign change; the final root is mapped back to a
//! frequency by interpolating the table interval it fell in.

use crate::constants::*;
use crate::math::*;
use crate::tables::COS_TABLE;

const NC: usize = LPC_ORDER / 2;

/// Evaluate the degree-4 Chebyshev series
/// `f[0]*T4 + f[1]*T3 + f[2]*T2 + f[3]*T1 + f[4]/2` at `x` (Q15 cosine).
fn cheb_eval(x: i16, f: &[i32; NC + 1]) -> i32 {
    let mut b1 = 0i64;
    let mut b2 = 0i64;
    for k in 0..NC {
        let b0 = ((2 * x as i64 * b1) >> 15) - b2 + f[k] as i64;
        b2 = b1;
        b1 = b0;
    }
    let v = ((x as i64 * b1) >> 15) - b2 + (f[NC] as i64 >> 1);
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Form the sum/difference polynomial coefficients from Q12 predictor
/// coefficients, with the trivial roots at z = -1 and z = 1 divided out.
fn sum_diff_polys(a: &[i16; LPC_ORDER + 1]) -> ([i32; NC + 1], [i32; NC + 1]) {
    // Q23 coefficient scale keeps plenty of headroom in the i32 recurrence
    let mut f1 = [0i32; NC + 1];
    let mut f2 = [0i32; NC + 1];
    f1[0] = 1 << 23;
    f2[0] = 1 << 23;
    for i in 0..NC {
        let s = ((a[i + 1] as i32 + a[LPC_ORDER - i] as i32) << 23) >> 12;
        let d = ((a[i + 1] as i32 - a[LPC_ORDER - i] as i32) << 23) >> 12;
        f1[i + 1] = s - f1[i];
        f2[i + 1] = d + f2[i];
    }
    (f1, f2)
}

/// Convert Q12 predictor coefficients to Q15 LSP frequencies.
///
/// Falls back to `old_lsp` when fewer than `LPC_ORDER` roots are found,
/// which can happen for near-unstable coefficient sets.
pub fn a_to_lsp(
    a: &[i16; LPC_ORDER + 1],
    old_lsp: &[i16; LPC_ORDER],
) -> [i16; LPC_ORDER] {
    let (f1, f2) = sum_diff_polys(a);
    let mut lsp = [0i16; LPC_ORDER];
    let mut nf = 0usize;
    let mut use_f1 = true;

    let mut xlow = COS_TABLE[0];
    let mut ylow = cheb_eval(xlow, &f1);

    for k in 1..COS_TABLE.len() {
        if nf == LPC_ORDER {
            break;
        }
        let xhigh = xlow;
        let yhigh = ylow;
        xlow = COS_TABLE[k];
        let f = if use_f1 { &f1 } else { &f2 };
        ylow = cheb_eval(xlow, f);

        if ylow as i64 * yhigh as i64 > 0 {
            continue;
        }

        // bisect twice, then interpolate linearly
        let (mut xl, mut yl, mut xh, mut yh) = (xlow, ylow, xhigh, yhigh);
        for _ in 0..2 {
            let xm = add(shr(xl, 1), shr(xh, 1));
            let ym = cheb_eval(xm, f);
            if ym as i64 * yl as i64 <= 0 {
                xh = xm;
                yh = ym;
            } else {
                xl = xm;
                yl = ym;
            }
        }
        let dy = yh as i64 - yl as i64;
        let xint = if dy == 0 {
            xl
        } else {
            let num = yl as i64 * (xh as i64 - xl as i64);
            saturate((xl as i64 - num / dy) as i32)
        };

        lsp[nf] = cos_interval_to_freq(k, xint);
        nf += 1;
        use_f1 = !use_f1;

        // restart the scan from the root with the other polynomial
        xlow = xint;
        let f = if use_f1 { &f1 } else { &f2 };
        ylow = cheb_eval(xlow, f);
    }

    if nf < LPC_ORDER {
        return *old_lsp;
    }
    lsp
}

/// Map a cosine-domain root inside table interval `k` (between
/// `COS_TABLE[k - 1]` and `COS_TABLE[k]`) to a Q15 frequency.
fn cos_interval_to_freq(k: usize, xint: i16) -> i16 {
    let c_hi = COS_TABLE[k - 1] as i32; // larger cosine, lower frequency
    let c_lo = COS_TABLE[k] as i32;
    let span = c_hi - c_lo;
    let off = (c_hi - xint as i32).clamp(0, span);
    let frac = if span > 0 { (off << 15) / span } else { 0 }; // Q15
    saturate((((k - 1) as i32) << 8) + (frac >> 7))
}

/// Q15 frequency to Q15 cosine via table interpolation.
fn freq_to_cos(freq: i16) -> i16 {
    let idx = (freq as usize) >> 8;
    let frac = (freq as i32) & 0xff;
    let c0 = COS_TABLE[idx] as i32;
    let c1 = COS_TABLE[idx + 1] as i32;
    saturate(c0 + (((c1 - c0) * frac) >> 8))
}

/// Expand one half of the LSP polynomial product in Q24.
///
/// The product over `(1 - 2 cos w z^-1 + z^-2)` factors is palindromic, so
/// only the first `NC + 1` coefficients are stored; the top slot of each
/// growth step starts from `f[i - 2]` by that symmetry.
fn lsp_poly(cosines: &[i16; NC], f: &mut [i32; NC + 1]) {
    f[0] = 1 << 24;
    f[1] = l_msu(0, cosines[0], 512); // -2 * cos in Q24
    for i in 2..=NC {
        let c = cosines[i - 1];
        f[i] = f[i - 2];
        for j in (2..=i).rev() {
            let t = l_shl(mpy_32_16(f[j - 1], c), 1);
            f[j] = l_sub(l_add(f[j], f[j - 2]), t);
        }
        f[1] = l_msu(f[1], c, 512);
    }
}

/// Convert Q15 LSP frequencies back to Q12 predictor coefficients.
pub fn lsp_to_a(lsp: &[i16; LPC_ORDER]) -> [i16; LPC_ORDER + 1] {
    let mut even = [0i16; NC];
    let mut odd = [0i16; NC];
    for i in 0..NC {
        even[i] = freq_to_cos(lsp[2 * i]);
        odd[i] = freq_to_cos(lsp[2 * i + 1]);
    }

    let mut f1 = [0i32; NC + 1];
    let mut f2 = [0i32; NC + 1];
    lsp_poly(&even, &mut f1);
    lsp_poly(&odd, &mut f2);

    // multiply back the (1 + z^-1) and (1 - z^-1) factors
    for i in (1..=NC).rev() {
        f1[i] = l_add(f1[i], f1[i - 1]);
        f2[i] = l_sub(f2[i], f2[i - 1]);
    }

    let mut a = [0i16; LPC_ORDER + 1];
    a[0] = Q12_ONE;
    for i in 1..=NC {
        let j = LPC_ORDER + 1 - i;
        // Q24 -> Q12 including the final 0.5 factor
        a[i] = saturate((l_add(f1[i], f2[i]) + (1 << 12)) >> 13);
        a[j] = saturate((l_sub(f1[i], f2[i]) + (1 << 12)) >> 13);
    }
    a
}

/// Force ascending order with a minimum gap so the synthesis filter
/// derived from the LSPs stays stable.
pub fn stabilize_lsp(lsp: &mut [i16; LPC_ORDER]) {
    let mut floor = LSP_MIN_GAP;
    for v in lsp.iter_mut() {
        if *v < floor {
            *v = floor;
        }
        floor = add(*v, LSP_MIN_GAP);
    }
    // keep the top end below Nyquist, walking back down if needed
    let mut ceil = sub(i16::MAX, LSP_MIN_GAP);
    for v in lsp.iter_mut().rev() {
        if *v > ceil {
            *v = ceil;
        }
        ceil = sub(*v, LSP_MIN_GAP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_lsp() -> [i16; LPC_ORDER] {
        core::array::from_fn(|i| ((i + 1) * 3641) as i16)
    }

    #[test]
    fn test_flat_spectrum_round_trip() {
        // identity predictor: LSPs evenly spaced, and back-conversion flat
        let mut a = [0i16; LPC_ORDER + 1];
        a[0] = Q12_ONE;
        let lsp = a_to_lsp(&a, &default_lsp());
        for i in 1..LPC_ORDER {
            assert!(lsp[i] > lsp[i - 1], "unordered at {i}: {:?}", lsp);
        }
        let a2 = lsp_to_a(&lsp);
        assert_eq!(a2[0], Q12_ONE);
        for i in 1..=LPC_ORDER {
            assert!(a2[i].abs() < 140, "a2[{i}] = {}", a2[i]);
        }
    }

    #[test]
    fn test_round_trip_shaped_predictor() {
        let mut a = [0i16; LPC_ORDER + 1];
        a[0] = Q12_ONE;
        a[1] = -5324; // about -1.3
        a[2] = 2130;
        a[3] = -819;
        a[4] = 410;
        let lsp = a_to_lsp(&a, &default_lsp());
        for i in 1..LPC_ORDER {
            assert!(lsp[i] > lsp[i - 1]);
        }
        let a2 = lsp_to_a(&lsp);
        for i in 0..=LPC_ORDER {
            assert!(
                (a2[i] as i32 - a[i] as i32).abs() < 220,
                "i={i}: {} vs {}",
                a2[i],
                a[i]
            );
        }
    }

    #[test]
    fn test_fallback_keeps_old_lsp() {
        // wildly unstable coefficients: root search comes up short
        let mut a = [0i16; LPC_ORDER + 1];
        a[0] = Q12_ONE;
        for i in 1..=LPC_ORDER {
            a[i] = if i % 2 == 0 { 32000 } else { -32000 };
        }
        let old = default_lsp();
        let lsp = a_to_lsp(&a, &old);
        if lsp != old {
            // if roots were found they must at least be ordered
            for i in 1..LPC_ORDER {
                assert!(lsp[i] > lsp[i - 1]);
            }
        }
    }

    #[test]
    fn test_stabilize_reorders() {
        let mut lsp = [100i16, 90, 5000, 4900, 20000, 20010, 32700, 32760];
        stabilize_lsp(&mut lsp);
        for i in 1..LPC_ORDER {
            assert!(lsp[i] - lsp[i - 1] >= LSP_MIN_GAP);
        }
        assert!(lsp[0] >= LSP_MIN_GAP);
        assert!(lsp[LPC_ORDER - 1] <= i16::MAX - LSP_MIN_GAP);
    }

    #[test]
    fn test_freq_cos_inverse() {
        for f in (256..32000).step_by(997) {
            let c = freq_to_cos(f as i16);
            // locate the interval and invert
            let k = COS_TABLE.iter().position(|&t| t <= c).unwrap_or(128);
            let back = cos_interval_to_freq(k.max(1), c);
            assert!(
                (back as i32 - f as i32).abs() < 16,
                "f={f} c={c} back={back}"
            );
        }
    }
}
