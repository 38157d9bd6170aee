//! Pitch analysis: coarse search on a decimated weighted signal, full-rate
//! refinement, three-tap predictor quantization, and the residual energy
//! used for gain coding.
//!
//! The coarse search runs 8:1 decimated so the full 10..265 lag range
//! costs only 33 correlations. Candidate peaks are compared on squared
//! normalized correlation; a sub-multiple pass pulls the estimate down to
//! the fundamental when the global maximum sits on a harmonic, and a
//! hysteresis pass prefers lags near the previous pitch when they are
//! nearly as good.

use crate::constants::*;
use crate::excitation::pitch_prediction;
use crate::math::*;
use crate::tables::{DEC_A, DEC_B, PITCH_TAP_CB, SUBMULT_THRESH};

/// Squared normalized correlation `cc^2 / (en * ex)` in Q15, zero for
/// non-positive correlation.
fn norm_corr_sq(cc: i64, en: i64, ex: i64) -> i16 {
    if cc <= 0 || en <= 0 || ex <= 0 {
        return 0;
    }
    let num = (cc as i128 * cc as i128) << 15;
    let den = en as i128 * ex as i128;
    (num / den).min(Q15_ONE as i128) as i16
}

/// Coarse pitch tracker over the decimated weighted speech.
#[derive(Debug, Clone)]
pub struct CoarsePitch {
    /// Decimation filter input history
    x_mem: [i16; DEC_FILTER_ORDER],
    /// Decimation filter output history, Q16
    y_mem: [i32; DEC_FILTER_ORDER],
    /// Decimated signal, Q16, oldest first
    buf: [i32; DEC_BUF_LEN],
    /// Previous full-rate coarse pitch
    cpplast: usize,
}

impl Default for CoarsePitch {
    fn default() -> Self {
        Self {
            x_mem: [0; DEC_FILTER_ORDER],
            y_mem: [0; DEC_FILTER_ORDER],
            buf: [0; DEC_BUF_LEN],
            cpplast: 96,
        }
    }
}

impl CoarsePitch {
    /// Low-pass filter one frame of weighted speech and keep every eighth
    /// output sample.
    fn decimate(&mut self, xw: &[i16; FRAME_SIZE]) -> [i32; FRAME_SIZE_DEC] {
        let mut out = [0i32; FRAME_SIZE_DEC];
        for (n, &x) in xw.iter().enumerate() {
            let mut num = DEC_B[0] as i64 * x as i64;
            for j in 1..=DEC_FILTER_ORDER {
                num += DEC_B[j] as i64 * self.x_mem[j - 1] as i64;
            }
            let mut den = 0i64;
            for j in 1..=DEC_FILTER_ORDER {
                den += DEC_A[j] as i64 * self.y_mem[j - 1] as i64;
            }
            let y = ((num << 16) - den) >> 13; // Q16
            let y = y.clamp(i32::MIN as i64, i32::MAX as i64) as i32;

            for j in (1..DEC_FILTER_ORDER).rev() {
                self.x_mem[j] = self.x_mem[j - 1];
                self.y_mem[j] = self.y_mem[j - 1];
            }
            self.x_mem[0] = x;
            self.y_mem[0] = y;

            if n % DEC_FACTOR == DEC_FACTOR - 1 {
                out[n / DEC_FACTOR] = y;
            }
        }
        out
    }

    /// Track the coarse pitch over one frame of Q1 weighted speech.
    /// Returns the estimate in full-rate samples.
    pub fn track(&mut self, xw: &[i16; FRAME_SIZE]) -> usize {
        let new = self.decimate(xw);
        self.buf.copy_within(FRAME_SIZE_DEC.., 0);
        self.buf[DEC_HISTORY..].copy_from_slice(&new);

        // block-normalize to 16 bits for the correlations
        let max = self.buf.iter().fold(1i32, |m, &v| m.max(v.saturating_abs()));
        let exp = norm_l(max) - 1;
        let mut xd = [0i16; DEC_BUF_LEN];
        for (d, &s) in xd.iter_mut().zip(self.buf.iter()) {
            *d = round(l_shl(s, exp));
        }

        let win = DEC_BUF_LEN - PITCH_WINDOW_DEC;
        let mut ex = 1i64;
        for n in win..DEC_BUF_LEN {
            ex += xd[n] as i64 * xd[n] as i64;
        }

        let mut c2 = [0i16; MAX_PITCH_DEC + 1];
        for lag in MIN_PITCH_DEC..=MAX_PITCH_DEC {
            let mut cc = 0i64;
            let mut en = 1i64;
            for n in win..DEC_BUF_LEN {
                cc += xd[n] as i64 * xd[n - lag] as i64;
                en += xd[n - lag] as i64 * xd[n - lag] as i64;
            }
            c2[lag] = norm_corr_sq(cc, en, ex);
        }

        // local maxima of the squared normalized correlation
        let mut peaks = [0usize; MAX_PEAKS];
        let mut npeaks = 0usize;
        for lag in (MIN_PITCH_DEC + 1)..MAX_PITCH_DEC {
            if npeaks == MAX_PEAKS {
                break;
            }
            if c2[lag] > 0 && c2[lag] > c2[lag - 1] && c2[lag] >= c2[lag + 1] {
                peaks[npeaks] = lag;
                npeaks += 1;
            }
        }
        if npeaks == 0 {
            return self.cpplast;
        }
        let peaks = &peaks[..npeaks];

        let mut im = 0usize;
        for i in 1..npeaks {
            if c2[peaks[i]] > c2[peaks[im]] {
                im = i;
            }
        }

        // too weak to trust: hold the previous estimate
        if c2[peaks[im]] < mult(COR_THRESH_LOW, COR_THRESH_LOW) {
            return self.cpplast;
        }

        // prefer the fundamental when the best peak sits on a harmonic
        for i in 0..im {
            let m = (peaks[im] + peaks[i] / 2) / peaks[i];
            if m < 2 {
                continue;
            }
            let dev = (peaks[im] as i32 - (m * peaks[i]) as i32).abs();
            let dev_th = if m <= 4 { SUBMULT_DEV } else { MULT_PEAK_DEV };
            if (dev << 15) > dev_th as i32 * peaks[im] as i32 {
                continue;
            }
            let th = SUBMULT_THRESH[m.min(SUBMULT_THRESH.len() - 1)];
            if (c2[peaks[i]] as i32) << 15 >= th as i32 * c2[peaks[im]] as i32 {
                im = i;
                break;
            }
        }

        // hysteresis toward the previous pitch
        let prev = (self.cpplast + DEC_FACTOR / 2) / DEC_FACTOR;
        let mut j = 0usize;
        for i in 1..npeaks {
            if (peaks[i] as i32 - prev as i32).abs()
                < (peaks[j] as i32 - prev as i32).abs()
            {
                j = i;
            }
        }
        if j != im {
            let dev = (peaks[j] as i32 - prev as i32).abs();
            if (dev << 15) <= PITCH_DEV_THRESH as i32 * prev as i32 {
                let rel = (c2[peaks[j]] as i32) << 15;
                let confident =
                    c2[peaks[im]] >= mult(COR_THRESH_HIGH, COR_THRESH_HIGH);
                let strong =
                    rel >= COR_THRESH_HIGH_LAST as i32 * c2[peaks[im]] as i32;
                let close =
                    rel >= COR_THRESH_LOW_LAST as i32 * c2[peaks[im]] as i32;
                if strong || (!confident && close) {
                    im = j;
                }
            }
        }

        let cpp = peaks[im] * DEC_FACTOR;
        self.cpplast = cpp;
        cpp
    }
}

/// Refine the coarse pitch at full rate over the current frame of the
/// down-scaled residual `x` (the frame occupies the last `FRAME_SIZE`
/// samples). Returns the pitch period and the single-tap predictor gain
/// in Q9.
pub fn refine_pitch(x: &[i16], cpp: usize) -> (usize, i16) {
    let start = x.len() - FRAME_SIZE;
    let lb = cpp.saturating_sub(DEC_FACTOR / 2).max(MIN_PITCH);
    let ub = (cpp + DEC_FACTOR / 2).min(MAX_PITCH);

    let mut best_pp = lb;
    let mut best_score = i64::MIN;
    let mut best_cc = 0i64;
    let mut best_en = 1i64;
    for pp in lb..=ub {
        let mut cc = 0i64;
        let mut en = 1i64;
        for n in start..x.len() {
            cc += x[n] as i64 * x[n - pp] as i64;
            en += x[n - pp] as i64 * x[n - pp] as i64;
        }
        let score = if cc > 0 { cc * cc / en } else { i64::MIN + 1 };
        if score > best_score {
            best_score = score;
            best_pp = pp;
            best_cc = cc;
            best_en = en;
        }
    }

    let ppt = (best_cc * 512 / best_en)
        .clamp(i16::MIN as i64, i16::MAX as i64) as i16;
    (best_pp, ppt)
}

/// Quantize the three-tap pitch predictor against the Q1 residual.
///
/// The current frame occupies the last `FRAME_SIZE` samples of `dq`.
/// Maximizes `2 b'c - b'Rb` over the codebook; entry 0 is the all-zero
/// predictor, so an unpredictable frame scores it best.
pub fn pitch_tap_quantize(dq: &[i16], pp: usize) -> (usize, [i16; 3]) {
    let start = dq.len() - FRAME_SIZE;
    let mut c = [0i64; 3];
    let mut r = [[0i64; 3]; 3];
    for n in start..dq.len() {
        let y = [
            dq[n + 1 - pp] as i64,
            dq[n - pp] as i64,
            dq[n - 1 - pp] as i64,
        ];
        for j in 0..3 {
            c[j] += dq[n] as i64 * y[j];
            for k in j..3 {
                r[j][k] += y[j] * y[k];
            }
        }
    }
    for j in 0..3 {
        for k in 0..j {
            r[j][k] = r[k][j];
        }
    }

    // shift the statistics so b'Rb stays inside 64 bits
    let mut max = 1i64;
    for j in 0..3 {
        max = max.max(c[j].abs());
        for k in 0..3 {
            max = max.max(r[j][k].abs());
        }
    }
    let bits = 64 - max.leading_zeros() as i32;
    let sh = (bits - 28).max(0) as u32;

    let mut best = 0usize;
    let mut best_score = i64::MIN;
    for (i, b) in PITCH_TAP_CB.iter().enumerate() {
        let mut s = 0i64;
        for j in 0..3 {
            s += (2 * (b[j] as i64) * (c[j] >> sh)) << 15;
            for k in 0..3 {
                s -= b[j] as i64 * b[k] as i64 * (r[j][k] >> sh);
            }
        }
        if s > best_score {
            best_score = s;
            best = i;
        }
    }
    (best, PITCH_TAP_CB[best])
}

/// Energy of the Q1 pitch prediction residual over one subframe starting
/// at `offset`.
pub fn residual_energy(dq: &[i16], pp: usize, taps: &[i16; 3], offset: usize) -> i32 {
    let mut ee = 0i32;
    for n in offset..offset + SUBFRAME_SIZE {
        let pred = pitch_prediction(dq, n, pp, taps);
        let e = sub(dq[n], round(l_shl(pred, 1)));
        ee = l_mac0(ee, e, e);
    }
    ee
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_frame(buf: &mut [i16], period: f64, amp: f64, phase0: usize) {
        for (n, s) in buf.iter_mut().enumerate() {
            let t = (phase0 + n) as f64;
            *s = (amp * (2.0 * std::f64::consts::PI * t / period).sin()) as i16;
        }
    }

    #[test]
    fn test_coarse_pitch_locks_to_period() {
        let mut cp = CoarsePitch::default();
        let mut cpp = 0;
        for f in 0..12 {
            let mut xw = [0i16; FRAME_SIZE];
            sine_frame(&mut xw, 80.0, 6000.0, f * FRAME_SIZE);
            cpp = cp.track(&xw);
        }
        assert_eq!(cpp, 80, "locked to {cpp}");
    }

    #[test]
    fn test_coarse_pitch_silence_holds_last() {
        let mut cp = CoarsePitch::default();
        let xw = [0i16; FRAME_SIZE];
        assert_eq!(cp.track(&xw), 96);
        assert_eq!(cp.track(&xw), 96);
    }

    #[test]
    fn test_refine_finds_true_period() {
        let mut x = vec![0i16; INPUT_BUF_LEN];
        sine_frame(&mut x, 83.0, 3000.0, 0);
        let (pp, ppt) = refine_pitch(&x, 80);
        assert_eq!(pp, 83);
        // near-perfect single-tap prediction
        assert!(ppt > 460 && ppt < 560, "ppt {ppt}");
    }

    #[test]
    fn test_refine_range_clamped() {
        let x = vec![100i16; INPUT_BUF_LEN];
        let (pp, _) = refine_pitch(&x, MIN_PITCH);
        assert!(pp >= MIN_PITCH);
        let (pp, _) = refine_pitch(&x, MAX_PITCH);
        assert!(pp <= MAX_PITCH);
    }

    #[test]
    fn test_tap_quantizer_reduces_energy() {
        let pp = 60usize;
        let mut dq = vec![0i16; INPUT_BUF_LEN];
        sine_frame(&mut dq, pp as f64, 2500.0, 0);
        let (idx, taps) = pitch_tap_quantize(&dq, pp);
        assert_ne!(idx, 0, "all-zero taps picked for periodic input");
        let offset = INPUT_BUF_LEN - FRAME_SIZE;
        let with = residual_energy(&dq, pp, &taps, offset);
        let without = residual_energy(&dq, pp, &[0; 3], offset);
        assert!(with < without / 2, "with {with} without {without}");
    }

    #[test]
    fn test_tap_quantizer_zero_for_noise() {
        // white noise at a wrong lag: prediction cannot help much, and the
        // score of every nonzero entry stays at or below the zero entry
        let mut seed = 1234u32;
        let mut dq = vec![0i16; INPUT_BUF_LEN];
        for s in dq.iter_mut() {
            seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
            *s = ((seed >> 18) as i32 - 8192) as i16;
        }
        let offset = INPUT_BUF_LEN - FRAME_SIZE;
        let (_, taps) = pitch_tap_quantize(&dq, 100);
        let with = residual_energy(&dq, 100, &taps, offset);
        let without = residual_energy(&dq, 100, &[0; 3], offset);
        assert!(with <= without + without / 8, "with {with} without {without}");
    }
}
