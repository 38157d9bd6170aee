//! Excitation gain coding and signal level tracking.
//!
//! The base-2 log of the subframe residual energy is coded as a scalar
//! prediction error against a 16th-order moving-average predictor plus a
//! long-term mean. A gain-change limiter keeps the decoded gain from
//! jumping faster than a level-dependent bound, which stops single bit
//! errors from producing loud bangs; the decoder carries a matching trap
//! with an escape counter so a legitimate sustained rise is not clamped
//! forever.

use crate::constants::*;
use crate::math::*;
use crate::tables::{
    GAIN_CHANGE_LIMIT, LOG_GAIN_CB, LOG_GAIN_MEAN, LOG_GAIN_NEXT_HIGHER,
    LOG_GAIN_ORDER, LOG_GAIN_PRED,
};

/// log2(SUBFRAME_SIZE) in Q25, used to normalize concealment energies.
const LOG2_SUBFRAME_Q25: i32 = 178574274;

/// Base-2 log of the subframe residual energy, Q25.
///
/// Returns [`MIN_LOG_GAIN`] for near-silent subframes so the predictor
/// memory settles at a well-defined floor.
pub fn residual_log_gain(ee: i32) -> i32 {
    if ee < MIN_GAIN_ENERGY {
        return MIN_LOG_GAIN;
    }
    let scaled = mpy_32_16(ee, 6554); // ee / 5
    if scaled <= 0 {
        return MIN_LOG_GAIN;
    }
    let (exp, frac) = log2_fx(scaled);
    l_add(
        l_shl(l_deposit_h(sub(exp, 4)), 9),
        l_shr(l_deposit_h(frac), 6),
    )
}

/// Moving-average prediction of the log-gain including the long-term
/// mean, Q25.
fn predict_log_gain(lgpm: &[i16; LOG_GAIN_PRED_ORDER]) -> i32 {
    let mut a0 = 0i32;
    for k in 0..LOG_GAIN_PRED_ORDER {
        a0 = l_mac0(a0, LOG_GAIN_PRED[k], lgpm[k]);
    }
    l_shr(l_add(l_shr(l_deposit_h(LOG_GAIN_MEAN), 1), a0), 1)
}

/// Convert a Q25 log-gain to the Q18 linear gain `2^(lg / 2)`.
pub fn log_gain_to_linear(lgq: i32) -> i32 {
    let elg = l_shr(lgq, 10);
    let exp = extract_h(elg);
    let frac = extract_l(l_shr(l_sub(elg, l_deposit_h(exp)), 1));
    pow2_fx(add(exp, 18), frac)
}

/// Normalize a Q18 linear gain to a 16-bit mantissa and block exponent.
///
/// The scaled shape codebook and all per-sample excitation arithmetic run
/// at `Q(gain_exp)` so quiet subframes keep full precision.
pub fn gain_scale(gain: i32) -> (i16, i16) {
    let gain_exp = norm_l(gain) - 2;
    (round(l_shl(gain, gain_exp)), gain_exp as i16)
}

/// Reconstruct the Q25 log-gain for codeword `gidx` given the prediction.
fn reconstruct_log_gain(gidx: usize, elg: i32) -> i32 {
    l_add(l_shr(l_deposit_h(LOG_GAIN_CB[gidx]), 2), elg)
}

/// Maximum allowed Q9 log-gain rise given the gain history and the
/// tracked signal level.
fn gain_change_limit(prevlg: &[i32; 2], level: i32) -> i16 {
    let i = ((extract_h(l_sub(prevlg[0], level)) >> 9) as i32 - GAIN_LEVEL_LB as i32) >> 1;
    let i = i.clamp(0, GAIN_LEVEL_BINS as i32 - 1) as usize;
    let n = ((extract_h(l_sub(prevlg[0], prevlg[1])) >> 9) as i32 - GAIN_CHANGE_LB as i32) >> 1;
    let n = n.clamp(0, GAIN_CHANGE_BINS as i32 - 1) as usize;
    GAIN_CHANGE_LIMIT[i * GAIN_CHANGE_BINS + n]
}

fn shift_gain_memory(lgpm: &mut [i16; LOG_GAIN_PRED_ORDER]) {
    for k in (1..LOG_GAIN_PRED_ORDER).rev() {
        lgpm[k] = lgpm[k - 1];
    }
}

/// Quantize the subframe log-gain.
///
/// The prediction error is matched against the codebook in ascending
/// value order, then walked down while the reconstructed gain would rise
/// faster than the change limit allows. Returns the codeword index, the
/// Q18 linear gain, and the Q25 quantized log-gain.
pub fn gain_quantize(
    ee: i32,
    lgpm: &mut [i16; LOG_GAIN_PRED_ORDER],
    prevlg: &mut [i32; 2],
    level: i32,
) -> (usize, i32, i32) {
    let lg = residual_log_gain(ee);
    let elg = predict_log_gain(lgpm);
    let lgpe = round(l_shl(l_sub(lg, elg), 2)); // Q11

    let ord = &*LOG_GAIN_ORDER;
    let mut dmin = i16::MAX;
    let mut r = 0usize;
    for (k, &ci) in ord.iter().enumerate() {
        let d = abs_s(sub(lgpe, LOG_GAIN_CB[ci as usize]));
        if d < dmin {
            dmin = d;
            r = k;
        }
    }

    let limit = gain_change_limit(prevlg, level);
    let mut lgq = reconstruct_log_gain(ord[r] as usize, elg);
    while r > 0 && extract_h(l_sub(lgq, prevlg[0])) > limit {
        r -= 1;
        lgq = reconstruct_log_gain(ord[r] as usize, elg);
    }
    let gidx = ord[r] as usize;

    shift_gain_memory(lgpm);
    lgpm[0] = LOG_GAIN_CB[gidx];
    prevlg[1] = prevlg[0];
    prevlg[0] = lgq;

    (gidx, log_gain_to_linear(lgq), lgq)
}

/// Decode the subframe log-gain with the change limiter trap.
///
/// `lctimer` nonzero relaxes the trap; the caller restarts it whenever
/// `nclglim` saturates at [`GAIN_LIMIT_TRAPPED`] so a genuinely louder
/// signal can break out. Returns the Q18 linear gain and the Q25
/// log-gain.
pub fn gain_decode(
    gidx: usize,
    lgpm: &mut [i16; LOG_GAIN_PRED_ORDER],
    prevlg: &mut [i32; 2],
    level: i32,
    nclglim: &mut i16,
    lctimer: i16,
) -> (i32, i32) {
    let elg = predict_log_gain(lgpm);
    let mut lgq = reconstruct_log_gain(gidx, elg);

    // Codewords at the bottom of the range code silence; when even the
    // next higher codeword reconstructs near the floor, pin the gain to
    // the floor exactly so the level tracker sees a stable reference.
    let nh = LOG_GAIN_NEXT_HIGHER[gidx] as usize;
    let floor = l_sub(MIN_LOG_GAIN, 8192);
    if nh != gidx && lgq < floor {
        let lgq_nh = reconstruct_log_gain(nh, elg);
        if l_sub(lgq_nh, floor).abs() < l_sub(lgq, floor).abs() {
            lgq = MIN_LOG_GAIN;
        }
    }

    let limit = gain_change_limit(prevlg, level);
    let lgc = extract_h(l_sub(lgq, prevlg[0]));
    let lowest = LOG_GAIN_ORDER[0] as usize;

    shift_gain_memory(lgpm);
    if lgc > limit && gidx != lowest && lctimer == 0 {
        lgq = prevlg[0];
        lgpm[0] = extract_h(l_shl(l_sub(lgq, elg), 2));
        *nclglim = add(*nclglim, 1).min(GAIN_LIMIT_TRAPPED);
    } else {
        lgpm[0] = LOG_GAIN_CB[gidx];
        *nclglim = 0;
    }

    prevlg[1] = prevlg[0];
    prevlg[0] = lgq;

    (log_gain_to_linear(lgq), lgq)
}

/// Roll the log-gain predictor through a concealed subframe using the
/// energy of the synthesized excitation. Returns the Q25 log-gain fed to
/// the level estimator.
pub fn gain_conceal(
    e: i32,
    lgpm: &mut [i16; LOG_GAIN_PRED_ORDER],
    prevlg: &mut [i32; 2],
) -> i32 {
    let lg = if e > MIN_SYNTH_ENERGY {
        let (exp, frac) = log2_fx(e);
        l_sub(
            l_add(l_shl(l_deposit_h(exp), 9), l_shr(l_deposit_h(frac), 6)),
            LOG2_SUBFRAME_Q25,
        )
    } else {
        0
    };

    let mrlg = l_sub(lg, l_shr(l_deposit_h(LOG_GAIN_MEAN), 2));
    // prediction without the mean term
    let mut a0 = 0i32;
    for k in 0..LOG_GAIN_PRED_ORDER {
        a0 = l_mac0(a0, LOG_GAIN_PRED[k], lgpm[k]);
    }
    let elg = l_shr(a0, 1);
    let lge = round(l_shl(l_sub(mrlg, elg), 2)); // Q11

    shift_gain_memory(lgpm);
    lgpm[0] = lge;
    prevlg[1] = prevlg[0];
    prevlg[0] = lg;
    lg
}

/// Long-term signal level estimator, all state in Q25 log2 domain.
///
/// Tracks a leaky running maximum and minimum of the log-gain, their
/// midpoint mean, and smooths log-gains above an adaptive threshold into
/// the level output used by the gain-change limiter.
#[derive(Debug, Clone)]
pub struct LevelEstimator {
    lmax: i32,
    lmin: i32,
    lmean: i32,
    x1: i32,
    level: i32,
}

impl Default for LevelEstimator {
    fn default() -> Self {
        Self {
            lmax: i32::MIN,
            lmin: i32::MAX,
            lmean: 0x1000_0000,        // 8.0
            x1: 0x1b00_0000,           // 13.5
            level: 0x1b00_0000,
        }
    }
}

impl LevelEstimator {
    /// Track one subframe log-gain (Q25) and return the updated level.
    pub fn update(&mut self, lg: i32) -> i32 {
        if lg > self.lmax {
            self.lmax = lg;
        } else {
            self.lmax = l_add(
                self.lmean,
                mpy_32_16(l_sub(self.lmax, self.lmean), ESTL_ALPHA),
            );
        }
        if lg < self.lmin {
            self.lmin = lg;
        } else {
            self.lmin = l_add(
                self.lmean,
                mpy_32_16(l_sub(self.lmin, self.lmean), ESTL_ALPHA),
            );
        }
        self.lmean = l_add(
            mpy_32_16(self.lmean, ESTL_BETA),
            mpy_32_16(l_shr(l_add(self.lmax, self.lmin), 1), ESTL_BETA1),
        );

        let lth = l_add(
            self.lmean,
            mpy_32_16(l_sub(self.lmax, self.lmean), ESTL_TH),
        );
        if lg > lth {
            self.x1 = l_add(mpy_32_16(self.x1, ESTL_A), mpy_32_16(lg, ESTL_A1));
            self.level = l_add(
                mpy_32_16(self.level, ESTL_A),
                mpy_32_16(self.x1, ESTL_A1),
            );
        }
        self.level
    }

    /// Current level estimate, Q25.
    pub fn level(&self) -> i32 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> ([i16; LOG_GAIN_PRED_ORDER], [i32; 2]) {
        ([0; LOG_GAIN_PRED_ORDER], [MIN_LOG_GAIN; 2])
    }

    #[test]
    fn test_log_gain_of_silence() {
        assert_eq!(residual_log_gain(0), MIN_LOG_GAIN);
        assert_eq!(residual_log_gain(MIN_GAIN_ENERGY - 1), MIN_LOG_GAIN);
        assert!(residual_log_gain(1 << 20) > 0);
    }

    #[test]
    fn test_log_gain_to_linear_known_points() {
        // lg = 0 -> gain 1.0 in Q18
        let g = log_gain_to_linear(0);
        assert!((g - (1 << 18)).abs() <= 16, "g = {g}");
        // lg = 2 -> gain 2.0
        let g = log_gain_to_linear(2 << 25);
        assert!((g - (2 << 18)).abs() <= 32, "g = {g}");
        // lg = -2 -> gain 0.5
        let g = log_gain_to_linear(MIN_LOG_GAIN);
        assert!((g - (1 << 17)).abs() <= 16, "g = {g}");
    }

    #[test]
    fn test_quantize_decode_agree_on_steady_signal() {
        let (mut elgpm, mut eprev) = fresh();
        let (mut dlgpm, mut dprev) = fresh();
        let mut level = LevelEstimator::default();
        let mut nclglim = 0i16;
        let ee = 200_000i32;
        for f in 0..30 {
            let lvl = level.level();
            let (gidx, egain, elgq) = gain_quantize(ee, &mut elgpm, &mut eprev, lvl);
            let (dgain, dlgq) = gain_decode(
                gidx, &mut dlgpm, &mut dprev, lvl, &mut nclglim, 0,
            );
            assert_eq!(egain, dgain, "frame {f}");
            assert_eq!(elgq, dlgq, "frame {f}");
            level.update(elgq);
        }
        assert_eq!(nclglim, 0);
    }

    #[test]
    fn test_quantizer_tracks_energy() {
        let (mut lgpm, mut prev) = fresh();
        let mut level = LevelEstimator::default();
        let ee = 1 << 22;
        let mut lgq = 0;
        for _ in 0..40 {
            let (_, _, q) = gain_quantize(ee, &mut lgpm, &mut prev, level.level());
            level.update(q);
            lgq = q;
        }
        let lg = residual_log_gain(ee);
        // converged within half a codebook step (codewords are ~0.4 apart)
        assert!((l_sub(lgq, lg) >> 20).abs() < 16, "lgq {lgq} lg {lg}");
    }

    #[test]
    fn test_decoder_limits_gain_jump() {
        let (mut lgpm, mut prev) = fresh();
        let mut nclglim = 0i16;
        // history pinned at the silence floor, level left high
        let level = 0x1b00_0000;
        // force the loudest codeword straight from silence
        let loudest = LOG_GAIN_ORDER[LOG_GAIN_CB_SIZE - 1] as usize;
        let before = prev[0];
        let (_, lgq) = gain_decode(
            loudest, &mut lgpm, &mut prev, level, &mut nclglim, 0,
        );
        assert_eq!(lgq, before, "jump not clamped");
        assert_eq!(nclglim, 1);
    }

    #[test]
    fn test_trap_escape_timer() {
        let (mut lgpm, mut prev) = fresh();
        let mut nclglim = 49i16;
        let level = 0x1b00_0000;
        let loudest = LOG_GAIN_ORDER[LOG_GAIN_CB_SIZE - 1] as usize;
        // with the timer running the same jump is let through
        let (_, lgq) = gain_decode(
            loudest, &mut lgpm, &mut prev, level, &mut nclglim, 1,
        );
        assert!(lgq > MIN_LOG_GAIN);
        assert_eq!(nclglim, 0);
    }

    #[test]
    fn test_level_estimator_converges_up() {
        let mut est = LevelEstimator::default();
        let target = 20 << 25; // loud steady signal
        for _ in 0..4000 {
            est.update(target);
        }
        let err = (l_sub(est.level(), target) >> 25).abs();
        assert!(err <= 1, "level {} target {}", est.level(), target);
    }

    #[test]
    fn test_level_ignores_quiet_frames() {
        let mut est = LevelEstimator::default();
        for _ in 0..50 {
            est.update(18 << 25);
        }
        let settled = est.level();
        // silence must not drag the level down
        for _ in 0..50 {
            est.update(MIN_LOG_GAIN);
        }
        assert!(est.level() >= settled - (1 << 25));
    }

    #[test]
    fn test_conceal_rolls_memory() {
        let (mut lgpm, mut prev) = fresh();
        gain_conceal(1 << 16, &mut lgpm, &mut prev);
        assert_ne!(lgpm[0], 0);
        assert!(prev[0] > MIN_LOG_GAIN);
        let first = prev[0];
        gain_conceal(0, &mut lgpm, &mut prev);
        assert_eq!(prev[1], first);
        assert_eq!(prev[0], 0);
    }
}
