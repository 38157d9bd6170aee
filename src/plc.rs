//! Packet loss concealment.
//!
//! A lost frame is replaced by re-exciting the last good synthesis filter
//! with a mix of periodic extrapolation (the last pitch predictor taps on
//! the excitation history) and scaled pseudo-random noise, with the mix
//! steered by the smoothed periodicity of the stream. The noise gain is
//! matched to the energy of the last decoded excitation. After
//! [`PLC_HOLD_FRAMES`] consecutive losses the output is ramped down,
//! reaching silence [`PLC_ATTN_FRAMES`] frames later.

use tracing::debug;

use crate::constants::*;
use crate::decoder::Bv32Decoder;
use crate::excitation::pitch_prediction;
use crate::gain::gain_conceal;
use crate::math::*;
use crate::signal::ap_filter_q1_q0;
use crate::spectral::lsp_conceal;

/// Multiplicative congruential generator matching across builds; the low
/// word of the scaled state gives a roughly uniform 16-bit sample.
fn prng_sample(idum: &mut u32) -> i16 {
    *idum = idum.wrapping_mul(1664525).wrapping_add(1013904223);
    extract_l(l_sub(l_shr(*idum as i32, 16), Q15_ONE as i32))
}

/// Noise gain matching `target` energy over `actual` energy: returns a
/// Q15 mantissa and the power-of-two exponent of `sqrt(target / actual)`.
fn match_energy(target: i32, actual: i32) -> (i16, i32) {
    if target <= 0 || actual <= 0 {
        return (0, 0);
    }
    let ne = norm_l(target);
    let de = norm_l(actual);
    let mut nm = extract_h(l_shl(target, ne));
    let dm = extract_h(l_shl(actual, de));
    let mut exp = de - ne; // ratio = (nm / dm) * 2^exp
    if nm > dm {
        nm = shr(nm, 1);
        exp += 1;
    }
    let mut frac = div_s(nm, dm);
    if exp & 1 != 0 {
        frac = shr(frac, 1);
        exp += 1;
    }
    (sqrt_q15(frac), exp / 2)
}

impl Bv32Decoder {
    /// Synthesize one frame in place of a lost packet.
    pub fn conceal_frame(&mut self) -> [i16; FRAME_SIZE] {
        // concealment runs at exponent zero; bring the memories down
        if self.prv_exp != 0 {
            for s in self.stsym.iter_mut() {
                *s = shr(*s, self.prv_exp as i32);
            }
            self.deemph.pole_mem = shr(self.deemph.pole_mem, self.prv_exp as i32);
            self.deemph.zero_mem = shr(self.deemph.zero_mem, self.prv_exp as i32);
            self.prv_exp = 0;
        }
        if self.cfecount < PLC_HOLD_FRAMES + PLC_ATTN_FRAMES - 1 {
            self.cfecount += 1;
        }
        debug!(count = self.cfecount, "concealing lost frame");

        self.ltsym.copy_within(FRAME_SIZE.., 0);

        // noise scaling from the periodicity: strongly voiced frames take
        // little noise, unvoiced frames mostly noise
        let scplcg = shl(
            add(PLC_SCALE_A, mult(PLC_SCALE_B, self.per))
                .clamp(PLC_SCALE_MIN, PLC_SCALE_MAX),
            1,
        );

        let mut out = [0i16; FRAME_SIZE];
        for ssf in 0..SUBFRAMES {
            let base = LT_HISTORY + ssf * SUBFRAME_SIZE;

            let mut r = [0i16; SUBFRAME_SIZE];
            let mut ew = 0i32;
            for s in r.iter_mut() {
                *s = shr(prng_sample(&mut self.idum), 3);
                ew = l_mac0(ew, *s, *s);
            }

            let (g, half) = match_energy(self.e_last, ew);
            let g = mult(g, scplcg);

            let mut e_sub = 0i32;
            for (n, &rn) in r.iter().enumerate() {
                let pos = base + n;
                let rv = l_shl(l_mult(g, rn), half); // Q16
                let ppv = pitch_prediction(&self.ltsym, pos, self.pp_last, &self.bq_last);
                let q = l_add(rv, ppv);
                self.ltsym[pos] = round(l_shl(q, 1));
                let s = round(rv);
                e_sub = l_mac0(e_sub, s, s);
            }

            // synthesize and de-emphasize this subframe
            let mut d = [0i16; SUBFRAME_SIZE];
            d.copy_from_slice(&self.ltsym[base..base + SUBFRAME_SIZE]);
            let synth = &mut out[ssf * SUBFRAME_SIZE..(ssf + 1) * SUBFRAME_SIZE];
            ap_filter_q1_q0(&self.atplc, &d, synth, &mut self.stsym, true);
            crate::signal::deemphasis(&mut self.deemph, synth);

            let lg = gain_conceal(e_sub, &mut self.lgpm, &mut self.prevlg);
            self.level.update(lg);
        }

        lsp_conceal(&self.lsplast, &mut self.lsppm);

        // ramp down after the hold period
        if self.cfecount >= PLC_HOLD_FRAMES {
            let k = (self.cfecount - PLC_HOLD_FRAMES + 1) as i32;
            let g = round(l_shl(l_sub(1 << 20, PLC_ATTN_STEP * k), 11)); // Q15
            for t in self.bq_last.iter_mut() {
                *t = mult(*t, g);
            }
            self.e_last = mpy_32_16(mpy_32_16(self.e_last, g), g);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Bv32Encoder;

    fn voiced_frame(f: usize) -> [i16; FRAME_SIZE] {
        let mut x = [0i16; FRAME_SIZE];
        for (n, s) in x.iter_mut().enumerate() {
            let t = (f * FRAME_SIZE + n) as f64;
            *s = (8000.0 * (2.0 * std::f64::consts::PI * t / 80.0).sin()) as i16;
        }
        x
    }

    fn energy(x: &[i16]) -> i64 {
        x.iter().map(|&s| s as i64 * s as i64).sum()
    }

    fn warmed_pair() -> (Bv32Encoder, Bv32Decoder) {
        let mut enc = Bv32Encoder::new();
        let mut dec = Bv32Decoder::new();
        for f in 0..40 {
            let p = enc.encode_frame(&voiced_frame(f)).unwrap();
            dec.decode_frame(&p).unwrap();
        }
        (enc, dec)
    }

    #[test]
    fn test_conceal_fills_at_comparable_level() {
        let (mut enc, mut dec) = warmed_pair();
        let p = enc.encode_frame(&voiced_frame(40)).unwrap();
        let good = dec.decode_frame(&p).unwrap();
        let lost = dec.conceal_frame();
        let eg = energy(&good);
        let el = energy(&lost);
        assert!(el > eg / 16 && el < eg * 16, "good {eg} lost {el}");
    }

    #[test]
    fn test_long_loss_decays_to_silence() {
        let (_, mut dec) = warmed_pair();
        let mut frames = Vec::new();
        for _ in 0..(PLC_HOLD_FRAMES + PLC_ATTN_FRAMES + 5) {
            frames.push(dec.conceal_frame());
        }
        let early = energy(&frames[2]);
        let last = energy(frames.last().unwrap());
        assert!(early > 0);
        assert!(
            last < early / 100 + FRAME_SIZE as i64,
            "early {early} last {last}"
        );
    }

    #[test]
    fn test_decoder_recovers_after_loss() {
        let (mut enc, mut dec) = warmed_pair();
        for f in 40..43 {
            let _ = enc.encode_frame(&voiced_frame(f)).unwrap();
            dec.conceal_frame();
        }
        // decoding resumes without panicking and settles back
        let mut out = [0i16; FRAME_SIZE];
        for f in 43..60 {
            let p = enc.encode_frame(&voiced_frame(f)).unwrap();
            out = dec.decode_frame(&p).unwrap();
        }
        let e = energy(&out);
        assert!(e > 0, "no signal after recovery");
        assert_eq!(dec.cfecount, 0);
    }

    #[test]
    fn test_conceal_is_deterministic() {
        let (_, mut d1) = warmed_pair();
        let (_, mut d2) = warmed_pair();
        for _ in 0..5 {
            assert_eq!(d1.conceal_frame(), d2.conceal_frame());
        }
    }
}
