//! Frame encoder.
//!
//! Per 5 ms frame: condition the input, run the LPC analysis and LSP
//! quantization, derive the perceptually weighted signal for the
//! two-stage pitch search, quantize the three-tap pitch predictor and the
//! per-subframe log-gains, and code the excitation with noise feedback.

use bytes::Bytes;
use tracing::trace;

use crate::bitstream::FrameParams;
use crate::constants::*;
use crate::error::{CodecError, Result};
use crate::excitation::{excitation_quantize, scale_shape_cb};
use crate::gain::{gain_quantize, gain_scale, LevelEstimator};
use crate::lpc::{autocorr, bandwidth_expand, levinson, spectral_smoothing};
use crate::lsp::{a_to_lsp, lsp_to_a};
use crate::math::*;
use crate::pitch::{pitch_tap_quantize, refine_pitch, residual_energy, CoarsePitch};
use crate::signal::{az_filter_q0_q1, ap_filter, preprocess, PreprocState};
use crate::spectral::{lsp_quantize, LSP_MEM_SIZE};
use crate::tables::WEIGHT_DECAY;

/// Wideband speech encoder. One instance per stream; frames must be fed
/// in order.
pub struct Bv32Encoder {
    preproc: PreprocState,
    /// Conditioned input, analysis window length (last frame + current)
    x: [i16; WINDOW_SIZE],
    /// Q1 short-term residual with full pitch history
    dq: [i16; INPUT_BUF_LEN],
    /// Q1 quantized excitation history
    ltsym: [i16; LT_HISTORY + FRAME_SIZE],
    /// Q1 long-term noise feedback history
    ltnfm: [i16; LT_HISTORY + FRAME_SIZE],
    /// Weighted-speech filter memory
    stwpm: [i16; LPC_ORDER],
    /// Short-term noise feedback memory
    stnfm: [i16; LPC_ORDER],
    lsplast: [i16; LPC_ORDER],
    lsppm: [i16; LSP_MEM_SIZE],
    old_a: [i16; LPC_ORDER + 1],
    lgpm: [i16; LOG_GAIN_PRED_ORDER],
    prevlg: [i32; 2],
    level: LevelEstimator,
    coarse: CoarsePitch,
}

impl Default for Bv32Encoder {
    fn default() -> Self {
        let mut old_a = [0i16; LPC_ORDER + 1];
        old_a[0] = Q12_ONE;
        Self {
            preproc: PreprocState::default(),
            x: [0; WINDOW_SIZE],
            dq: [0; INPUT_BUF_LEN],
            ltsym: [0; LT_HISTORY + FRAME_SIZE],
            ltnfm: [0; LT_HISTORY + FRAME_SIZE],
            stwpm: [0; LPC_ORDER],
            stnfm: [0; LPC_ORDER],
            lsplast: core::array::from_fn(|i| ((i + 1) * 3641) as i16),
            lsppm: [0; LSP_MEM_SIZE],
            old_a,
            lgpm: [0; LOG_GAIN_PRED_ORDER],
            prevlg: [MIN_LOG_GAIN; 2],
            level: LevelEstimator::default(),
            coarse: CoarsePitch::default(),
        }
    }
}

impl Bv32Encoder {
    /// Create an encoder in the initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the encoder to the initial state, e.g. between streams.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Encode one 80-sample frame into a 20-byte payload.
    pub fn encode_frame(&mut self, input: &[i16]) -> Result<Bytes> {
        Ok(self.encode_frame_params(input)?.to_bytes())
    }

    /// Encode one frame, returning the quantizer indices before packing.
    pub fn encode_frame_params(&mut self, input: &[i16]) -> Result<FrameParams> {
        if input.len() != FRAME_SIZE {
            return Err(CodecError::invalid_frame_size(FRAME_SIZE, input.len()));
        }

        // slide the signal histories
        self.x.copy_within(FRAME_SIZE.., 0);
        self.dq.copy_within(FRAME_SIZE.., 0);
        self.ltsym.copy_within(FRAME_SIZE.., 0);
        self.ltnfm.copy_within(FRAME_SIZE.., 0);

        let mut conditioned = [0i16; FRAME_SIZE];
        preprocess(&mut self.preproc, &mut conditioned, input);
        self.x[WINDOW_SIZE - FRAME_SIZE..].copy_from_slice(&conditioned);

        // LPC analysis on the conditioned window
        let mut r = autocorr(&self.x);
        spectral_smoothing(&mut r);
        let mut a = levinson(&r, &mut self.old_a);
        bandwidth_expand(&mut a);

        let lsp = a_to_lsp(&a, &self.lsplast);
        self.lsplast = lsp;
        let (lspq, lsp_idx) = lsp_quantize(&lsp, &mut self.lsppm);
        let aq = lsp_to_a(&lspq);

        // short-term residual from the quantized predictor
        let mut resid = [0i16; FRAME_SIZE];
        az_filter_q0_q1(&aq, &self.x, WINDOW_SIZE - FRAME_SIZE, &mut resid);
        self.dq[PITCH_HISTORY..].copy_from_slice(&resid);

        // perceptual weighting filter from the unquantized predictor
        let mut aw = a;
        for (w, c) in aw.iter_mut().zip(WEIGHT_DECAY.iter()) {
            *w = mult_r(*c, *w);
        }

        // weighted speech drives the coarse pitch tracker
        let mut xin = [0i16; FRAME_SIZE];
        for (s, &d) in xin.iter_mut().zip(self.dq[PITCH_HISTORY..].iter()) {
            *s = shr(d, 2);
        }
        let mut xw = [0i16; FRAME_SIZE];
        ap_filter(&aw, &xin, &mut xw, &mut self.stwpm, true);
        let cpp = self.coarse.track(&xw);

        // full-rate refinement on the down-scaled residual
        let mut sdq = [0i16; INPUT_BUF_LEN];
        for (s, &d) in sdq.iter_mut().zip(self.dq.iter()) {
            *s = shr(d, 3);
        }
        let (pp, ppt) = refine_pitch(&sdq, cpp);
        let (tap_idx, taps) = pitch_tap_quantize(&self.dq, pp);

        // long-term noise feedback weight: half the single-tap gain,
        // capped at one
        let beta = if ppt > 512 {
            LT_WEIGHT_CAP
        } else if ppt <= 0 {
            0
        } else {
            extract_h(l_shl(l_mult(LT_WEIGHT_CAP, ppt), 6))
        };

        let mut params = FrameParams {
            lsp_idx,
            pitch_idx: (pp - MIN_PITCH) as u8,
            tap_idx: tap_idx as u8,
            ..Default::default()
        };

        for ssf in 0..SUBFRAMES {
            let offset = PITCH_HISTORY + ssf * SUBFRAME_SIZE;
            let ee = residual_energy(&self.dq, pp, &taps, offset);
            let (gidx, gain, lgq) = gain_quantize(
                ee,
                &mut self.lgpm,
                &mut self.prevlg,
                self.level.level(),
            );
            self.level.update(lgq);
            params.gain_idx[ssf] = gidx as u8;

            let (gainq, gain_exp) = gain_scale(gain);
            let cbs = scale_shape_cb(gainq);
            let base = LT_HISTORY + ssf * SUBFRAME_SIZE;
            excitation_quantize(
                &mut self.dq[offset..offset + SUBFRAME_SIZE],
                &aw,
                &taps,
                beta,
                &mut self.ltsym,
                &mut self.ltnfm,
                base,
                &mut self.stnfm,
                &cbs,
                pp,
                gain_exp,
                &mut params.shape_idx[ssf],
            );
        }

        trace!(pp, ppt, tap_idx, "frame encoded");
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voiced_frame(f: usize) -> [i16; FRAME_SIZE] {
        let mut x = [0i16; FRAME_SIZE];
        for (n, s) in x.iter_mut().enumerate() {
            let t = (f * FRAME_SIZE + n) as f64;
            *s = (7000.0 * (2.0 * std::f64::consts::PI * t / 80.0).sin()
                + 1500.0 * (2.0 * std::f64::consts::PI * t / 40.0).sin())
                as i16;
        }
        x
    }

    #[test]
    fn test_wrong_frame_size_rejected() {
        let mut enc = Bv32Encoder::new();
        assert!(matches!(
            enc.encode_frame(&[0i16; 79]),
            Err(CodecError::InvalidFrameSize { .. })
        ));
    }

    #[test]
    fn test_payload_size() {
        let mut enc = Bv32Encoder::new();
        let frame = voiced_frame(0);
        let payload = enc.encode_frame(&frame).unwrap();
        assert_eq!(payload.len(), ENCODED_FRAME_SIZE);
    }

    #[test]
    fn test_reset_matches_fresh_encoder() {
        let mut used = Bv32Encoder::new();
        for f in 0..5 {
            used.encode_frame(&voiced_frame(f)).unwrap();
        }
        used.reset();
        let mut fresh = Bv32Encoder::new();
        let frame = voiced_frame(0);
        assert_eq!(
            used.encode_frame(&frame).unwrap(),
            fresh.encode_frame(&frame).unwrap()
        );
    }

    #[test]
    fn test_encoder_is_deterministic() {
        let mut a = Bv32Encoder::new();
        let mut b = Bv32Encoder::new();
        for f in 0..20 {
            let frame = voiced_frame(f);
            assert_eq!(
                a.encode_frame(&frame).unwrap(),
                b.encode_frame(&frame).unwrap(),
                "frame {f}"
            );
        }
    }

    #[test]
    fn test_pitch_index_tracks_period() {
        let mut enc = Bv32Encoder::new();
        let mut pitch_idx = 0u8;
        for f in 0..20 {
            let frame = voiced_frame(f);
            pitch_idx = enc.encode_frame_params(&frame).unwrap().pitch_idx;
        }
        let pp = pitch_idx as usize + MIN_PITCH;
        assert!((pp as i32 - 80).abs() <= 2, "pp {pp}");
    }

    #[test]
    fn test_silence_uses_bottom_gain() {
        let mut enc = Bv32Encoder::new();
        let mut params = FrameParams::default();
        for _ in 0..10 {
            params = enc.encode_frame_params(&[0i16; FRAME_SIZE]).unwrap();
        }
        // both subframes sit on the lowest codeword once converged
        use crate::tables::{LOG_GAIN_CB, LOG_GAIN_ORDER};
        let lo = LOG_GAIN_CB[LOG_GAIN_ORDER[0] as usize];
        for sf in 0..SUBFRAMES {
            let cw = LOG_GAIN_CB[params.gain_idx[sf] as usize];
            assert!(cw - lo < 2048, "gain codeword {cw} floor {lo}");
        }
    }
}
