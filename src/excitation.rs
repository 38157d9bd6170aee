//! Excitation vector quantization with two-stage noise feedback.
//!
//! Each 40-sample subframe is coded as ten 4-dimensional vectors from a
//! gain-scaled shape codebook with a sign bit. The search target runs
//! through short-term noise feedback (the weighted LPC filter `h`) and
//! long-term noise feedback (the three-tap pitch predictor weighted by
//! `beta`), so quantization noise is spectrally shaped instead of white.
//!
//! The search itself is pure: for every vector the zero-input response of
//! the feedback structure is computed first, the best codevector and sign
//! are picked against precomputed zero-state responses, and only then is
//! the filter state committed with the winning excitation.

use crate::constants::*;
use crate::math::*;
use crate::tables::SHAPE_CB;

/// Scale the unit-RMS shape codebook by the gain mantissa.
///
/// `gainq` comes from [`crate::gain::gain_scale`]; the result is at the
/// block exponent `Q(gain_exp)`.
pub fn scale_shape_cb(gainq: i16) -> [[i16; VECTOR_DIM]; SHAPE_CB_SIZE] {
    let mut cbs = [[0i16; VECTOR_DIM]; SHAPE_CB_SIZE];
    for (row, cb) in cbs.iter_mut().zip(SHAPE_CB.iter()) {
        for (s, &c) in row.iter_mut().zip(cb.iter()) {
            *s = mult_r(gainq, c);
        }
    }
    cbs
}

/// Zero-state responses of every scaled codevector through the
/// short-term feedback filter, at `Q(gain_exp - 1)`.
fn zero_state_responses(
    cbs: &[[i16; VECTOR_DIM]; SHAPE_CB_SIZE],
    h: &[i16; LPC_ORDER + 1],
) -> [[i16; VECTOR_DIM]; SHAPE_CB_SIZE] {
    let mut zsr = [[0i16; VECTOR_DIM]; SHAPE_CB_SIZE];
    for (out, cb) in zsr.iter_mut().zip(cbs.iter()) {
        out[0] = shr(cb[0], 1);
        for n in 1..VECTOR_DIM {
            let mut a0 = 0i32;
            for i in 1..=n {
                a0 = l_msu(a0, h[i], out[n - i]);
            }
            a0 = l_shl(a0, 4);
            a0 = l_add(a0, l_shr(l_deposit_h(cb[n]), 1));
            out[n] = round(a0);
        }
    }
    zsr
}

/// Three-tap long-term prediction at sample `pos` of the history buffer.
///
/// The taps weight lags `pp - 1`, `pp`, and `pp + 1`; the result is Q16
/// for a Q1 history.
pub(crate) fn pitch_prediction(buf: &[i16], pos: usize, pp: usize, taps: &[i16; 3]) -> i32 {
    let i = pos + 1 - pp;
    l_mac0(
        l_mac0(l_mult0(taps[0], buf[i]), taps[1], buf[i - 1]),
        taps[2],
        buf[i - 2],
    )
}

/// Pick the codevector and sign whose zero-state response best matches
/// the Q(gain_exp - 1) target. Returns the transmitted index, with the
/// sign in the bit above the shape bits.
fn search_shape(
    target: &[i16; VECTOR_DIM],
    zsr: &[[i16; VECTOR_DIM]; SHAPE_CB_SIZE],
) -> usize {
    let mut emin = i32::MAX;
    let mut idx = 0usize;
    for (j, z) in zsr.iter().enumerate() {
        let mut ep = 0i32;
        let mut en = 0i32;
        for n in 0..VECTOR_DIM {
            let e = sub(target[n], z[n]);
            ep = l_mac0(ep, e, e);
            let e = add(target[n], z[n]);
            en = l_mac0(en, e, e);
        }
        if ep < emin {
            emin = ep;
            idx = j;
        }
        if en < emin {
            emin = en;
            idx = j + SHAPE_CB_SIZE;
        }
    }
    idx
}

fn codevector_sample(
    cbs: &[[i16; VECTOR_DIM]; SHAPE_CB_SIZE],
    idx: usize,
    k: usize,
) -> i16 {
    if idx < SHAPE_CB_SIZE {
        cbs[idx][k]
    } else {
        sub(0, cbs[idx - SHAPE_CB_SIZE][k])
    }
}

/// Quantize one subframe of the Q1 short-term residual `d`.
///
/// `ltsym` and `ltnfm` are the Q1 long-term synthesis and noise feedback
/// histories with the current subframe starting at `base`; both are
/// extended in place. `stnfm` is the short-term noise feedback memory
/// carried between subframes, and `d` is overwritten with the coded
/// residual. One index per vector is written to `indices`.
#[allow(clippy::too_many_arguments)]
pub fn excitation_quantize(
    d: &mut [i16],
    h: &[i16; LPC_ORDER + 1],
    taps: &[i16; 3],
    beta: i16,
    ltsym: &mut [i16],
    ltnfm: &mut [i16],
    base: usize,
    stnfm: &mut [i16; LPC_ORDER],
    cbs: &[[i16; VECTOR_DIM]; SHAPE_CB_SIZE],
    pp: usize,
    gain_exp: i16,
    indices: &mut [u8],
) {
    debug_assert_eq!(d.len(), SUBFRAME_SIZE);
    debug_assert_eq!(indices.len(), VECTORS_PER_SUBFRAME);

    let zsr = zero_state_responses(cbs, h);

    // short-term noise feedback signal v - qv, oldest first
    let mut buf = [0i16; LPC_ORDER + SUBFRAME_SIZE];
    buf[..LPC_ORDER].copy_from_slice(stnfm);

    for jv in 0..VECTORS_PER_SUBFRAME {
        let mut ppv_v = [0i32; VECTOR_DIM];
        let mut ltfv_v = [0i32; VECTOR_DIM];
        let mut target = [0i16; VECTOR_DIM];

        // zero-input response of the feedback structure
        for k in 0..VECTOR_DIM {
            let n = jv * VECTOR_DIM + k;
            let pos = base + n;
            let ppv = pitch_prediction(ltsym, pos, pp, taps);
            let ltfv = l_add(
                ppv,
                l_shl(l_mult0(beta, ltnfm[pos - pp]), 2),
            );

            let mut a0 = l_mult(d[n], 2048); // Q13
            for i in 1..=LPC_ORDER {
                a0 = l_msu(a0, h[i], buf[n + LPC_ORDER - i]);
            }
            let v = l_shl(a0, 3); // Q16

            // trial memory assuming zero excitation for this vector
            buf[n + LPC_ORDER] = round(l_sub(v, ppv));
            // target scaled to Q(gain_exp - 1) to match the responses
            target[k] = shl(
                round(l_shl(l_sub(v, ltfv), (gain_exp - 3) as i32)),
                2,
            );
            ppv_v[k] = ppv;
            ltfv_v[k] = ltfv;
        }

        let idx = search_shape(&target, &zsr);
        indices[jv] = idx as u8;

        // commit: rerun the short-term recursion with the chosen vector
        for k in 0..VECTOR_DIM {
            let n = jv * VECTOR_DIM + k;
            let pos = base + n;
            let cb = codevector_sample(cbs, idx, k);
            let uq = l_shr(l_deposit_h(cb), gain_exp as i32); // Q16

            let mut a0 = l_mult(d[n], 2048);
            for i in 1..=LPC_ORDER {
                a0 = l_msu(a0, h[i], buf[n + LPC_ORDER - i]);
            }
            let v = l_shl(a0, 3);

            let u = l_sub(v, ltfv_v[k]);
            ltnfm[pos] = round(l_shl(l_sub(u, uq), 1));
            let qv = l_add(ppv_v[k], uq);
            let dq = round(l_shl(qv, 1));
            ltsym[pos] = dq;
            d[n] = dq;
            buf[n + LPC_ORDER] = round(l_sub(v, qv));
        }
    }

    stnfm.copy_from_slice(&buf[SUBFRAME_SIZE..]);
}

/// Decode one subframe of excitation and run the long-term synthesis.
///
/// Writes the Q16 excitation-plus-prediction to `qv`, extends the Q1
/// `ltsym` history in place, and returns the energy of the rounded
/// scaled codevectors for the concealment gain tracker.
pub fn excitation_decode(
    ltsym: &mut [i16],
    base: usize,
    indices: &[u8],
    taps: &[i16; 3],
    cbs: &[[i16; VECTOR_DIM]; SHAPE_CB_SIZE],
    pp: usize,
    gain_exp: i16,
    qv: &mut [i32],
) -> i32 {
    debug_assert_eq!(qv.len(), SUBFRAME_SIZE);
    let mut e = 0i32;
    for jv in 0..VECTORS_PER_SUBFRAME {
        let idx = indices[jv] as usize;
        for k in 0..VECTOR_DIM {
            let n = jv * VECTOR_DIM + k;
            let pos = base + n;
            let cb = codevector_sample(cbs, idx, k);
            let uq = l_shr(l_deposit_h(cb), gain_exp as i32);
            let ppv = pitch_prediction(ltsym, pos, pp, taps);
            let q = l_add(ppv, uq);
            qv[n] = q;
            ltsym[pos] = round(l_shl(q, 1));
            let s = round(uq);
            e = l_mac0(e, s, s);
        }
    }
    e
}
