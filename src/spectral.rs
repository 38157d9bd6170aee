//! LSP quantization and decoding.
//!
//! The LSP vector is coded as a prediction error against a long-term mean
//! plus a moving-average prediction from the last eight quantized errors.
//! Stage one is a plain MSE search over a 128-entry codebook; stage two
//! splits the Q18 residual 3/5 and searches 32-entry codebooks with
//! inverse-gap weighting, rejecting low-split candidates that would break
//! the LSP ordering.

use crate::constants::*;
use crate::lsp::stabilize_lsp;
use crate::math::*;
use crate::tables::{LSP_CB1, LSP_CB21, LSP_CB22, LSP_MEAN, LSP_PRED};

/// Length of the LSP predictor memory: eight past errors per dimension.
pub const LSP_MEM_SIZE: usize = LPC_ORDER * LSP_PRED_ORDER;

/// Moving-average prediction of the mean-removed LSP vector, Q15.
///
/// `lsppm[i * LSP_PRED_ORDER + k]` is the k-frames-old quantized error of
/// dimension i, newest first.
fn predict_lsp(lsppm: &[i16; LSP_MEM_SIZE]) -> [i16; LPC_ORDER] {
    let mut elsp = [0i16; LPC_ORDER];
    for i in 0..LPC_ORDER {
        let mut a0 = 0i32;
        for k in 0..LSP_PRED_ORDER {
            a0 = l_mac(a0, LSP_PRED[i][k], lsppm[i * LSP_PRED_ORDER + k]);
        }
        elsp[i] = round(l_shl(a0, 1));
    }
    elsp
}

/// Shift the reconstructed quantized errors into the predictor memory.
fn update_lsp_memory(lsppm: &mut [i16; LSP_MEM_SIZE], lspe: &[i16; LPC_ORDER]) {
    for i in 0..LPC_ORDER {
        let row = &mut lsppm[i * LSP_PRED_ORDER..(i + 1) * LSP_PRED_ORDER];
        for k in (1..LSP_PRED_ORDER).rev() {
            row[k] = row[k - 1];
        }
        row[0] = lspe[i];
    }
}

/// Inverse-gap weights for the second-stage search, Q15.
///
/// Each dimension is weighted by the tightest gap over the smaller of
/// its two adjacent inter-LSP gaps; the end dimensions have only one.
/// Crowded regions therefore dominate the distortion.
fn lsp_weights(lsp: &[i16; LPC_ORDER]) -> [i16; LPC_ORDER] {
    let mut d = [0i16; LPC_ORDER - 1];
    let mut min_d = i16::MAX;
    for i in 0..LPC_ORDER - 1 {
        d[i] = sub(lsp[i + 1], lsp[i]).max(1);
        min_d = min_d.min(d[i]);
    }
    let mut w = [0i16; LPC_ORDER];
    w[0] = div_s(min_d, d[0]);
    for i in 1..LPC_ORDER - 1 {
        w[i] = div_s(min_d, d[i].min(d[i - 1]));
    }
    w[LPC_ORDER - 1] = div_s(min_d, d[LPC_ORDER - 2]);
    w
}

/// Unweighted MSE search over the first-stage codebook.
fn vq_mse(x: &[i16; LPC_ORDER]) -> usize {
    let mut dmin = i32::MAX;
    let mut idx = 0usize;
    for (j, cb) in LSP_CB1.iter().enumerate() {
        let mut d = 0i32;
        for i in 0..LPC_ORDER {
            let e = sub(x[i], cb[i]);
            d = l_mac0(d, e, e);
        }
        if d < dmin {
            dmin = d;
            idx = j;
        }
    }
    idx
}

/// Weighted MSE search over the high-split second-stage codebook.
fn vq_wmse(x: &[i16; LSP_SPLIT2], w: &[i16; LSP_SPLIT2]) -> usize {
    let mut dmin = i32::MAX;
    let mut idx = 0usize;
    for (j, cb) in LSP_CB22.iter().enumerate() {
        let mut d = 0i32;
        for i in 0..LSP_SPLIT2 {
            let t = sub(x[i], shr(cb[i], 1));
            let s = extract_h(l_mult0(w[i], t));
            d = l_mac0(d, s, t);
        }
        if d < dmin {
            dmin = d;
            idx = j;
        }
    }
    idx
}

/// Weighted MSE search over the low-split codebook, restricted to
/// candidates whose reconstructed LSPs stay non-negative and ascending.
///
/// `approx` is the stage-one reconstruction of the first `LSP_SPLIT1`
/// LSPs in Q15. Falls back to index 1 when every candidate breaks the
/// ordering.
fn vq_wmse_stable(
    x: &[i16; LSP_SPLIT1],
    w: &[i16; LSP_SPLIT1],
    approx: &[i16; LSP_SPLIT1],
) -> usize {
    let mut dmin = i32::MAX;
    let mut idx: Option<usize> = None;
    'cand: for (j, cb) in LSP_CB21.iter().enumerate() {
        let mut prev = 0i16;
        for k in 0..LSP_SPLIT1 {
            let xqc = add(approx[k], shr(cb[k], 4));
            if xqc < prev {
                continue 'cand;
            }
            prev = xqc;
        }
        let mut d = 0i32;
        for i in 0..LSP_SPLIT1 {
            let t = sub(x[i], shr(cb[i], 1));
            let s = extract_h(l_mult0(w[i], t));
            d = l_mac0(d, s, t);
        }
        if d < dmin {
            dmin = d;
            idx = Some(j);
        }
    }
    idx.unwrap_or(1)
}

/// Combine the stage outputs into the reconstructed Q15 error.
///
/// Stage one is Q16, stage two Q18; the sum is formed in Q19 and
/// brought down to the predictor memory scale.
fn combine_stages(eq1: i16, eq2: i16) -> i16 {
    saturate((((eq1 as i32) << 3) + ((eq2 as i32) << 1)) >> 4)
}

/// Quantize an LSP vector. Returns the quantized LSPs and the three
/// codebook indices (stage one, low split, high split).
pub fn lsp_quantize(
    lsp: &[i16; LPC_ORDER],
    lsppm: &mut [i16; LSP_MEM_SIZE],
) -> ([i16; LPC_ORDER], [u8; 3]) {
    let elsp = predict_lsp(lsppm);

    // mean-removed prediction error, Q16
    let mut lspe = [0i16; LPC_ORDER];
    for i in 0..LPC_ORDER {
        lspe[i] = shl(sub(sub(lsp[i], LSP_MEAN[i]), elsp[i]), 1);
    }

    let idx1 = vq_mse(&lspe);
    let eq1 = &LSP_CB1[idx1];

    // second-stage residual, Q18
    let mut resid = [0i16; LPC_ORDER];
    for i in 0..LPC_ORDER {
        resid[i] = shl(sub(lspe[i], eq1[i]), 2);
    }

    let w = lsp_weights(lsp);

    // stage-one reconstruction of the low split, used for ordering checks
    let mut approx = [0i16; LSP_SPLIT1];
    for k in 0..LSP_SPLIT1 {
        approx[k] = add(add(shr(eq1[k], 1), elsp[k]), LSP_MEAN[k]);
    }

    let mut rlo = [0i16; LSP_SPLIT1];
    let mut wlo = [0i16; LSP_SPLIT1];
    rlo.copy_from_slice(&resid[..LSP_SPLIT1]);
    wlo.copy_from_slice(&w[..LSP_SPLIT1]);
    let idx21 = vq_wmse_stable(&rlo, &wlo, &approx);

    let mut rhi = [0i16; LSP_SPLIT2];
    let mut whi = [0i16; LSP_SPLIT2];
    rhi.copy_from_slice(&resid[LSP_SPLIT1..]);
    whi.copy_from_slice(&w[LSP_SPLIT1..]);
    let idx22 = vq_wmse(&rhi, &whi);

    // reconstruct and refresh the predictor memory
    let mut lspe_r = [0i16; LPC_ORDER];
    let mut lspq = [0i16; LPC_ORDER];
    for i in 0..LPC_ORDER {
        let eq2 = if i < LSP_SPLIT1 {
            shr(LSP_CB21[idx21][i], 1)
        } else {
            shr(LSP_CB22[idx22][i - LSP_SPLIT1], 1)
        };
        lspe_r[i] = combine_stages(eq1[i], eq2);
        lspq[i] = add(add(lspe_r[i], elsp[i]), LSP_MEAN[i]);
    }
    update_lsp_memory(lsppm, &lspe_r);
    stabilize_lsp(&mut lspq);

    (lspq, [idx1 as u8, idx21 as u8, idx22 as u8])
}

/// Decode the three LSP indices. On an implausible reconstruction (first
/// LSP negative or the low split out of order, which a clean bitstream
/// cannot produce) the previous frame's LSPs are substituted.
pub fn lsp_decode(
    idx: [u8; 3],
    lspq_last: &[i16; LPC_ORDER],
    lsppm: &mut [i16; LSP_MEM_SIZE],
) -> [i16; LPC_ORDER] {
    let elsp = predict_lsp(lsppm);
    let eq1 = &LSP_CB1[idx[0] as usize];
    let cb21 = &LSP_CB21[idx[1] as usize];
    let cb22 = &LSP_CB22[idx[2] as usize];

    let mut lspe_r = [0i16; LPC_ORDER];
    let mut lspq = [0i16; LPC_ORDER];
    for i in 0..LPC_ORDER {
        let eq2 = if i < LSP_SPLIT1 {
            shr(cb21[i], 1)
        } else {
            shr(cb22[i - LSP_SPLIT1], 1)
        };
        lspe_r[i] = combine_stages(eq1[i], eq2);
        lspq[i] = add(add(lspe_r[i], elsp[i]), LSP_MEAN[i]);
    }

    let mut ordered = lspq[0] >= 0;
    for i in 1..LSP_SPLIT1 {
        if lspq[i] < lspq[i - 1] {
            ordered = false;
        }
    }
    if !ordered {
        lspq = *lspq_last;
        for i in 0..LPC_ORDER {
            lspe_r[i] = sub(sub(lspq[i], elsp[i]), LSP_MEAN[i]);
        }
    }

    update_lsp_memory(lsppm, &lspe_r);
    stabilize_lsp(&mut lspq);
    lspq
}

/// Keep the LSP predictor memory rolling through a lost frame by feeding
/// it the error that would reproduce the last good LSP vector.
pub fn lsp_conceal(lsplast: &[i16; LPC_ORDER], lsppm: &mut [i16; LSP_MEM_SIZE]) {
    let elsp = predict_lsp(lsppm);
    let mut lspe = [0i16; LPC_ORDER];
    for i in 0..LPC_ORDER {
        lspe[i] = sub(sub(lsplast[i], elsp[i]), LSP_MEAN[i]);
    }
    update_lsp_memory(lsppm, &lspe);
}
