//! Input conditioning and short-term filtering.
//!
//! The encoder front end runs a 50 Hz high-pass filter followed by a
//! first-order pre-emphasis. The decoder undoes the pre-emphasis with the
//! matching de-emphasis stage. Also here are the all-zero and all-pole
//! direct-form filters used for residual computation, perceptual
//! weighting, and LPC synthesis; coefficient arrays are Q12 with a[0] = 1.

use crate::constants::*;
use crate::math::*;
use crate::tables::{HPF_A, HPF_B};

/// High-pass and pre-emphasis filter state.
#[derive(Debug, Clone, Default)]
pub struct PreprocState {
    /// Pole-section memory of the high-pass biquad, kept at 32-bit precision
    pole_mem: [i32; PREPROC_ORDER],
    /// Zero-section memory (previous raw inputs)
    zero_mem: [i16; PREPROC_ORDER],
    /// Previous pre-emphasis input
    pre_x: i16,
    /// Previous pre-emphasis output
    pre_y: i16,
}

/// High-pass filter the input and apply pre-emphasis.
///
/// The input is halved on the way in; all later stages run on the
/// half-scale signal and the decoder output stays at that scale.
pub fn preprocess(st: &mut PreprocState, output: &mut [i16], input: &[i16]) {
    debug_assert_eq!(output.len(), input.len());
    for (y, &x) in output.iter_mut().zip(input.iter()) {
        let xs = shr(x, 1);

        // pole section, 32-bit memory to keep the 50 Hz pole accurate
        let mut a0 = mpy_32_16(st.pole_mem[0], -HPF_A[1]);
        a0 = l_add(a0, mpy_32_16(st.pole_mem[1], -HPF_A[2]));
        // zero section
        a0 = l_mac(a0, xs, HPF_B[0]);
        a0 = l_mac(a0, st.zero_mem[0], HPF_B[1]);
        a0 = l_mac(a0, st.zero_mem[1], HPF_B[2]);
        a0 = l_shl(a0, 2); // Q13 coefficients back to Q16

        st.pole_mem[1] = st.pole_mem[0];
        st.pole_mem[0] = a0;
        st.zero_mem[1] = st.zero_mem[0];
        st.zero_mem[0] = xs;

        let hp = round(a0);

        // pre-emphasis: y[n] = x[n] + 0.5 x[n-1] - 0.75 y[n-1]
        let mut acc = l_deposit_h(hp);
        acc = l_mac(acc, PREEMPH_ZERO, st.pre_x);
        acc = l_mac(acc, -PREEMPH_POLE, st.pre_y);
        st.pre_x = hp;
        st.pre_y = round(acc);
        *y = st.pre_y;
    }
}

/// De-emphasis filter state.
#[derive(Debug, Clone, Default)]
pub struct DeemphState {
    /// Pole-section output memory
    pub pole_mem: i16,
    /// Zero-section memory (previous pole-section output)
    pub zero_mem: i16,
}

/// Undo the encoder pre-emphasis: (1 + 0.75 z^-1) / (1 + 0.5 z^-1).
pub fn deemphasis(st: &mut DeemphState, samples: &mut [i16]) {
    for s in samples.iter_mut() {
        let mut acc = l_deposit_h(*s);
        acc = l_mac(acc, -PREEMPH_ZERO, st.pole_mem);
        st.pole_mem = round(acc);
        acc = l_mac(acc, PREEMPH_POLE, st.zero_mem);
        st.zero_mem = st.pole_mem;
        *s = round(acc);
    }
}

/// All-zero (FIR) filtering producing the Q1 short-term residual:
/// `y[n] = 2 * sum(a[i] * x[n - i])` with x in Q0 and a in Q12.
///
/// `x` must hold `LPC_ORDER` history samples before `offset`.
pub fn az_filter_q0_q1(
    a: &[i16; LPC_ORDER + 1],
    x: &[i16],
    offset: usize,
    output: &mut [i16],
) {
    debug_assert!(offset >= LPC_ORDER);
    for (n, y) in output.iter_mut().enumerate() {
        let pos = offset + n;
        let mut a0 = 0i32;
        for (i, &c) in a.iter().enumerate() {
            a0 = l_mac(a0, c, x[pos - i]); // Q13
        }
        *y = round(l_shl(a0, 4)); // Q1
    }
}

/// All-pole (IIR) filtering at Q0: `y[n] = x[n] - sum(a[i] * y[n - i])`.
///
/// `mem` holds the last `LPC_ORDER` outputs, most recent first. When
/// `update` is false the memory is left untouched (trial filtering).
pub fn ap_filter(
    a: &[i16; LPC_ORDER + 1],
    x: &[i16],
    y: &mut [i16],
    mem: &mut [i16; LPC_ORDER],
    update: bool,
) {
    let mut m = *mem;
    filter_all_pole(a, x, y, &mut m, 12);
    if update {
        *mem = m;
    }
}

/// All-pole filtering taking a Q1 input and producing Q0 output.
pub fn ap_filter_q1_q0(
    a: &[i16; LPC_ORDER + 1],
    x: &[i16],
    y: &mut [i16],
    mem: &mut [i16; LPC_ORDER],
    update: bool,
) {
    let mut m = *mem;
    filter_all_pole(a, x, y, &mut m, 11);
    if update {
        *mem = m;
    }
}

/// Shared all-pole kernel. `in_shift` positions the Q13 accumulator for the
/// input term: 12 for Q0 input, 11 for Q1 input.
fn filter_all_pole(
    a: &[i16; LPC_ORDER + 1],
    x: &[i16],
    y: &mut [i16],
    mem: &mut [i16; LPC_ORDER],
    in_shift: i32,
) {
    debug_assert_eq!(x.len(), y.len());
    for n in 0..x.len() {
        let mut a0 = l_mult(x[n], shl(1, in_shift)); // Q13
        for i in 0..LPC_ORDER {
            a0 = l_msu(a0, a[i + 1], mem[i]); // Q13
        }
        let out = round(l_shl(a0, 3)); // Q0
        for i in (1..LPC_ORDER).rev() {
            mem[i] = mem[i - 1];
        }
        mem[0] = out;
        y[n] = out;
    }
}
