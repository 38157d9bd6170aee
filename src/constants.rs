//! Constants and parameters for the BV32 codec.
#![allow(missing_docs)]

// Frame parameters
pub const SAMPLE_RATE: u32 = 16000;
pub const FRAME_SIZE: usize = 80;        // 5ms at 16kHz
pub const SUBFRAMES: usize = 2;
pub const SUBFRAME_SIZE: usize = 40;     // 2.5ms subframes

// Linear prediction parameters
pub const LPC_ORDER: usize = 8;
pub const WINDOW_SIZE: usize = 160;      // Analysis window (10ms)

// Excitation parameters
pub const VECTOR_DIM: usize = 4;         // Excitation vector dimension
pub const SHAPE_CB_SIZE: usize = 32;     // Shape codebook size
pub const VECTORS_PER_FRAME: usize = FRAME_SIZE / VECTOR_DIM;
pub const VECTORS_PER_SUBFRAME: usize = SUBFRAME_SIZE / VECTOR_DIM;

// Pitch parameters
pub const MIN_PITCH: usize = 10;         // 1600 Hz
pub const MAX_PITCH: usize = 265;        // ~60 Hz
pub const PITCH_WINDOW: usize = 240;     // Pitch analysis window
pub const PITCH_TAP_CB_SIZE: usize = 32;

// Coarse pitch search over the 8:1 decimated signal
pub const DEC_FACTOR: usize = 8;
pub const DEC_FILTER_ORDER: usize = 4;
pub const FRAME_SIZE_DEC: usize = FRAME_SIZE / DEC_FACTOR;
pub const MIN_PITCH_DEC: usize = 1;
pub const MAX_PITCH_DEC: usize = 33;
pub const PITCH_WINDOW_DEC: usize = PITCH_WINDOW / DEC_FACTOR;
pub const MAX_PEAKS: usize = 7;

// Decimated signal buffer: MAX_PITCH_DEC + 1 lag samples of history plus
// the analysis window, minus the new frame appended each time.
pub const DEC_BUF_LEN: usize = MAX_PITCH_DEC + 1 + PITCH_WINDOW_DEC;
pub const DEC_HISTORY: usize = DEC_BUF_LEN - FRAME_SIZE_DEC;

// Coarse pitch decision thresholds, Q15 unless noted
pub const COR_THRESH_HIGH: i16 = 23921;      // 0.73
pub const COR_THRESH_LOW: i16 = 13107;       // 0.4
pub const COR_THRESH_HIGH_LAST: i16 = 25559; // 0.78, near the previous pitch
pub const COR_THRESH_LOW_LAST: i16 = 14090;  // 0.43, near the previous pitch
pub const PITCH_DEV_THRESH: i16 = 8192;      // 0.25, relative lag deviation
pub const MULT_PEAK_DEV: i16 = 1966;         // 0.06, sub-multiple peak match
pub const SUBMULT_DEV: i16 = 3113;           // 0.095, sub-multiple lag match

// Signal history offsets (in 16 kHz samples)
pub const PITCH_HISTORY: usize = MAX_PITCH + 1;
pub const INPUT_BUF_LEN: usize = PITCH_HISTORY + FRAME_SIZE;

// Long-term predictor
pub const LT_HISTORY: usize = MAX_PITCH + 1;
pub const LT_WEIGHT_CAP: i16 = 4096;     // 0.5 in Q13, feedback weight at unity tap

// Perceptual weighting and de-emphasis
pub const PREEMPH_POLE: i16 = 24576;     // 0.75 in Q15
pub const PREEMPH_ZERO: i16 = 16384;     // 0.5 in Q15
pub const PREPROC_ORDER: usize = 2;

// Level estimator, leakage factors in Q15 and thresholds in Q25
pub const ESTL_ALPHA: i16 = 32764;
pub const ESTL_BETA: i16 = 32736;
pub const ESTL_BETA1: i16 = 32;
pub const ESTL_A: i16 = 32704;
pub const ESTL_A1: i16 = 64;
pub const ESTL_TH: i16 = 6554;           // 0.2 in Q15

// Gain quantization
pub const LOG_GAIN_PRED_ORDER: usize = 16;
pub const LOG_GAIN_CB_SIZE: usize = 32;
pub const GAIN_LEVEL_BINS: usize = 18;   // rows of the gain change limit table
pub const GAIN_CHANGE_BINS: usize = 11;  // columns of the gain change limit table
pub const GAIN_LEVEL_LB: i16 = -24;      // lowest level bin, integer log2
pub const GAIN_CHANGE_LB: i16 = -8;      // lowest gain-change bin, integer log2
pub const MIN_LOG_GAIN: i32 = -67108864; // -2.0 in Q25
pub const MIN_GAIN_ENERGY: i32 = 20;     // Q1 energy floor for log conversion
pub const MIN_SYNTH_ENERGY: i32 = 10;    // Q0 energy floor in concealment
pub const GAIN_LIMIT_TRAPPED: i16 = 50;  // consecutive clamps before escape
pub const LEVEL_CONVERGENCE_TIME: i16 = 100; // frames with the limiter relaxed

// LSP quantization
pub const LSP_PRED_ORDER: usize = 8;
pub const LSP_CB1_SIZE: usize = 128;
pub const LSP_CB2_SIZE: usize = 32;
pub const LSP_SPLIT1: usize = 3;         // low split of the second stage
pub const LSP_SPLIT2: usize = 5;         // high split of the second stage
pub const LSP_MIN_GAP: i16 = 50;         // minimum spacing, Q15

// Packet loss concealment
pub const PLC_HOLD_FRAMES: i16 = 8;      // frames before attenuation starts
pub const PLC_ATTN_FRAMES: i16 = 50;     // frames until full muting
pub const PLC_ATTN_STEP: i32 = 20971;    // per-frame gain decrement, Q20
pub const PLC_SCALE_A: i16 = 31130;      // 1.9 in Q14, scaling line slope
pub const PLC_SCALE_B: i16 = -32768;     // -2.0 in Q14, scaling line offset
pub const PLC_SCALE_MIN: i16 = 1638;     // 0.1 in Q14
pub const PLC_SCALE_MAX: i16 = 14746;    // 0.9 in Q14

// Bitstream layout: 160 bits per frame
pub const ENCODED_FRAME_SIZE: usize = 20;
pub const LSP1_BITS: u32 = 7;
pub const LSP2_BITS: u32 = 5;
pub const PITCH_BITS: u32 = 8;
pub const PITCH_TAP_BITS: u32 = 5;
pub const GAIN_BITS: u32 = 5;
pub const SHAPE_BITS: u32 = 6;           // 5-bit shape index plus sign

// Fixed-point constants
pub const Q15_ONE: i16 = 32767;
pub const Q12_ONE: i16 = 4096;
