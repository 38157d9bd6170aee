//! Frame parameter packing.
//!
//! A frame is 160 bits: the three LSP indices, the pitch period offset,
//! the pitch tap index, then per subframe a gain index followed by ten
//! 6-bit excitation indices (5-bit shape plus sign). Bits are packed
//! MSB first in transmission order.

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::*;
use crate::error::{CodecError, Result};

/// Quantizer indices for one coded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameParams {
    /// LSP indices: first stage, low split, high split
    pub lsp_idx: [u8; 3],
    /// Pitch period minus [`MIN_PITCH`]
    pub pitch_idx: u8,
    /// Three-tap pitch predictor index
    pub tap_idx: u8,
    /// Log-gain index per subframe
    pub gain_idx: [u8; SUBFRAMES],
    /// Excitation indices per subframe, sign bit above the shape bits
    pub shape_idx: [[u8; VECTORS_PER_SUBFRAME]; SUBFRAMES],
}

struct BitWriter {
    buf: BytesMut,
    acc: u32,
    nbits: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(ENCODED_FRAME_SIZE),
            acc: 0,
            nbits: 0,
        }
    }

    fn put(&mut self, value: u32, bits: u32) {
        debug_assert!(value < (1 << bits));
        self.acc = (self.acc << bits) | value;
        self.nbits += bits;
        while self.nbits >= 8 {
            self.nbits -= 8;
            self.buf.put_u8((self.acc >> self.nbits) as u8);
        }
    }

    fn finish(self) -> Bytes {
        debug_assert_eq!(self.nbits, 0);
        self.buf.freeze()
    }
}

struct BitReader<'a> {
    buf: &'a [u8],
    pos: usize,
    acc: u32,
    nbits: u32,
}

impl<'a> BitReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            acc: 0,
            nbits: 0,
        }
    }

    fn get(&mut self, bits: u32) -> u32 {
        while self.nbits < bits {
            self.acc = (self.acc << 8) | self.buf[self.pos] as u32;
            self.pos += 1;
            self.nbits += 8;
        }
        self.nbits -= bits;
        (self.acc >> self.nbits) & ((1 << bits) - 1)
    }
}

impl FrameParams {
    /// Check every index against its codebook range. Parsed frames always
    /// pass; this guards parameters assembled by hand.
    pub fn validate(&self) -> Result<()> {
        let checks: [(&'static str, u32, u32); 4] = [
            ("lsp1", self.lsp_idx[0] as u32, LSP_CB1_SIZE as u32 - 1),
            ("lsp2_low", self.lsp_idx[1] as u32, LSP_CB2_SIZE as u32 - 1),
            ("lsp2_high", self.lsp_idx[2] as u32, LSP_CB2_SIZE as u32 - 1),
            ("pitch_tap", self.tap_idx as u32, PITCH_TAP_CB_SIZE as u32 - 1),
        ];
        for (field, value, max) in checks {
            if value > max {
                return Err(CodecError::InvalidBitstreamField { field, value, max });
            }
        }
        for sf in 0..SUBFRAMES {
            if self.gain_idx[sf] as usize >= LOG_GAIN_CB_SIZE {
                return Err(CodecError::InvalidBitstreamField {
                    field: "gain",
                    value: self.gain_idx[sf] as u32,
                    max: LOG_GAIN_CB_SIZE as u32 - 1,
                });
            }
            for &s in &self.shape_idx[sf] {
                if s as usize >= 2 * SHAPE_CB_SIZE {
                    return Err(CodecError::InvalidBitstreamField {
                        field: "shape",
                        value: s as u32,
                        max: 2 * SHAPE_CB_SIZE as u32 - 1,
                    });
                }
            }
        }
        Ok(())
    }

    /// Pack into the 20-byte frame payload.
    pub fn to_bytes(&self) -> Bytes {
        let mut w = BitWriter::new();
        w.put(self.lsp_idx[0] as u32, LSP1_BITS);
        w.put(self.lsp_idx[1] as u32, LSP2_BITS);
        w.put(self.lsp_idx[2] as u32, LSP2_BITS);
        w.put(self.pitch_idx as u32, PITCH_BITS);
        w.put(self.tap_idx as u32, PITCH_TAP_BITS);
        for sf in 0..SUBFRAMES {
            w.put(self.gain_idx[sf] as u32, GAIN_BITS);
            for &s in &self.shape_idx[sf] {
                w.put(s as u32, SHAPE_BITS);
            }
        }
        w.finish()
    }

    /// Parse a 20-byte frame payload.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() != ENCODED_FRAME_SIZE {
            return Err(CodecError::invalid_payload_size(
                ENCODED_FRAME_SIZE,
                buf.len(),
            ));
        }
        let mut r = BitReader::new(buf);
        let mut p = FrameParams {
            lsp_idx: [
                r.get(LSP1_BITS) as u8,
                r.get(LSP2_BITS) as u8,
                r.get(LSP2_BITS) as u8,
            ],
            pitch_idx: r.get(PITCH_BITS) as u8,
            tap_idx: r.get(PITCH_TAP_BITS) as u8,
            ..Default::default()
        };
        for sf in 0..SUBFRAMES {
            p.gain_idx[sf] = r.get(GAIN_BITS) as u8;
            for s in p.shape_idx[sf].iter_mut() {
                *s = r.get(SHAPE_BITS) as u8;
            }
        }
        Ok(p)
    }
}
