//! # BV32: Wideband Speech Codec
//!
//! A fixed-point implementation of the BroadVoice32 wideband speech codec
//! for VoIP applications: 16 kHz input, 5 ms frames, 32 kbit/s.
//!
//! The coder runs two-stage noise-feedback quantization of the short-term
//! LPC residual with a three-tap long-term predictor, split-VQ LSP coding
//! with moving-average prediction, and predictive log-gain coding with a
//! gain-change limiter. The decoder conceals lost frames by periodic
//! extrapolation mixed with energy-matched noise.
//!
//! ## Usage
//!
//! ```rust
//! use bv32_codec::{Bv32Decoder, Bv32Encoder};
//!
//! let mut encoder = Bv32Encoder::new();
//! let mut decoder = Bv32Decoder::new();
//!
//! let samples = vec![0i16; 80]; // 5ms at 16kHz
//! let payload = encoder.encode_frame(&samples)?;
//! assert_eq!(payload.len(), 20);
//!
//! let decoded = decoder.decode_frame(&payload)?;
//! assert_eq!(decoded.len(), 80);
//!
//! // on packet loss, substitute a concealed frame instead
//! let concealed = decoder.conceal_frame();
//! assert_eq!(concealed.len(), 80);
//! # Ok::<(), bv32_codec::CodecError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
mod excitation;
mod gain;
mod lpc;
mod lsp;
mod math;
mod pitch;
mod plc;
mod signal;
mod spectral;
mod tables;

pub use bitstream::FrameParams;
pub use decoder::Bv32Decoder;
pub use encoder::Bv32Encoder;
pub use error::{CodecError, Result};

/// Version information for the codec library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging for the library (for standalone use and tests).
///
/// Applications embedding the codec normally install their own
/// subscriber; this is a no-op if one is already set.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_init_logging_idempotent() {
        init_logging();
        init_logging();
    }
}
