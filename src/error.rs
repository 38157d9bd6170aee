//! Error handling for the codec library
//!
//! Defines the error type returned by encoder, decoder, and bitstream
//! operations, with enough detail to diagnose malformed input.

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Error type for codec operations
#[derive(Error, Debug)]
pub enum CodecError {
    /// Invalid frame size
    #[error("Invalid frame size: expected {expected}, got {actual}")]
    InvalidFrameSize {
        /// Required number of samples per frame
        expected: usize,
        /// Number of samples supplied
        actual: usize,
    },

    /// Invalid encoded payload size
    #[error("Invalid payload size: expected {expected} bytes, got {actual}")]
    InvalidPayloadSize {
        /// Required payload length in bytes
        expected: usize,
        /// Length of the payload supplied
        actual: usize,
    },

    /// A bitstream field decoded to a value outside its codebook range
    #[error("Invalid bitstream field {field}: value {value} exceeds {max}")]
    InvalidBitstreamField {
        /// Name of the offending field
        field: &'static str,
        /// Decoded value
        value: u32,
        /// Largest acceptable value
        max: u32,
    },
}

impl CodecError {
    /// Create a new invalid frame size error
    pub fn invalid_frame_size(expected: usize, actual: usize) -> Self {
        Self::InvalidFrameSize { expected, actual }
    }

    /// Create a new invalid payload size error
    pub fn invalid_payload_size(expected: usize, actual: usize) -> Self {
        Self::InvalidPayloadSize { expected, actual }
    }

    /// Whether the caller can keep the codec instance and carry on
    /// (all current errors reject one frame without corrupting state)
    pub fn is_recoverable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = CodecError::invalid_frame_size(80, 79);
        assert!(e.to_string().contains("expected 80"));
        let e = CodecError::InvalidBitstreamField {
            field: "pitch",
            value: 300,
            max: 255,
        };
        assert!(e.to_string().contains("pitch"));
    }

    #[test]
    fn test_recoverable() {
        assert!(CodecError::invalid_payload_size(20, 10).is_recoverable());
    }

    #[test]
    fn test_error_surface_is_specific() {
        // every emittable error names the offending values
        let errs = [
            CodecError::invalid_frame_size(80, 79),
            CodecError::invalid_payload_size(20, 19),
            CodecError::InvalidBitstreamField {
                field: "gain",
                value: 32,
                max: 31,
            },
        ];
        for e in errs {
            assert!(e.is_recoverable());
            assert!(!e.to_string().is_empty());
        }
    }
}
