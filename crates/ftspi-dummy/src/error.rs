//! Error types for the dummy engine

use thiserror::Error;

/// Result type for dummy engine operations
pub type Result<T> = std::result::Result<T, DummyError>;

/// Errors reported by the dummy engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DummyError {
    /// Opcode the engine does not emulate
    #[error("unsupported MPSSE command 0x{0:02X}")]
    UnsupportedCommand(u8),

    /// Command cut off before its arguments or payload
    #[error("truncated MPSSE command")]
    Truncated,

    /// Fewer bytes clocked in than requested
    #[error("short read: wanted {wanted} bytes, {available} available")]
    ShortRead {
        /// Bytes requested
        wanted: usize,
        /// Bytes the engine had
        available: usize,
    },

    /// Failure requested through [`Faults`](crate::Faults)
    #[error("injected {0} failure")]
    Injected(&'static str),

    /// Invalid programmer option
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
