//! Error types for ftspi-core

use thiserror::Error;

/// Errors reported by the SPI engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Submitting commands or payload to the transport failed
    #[error("MPSSE write failed: {0}")]
    TransportWrite(String),

    /// Reading back the expected number of bytes failed
    #[error("MPSSE read failed: {0}")]
    TransportRead(String),

    /// A GPIO command driving chip select failed
    #[error("chip select update failed: {0}")]
    CsUpdate(String),

    /// A status poll ran out of iterations
    #[error("timed out after {iterations} polls, last status 0x{last:02X}")]
    Timeout {
        /// Last status byte sampled before giving up
        last: u8,
        /// Number of read cycles performed
        iterations: u32,
    },

    /// Clock mode number outside 0..=3
    #[error("invalid SPI clock mode {0} (expected 0-3)")]
    InvalidMode(u8),

    /// Pin masks overlap, are not single bits, or move the clock
    #[error("invalid pin configuration: {0}")]
    InvalidPins(String),

    /// Transfer with neither a write nor a read buffer, or zero length
    #[error("transfer has no data to clock")]
    EmptyTransfer,

    /// Buffer shorter than the length requested for it
    #[error("buffer holds {have} bytes, {len} requested")]
    BufferTooShort {
        /// Bytes requested
        len: usize,
        /// Bytes the buffer holds
        have: usize,
    },
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
