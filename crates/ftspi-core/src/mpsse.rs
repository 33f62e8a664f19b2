//! MPSSE command encoding
//!
//! Based on FTDI AN_108 ("Command Processor for MPSSE and MCU Host Bus
//! Emulation Modes"). Data shifting commands are a single opcode byte
//! whose low bits select direction, edge and bit order, followed by a
//! little-endian `length - 1` and, for writes, the payload.

use bitflags::bitflags;

bitflags! {
    /// Bits of an MPSSE data shifting opcode
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MpsseFlags: u8 {
        /// Shift data out on the negative clock edge
        const WRITE_NEG = 0x01;
        /// Length is in bits instead of bytes
        const BITMODE   = 0x02;
        /// Sample data in on the negative clock edge
        const READ_NEG  = 0x04;
        /// LSB first
        const LSB       = 0x08;
        /// Clock data out on DO
        const DO_WRITE  = 0x10;
        /// Clock data in from DI
        const DO_READ   = 0x20;
    }
}

/// Set data bits low byte (value, direction)
pub const SET_BITS_LOW: u8 = 0x80;

/// Get data bits low byte
pub const GET_BITS_LOW: u8 = 0x81;

/// Set data bits high byte (value, direction)
pub const SET_BITS_HIGH: u8 = 0x82;

/// Disable loopback mode
pub const LOOPBACK_END: u8 = 0x85;

/// Set clock divisor
pub const TCK_DIVISOR: u8 = 0x86;

/// Send immediate (flush the chip's read buffer back to the host)
pub const SEND_IMMEDIATE: u8 = 0x87;

/// Disable divide-by-5 prescaler (60 MHz clock)
pub const DIS_DIV_5: u8 = 0x8A;

/// Length of a data command header (opcode + 16-bit length)
pub const HEADER_LEN: usize = 3;

/// Largest byte count a single data command can encode
pub const MAX_COMMAND_LEN: usize = 0x1_0000;

// Low byte pin assignments. SK, DO and DI are owned by the engine.

/// SK (clock) mask
pub const PIN_SK: u8 = 1 << 0;

/// DO (MOSI) mask
pub const PIN_DO: u8 = 1 << 1;

/// DI (MISO) mask
pub const PIN_DI: u8 = 1 << 2;

/// Build the 3-byte header of a data command clocking `len` bytes
///
/// `len` must be in `1..=MAX_COMMAND_LEN`.
pub fn data_header(opcode: MpsseFlags, len: usize) -> [u8; HEADER_LEN] {
    debug_assert!(len > 0 && len <= MAX_COMMAND_LEN);
    let [lo, hi] = ((len - 1) as u16).to_le_bytes();
    [opcode.bits(), lo, hi]
}

/// Decode the byte count of a data command header
pub fn header_len(header: &[u8; HEADER_LEN]) -> usize {
    u16::from_le_bytes([header[1], header[2]]) as usize + 1
}
