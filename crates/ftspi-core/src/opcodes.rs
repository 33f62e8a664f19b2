//! Common JEDEC SPI NOR opcodes
//!
//! Only the handful used by the status/identification helpers, the CLI
//! and the flash emulator are listed here.

/// Write Enable - required before any write/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL bit in status register
pub const WRDI: u8 = 0x04;

/// Read Status Register 1
pub const RDSR: u8 = 0x05;

/// Read JEDEC ID (manufacturer + device ID)
pub const RDID: u8 = 0x9F;

/// Read Data
pub const READ: u8 = 0x03;

/// Page Program
pub const PP: u8 = 0x02;

/// Sector Erase (4 KiB)
pub const SE: u8 = 0x20;
/// Chip Erase
pub const CE: u8 = 0xC7;

/// Status register: Write In Progress
pub const SR_WIP: u8 = 0x01;
/// Status register: Write Enable Latch
pub const SR_WEL: u8 = 0x02;
