//! SPI master on top of an [`MpsseTransport`]
//!
//! [`FtdiSpi`] holds all per-device SPI state: pin masks, the edge flags
//! derived from the clock mode, the chip select policy and the current
//! chip select level. Its methods are split by concern:
//!
//! - `cs` - chip select control and policy
//! - `transfer` - chunked data transfers and convenience wrappers
//! - `poll` - status register polling

mod cs;
mod poll;
mod transfer;

#[cfg(test)]
pub(crate) mod mock;

use heapless::Vec as BoundedVec;

use crate::error::{Error, Result};
use crate::mode::{BitOrder, ClockMode};
use crate::mpsse::{MpsseFlags, HEADER_LEN};
use crate::pins::PinConfig;
use crate::transport::MpsseTransport;

/// Largest chunk clocked by a single data command
///
/// The engine's command buffer holds one header plus this many payload
/// bytes; transport chunk sizes above it are clamped.
pub const MAX_CHUNK: usize = 4096;

const BUF_CAPACITY: usize = HEADER_LEN + MAX_CHUNK;

/// Chip select policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsMode {
    /// Every transfer asserts CS before its first chunk and releases it
    /// after its last
    #[default]
    Auto,
    /// The caller brackets one or more transfers with
    /// [`FtdiSpi::assert_cs`] / [`FtdiSpi::deassert_cs`]
    Manual,
}

/// SPI configuration applied when the engine is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpiConfig {
    /// Pin masks
    pub pins: PinConfig,
    /// Initial clock mode
    pub mode: ClockMode,
    /// Bit order
    pub bit_order: BitOrder,
}

/// SPI master driving an MPSSE transport
pub struct FtdiSpi<T: MpsseTransport> {
    transport: T,
    pins: PinConfig,
    mode: ClockMode,
    bit_order: BitOrder,
    /// Edge flag OR'd into write opcodes
    wr_mode: MpsseFlags,
    /// Edge flag OR'd into read opcodes
    rd_mode: MpsseFlags,
    /// Clock idle level in the GPIO byte
    clk_idle: u8,
    cs_mode: CsMode,
    cs_asserted: bool,
    /// Reused for every chunk
    buf: BoundedVec<u8, BUF_CAPACITY>,
}

impl<T: MpsseTransport> FtdiSpi<T> {
    /// Take ownership of an opened transport and bring the bus to idle
    ///
    /// CS, HOLD# and WP# become outputs driven high, the clock is parked
    /// at the idle level of `config.mode` and chip select is automatic.
    pub fn new(transport: T, config: &SpiConfig) -> Result<Self> {
        let pins = config.pins.resolved();
        pins.validate()?;

        log::debug!(
            "SPI pins: clk=0x{:02X} cs=0x{:02X} holdn=0x{:02X} wpn=0x{:02X}",
            pins.clk,
            pins.cs,
            pins.holdn,
            pins.wpn
        );

        let mut spi = Self {
            transport,
            pins,
            mode: config.mode,
            bit_order: config.bit_order,
            wr_mode: config.mode.write_edge(),
            rd_mode: config.mode.read_edge(),
            clk_idle: config.mode.clock_idle(pins.clk),
            cs_mode: CsMode::Auto,
            cs_asserted: false,
            buf: BoundedVec::new(),
        };

        // The clock is owned by the engine; only the free lines need a
        // direction update.
        let released = pins.released();
        spi.transport
            .gpio_set_output(released)
            .map_err(transport_write)?;
        spi.transport.gpio_set(released).map_err(transport_write)?;

        spi.set_mode(config.mode)?;
        Ok(spi)
    }

    /// Select the SPI clock mode and park the clock at its idle level
    pub fn set_mode(&mut self, mode: ClockMode) -> Result<()> {
        self.mode = mode;
        self.wr_mode = mode.write_edge();
        self.rd_mode = mode.read_edge();
        self.clk_idle = mode.clock_idle(self.pins.clk);

        log::debug!(
            "SPI {}: write edge {:?}, read edge {:?}, clock idle {}",
            mode,
            self.wr_mode,
            self.rd_mode,
            if self.clk_idle != 0 { "high" } else { "low" }
        );

        let result = if self.clk_idle != 0 {
            self.transport.gpio_set(self.pins.clk)
        } else {
            self.transport.gpio_clear(self.pins.clk)
        };
        result.map_err(transport_write)
    }

    /// Current clock mode
    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    /// Edge flag currently applied to write opcodes
    pub fn write_edge(&self) -> MpsseFlags {
        self.wr_mode
    }

    /// Edge flag currently applied to read opcodes
    pub fn read_edge(&self) -> MpsseFlags {
        self.rd_mode
    }

    /// Clock idle level as a GPIO byte (0 or the clock mask)
    pub fn clock_idle(&self) -> u8 {
        self.clk_idle
    }

    /// Select MSB- or LSB-first shifting
    pub fn set_bit_order(&mut self, order: BitOrder) {
        self.bit_order = order;
    }

    /// Current bit order
    pub fn bit_order(&self) -> BitOrder {
        self.bit_order
    }

    /// Resolved pin masks
    pub fn pins(&self) -> &PinConfig {
        &self.pins
    }

    /// Borrow the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back
    pub fn into_inner(self) -> T {
        self.transport
    }
}

fn transport_write<E: core::fmt::Display>(e: E) -> Error {
    Error::TransportWrite(e.to_string())
}

fn transport_read<E: core::fmt::Display>(e: E) -> Error {
    Error::TransportRead(e.to_string())
}

/// First `len` bytes of `buf`
pub(crate) fn head(buf: &[u8], len: usize) -> Result<&[u8]> {
    let have = buf.len();
    buf.get(..len).ok_or(Error::BufferTooShort { len, have })
}

/// First `len` bytes of `buf`, mutably
pub(crate) fn head_mut(buf: &mut [u8], len: usize) -> Result<&mut [u8]> {
    let have = buf.len();
    buf.get_mut(..len).ok_or(Error::BufferTooShort { len, have })
}
