//! ftspi-core - SPI master over an FTDI MPSSE engine
//!
//! This crate drives SPI peripherals (configuration flashes, FPGA
//! configuration ports, ...) through the MPSSE block found in FTDI
//! USB bridges. The MPSSE has no SPI controller of its own: chip select
//! is a plain GPIO line and every data phase is a clocked byte command,
//! so this crate is responsible for:
//!
//! - deriving the MPSSE edge flags and clock idle level from an SPI mode
//! - driving chip select (automatically per transfer, or manually across
//!   several transfers)
//! - packing data commands and payload into transport-sized chunks
//! - polling a status register until a masked condition holds
//!
//! The USB side is abstracted behind [`MpsseTransport`]; see the
//! `ftspi-ftdi` crate for a libftdi1 implementation and `ftspi-dummy`
//! for an in-memory one.
//!
//! # Example
//!
//! ```ignore
//! use ftspi_core::{FtdiSpi, SpiConfig, ClockMode};
//!
//! let mut spi = FtdiSpi::new(transport, &SpiConfig::default())?;
//! spi.set_mode(ClockMode::Mode0)?;
//!
//! let mut id = [0u8; 3];
//! spi.write_then_read(&[0x9F], &mut id)?;
//!
//! // Wait for the WIP bit to clear
//! spi.poll_until(0x05, 0x01, 0x00, 1000)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod interface;
pub mod mode;
pub mod mpsse;
pub mod opcodes;
pub mod pins;
pub mod spi;
pub mod transport;

pub use error::{Error, Result};
pub use interface::SpiInterface;
pub use mode::{BitOrder, ClockMode};
pub use pins::PinConfig;
pub use spi::{CsMode, FtdiSpi, SpiConfig, MAX_CHUNK};
pub use transport::MpsseTransport;
