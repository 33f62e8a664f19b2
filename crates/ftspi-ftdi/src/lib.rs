//! ftspi-ftdi - libftdi1 MPSSE transport
//!
//! This crate provides the USB side of `ftspi-core` for FTDI high-speed
//! parts whose channels carry an MPSSE engine (FT2232H, FT4232H, FT232H,
//! FT4233H and boards built on them).
//!
//! # Example
//!
//! ```no_run
//! use ftspi_core::SpiInterface;
//! use ftspi_ftdi::{open_spi, FtdiConfig, FtdiInterface};
//!
//! // Stock cable: FT2232H channel B
//! let mut spi = open_spi(&FtdiConfig::default())?;
//!
//! // Or channel A at 10 MHz with CS on ADBUS4
//! let config = FtdiConfig::default()
//!     .interface(FtdiInterface::A)?
//!     .divisor(6)?
//!     .cs_pin(4)?;
//! let mut spi = open_spi(&config)?;
//!
//! let id = spi.read_jedec_id()?;
//! println!("JEDEC ID: {:02X} {:02X} {:02X}", id[0], id[1], id[2]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Programmer Options
//!
//! - `type=<device>` - Device type (2232h, 4232h, 232h, 4233h, tumpa, tumpalite)
//! - `port=<A|B|C|D>` - Channel to use (default: B)
//! - `divisor=<N>` - Clock divisor (2-65534, even; default: 2)
//! - `serial=<string>` - USB serial number filter
//! - `cs=<bit>` - ADBUS bit used as chip select (default: 3)
//! - `holdn=<bit>` / `wpn=<bit>` - ADBUS bits driving HOLD# / WP# high
//! - `mode=<0-3>` - SPI clock mode (default: 0)
//! - `lsb=<bool>` - Shift least significant bit first
//!
//! # SPI Clock Speed
//!
//! ```text
//! SPI_clock = 60 MHz / divisor
//! ```
//!
//! | Divisor | SPI Clock |
//! |---------|-----------|
//! | 2       | 30 MHz    |
//! | 4       | 15 MHz    |
//! | 6       | 10 MHz    |
//! | 60      | 1 MHz     |

mod device;
mod error;
mod protocol;

pub use device::{list_devices, open_spi, parse_options, FtdiConfig, FtdiDeviceInfo, FtdiMpsse};
pub use error::{FtdiError, Result};
pub use protocol::{FtdiDeviceType, FtdiInterface, SUPPORTED_DEVICES};
