//! ftspi-dummy - In-memory MPSSE engine for testing
//!
//! This crate provides an [`MpsseTransport`](ftspi_core::MpsseTransport)
//! that needs no hardware: it decodes the MPSSE command stream itself and
//! has an emulated SPI NOR flash hanging off its chip select line. It's
//! useful for testing the SPI engine end to end and for trying the CLI
//! without a cable.
//!
//! # Programmer Options
//!
//! - `mfr=<hex>` - JEDEC manufacturer ID (default: EF)
//! - `device=<hex>` - JEDEC device ID (default: 4018)
//! - `size=<bytes>` - Flash size, decimal or 0x-prefixed (default: 1 MiB)
//! - `busy=<N>` - Status samples reporting WIP after program/erase (default: 3)
//! - `cs=<bit>` - ADBUS bit wired to the flash's CS# (default: 3)
//! - `chunk=<bytes>` - Largest read-back chunk (default: 4096)

mod engine;
mod error;
mod flash;

pub use engine::{DummyMpsse, Event, Faults};
pub use error::{DummyError, Result};
pub use flash::{DummyConfig, DummyFlash, SECTOR_SIZE};

/// Parse programmer options
pub fn parse_options(options: &[(&str, &str)]) -> Result<DummyConfig> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        match *key {
            "mfr" => {
                config.manufacturer_id = u8::from_str_radix(value, 16).map_err(|_| {
                    DummyError::InvalidParameter(format!("Invalid manufacturer ID '{}'", value))
                })?;
            }
            "device" => {
                config.device_id = u16::from_str_radix(value, 16).map_err(|_| {
                    DummyError::InvalidParameter(format!("Invalid device ID '{}'", value))
                })?;
            }
            "size" => {
                let size = parse_number(key, value)?;
                if size < SECTOR_SIZE || !size.is_power_of_two() {
                    return Err(DummyError::InvalidParameter(format!(
                        "Invalid size {}: must be a power of two of at least {}",
                        size, SECTOR_SIZE
                    )));
                }
                config.size = size;
            }
            "busy" => {
                config.busy_samples = value.parse().map_err(|_| {
                    DummyError::InvalidParameter(format!("Invalid busy count '{}'", value))
                })?;
            }
            "cs" => {
                let bit = parse_number(key, value)?;
                if bit > 7 {
                    return Err(DummyError::InvalidParameter(format!(
                        "Invalid cs pin {}: must be 0-7",
                        bit
                    )));
                }
                config.cs = 1 << bit;
            }
            "chunk" => {
                let chunk = parse_number(key, value)?;
                if chunk == 0 {
                    return Err(DummyError::InvalidParameter(
                        "chunk must be at least 1 byte".to_string(),
                    ));
                }
                config.read_chunk = chunk;
            }
            _ => {
                log::warn!("Unknown dummy option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

fn parse_number(key: &str, value: &str) -> Result<usize> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| DummyError::InvalidParameter(format!("Invalid {} '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftspi_core::opcodes;
    use ftspi_core::{BitOrder, Error, FtdiSpi, PinConfig, SpiConfig, SpiInterface};

    fn spi(config: DummyConfig) -> FtdiSpi<DummyMpsse> {
        let mut spi = FtdiSpi::new(DummyMpsse::new(config), &SpiConfig::default()).unwrap();
        spi.transport_mut().clear_events();
        spi
    }

    fn write_enable(spi: &mut FtdiSpi<DummyMpsse>) {
        spi.transfer_with_command_byte(opcodes::WREN, None, None, 0)
            .unwrap();
    }

    fn reads(spi: &FtdiSpi<DummyMpsse>) -> usize {
        spi.transport()
            .events()
            .iter()
            .filter(|e| matches!(e, Event::Read(_)))
            .count()
    }

    #[test]
    fn test_write_then_read_jedec_id() {
        let mut spi = spi(DummyConfig::default());
        let mut id = [0u8; 3];
        spi.write_then_read(&[opcodes::RDID], &mut id).unwrap();
        assert_eq!(id, [0xEF, 0x40, 0x18]);

        assert_eq!(
            spi.transport().events(),
            &[
                Event::GpioClear(0x08),
                Event::GpioClear(0x08),
                Event::Flush,
                Event::Store(vec![0x11, 0x00, 0x00, 0x9F]),
                Event::Flush,
                Event::Flush,
                Event::Store(vec![0x20, 0x02, 0x00]),
                Event::Read(3),
                Event::GpioSet(0x08),
                Event::GpioSet(0x08),
            ]
        );
        assert!(!spi.transport().flash().is_selected());
    }

    #[test]
    fn test_full_duplex_jedec_id() {
        let mut spi = spi(DummyConfig {
            manufacturer_id: 0xC2,
            device_id: 0x2017,
            ..DummyConfig::default()
        });
        assert_eq!(spi.read_jedec_id().unwrap(), [0xC2, 0x20, 0x17]);
    }

    #[test]
    fn test_program_poll_and_read_back() {
        let mut spi = spi(DummyConfig {
            busy_samples: 4,
            read_chunk: 16,
            ..DummyConfig::default()
        });

        let data: Vec<u8> = (0..100u8).collect();
        write_enable(&mut spi);
        let mut pp = vec![0x00, 0x10, 0x00];
        pp.extend_from_slice(&data);
        spi.transfer_with_command_byte(opcodes::PP, Some(&pp), None, pp.len())
            .unwrap();
        assert_eq!(spi.read_status().unwrap(), opcodes::SR_WIP);

        spi.transport_mut().clear_events();
        spi.poll_until(opcodes::RDSR, opcodes::SR_WIP, 0, 10).unwrap();
        // One busy sample was already used by read_status
        assert_eq!(reads(&spi), 4);

        let mut buf = vec![0u8; 100];
        spi.transport_mut().clear_events();
        spi.write_then_read(&[opcodes::READ, 0x00, 0x10, 0x00], &mut buf)
            .unwrap();
        assert_eq!(buf, data);
        // 100 bytes in 16-byte chunks
        assert_eq!(reads(&spi), 7);
    }

    #[test]
    fn test_poll_timeout_leaves_bus_idle() {
        let mut spi = spi(DummyConfig {
            busy_samples: 50,
            ..DummyConfig::default()
        });
        write_enable(&mut spi);
        spi.transfer_with_command_byte(opcodes::SE, Some(&[0x00, 0x00, 0x00]), None, 3)
            .unwrap();

        assert_eq!(
            spi.wait_ready(5),
            Err(Error::Timeout {
                last: opcodes::SR_WIP,
                iterations: 5
            })
        );
        assert!(!spi.transport().flash().is_selected());
        assert_eq!(spi.transport().gpio_value() & 0x08, 0x08);
    }

    #[test]
    fn test_erase_after_ready() {
        let mut spi = spi(DummyConfig {
            busy_samples: 1,
            ..DummyConfig::default()
        });
        spi.transport_mut().flash_mut().data_mut()[0x3000..0x4000].fill(0x5A);

        write_enable(&mut spi);
        spi.transfer_with_command_byte(opcodes::SE, Some(&[0x00, 0x30, 0x10]), None, 3)
            .unwrap();
        spi.wait_ready(10).unwrap();

        let flash = spi.transport().flash();
        assert!(flash.data()[0x3000..0x4000].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_lsb_first_reverses_wire_order() {
        let config = SpiConfig {
            bit_order: BitOrder::LsbFirst,
            ..SpiConfig::default()
        };
        let mut spi = FtdiSpi::new(DummyMpsse::new(DummyConfig::default()), &config).unwrap();

        let mut id = [0u8; 3];
        spi.write_then_read(&[opcodes::RDID.reverse_bits()], &mut id)
            .unwrap();
        assert_eq!(
            id,
            [0xEFu8.reverse_bits(), 0x40u8.reverse_bits(), 0x18u8.reverse_bits()]
        );
    }

    #[test]
    fn test_moved_chip_select() {
        let config = SpiConfig {
            pins: PinConfig::default().cs_pin(4).unwrap(),
            ..SpiConfig::default()
        };
        let dummy = DummyMpsse::new(DummyConfig {
            cs: 0x10,
            ..DummyConfig::default()
        });
        let mut spi = FtdiSpi::new(dummy, &config).unwrap();
        assert_eq!(spi.read_jedec_id().unwrap(), [0xEF, 0x40, 0x18]);
    }

    #[test]
    fn test_dropped_cs_command_still_selects() {
        let mut spi = spi(DummyConfig::default());
        spi.transport_mut().faults_mut().gpio_at = Some(0);

        // The second of the two CS commands lands, so the flash answers
        let mut id = [0u8; 3];
        spi.write_then_read(&[opcodes::RDID], &mut id).unwrap();
        assert_eq!(id, [0xEF, 0x40, 0x18]);
    }

    #[test]
    fn test_read_failure_releases_cs() {
        let mut spi = spi(DummyConfig::default());
        spi.transport_mut().faults_mut().read = true;
        let mut id = [0u8; 3];
        assert!(matches!(
            spi.write_then_read(&[opcodes::RDID], &mut id),
            Err(Error::TransportRead(_))
        ));
        assert!(!spi.transport().flash().is_selected());
        assert!(spi.transport().events().ends_with(&[
            Event::GpioSet(0x08),
            Event::GpioSet(0x08)
        ]));
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[
            ("mfr", "c2"),
            ("device", "2017"),
            ("size", "0x10000"),
            ("busy", "7"),
            ("cs", "4"),
            ("chunk", "64"),
            ("colour", "blue"),
        ])
        .unwrap();
        assert_eq!(config.manufacturer_id, 0xC2);
        assert_eq!(config.device_id, 0x2017);
        assert_eq!(config.size, 0x10000);
        assert_eq!(config.busy_samples, 7);
        assert_eq!(config.cs, 0x10);
        assert_eq!(config.read_chunk, 64);

        assert!(parse_options(&[("size", "1000")]).is_err());
        assert!(parse_options(&[("cs", "8")]).is_err());
        assert!(parse_options(&[("chunk", "0")]).is_err());
    }
}
