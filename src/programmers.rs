//! Programmer registration and dispatch
//!
//! Every programmer ends up as an `FtdiSpi` over some MPSSE transport;
//! commands only see it through [`SpiInterface`].

use ftspi_core::SpiInterface;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory MPSSE engine with an emulated SPI flash",
    });

    #[cfg(feature = "ftdi")]
    programmers.push(ProgrammerInfo {
        name: "ftdi",
        aliases: &["ft2232_spi", "ft4232_spi"],
        description: "FTDI MPSSE cable (type=<dev>,port=<A-D>,divisor=<N>,cs=<bit>,mode=<0-3>)",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:12} - {}\n", p.name, p.description));
    }
    help
}

/// Resolve a programmer name or alias to its canonical name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.iter().any(|a| *a == name))
        .map(|p| p.name)
}

/// Execute a function with the specified programmer
///
/// The programmer string can be just the name (e.g., "ftdi") or include
/// parameters (e.g., "ftdi:type=232h,divisor=6").
#[allow(unused_variables)]
pub fn with_programmer<F>(programmer: &str, f: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut dyn SpiInterface) -> Result<(), Box<dyn std::error::Error>>,
{
    let (name, options) = parse_programmer_string(programmer);

    let canonical_name = match find_programmer(name) {
        Some(n) => n,
        None => return Err(unknown_programmer_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            use ftspi_core::{FtdiSpi, SpiConfig};
            use ftspi_dummy::{parse_options, DummyMpsse};

            let config = parse_options(&options)
                .map_err(|e| format!("Invalid dummy parameters: {}", e))?;
            let spi_config = SpiConfig {
                pins: ftspi_core::PinConfig::default()
                    .cs_pin(config.cs.trailing_zeros() as u8)?,
                ..SpiConfig::default()
            };

            log::info!("Opening dummy programmer...");
            let mut spi = FtdiSpi::new(DummyMpsse::new(config), &spi_config)?;
            f(&mut spi)
        }

        #[cfg(feature = "ftdi")]
        "ftdi" => {
            use ftspi_ftdi::{open_spi, parse_options};

            log::info!("Opening FTDI programmer...");

            let config =
                parse_options(&options).map_err(|e| format!("Invalid FTDI parameters: {}", e))?;

            let mut spi = open_spi(&config).map_err(|e| {
                format!(
                    "Failed to open FTDI device: {}\n\
                     Make sure the device is connected and you have permissions.\n\
                     You may need to unbind the kernel ftdi_sio driver:\n\
                     echo -n '<bus>-<port>' | sudo tee /sys/bus/usb/drivers/ftdi_sio/unbind",
                    e
                )
            })?;

            f(&mut spi)
        }

        _ => Err(unknown_programmer_error(name)),
    }
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| {
                let pair = opt.split_once('=');
                if pair.is_none() && !opt.is_empty() {
                    log::warn!("Ignoring malformed option '{}' (expected key=value)", opt);
                }
                pair
            })
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

fn unknown_programmer_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown programmer: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.push_str("\nUse 'ftspi list' for more details");
    msg.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_string() {
        assert_eq!(parse_programmer_string("ftdi"), ("ftdi", vec![]));
        assert_eq!(
            parse_programmer_string("ftdi:type=232h,divisor=6"),
            ("ftdi", vec![("type", "232h"), ("divisor", "6")])
        );
        assert_eq!(
            parse_programmer_string("dummy:busy=2,bogus"),
            ("dummy", vec![("busy", "2")])
        );
    }

    #[test]
    fn test_unknown_programmer() {
        assert!(find_programmer("ch341a").is_none());
        assert!(with_programmer("ch341a", |_| Ok(())).is_err());
    }

    #[cfg(feature = "ftdi")]
    #[test]
    fn test_ftdi_aliases() {
        assert_eq!(find_programmer("ft2232_spi"), Some("ftdi"));
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_programmer_reads_id() {
        let mut id = [0u8; 3];
        with_programmer("dummy:mfr=c2,device=2017,cs=4", |spi| {
            id = spi.read_jedec_id()?;
            Ok(())
        })
        .unwrap();
        assert_eq!(id, [0xC2, 0x20, 0x17]);
    }
}
