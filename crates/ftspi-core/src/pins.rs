//! Low-byte GPIO pin assignment
//!
//! ```text
//! ADBUS0  SK   clock (fixed)
//! ADBUS1  DO   MOSI (fixed)
//! ADBUS2  DI   MISO (fixed)
//! ADBUS3  CS   chip select (default)
//! ADBUS4+ free for CS, HOLD#, WP#
//! ```

use crate::error::{Error, Result};
use crate::mpsse::{PIN_DI, PIN_DO, PIN_SK};

/// Default CS mask (ADBUS3)
pub const DEFAULT_CS: u8 = 1 << 3;

/// Default clock mask (ADBUS0)
pub const DEFAULT_CLK: u8 = PIN_SK;

/// Pin masks within the low GPIO byte
///
/// A zero field means "use the default" for CS and clock, and "not
/// connected" for HOLD# and WP#.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    /// Clock mask; the MPSSE engine only clocks ADBUS0
    pub clk: u8,
    /// Chip select mask (active low)
    pub cs: u8,
    /// HOLD# mask, held high while idle
    pub holdn: u8,
    /// WP# mask, held high while idle
    pub wpn: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            clk: DEFAULT_CLK,
            cs: DEFAULT_CS,
            holdn: 0,
            wpn: 0,
        }
    }
}

impl PinConfig {
    /// Move chip select to ADBUS`bit`
    pub fn cs_pin(mut self, bit: u8) -> Result<Self> {
        self.cs = pin_mask("cs", bit)?;
        Ok(self)
    }

    /// Route HOLD# to ADBUS`bit`
    pub fn holdn_pin(mut self, bit: u8) -> Result<Self> {
        self.holdn = pin_mask("holdn", bit)?;
        Ok(self)
    }

    /// Route WP# to ADBUS`bit`
    pub fn wpn_pin(mut self, bit: u8) -> Result<Self> {
        self.wpn = pin_mask("wpn", bit)?;
        Ok(self)
    }

    /// Replace zero CS/clock masks by their defaults
    pub fn resolved(self) -> Self {
        Self {
            clk: if self.clk == 0 { DEFAULT_CLK } else { self.clk },
            cs: if self.cs == 0 { DEFAULT_CS } else { self.cs },
            ..self
        }
    }

    /// Check that every mask is a single bit and that no two overlap
    ///
    /// Call on a [`resolved`](Self::resolved) configuration.
    pub fn validate(&self) -> Result<()> {
        if self.clk != PIN_SK {
            return Err(Error::InvalidPins(format!(
                "clock is fixed to ADBUS0 by the MPSSE engine (got 0x{:02X})",
                self.clk
            )));
        }

        let mut used = PIN_SK | PIN_DO | PIN_DI;
        for (name, mask, optional) in [
            ("cs", self.cs, false),
            ("holdn", self.holdn, true),
            ("wpn", self.wpn, true),
        ] {
            if optional && mask == 0 {
                continue;
            }
            if mask.count_ones() != 1 {
                return Err(Error::InvalidPins(format!(
                    "{} mask 0x{:02X} must select exactly one pin",
                    name, mask
                )));
            }
            if used & mask != 0 {
                return Err(Error::InvalidPins(format!(
                    "{} mask 0x{:02X} overlaps another pin",
                    name, mask
                )));
            }
            used |= mask;
        }

        Ok(())
    }

    /// Lines driven high when the bus is idle: CS plus HOLD# and WP#
    pub fn released(&self) -> u8 {
        self.cs | self.holdn | self.wpn
    }
}

fn pin_mask(name: &str, bit: u8) -> Result<u8> {
    if bit > 7 {
        return Err(Error::InvalidPins(format!(
            "{} pin {} out of range (0-7)",
            name, bit
        )));
    }
    Ok(1 << bit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let pins = PinConfig::default();
        assert_eq!(pins.cs, 0x08);
        assert_eq!(pins.clk, 0x01);
        assert_eq!(pins.released(), 0x08);
        assert!(pins.validate().is_ok());
    }

    #[test]
    fn test_zero_fields_resolve_to_defaults() {
        let pins = PinConfig {
            clk: 0,
            cs: 0,
            holdn: 0x40,
            wpn: 0,
        }
        .resolved();
        assert_eq!(pins.clk, DEFAULT_CLK);
        assert_eq!(pins.cs, DEFAULT_CS);
        assert_eq!(pins.holdn, 0x40);
        assert_eq!(pins.released(), 0x48);
    }

    #[test]
    fn test_builder() {
        let pins = PinConfig::default()
            .cs_pin(4)
            .unwrap()
            .holdn_pin(6)
            .unwrap()
            .wpn_pin(7)
            .unwrap();
        assert_eq!(pins.cs, 0x10);
        assert_eq!(pins.released(), 0xD0);
        assert!(pins.validate().is_ok());
        assert!(PinConfig::default().cs_pin(8).is_err());
    }

    #[test]
    fn test_rejects_overlap() {
        let pins = PinConfig::default().holdn_pin(3).unwrap();
        assert!(matches!(pins.validate(), Err(Error::InvalidPins(_))));

        // CS on a data line
        let pins = PinConfig::default().cs_pin(1).unwrap();
        assert!(pins.validate().is_err());
    }

    #[test]
    fn test_rejects_moved_clock() {
        let pins = PinConfig {
            clk: 0x80,
            ..PinConfig::default()
        };
        assert!(pins.validate().is_err());
    }

    #[test]
    fn test_rejects_multi_bit_mask() {
        let pins = PinConfig {
            cs: 0x18,
            ..PinConfig::default()
        };
        assert!(pins.validate().is_err());
    }
}
