//! Chip select control
//!
//! CS is active low. Every level change is sent as two independent GPIO
//! commands; a single dropped command on the transport leaves the line
//! in the right state, and the change is only reported as successful
//! when both went through.

use super::{CsMode, FtdiSpi};
use crate::error::{Error, Result};
use crate::transport::MpsseTransport;

impl<T: MpsseTransport> FtdiSpi<T> {
    /// Select who drives chip select
    pub fn set_cs_mode(&mut self, mode: CsMode) {
        self.cs_mode = mode;
    }

    /// Current chip select policy
    pub fn cs_mode(&self) -> CsMode {
        self.cs_mode
    }

    /// Whether chip select is currently asserted
    pub fn is_cs_asserted(&self) -> bool {
        self.cs_asserted
    }

    /// Drive CS low
    pub fn assert_cs(&mut self) -> Result<()> {
        self.cs_asserted = true;
        self.update_cs()
    }

    /// Drive CS, HOLD# and WP# back high
    pub fn deassert_cs(&mut self) -> Result<()> {
        self.cs_asserted = false;
        self.update_cs()
    }

    fn update_cs(&mut self) -> Result<()> {
        let first = self.issue_cs();
        let second = self.issue_cs();

        match first.and(second) {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!(
                    "CS update ({}) failed: {}",
                    if self.cs_asserted { "assert" } else { "release" },
                    e
                );
                Err(Error::CsUpdate(e.to_string()))
            }
        }
    }

    fn issue_cs(&mut self) -> core::result::Result<(), T::Error> {
        if self.cs_asserted {
            self.transport.gpio_clear(self.pins.cs)
        } else {
            self.transport.gpio_set(self.pins.released())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::{Event, MockTransport};
    use super::super::SpiConfig;
    use super::*;
    use crate::pins::PinConfig;

    fn spi(pins: PinConfig) -> FtdiSpi<MockTransport> {
        let config = SpiConfig {
            pins,
            ..SpiConfig::default()
        };
        let mut spi = FtdiSpi::new(MockTransport::new(), &config).unwrap();
        spi.transport_mut().clear_events();
        spi
    }

    #[test]
    fn test_assert_issues_clear_twice() {
        let mut spi = spi(PinConfig::default());
        spi.assert_cs().unwrap();
        assert!(spi.is_cs_asserted());
        assert!(!spi.transport().level(0x08));
        assert_eq!(
            spi.transport().events,
            vec![Event::GpioClear(0x08), Event::GpioClear(0x08)]
        );
    }

    #[test]
    fn test_deassert_releases_aux_lines() {
        let pins = PinConfig::default()
            .holdn_pin(5)
            .unwrap()
            .wpn_pin(6)
            .unwrap();
        let mut spi = spi(pins);
        spi.assert_cs().unwrap();
        spi.transport_mut().clear_events();

        spi.deassert_cs().unwrap();
        assert!(!spi.is_cs_asserted());
        assert_eq!(
            spi.transport().events,
            vec![Event::GpioSet(0x68), Event::GpioSet(0x68)]
        );
    }

    #[test]
    fn test_single_dropped_command_is_reported() {
        let mut spi = spi(PinConfig::default());
        spi.transport_mut().fail_gpio_at = Some(1);

        assert!(matches!(spi.assert_cs(), Err(Error::CsUpdate(_))));
        // The first command still landed
        assert!(!spi.transport().level(0x08));
        assert!(spi.is_cs_asserted());
    }

    #[test]
    fn test_cs_mode_round_trip() {
        let mut spi = spi(PinConfig::default());
        assert_eq!(spi.cs_mode(), CsMode::Auto);
        spi.set_cs_mode(CsMode::Manual);
        assert_eq!(spi.cs_mode(), CsMode::Manual);
    }
}
