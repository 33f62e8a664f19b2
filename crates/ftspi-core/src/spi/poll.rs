//! Status register polling

use super::{CsMode, FtdiSpi};
use crate::error::{Error, Result};
use crate::transport::MpsseTransport;

impl<T: MpsseTransport> FtdiSpi<T> {
    /// Send `cmd` once, then sample one byte at a time until
    /// `(byte & mask) == expected`
    ///
    /// Chip select stays asserted for the whole poll, so the device keeps
    /// streaming its status register. At most `max_iterations` bytes are
    /// sampled (zero counts as one); when none matches, the last sampled
    /// byte is returned in [`Error::Timeout`]. Chip select is released and
    /// the policy restored to [`CsMode::Auto`] on every path.
    pub fn poll_until(&mut self, cmd: u8, mask: u8, expected: u8, max_iterations: u32) -> Result<()> {
        let max_iterations = max_iterations.max(1);

        self.set_cs_mode(CsMode::Manual);
        let _ = self.assert_cs();

        let result = self.sample_until(cmd, mask, expected, max_iterations);

        let _ = self.deassert_cs();
        self.set_cs_mode(CsMode::Auto);
        result
    }

    fn sample_until(&mut self, cmd: u8, mask: u8, expected: u8, max_iterations: u32) -> Result<()> {
        self.transfer(Some(&[cmd]), None)?;

        let mut sample = [0u8; 1];
        let mut iterations = 0;
        loop {
            self.transfer(None, Some(&mut sample))?;
            iterations += 1;

            let last = sample[0];
            log::trace!("poll 0x{:02X}: 0x{:02X} (#{})", cmd, last, iterations);

            if last & mask == expected {
                return Ok(());
            }
            if iterations >= max_iterations {
                log::warn!(
                    "poll 0x{:02X}: 0x{:02X} & 0x{:02X} != 0x{:02X} after {} samples",
                    cmd,
                    last,
                    mask,
                    expected,
                    iterations
                );
                return Err(Error::Timeout { last, iterations });
            }
        }
    }
}
