//! Upward interface used by programming protocols
//!
//! Higher layers (flash programmers, FPGA configuration loaders) only
//! need three primitives: a command byte with optional payload, a raw
//! transfer, and a status wait. Buffers may be longer than `len`; only
//! the first `len` bytes take part.

use crate::error::Result;
use crate::opcodes;
use crate::spi::{head, head_mut, FtdiSpi};
use crate::transport::MpsseTransport;

/// SPI master as seen by a programming protocol
pub trait SpiInterface {
    /// Send `cmd` followed by `len` bytes of `tx` (zeros if absent),
    /// reading the `len` bytes that follow `cmd` into `rx`
    fn spi_put_cmd(
        &mut self,
        cmd: u8,
        tx: Option<&[u8]>,
        rx: Option<&mut [u8]>,
        len: usize,
    ) -> Result<()>;

    /// Clock `len` bytes out of `tx` and/or into `rx`
    fn spi_put(&mut self, tx: Option<&[u8]>, rx: Option<&mut [u8]>, len: usize) -> Result<()>;

    /// Issue `cmd` and sample until `(status & mask) == cond`
    fn spi_wait(&mut self, cmd: u8, mask: u8, cond: u8, max_iterations: u32) -> Result<()>;

    /// Read the 3-byte JEDEC manufacturer/device ID
    fn read_jedec_id(&mut self) -> Result<[u8; 3]> {
        let mut id = [0u8; 3];
        self.spi_put_cmd(opcodes::RDID, None, Some(&mut id), 3)?;
        Ok(id)
    }

    /// Read status register 1
    fn read_status(&mut self) -> Result<u8> {
        let mut sr = [0u8; 1];
        self.spi_put_cmd(opcodes::RDSR, None, Some(&mut sr), 1)?;
        Ok(sr[0])
    }

    /// Wait for the write-in-progress bit to clear
    fn wait_ready(&mut self, max_iterations: u32) -> Result<()> {
        self.spi_wait(opcodes::RDSR, opcodes::SR_WIP, 0, max_iterations)
    }
}

impl<T: MpsseTransport> SpiInterface for FtdiSpi<T> {
    fn spi_put_cmd(
        &mut self,
        cmd: u8,
        tx: Option<&[u8]>,
        rx: Option<&mut [u8]>,
        len: usize,
    ) -> Result<()> {
        self.transfer_with_command_byte(cmd, tx, rx, len)
    }

    fn spi_put(&mut self, tx: Option<&[u8]>, rx: Option<&mut [u8]>, len: usize) -> Result<()> {
        let tx = tx.map(|t| head(t, len)).transpose()?;
        let rx = rx.map(|r| head_mut(r, len)).transpose()?;
        self.transfer(tx, rx)
    }

    fn spi_wait(&mut self, cmd: u8, mask: u8, cond: u8, max_iterations: u32) -> Result<()> {
        self.poll_until(cmd, mask, cond, max_iterations)
    }
}
