//! Chunked MPSSE data transfers
//!
//! Every transfer is split into chunks that fit both the engine's
//! command buffer and the transport's limit. Each chunk is one data
//! command (3-byte header + payload) submitted as a single store, so a
//! write-only chunk costs one USB bulk transfer.

use super::{head, head_mut, transport_read, transport_write, CsMode, FtdiSpi, MAX_CHUNK};
use crate::error::{Error, Result};
use crate::mpsse::{data_header, MpsseFlags};
use crate::transport::MpsseTransport;

impl<T: MpsseTransport> FtdiSpi<T> {
    /// Clock `write` out and/or clock bytes into `read`
    ///
    /// Buffers of equal length are clocked full duplex. Otherwise `write`
    /// is clocked out first and `read` filled afterwards, still within a
    /// single chip select window. In [`CsMode::Auto`] chip select is
    /// asserted once before the first chunk and released once after the
    /// last one, also when the transfer fails. Chip select failures are
    /// logged and do not change the result.
    pub fn transfer(&mut self, write: Option<&[u8]>, read: Option<&mut [u8]>) -> Result<()> {
        let write_len = write.map_or(0, <[u8]>::len);
        let read_len = read.as_deref().map_or(0, <[u8]>::len);
        if write_len == 0 && read_len == 0 {
            return Err(Error::EmptyTransfer);
        }

        self.with_auto_cs(|spi| {
            if write_len == read_len {
                return spi.clock_chunks(None, write, read, write_len);
            }

            if let Some(tx) = write.filter(|w| !w.is_empty()) {
                spi.clock_chunks(None, Some(tx), None, write_len)?;
            }
            match read.filter(|r| !r.is_empty()) {
                Some(rx) => spi.clock_chunks(None, None, Some(rx), read_len),
                None => Ok(()),
            }
        })
    }

    /// Send `cmd` followed by `len` bytes of `write` (zeros if absent),
    /// optionally reading back
    ///
    /// `len + 1` bytes are clocked. When `read` is given the byte clocked
    /// in during `cmd` is dropped, so `read` receives exactly the `len`
    /// bytes that followed it. Buffers longer than `len` are only used up
    /// to `len`.
    pub fn transfer_with_command_byte(
        &mut self,
        cmd: u8,
        write: Option<&[u8]>,
        read: Option<&mut [u8]>,
        len: usize,
    ) -> Result<()> {
        let write = write.map(|w| head(w, len)).transpose()?;
        let read = read.map(|r| head_mut(r, len)).transpose()?;

        self.with_auto_cs(|spi| spi.clock_chunks(Some(cmd), write, read, len))
    }

    /// Send `tx` write-only, then read `rx`, under one chip select window
    ///
    /// Chip select is switched to manual for the duration and restored to
    /// [`CsMode::Auto`] afterwards. Empty buffers skip their phase.
    pub fn write_then_read(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        self.set_cs_mode(CsMode::Manual);
        let _ = self.assert_cs();

        let mut result = Ok(());
        if !tx.is_empty() {
            result = self.transfer(Some(tx), None);
            if let Err(e) = &result {
                log::error!("write phase failed ({} bytes): {}", tx.len(), e);
            }
        }
        if result.is_ok() && !rx.is_empty() {
            result = self.transfer(None, Some(rx));
            if let Err(e) = &result {
                log::error!("read phase failed ({} bytes): {}", rx.len(), e);
            }
        }

        let _ = self.deassert_cs();
        self.set_cs_mode(CsMode::Auto);
        result
    }

    /// Run `f` inside a chip select window when the policy is automatic
    fn with_auto_cs(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        let auto = self.cs_mode == CsMode::Auto;
        if auto {
            // Already logged by the CS controller
            let _ = self.assert_cs();
        }

        let result = f(self);

        if auto {
            let _ = self.deassert_cs();
        }
        result
    }

    /// Opcode for a data command with the current edges and bit order
    fn data_opcode(&self, writing: bool, reading: bool) -> MpsseFlags {
        let mut opcode = MpsseFlags::empty();
        if reading {
            opcode |= MpsseFlags::DO_READ | self.rd_mode;
        }
        if writing {
            opcode |= MpsseFlags::DO_WRITE | self.wr_mode;
        }
        opcode | self.bit_order.flag()
    }

    fn chunk_limit(&self, reading: bool) -> usize {
        let limit = if reading {
            self.transport.read_chunk_size()
        } else {
            self.transport.write_chunk_size()
        };
        limit.clamp(1, MAX_CHUNK)
    }

    /// Clock `len` data bytes, preceded by `cmd` when given
    ///
    /// With a command byte the phase always writes; missing write data is
    /// clocked as zeros and the response byte of `cmd` is dropped.
    fn clock_chunks(
        &mut self,
        cmd: Option<u8>,
        write: Option<&[u8]>,
        mut read: Option<&mut [u8]>,
        len: usize,
    ) -> Result<()> {
        // Whatever is still buffered must hit the wire before our header,
        // or the response bytes would be misattributed.
        self.transport.flush().map_err(transport_write)?;

        let prefix = usize::from(cmd.is_some());
        let total = len + prefix;
        let reading = read.is_some();
        let writing = cmd.is_some() || write.is_some();
        let limit = self.chunk_limit(reading);
        let opcode = self.data_opcode(writing, reading);

        let mut offset = 0;
        while offset < total {
            let chunk = (total - offset).min(limit);
            // Data bytes covered by this chunk, command byte excluded
            let span = offset.saturating_sub(prefix)..offset + chunk - prefix;
            let lead = cmd.filter(|_| offset == 0);

            self.buf.clear();
            self.buf
                .extend_from_slice(&data_header(opcode, chunk))
                .map_err(|_| overflow())?;
            if let Some(c) = lead {
                self.buf.push(c).map_err(|_| overflow())?;
            }
            match write {
                Some(tx) => self
                    .buf
                    .extend_from_slice(&tx[span.clone()])
                    .map_err(|_| overflow())?,
                None if writing => {
                    let filled = self.buf.len() + span.len();
                    self.buf.resize(filled, 0).map_err(|_| overflow())?;
                }
                None => {}
            }

            self.transport.store(&self.buf).map_err(|e| {
                log::error!("store failed at offset {}: {}", offset, e);
                transport_write(e)
            })?;

            match read.as_deref_mut() {
                Some(rx) if lead.is_some() => {
                    // Land the chunk in the command buffer to drop its
                    // first byte
                    self.buf.clear();
                    self.buf.resize(chunk, 0).map_err(|_| overflow())?;
                    self.transport.read(&mut self.buf[..]).map_err(|e| {
                        log::error!("read failed at offset {}: {}", offset, e);
                        transport_read(e)
                    })?;
                    rx[span].copy_from_slice(&self.buf[1..]);
                }
                Some(rx) => self.transport.read(&mut rx[span]).map_err(|e| {
                    log::error!("read failed at offset {}: {}", offset, e);
                    transport_read(e)
                })?,
                None => self.transport.flush().map_err(|e| {
                    log::error!("write failed at offset {}: {}", offset, e);
                    transport_write(e)
                })?,
            }

            log::trace!(
                "chunk opcode=0x{:02X} offset={} len={}",
                opcode.bits(),
                offset,
                chunk
            );
            offset += chunk;
        }

        Ok(())
    }
}

fn overflow() -> Error {
    Error::TransportWrite("command buffer overflow".to_string())
}
