//! Transport trait: the raw MPSSE byte engine below the SPI layer
//!
//! Implementations own the USB side: they buffer outgoing command bytes,
//! push them out as bulk transfers, read back responses and drive the
//! low-byte GPIO lines. The SPI engine never talks USB directly.

use core::fmt;

/// Chunk size for write-only transfers when the transport has no opinion
///
/// Nothing is read back for these, so only the outgoing USB buffer
/// bounds the chunk.
pub const DEFAULT_WRITE_CHUNK: usize = 4096;

/// Raw MPSSE command transport
pub trait MpsseTransport {
    /// Transport-level error
    type Error: fmt::Display;

    /// Append bytes to the outgoing command buffer
    fn store(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Send everything buffered by [`store`](Self::store)
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Flush pending commands, then read exactly `buf.len()` bytes
    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Drive the lines in `mask` high
    fn gpio_set(&mut self, mask: u8) -> Result<(), Self::Error>;

    /// Drive the lines in `mask` low
    fn gpio_clear(&mut self, mask: u8) -> Result<(), Self::Error>;

    /// Configure the lines in `mask` as outputs
    fn gpio_set_output(&mut self, mask: u8) -> Result<(), Self::Error>;

    /// Largest chunk that may be clocked in one go when reading back
    fn read_chunk_size(&self) -> usize;

    /// Largest chunk for write-only transfers
    fn write_chunk_size(&self) -> usize {
        DEFAULT_WRITE_CHUNK
    }
}

impl<T: MpsseTransport + ?Sized> MpsseTransport for &mut T {
    type Error = T::Error;

    fn store(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        (**self).store(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(buf)
    }

    fn gpio_set(&mut self, mask: u8) -> Result<(), Self::Error> {
        (**self).gpio_set(mask)
    }

    fn gpio_clear(&mut self, mask: u8) -> Result<(), Self::Error> {
        (**self).gpio_clear(mask)
    }

    fn gpio_set_output(&mut self, mask: u8) -> Result<(), Self::Error> {
        (**self).gpio_set_output(mask)
    }

    fn read_chunk_size(&self) -> usize {
        (**self).read_chunk_size()
    }

    fn write_chunk_size(&self) -> usize {
        (**self).write_chunk_size()
    }
}
