//! In-memory MPSSE engine
//!
//! [`DummyMpsse`] decodes the byte stream an SPI engine submits, keeps the
//! low GPIO byte, and clocks data commands through a [`DummyFlash`] while
//! its chip select line is low. Every transport call is recorded as an
//! [`Event`].

use std::collections::VecDeque;

use ftspi_core::mpsse::{
    MpsseFlags, DIS_DIV_5, GET_BITS_LOW, HEADER_LEN, LOOPBACK_END, SEND_IMMEDIATE, SET_BITS_HIGH,
    SET_BITS_LOW, TCK_DIVISOR,
};
use ftspi_core::MpsseTransport;

use crate::error::{DummyError, Result};
use crate::flash::{DummyConfig, DummyFlash};

/// One recorded transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Bytes appended to the command buffer
    Store(Vec<u8>),
    /// Command buffer executed
    Flush,
    /// Bytes read back
    Read(usize),
    /// Lines driven high
    GpioSet(u8),
    /// Lines driven low
    GpioClear(u8),
    /// Lines made outputs
    GpioOutput(u8),
}

/// Failures to inject into the next transport calls
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Fail the GPIO call with this index (0-based, counted from reset)
    pub gpio_at: Option<usize>,
    /// Fail every read
    pub read: bool,
    /// Fail every flush
    pub flush: bool,
}

/// MPSSE engine with an emulated flash on the bus
pub struct DummyMpsse {
    flash: DummyFlash,
    events: Vec<Event>,
    faults: Faults,
    gpio_calls: usize,
    /// Submitted but not yet executed
    pending: Vec<u8>,
    /// Bytes clocked in, waiting to be read
    rx: VecDeque<u8>,
    value: u8,
    dir: u8,
    cs: u8,
    read_chunk: usize,
}

impl DummyMpsse {
    /// Create an engine with a freshly erased flash
    pub fn new(config: DummyConfig) -> Self {
        let cs = config.cs;
        let read_chunk = config.read_chunk;
        Self {
            flash: DummyFlash::new(config),
            events: Vec::new(),
            faults: Faults::default(),
            gpio_calls: 0,
            pending: Vec::new(),
            rx: VecDeque::new(),
            // Pulled up until driven
            value: 0xFF,
            dir: 0x00,
            cs,
            read_chunk,
        }
    }

    /// The attached flash
    pub fn flash(&self) -> &DummyFlash {
        &self.flash
    }

    /// Mutable access to the attached flash
    pub fn flash_mut(&mut self) -> &mut DummyFlash {
        &mut self.flash
    }

    /// Recorded transport calls
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Forget recorded calls and restart the GPIO call count
    pub fn clear_events(&mut self) {
        self.events.clear();
        self.gpio_calls = 0;
    }

    /// Failure injection knobs
    pub fn faults_mut(&mut self) -> &mut Faults {
        &mut self.faults
    }

    /// Low GPIO byte as currently driven
    pub fn gpio_value(&self) -> u8 {
        self.value
    }

    /// Low GPIO direction byte
    pub fn gpio_dir(&self) -> u8 {
        self.dir
    }

    fn gpio(&mut self, event: Event, value: u8, dir: u8) -> Result<()> {
        let index = self.gpio_calls;
        self.gpio_calls += 1;
        if self.faults.gpio_at == Some(index) {
            return Err(DummyError::Injected("gpio"));
        }
        self.set_bits_low(value, dir);
        self.events.push(event);
        Ok(())
    }

    fn set_bits_low(&mut self, value: u8, dir: u8) {
        let was_low = self.cs_low();
        self.value = value;
        self.dir = dir;
        match (was_low, self.cs_low()) {
            (false, true) => self.flash.select(),
            (true, false) => self.flash.deselect(),
            _ => {}
        }
    }

    fn cs_low(&self) -> bool {
        self.dir & self.cs != 0 && self.value & self.cs == 0
    }

    /// Run every pending command
    fn execute(&mut self) -> Result<()> {
        let stream = std::mem::take(&mut self.pending);
        let mut pos = 0;

        while pos < stream.len() {
            let opcode = stream[pos];
            pos += 1;
            match opcode {
                SET_BITS_LOW => {
                    let args = take(&stream, &mut pos, 2)?;
                    self.set_bits_low(args[0], args[1]);
                }
                // High byte is not wired to anything
                SET_BITS_HIGH => {
                    take(&stream, &mut pos, 2)?;
                }
                GET_BITS_LOW => self.rx.push_back(self.value),
                TCK_DIVISOR => {
                    take(&stream, &mut pos, 2)?;
                }
                LOOPBACK_END | SEND_IMMEDIATE | DIS_DIV_5 => {}
                op if op & 0x80 == 0 => {
                    let flags = MpsseFlags::from_bits_truncate(op);
                    // Bit-length and TMS commands have no SPI meaning
                    if flags.contains(MpsseFlags::BITMODE) || op & 0x40 != 0 {
                        return Err(DummyError::UnsupportedCommand(op));
                    }
                    let header = take(&stream, &mut pos, HEADER_LEN - 1)?;
                    let len = u16::from_le_bytes([header[0], header[1]]) as usize + 1;
                    self.clock(flags, &stream, &mut pos, len)?;
                }
                op => return Err(DummyError::UnsupportedCommand(op)),
            }
        }

        Ok(())
    }

    fn clock(&mut self, flags: MpsseFlags, stream: &[u8], pos: &mut usize, len: usize) -> Result<()> {
        let payload = if flags.contains(MpsseFlags::DO_WRITE) {
            Some(take(stream, pos, len)?)
        } else {
            None
        };
        let lsb = flags.contains(MpsseFlags::LSB);
        let selected = self.cs_low();

        for i in 0..len {
            let mut mosi = payload.map_or(0xFF, |p| p[i]);
            if lsb {
                mosi = mosi.reverse_bits();
            }
            let mut miso = if selected {
                self.flash.exchange(mosi)
            } else {
                0xFF
            };
            if lsb {
                miso = miso.reverse_bits();
            }
            if flags.contains(MpsseFlags::DO_READ) {
                self.rx.push_back(miso);
            }
        }

        Ok(())
    }
}

fn take<'a>(stream: &'a [u8], pos: &mut usize, n: usize) -> Result<&'a [u8]> {
    let bytes = stream
        .get(*pos..*pos + n)
        .ok_or(DummyError::Truncated)?;
    *pos += n;
    Ok(bytes)
}

impl MpsseTransport for DummyMpsse {
    type Error = DummyError;

    fn store(&mut self, data: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(data);
        self.events.push(Event::Store(data.to_vec()));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.faults.flush {
            self.pending.clear();
            return Err(DummyError::Injected("flush"));
        }
        self.execute()?;
        self.events.push(Event::Flush);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.faults.read {
            self.pending.clear();
            return Err(DummyError::Injected("read"));
        }
        self.execute()?;
        if self.rx.len() < buf.len() {
            return Err(DummyError::ShortRead {
                wanted: buf.len(),
                available: self.rx.len(),
            });
        }
        for byte in buf.iter_mut() {
            *byte = self.rx.pop_front().unwrap_or(0xFF);
        }
        self.events.push(Event::Read(buf.len()));
        Ok(())
    }

    fn gpio_set(&mut self, mask: u8) -> Result<()> {
        self.gpio(Event::GpioSet(mask), self.value | mask, self.dir)
    }

    fn gpio_clear(&mut self, mask: u8) -> Result<()> {
        self.gpio(Event::GpioClear(mask), self.value & !mask, self.dir)
    }

    fn gpio_set_output(&mut self, mask: u8) -> Result<()> {
        self.gpio(Event::GpioOutput(mask), self.value, self.dir | mask)
    }

    fn read_chunk_size(&self) -> usize {
        self.read_chunk
    }
}
