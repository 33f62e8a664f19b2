//! Recording transport for unit tests

use std::collections::VecDeque;

use crate::mpsse::{header_len, HEADER_LEN};
use crate::transport::{MpsseTransport, DEFAULT_WRITE_CHUNK};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Store(Vec<u8>),
    Flush,
    Read(usize),
    GpioSet(u8),
    GpioClear(u8),
    GpioOutput(u8),
}

pub struct MockTransport {
    pub events: Vec<Event>,
    /// Bytes handed out by `read`, then `idle_response` once exhausted
    pub responses: VecDeque<u8>,
    pub idle_response: u8,
    pub read_chunk: usize,
    pub write_chunk: usize,
    pub fail_gpio: bool,
    /// Fail the gpio call with this index (0-based, counted from now on)
    pub fail_gpio_at: Option<usize>,
    pub fail_read: bool,
    pub fail_flush: bool,
    gpio_calls: usize,
    value: u8,
    dir: u8,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            responses: VecDeque::new(),
            idle_response: 0xFF,
            read_chunk: 64,
            write_chunk: DEFAULT_WRITE_CHUNK,
            fail_gpio: false,
            fail_gpio_at: None,
            fail_read: false,
            fail_flush: false,
            gpio_calls: 0,
            value: 0,
            dir: 0,
        }
    }

    pub fn with_chunks(read_chunk: usize, write_chunk: usize) -> Self {
        Self {
            read_chunk,
            write_chunk,
            ..Self::new()
        }
    }

    pub fn level(&self, mask: u8) -> bool {
        self.value & mask != 0
    }

    pub fn is_output(&self, mask: u8) -> bool {
        self.dir & mask == mask
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
        self.gpio_calls = 0;
    }

    /// Data command headers seen in stores, as (opcode, length)
    pub fn headers(&self) -> Vec<(u8, usize)> {
        self.stores()
            .iter()
            .map(|s| {
                let header: [u8; HEADER_LEN] = [s[0], s[1], s[2]];
                (s[0], header_len(&header))
            })
            .collect()
    }

    pub fn stores(&self) -> Vec<&Vec<u8>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Store(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    fn gpio(&mut self) -> Result<(), String> {
        let index = self.gpio_calls;
        self.gpio_calls += 1;
        if self.fail_gpio || self.fail_gpio_at == Some(index) {
            return Err("gpio command dropped".to_string());
        }
        Ok(())
    }
}

impl MpsseTransport for MockTransport {
    type Error = String;

    fn store(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.events.push(Event::Store(data.to_vec()));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.fail_flush {
            return Err("bulk write failed".to_string());
        }
        self.events.push(Event::Flush);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        if self.fail_read {
            return Err("bulk read failed".to_string());
        }
        for byte in buf.iter_mut() {
            *byte = self.responses.pop_front().unwrap_or(self.idle_response);
        }
        self.events.push(Event::Read(buf.len()));
        Ok(())
    }

    fn gpio_set(&mut self, mask: u8) -> Result<(), Self::Error> {
        self.gpio()?;
        self.value |= mask;
        self.events.push(Event::GpioSet(mask));
        Ok(())
    }

    fn gpio_clear(&mut self, mask: u8) -> Result<(), Self::Error> {
        self.gpio()?;
        self.value &= !mask;
        self.events.push(Event::GpioClear(mask));
        Ok(())
    }

    fn gpio_set_output(&mut self, mask: u8) -> Result<(), Self::Error> {
        self.gpio()?;
        self.dir |= mask;
        self.events.push(Event::GpioOutput(mask));
        Ok(())
    }

    fn read_chunk_size(&self) -> usize {
        self.read_chunk
    }

    fn write_chunk_size(&self) -> usize {
        self.write_chunk
    }
}
