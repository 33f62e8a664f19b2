//! Emulated SPI NOR flash
//!
//! Bytes are exchanged one at a time while chip select is low, the way a
//! real part sees them on the wire. Write-type commands take effect when
//! chip select is released.

use ftspi_core::opcodes;

/// Smallest erase unit (SE)
pub const SECTOR_SIZE: usize = 4096;

/// Configuration for the dummy flash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyConfig {
    /// JEDEC manufacturer ID
    pub manufacturer_id: u8,
    /// JEDEC device ID
    pub device_id: u16,
    /// Flash size in bytes
    pub size: usize,
    /// Page size for programming
    pub page_size: usize,
    /// Status samples that report WIP after a program or erase
    pub busy_samples: u32,
    /// Chip select mask on the low GPIO byte
    pub cs: u8,
    /// Largest read-back chunk the engine accepts
    pub read_chunk: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: 0xEF, // Winbond
            device_id: 0x4018,     // W25Q128FV
            size: 1024 * 1024,
            page_size: 256,
            busy_samples: 3,
            cs: 0x08,
            read_chunk: 4096,
        }
    }
}

/// Command decoded from the first byte of a chip select window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Rdid,
    Rdsr,
    Wren,
    Wrdi,
    Read,
    PageProgram,
    SectorErase,
    ChipErase,
    Unknown(u8),
}

impl Command {
    fn decode(opcode: u8) -> Self {
        match opcode {
            opcodes::RDID => Command::Rdid,
            opcodes::RDSR => Command::Rdsr,
            opcodes::WREN => Command::Wren,
            opcodes::WRDI => Command::Wrdi,
            opcodes::READ => Command::Read,
            opcodes::PP => Command::PageProgram,
            opcodes::SE => Command::SectorErase,
            opcodes::CE => Command::ChipErase,
            other => Command::Unknown(other),
        }
    }

    fn takes_address(self) -> bool {
        matches!(
            self,
            Command::Read | Command::PageProgram | Command::SectorErase
        )
    }
}

/// In-memory SPI NOR flash
#[derive(Debug)]
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    write_enabled: bool,
    /// Remaining status samples reporting WIP
    busy: u32,
    selected: bool,
    /// Bytes clocked in the current window
    count: usize,
    command: Option<Command>,
    address: usize,
    /// Page program payload collected in the current window
    program: Vec<u8>,
}

impl DummyFlash {
    /// Create a new dummy flash with the given configuration, erased
    ///
    /// The size is rounded up to a power of two of at least one sector
    /// and the page size to a power of two no larger than a sector, so
    /// pages and sectors always tile the array.
    pub fn new(mut config: DummyConfig) -> Self {
        let size = config.size.max(SECTOR_SIZE).next_power_of_two();
        let page_size = config.page_size.clamp(1, SECTOR_SIZE).next_power_of_two();
        if size != config.size || page_size != config.page_size {
            log::warn!(
                "dummy flash: using size {} / page {} instead of {} / {}",
                size,
                page_size,
                config.size,
                config.page_size
            );
            config.size = size;
            config.page_size = page_size;
        }

        let data = vec![0xFF; config.size];
        Self {
            config,
            data,
            write_enabled: false,
            busy: 0,
            selected: false,
            count: 0,
            command: None,
            address: 0,
            program: Vec::new(),
        }
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Current status register value
    pub fn status(&self) -> u8 {
        let mut sr = 0;
        if self.busy > 0 {
            sr |= opcodes::SR_WIP;
        }
        if self.write_enabled {
            sr |= opcodes::SR_WEL;
        }
        sr
    }

    /// Whether chip select is currently low
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Chip select went low
    pub fn select(&mut self) {
        self.selected = true;
        self.count = 0;
        self.command = None;
        self.address = 0;
        self.program.clear();
    }

    /// Chip select went high: commit the command of this window
    pub fn deselect(&mut self) {
        if !self.selected {
            return;
        }
        self.selected = false;

        let Some(command) = self.command.take() else {
            return;
        };
        let address_complete = self.count > 3;

        match command {
            Command::Wren if self.busy == 0 => self.write_enabled = true,
            Command::Wrdi if self.busy == 0 => self.write_enabled = false,
            Command::PageProgram if address_complete => self.page_program(),
            Command::SectorErase if address_complete => self.erase(SECTOR_SIZE),
            Command::ChipErase => self.erase(self.data.len()),
            _ => {}
        }
    }

    /// Clock one byte in and one byte out
    pub fn exchange(&mut self, mosi: u8) -> u8 {
        let index = self.count;
        self.count += 1;

        if index == 0 {
            let command = Command::decode(mosi);
            if let Command::Unknown(op) = command {
                log::debug!("dummy flash: unsupported opcode 0x{:02X}", op);
            }
            self.command = Some(command);
            return 0xFF;
        }

        let Some(command) = self.command else {
            return 0xFF;
        };

        if command.takes_address() && index <= 3 {
            self.address = (self.address << 8) | mosi as usize;
            return 0xFF;
        }

        match command {
            Command::Rdid => match index {
                1 => self.config.manufacturer_id,
                2 => (self.config.device_id >> 8) as u8,
                3 => self.config.device_id as u8,
                _ => 0xFF,
            },
            Command::Rdsr => self.sample_status(),
            Command::Read => {
                let offset = (self.address + index - 4) % self.data.len();
                self.data[offset]
            }
            Command::PageProgram => {
                if self.program.len() < self.config.page_size {
                    self.program.push(mosi);
                }
                0xFF
            }
            _ => 0xFF,
        }
    }

    fn sample_status(&mut self) -> u8 {
        let sr = self.status();
        if self.busy > 0 {
            self.busy -= 1;
        }
        sr
    }

    fn page_program(&mut self) {
        if !self.write_enabled || self.busy > 0 {
            log::debug!("dummy flash: page program ignored (WEL clear or busy)");
            return;
        }

        let page_size = self.config.page_size;
        let base = self.address % self.data.len();
        let page = base - base % page_size;
        // Programming wraps within the page and can only clear bits
        for (i, &byte) in self.program.iter().enumerate() {
            let offset = page + (base - page + i) % page_size;
            self.data[offset] &= byte;
        }

        self.finish_write();
    }

    fn erase(&mut self, erase_size: usize) {
        if !self.write_enabled || self.busy > 0 {
            log::debug!("dummy flash: erase ignored (WEL clear or busy)");
            return;
        }

        let base = self.address % self.data.len();
        let start = base - base % erase_size;
        let end = (start + erase_size).min(self.data.len());
        self.data[start..end].fill(0xFF);

        self.finish_write();
    }

    fn finish_write(&mut self) {
        self.write_enabled = false;
        self.busy = self.config.busy_samples;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(flash: &mut DummyFlash, bytes: &[u8]) -> Vec<u8> {
        flash.select();
        let out = bytes.iter().map(|&b| flash.exchange(b)).collect();
        flash.deselect();
        out
    }

    fn small() -> DummyFlash {
        DummyFlash::new(DummyConfig {
            size: 64 * 1024,
            busy_samples: 2,
            ..DummyConfig::default()
        })
    }

    #[test]
    fn test_degenerate_geometry_is_normalized() {
        let mut flash = DummyFlash::new(DummyConfig {
            size: 0,
            page_size: 0,
            busy_samples: 0,
            ..DummyConfig::default()
        });
        assert_eq!(flash.data().len(), SECTOR_SIZE);
        assert_eq!(flash.config().page_size, 1);

        // Addresses wrap, and a one-byte page keeps only the first byte
        command(&mut flash, &[opcodes::WREN]);
        command(&mut flash, &[opcodes::PP, 0x00, 0x10, 0x05, 0x12, 0x34]);
        assert_eq!(flash.data()[5], 0x12);
        assert_eq!(flash.data()[6], 0xFF);
        assert_eq!(command(&mut flash, &[opcodes::READ, 0x00, 0x10, 0x05, 0])[4], 0x12);

        let flash = DummyFlash::new(DummyConfig {
            size: 5000,
            page_size: 300,
            ..DummyConfig::default()
        });
        assert_eq!(flash.data().len(), 8192);
        assert_eq!(flash.config().page_size, 512);
    }

    #[test]
    fn test_read_jedec_id() {
        let mut flash = small();
        assert_eq!(
            command(&mut flash, &[0x9F, 0, 0, 0]),
            vec![0xFF, 0xEF, 0x40, 0x18]
        );
    }

    #[test]
    fn test_program_needs_write_enable() {
        let mut flash = small();
        command(&mut flash, &[0x02, 0x00, 0x10, 0x00, 0x12]);
        assert_eq!(flash.data()[0x1000], 0xFF);

        command(&mut flash, &[0x06]);
        assert_eq!(flash.status(), 0x02);
        command(&mut flash, &[0x02, 0x00, 0x10, 0x00, 0x12, 0x34]);
        assert_eq!(&flash.data()[0x1000..0x1002], &[0x12, 0x34]);
        assert_eq!(flash.status(), 0x01);
    }

    #[test]
    fn test_status_streams_until_ready() {
        let mut flash = small();
        command(&mut flash, &[0x06]);
        command(&mut flash, &[0xC7]);
        assert_eq!(
            command(&mut flash, &[0x05, 0, 0, 0]),
            vec![0xFF, 0x01, 0x01, 0x00]
        );
    }

    #[test]
    fn test_program_wraps_in_page() {
        let mut flash = small();
        command(&mut flash, &[0x06]);
        command(&mut flash, &[0x02, 0x00, 0x00, 0xFF, 0xA0, 0xA1]);
        assert_eq!(flash.data()[0xFF], 0xA0);
        assert_eq!(flash.data()[0x00], 0xA1);
        assert_eq!(flash.data()[0x100], 0xFF);
    }

    #[test]
    fn test_sector_erase() {
        let mut flash = small();
        flash.data_mut()[0x1000..0x2001].fill(0x00);
        command(&mut flash, &[0x06]);
        command(&mut flash, &[0x20, 0x00, 0x1F, 0xFF]);
        assert!(flash.data()[0x1000..0x2000].iter().all(|&b| b == 0xFF));
        assert_eq!(flash.data()[0x2000], 0x00);
    }

    #[test]
    fn test_commands_ignored_while_busy() {
        let mut flash = small();
        command(&mut flash, &[0x06]);
        command(&mut flash, &[0xC7]);
        command(&mut flash, &[0x06]);
        assert_eq!(flash.status() & 0x02, 0);
    }
}
