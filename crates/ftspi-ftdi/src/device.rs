//! FTDI MPSSE transport implementation
//!
//! [`FtdiMpsse`] owns a libftdi1 device in MPSSE mode and implements
//! [`MpsseTransport`] on top of it. Outgoing command bytes are buffered
//! until a flush or a read; GPIO changes are SET_BITS_LOW commands sent
//! straight away.

use std::io::{Read, Write};
use std::time::Duration;

use ftdi::{find_by_vid_pid, BitMode, Device, Interface};
use ftspi_core::mpsse::{
    DIS_DIV_5, LOOPBACK_END, PIN_DO, PIN_SK, SEND_IMMEDIATE, SET_BITS_LOW, TCK_DIVISOR,
};
use ftspi_core::{BitOrder, ClockMode, FtdiSpi, MpsseTransport, PinConfig, SpiConfig};

use crate::error::{FtdiError, Result};
use crate::protocol::*;

/// Configuration for opening an FTDI device
#[derive(Debug, Clone)]
pub struct FtdiConfig {
    /// Device type (determines VID/PID and buffer size)
    pub device_type: FtdiDeviceType,
    /// Interface/channel to use (A, B, C, D)
    pub interface: FtdiInterface,
    /// Clock divisor (2-65534, must be even)
    /// SPI clock = 60 MHz / divisor
    pub divisor: u16,
    /// SPI pin masks
    pub pins: PinConfig,
    /// Initial SPI clock mode
    pub mode: ClockMode,
    /// Bit order
    pub bit_order: BitOrder,
    /// USB serial number filter (optional)
    pub serial: Option<String>,
}

impl Default for FtdiConfig {
    /// FT2232H (0403:6010) on channel B
    fn default() -> Self {
        FtdiConfig {
            interface: FtdiInterface::B,
            ..Self::for_device(FtdiDeviceType::Ft2232H)
        }
    }
}

impl FtdiConfig {
    /// Create a new config for a specific device type on channel A
    pub fn for_device(device_type: FtdiDeviceType) -> Self {
        FtdiConfig {
            device_type,
            interface: FtdiInterface::A,
            divisor: DEFAULT_DIVISOR,
            pins: PinConfig::default(),
            mode: ClockMode::default(),
            bit_order: BitOrder::default(),
            serial: None,
        }
    }

    /// Set the interface/channel
    pub fn interface(mut self, interface: FtdiInterface) -> Result<Self> {
        // Validate that the interface is available on this device
        let max_channel = self.device_type.channel_count();
        if interface.index() >= max_channel {
            return Err(FtdiError::InvalidChannel(format!(
                "Channel {} not available on {} (max: {})",
                interface.letter(),
                self.device_type.name(),
                (b'A' + max_channel - 1) as char
            )));
        }
        self.interface = interface;
        Ok(self)
    }

    /// Set the clock divisor
    pub fn divisor(mut self, divisor: u16) -> Result<Self> {
        if divisor < 2 || !divisor.is_multiple_of(2) {
            return Err(FtdiError::InvalidParameter(format!(
                "Invalid divisor {}: must be even, between 2 and 65534",
                divisor
            )));
        }
        self.divisor = divisor;
        Ok(self)
    }

    /// Move chip select to ADBUS`bit`
    pub fn cs_pin(mut self, bit: u8) -> Result<Self> {
        self.pins = self.pins.cs_pin(bit).map_err(invalid_parameter)?;
        Ok(self)
    }

    /// Route HOLD# to ADBUS`bit`
    pub fn holdn_pin(mut self, bit: u8) -> Result<Self> {
        self.pins = self.pins.holdn_pin(bit).map_err(invalid_parameter)?;
        Ok(self)
    }

    /// Route WP# to ADBUS`bit`
    pub fn wpn_pin(mut self, bit: u8) -> Result<Self> {
        self.pins = self.pins.wpn_pin(bit).map_err(invalid_parameter)?;
        Ok(self)
    }

    /// Set the initial SPI clock mode
    pub fn mode(mut self, mode: ClockMode) -> Self {
        self.mode = mode;
        self
    }

    /// Calculate the SPI clock frequency in MHz
    pub fn spi_clock_mhz(&self) -> f64 {
        60.0 / self.divisor as f64
    }

    /// SPI engine settings carried by this config
    pub fn spi_config(&self) -> SpiConfig {
        SpiConfig {
            pins: self.pins,
            mode: self.mode,
            bit_order: self.bit_order,
        }
    }

    /// Bytes sent right after entering MPSSE mode
    ///
    /// Selects the 60 MHz base clock, programs the divisor, disables
    /// loopback and drives CS high with SK, DO and CS as outputs.
    fn init_commands(&self) -> (Vec<u8>, u8, u8) {
        let pins = self.pins.resolved();
        let value = pins.cs;
        let dir = PIN_SK | PIN_DO | pins.cs;

        // Divisor value for MPSSE is (divisor / 2 - 1)
        let divisor_val = self.divisor / 2 - 1;

        let buf = vec![
            DIS_DIV_5,
            TCK_DIVISOR,
            (divisor_val & 0xFF) as u8,
            ((divisor_val >> 8) & 0xFF) as u8,
            LOOPBACK_END,
            SET_BITS_LOW,
            value,
            dir,
        ];
        (buf, value, dir)
    }
}

fn invalid_parameter(e: ftspi_core::Error) -> FtdiError {
    FtdiError::InvalidParameter(e.to_string())
}

/// MPSSE transport over libftdi1
pub struct FtdiMpsse {
    /// libftdi device context
    device: Device,
    /// Commands waiting for the next flush
    pending: Vec<u8>,
    /// Cached low-byte GPIO value
    value: u8,
    /// Cached low-byte GPIO direction
    dir: u8,
    /// Largest read-back chunk
    read_chunk: usize,
}

impl FtdiMpsse {
    /// Open an FTDI device with the given configuration
    pub fn open(config: &FtdiConfig) -> Result<Self> {
        log::info!(
            "Opening FTDI {} channel {}",
            config.device_type.name(),
            config.interface.letter()
        );

        let interface = match config.interface {
            FtdiInterface::A => Interface::A,
            FtdiInterface::B => Interface::B,
            FtdiInterface::C => Interface::C,
            FtdiInterface::D => Interface::D,
        };

        let vid = config.device_type.vendor_id();
        let pid = config.device_type.product_id();

        if let Some(serial) = &config.serial {
            require_serial(vid, pid, serial)?;
        }

        log::debug!("Looking for FTDI device VID={:04X} PID={:04X}", vid, pid);

        let mut device = find_by_vid_pid(vid, pid)
            .interface(interface)
            .open()
            .map_err(|e| FtdiError::OpenFailed(format!("{}", e)))?;

        log::debug!("Opened FTDI device VID={:04X} PID={:04X}", vid, pid);

        device.usb_reset()?;

        // Set latency timer (2ms for best performance)
        device
            .set_latency_timer(2)
            .map_err(|e| FtdiError::ConfigFailed(format!("Set latency timer failed: {}", e)))?;

        device
            .set_bitmode(0x00, BitMode::Mpsse)
            .map_err(|e| FtdiError::ConfigFailed(format!("Set MPSSE mode failed: {}", e)))?;

        let (init, value, dir) = config.init_commands();
        let mut mpsse = FtdiMpsse {
            device,
            pending: Vec::with_capacity(config.device_type.buffer_size()),
            value,
            dir,
            read_chunk: config.device_type.buffer_size(),
        };

        log::debug!(
            "Initializing MPSSE: divisor={} value=0x{:02X} dir=0x{:02X}",
            config.divisor,
            value,
            dir
        );
        mpsse.send(&init)?;

        log::info!(
            "FTDI configured for SPI at {:.2} MHz",
            config.spi_clock_mhz()
        );

        Ok(mpsse)
    }

    /// Send data to the FTDI device
    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.device
            .write_all(data)
            .map_err(|e| FtdiError::TransferFailed(format!("Write failed: {}", e)))?;
        log::trace!("Sent {} bytes", data.len());
        Ok(())
    }

    /// Receive exactly `buf.len()` bytes
    fn recv(&mut self, buf: &mut [u8]) -> Result<()> {
        let len = buf.len();
        let mut total = 0;

        while total < len {
            match self.device.read(&mut buf[total..]) {
                Ok(0) => {
                    // No data available, wait a bit
                    std::thread::sleep(Duration::from_micros(100));
                }
                Ok(n) => {
                    total += n;
                }
                Err(e) => {
                    return Err(FtdiError::TransferFailed(format!("Read failed: {}", e)));
                }
            }
        }

        log::trace!("Received {} bytes", total);
        Ok(())
    }

    fn set_bits_low(&mut self) -> Result<()> {
        let cmd = [SET_BITS_LOW, self.value, self.dir];
        self.send(&cmd)
    }

    /// Release I/O pins (set all as inputs)
    fn release_pins(&mut self) -> Result<()> {
        let buf = [SET_BITS_LOW, 0x00, 0x00];
        self.send(&buf)
    }
}

impl Drop for FtdiMpsse {
    fn drop(&mut self) {
        // Release I/O pins on close
        if let Err(e) = self.release_pins() {
            log::warn!("Failed to release pins on close: {}", e);
        }
    }
}

impl MpsseTransport for FtdiMpsse {
    type Error = FtdiError;

    fn store(&mut self, data: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let result = self
            .device
            .write_all(&self.pending)
            .map_err(|e| FtdiError::TransferFailed(format!("Write failed: {}", e)));
        log::trace!("Flushed {} bytes", self.pending.len());
        self.pending.clear();
        result
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        self.pending.push(SEND_IMMEDIATE);
        self.flush()?;
        self.recv(buf)
    }

    fn gpio_set(&mut self, mask: u8) -> Result<()> {
        self.value |= mask;
        self.set_bits_low()
    }

    fn gpio_clear(&mut self, mask: u8) -> Result<()> {
        self.value &= !mask;
        self.set_bits_low()
    }

    fn gpio_set_output(&mut self, mask: u8) -> Result<()> {
        self.dir |= mask;
        self.set_bits_low()
    }

    fn read_chunk_size(&self) -> usize {
        self.read_chunk
    }
}

/// Open the device and wrap it in a configured SPI engine
pub fn open_spi(config: &FtdiConfig) -> Result<FtdiSpi<FtdiMpsse>> {
    let mpsse = FtdiMpsse::open(config)?;
    Ok(FtdiSpi::new(mpsse, &config.spi_config())?)
}

/// Fail unless a device with this VID/PID and serial number is attached
///
/// libftdi opens the first VID/PID match, so with several cables
/// attached the filter only guarantees presence.
fn require_serial(vid: u16, pid: u16, serial: &str) -> Result<()> {
    let mut matches = 0;
    for dev in nusb::list_devices()? {
        if dev.vendor_id() == vid && dev.product_id() == pid {
            matches += 1;
            if dev.serial_number() == Some(serial) {
                if matches > 1 {
                    log::warn!("Several FTDI devices attached; opening the first match");
                }
                return Ok(());
            }
        }
    }
    log::error!("No FTDI device with serial '{}' found", serial);
    Err(FtdiError::DeviceNotFound)
}

/// List available FTDI devices
pub fn list_devices() -> Result<Vec<FtdiDeviceInfo>> {
    let mut devices = Vec::new();

    for dev in nusb::list_devices()? {
        let vid = dev.vendor_id();
        let pid = dev.product_id();

        if let Some(info) = get_device_info(vid, pid) {
            devices.push(FtdiDeviceInfo {
                bus: dev.bus_number(),
                address: dev.device_address(),
                vendor_id: vid,
                product_id: pid,
                vendor_name: info.vendor_name,
                device_name: info.device_name,
                serial: dev.serial_number().map(str::to_string),
            });
        }
    }

    Ok(devices)
}

/// Information about a connected FTDI device
#[derive(Debug, Clone)]
pub struct FtdiDeviceInfo {
    /// USB bus number
    pub bus: u8,
    /// USB device address
    pub address: u8,
    /// Vendor ID
    pub vendor_id: u16,
    /// Product ID
    pub product_id: u16,
    /// Vendor name
    pub vendor_name: &'static str,
    /// Device name
    pub device_name: &'static str,
    /// Serial number (if available)
    pub serial: Option<String>,
}

impl std::fmt::Display for FtdiDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} at bus {} address {} ({:04X}:{:04X})",
            self.vendor_name,
            self.device_name,
            self.bus,
            self.address,
            self.vendor_id,
            self.product_id
        )?;
        if let Some(serial) = &self.serial {
            write!(f, " serial {}", serial)?;
        }
        Ok(())
    }
}

/// Parse programmer options
///
/// Format: "type=<type>,port=<A|B|C|D>,divisor=<N>,serial=<serial>,cs=<bit>,
/// holdn=<bit>,wpn=<bit>,mode=<0-3>,lsb=<bool>"
pub fn parse_options(options: &[(&str, &str)]) -> Result<FtdiConfig> {
    let mut config = FtdiConfig::default();

    for (key, value) in options {
        match *key {
            "type" => {
                config.device_type = FtdiDeviceType::parse(value).ok_or_else(|| {
                    FtdiError::InvalidDeviceType(format!(
                        "Unknown device type '{}'. Valid types: 2232h, 4232h, 232h, 4233h, \
                         tumpa, tumpalite",
                        value
                    ))
                })?;
                // Single-channel parts only have channel A
                if config.interface.index() >= config.device_type.channel_count() {
                    config.interface = FtdiInterface::A;
                }
            }
            "port" | "channel" => {
                let mut chars = value.chars();
                let interface = match (chars.next(), chars.next()) {
                    (Some(c), None) => FtdiInterface::from_char(c),
                    _ => None,
                }
                .ok_or_else(|| {
                    FtdiError::InvalidChannel(format!(
                        "Invalid channel '{}': must be A, B, C, or D",
                        value
                    ))
                })?;
                config = config.interface(interface)?;
            }
            "divisor" => {
                let divisor: u16 = value.parse().map_err(|_| {
                    FtdiError::InvalidParameter(format!("Invalid divisor '{}'", value))
                })?;
                config = config.divisor(divisor)?;
            }
            "serial" => {
                config.serial = Some(value.to_string());
            }
            "cs" => config = config.cs_pin(parse_bit(key, value)?)?,
            "holdn" => config = config.holdn_pin(parse_bit(key, value)?)?,
            "wpn" => config = config.wpn_pin(parse_bit(key, value)?)?,
            "mode" => {
                let mode: u8 = value.parse().map_err(|_| {
                    FtdiError::InvalidParameter(format!("Invalid SPI mode '{}'", value))
                })?;
                config.mode = ClockMode::try_from(mode).map_err(invalid_parameter)?;
            }
            "lsb" => {
                config.bit_order = match *value {
                    "1" | "yes" | "true" | "on" => BitOrder::LsbFirst,
                    "0" | "no" | "false" | "off" => BitOrder::MsbFirst,
                    _ => {
                        return Err(FtdiError::InvalidParameter(format!(
                            "Invalid lsb value '{}': must be a boolean",
                            value
                        )))
                    }
                };
            }
            _ => {
                log::warn!("Unknown FTDI option: {}={}", key, value);
            }
        }
    }

    // Catch overlapping pins here rather than after the device is open
    config
        .pins
        .resolved()
        .validate()
        .map_err(invalid_parameter)?;

    Ok(config)
}

fn parse_bit(key: &str, value: &str) -> Result<u8> {
    value
        .parse()
        .map_err(|_| FtdiError::InvalidParameter(format!("Invalid {} pin '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ft2232h_channel_b() {
        let config = FtdiConfig::default();
        assert_eq!(config.device_type, FtdiDeviceType::Ft2232H);
        assert_eq!(config.device_type.vendor_id(), 0x0403);
        assert_eq!(config.device_type.product_id(), 0x6010);
        assert_eq!(config.interface, FtdiInterface::B);
        assert_eq!(config.divisor, 2);
        assert_eq!(config.pins, PinConfig::default());
    }

    #[test]
    fn test_init_commands() {
        let config = FtdiConfig::default().divisor(6).unwrap();
        let (buf, value, dir) = config.init_commands();
        assert_eq!(
            buf,
            vec![0x8A, 0x86, 0x02, 0x00, 0x85, 0x80, 0x08, 0x0B]
        );
        assert_eq!(value, 0x08);
        assert_eq!(dir, 0x0B);

        let config = FtdiConfig::default().cs_pin(4).unwrap();
        let (buf, _, _) = config.init_commands();
        assert_eq!(&buf[5..], &[0x80, 0x10, 0x13]);
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[
            ("type", "4232h"),
            ("port", "c"),
            ("divisor", "10"),
            ("cs", "4"),
            ("holdn", "5"),
            ("wpn", "6"),
            ("mode", "3"),
            ("lsb", "yes"),
            ("serial", "FT123"),
        ])
        .unwrap();
        assert_eq!(config.device_type, FtdiDeviceType::Ft4232H);
        assert_eq!(config.interface, FtdiInterface::C);
        assert_eq!(config.divisor, 10);
        assert_eq!(config.pins.cs, 0x10);
        assert_eq!(config.pins.holdn, 0x20);
        assert_eq!(config.pins.wpn, 0x40);
        assert_eq!(config.mode, ClockMode::Mode3);
        assert_eq!(config.bit_order, BitOrder::LsbFirst);
        assert_eq!(config.serial.as_deref(), Some("FT123"));
        assert!((config.spi_clock_mhz() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_options_single_channel_type() {
        let config = parse_options(&[("type", "232h")]).unwrap();
        assert_eq!(config.interface, FtdiInterface::A);
        assert!(matches!(
            parse_options(&[("type", "232h"), ("port", "B")]),
            Err(FtdiError::InvalidChannel(_))
        ));
    }

    #[test]
    fn test_parse_options_rejects_bad_values() {
        assert!(matches!(
            parse_options(&[("type", "ft9000")]),
            Err(FtdiError::InvalidDeviceType(_))
        ));
        assert!(matches!(
            parse_options(&[("port", "AB")]),
            Err(FtdiError::InvalidChannel(_))
        ));
        assert!(matches!(
            parse_options(&[("divisor", "3")]),
            Err(FtdiError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("mode", "4")]),
            Err(FtdiError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("cs", "2")]),
            Err(FtdiError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("holdn", "3")]),
            Err(FtdiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_parse_options_ignores_unknown_keys() {
        let config = parse_options(&[("speed", "fast")]).unwrap();
        assert_eq!(config.device_type, FtdiDeviceType::Ft2232H);
    }
}
