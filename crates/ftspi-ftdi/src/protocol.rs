//! FTDI cable catalog
//!
//! VID/PID, channel count and on-chip buffer size per supported device.

/// FTDI vendor ID
pub const FTDI_VID: u16 = 0x0403;

/// FT2232H product ID (dual channel)
pub const FTDI_FT2232H_PID: u16 = 0x6010;

/// FT4232H product ID (quad channel)
pub const FTDI_FT4232H_PID: u16 = 0x6011;

/// FT232H product ID (single channel)
pub const FTDI_FT232H_PID: u16 = 0x6014;

/// FT4233H product ID (quad channel)
pub const FTDI_FT4233H_PID: u16 = 0x6041;

/// TIAO TUMPA product ID
pub const TIAO_TUMPA_PID: u16 = 0x8A98;

/// TIAO TUMPA Lite product ID
pub const TIAO_TUMPA_LITE_PID: u16 = 0x8A99;

/// Default clock divisor (30 MHz at 60 MHz base clock)
pub const DEFAULT_DIVISOR: u16 = 2;

/// Supported FTDI device types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FtdiDeviceType {
    /// FT2232H (dual channel, 60 MHz)
    #[default]
    Ft2232H,
    /// FT4232H (quad channel, 60 MHz)
    Ft4232H,
    /// FT232H (single channel, 60 MHz)
    Ft232H,
    /// FT4233H (quad channel, 60 MHz)
    Ft4233H,
    /// TIAO TUMPA (FT2232H based)
    Tumpa,
    /// TIAO TUMPA Lite (FT232H based)
    TumpaLite,
}

impl FtdiDeviceType {
    /// Get the vendor ID for this device type
    pub fn vendor_id(&self) -> u16 {
        FTDI_VID
    }

    /// Get the product ID for this device type
    pub fn product_id(&self) -> u16 {
        match self {
            FtdiDeviceType::Ft2232H => FTDI_FT2232H_PID,
            FtdiDeviceType::Ft4232H => FTDI_FT4232H_PID,
            FtdiDeviceType::Ft232H => FTDI_FT232H_PID,
            FtdiDeviceType::Ft4233H => FTDI_FT4233H_PID,
            FtdiDeviceType::Tumpa => TIAO_TUMPA_PID,
            FtdiDeviceType::TumpaLite => TIAO_TUMPA_LITE_PID,
        }
    }

    /// Get the number of channels for this device type
    pub fn channel_count(&self) -> u8 {
        match self {
            FtdiDeviceType::Ft232H | FtdiDeviceType::TumpaLite => 1,
            FtdiDeviceType::Ft2232H | FtdiDeviceType::Tumpa => 2,
            FtdiDeviceType::Ft4232H | FtdiDeviceType::Ft4233H => 4,
        }
    }

    /// Per-channel receive buffer of the chip
    ///
    /// A read-back chunk larger than this would stall the engine until
    /// the host drains it.
    pub fn buffer_size(&self) -> usize {
        match self {
            FtdiDeviceType::Ft232H | FtdiDeviceType::TumpaLite => 1024,
            FtdiDeviceType::Ft2232H | FtdiDeviceType::Tumpa => 4096,
            FtdiDeviceType::Ft4232H | FtdiDeviceType::Ft4233H => 2048,
        }
    }

    /// Parse device type from string
    pub fn parse(s: &str) -> Option<Self> {
        let s_lower = s.to_lowercase();
        match s_lower.as_str() {
            "2232h" | "ft2232h" => Some(FtdiDeviceType::Ft2232H),
            "4232h" | "ft4232h" => Some(FtdiDeviceType::Ft4232H),
            "232h" | "ft232h" => Some(FtdiDeviceType::Ft232H),
            "4233h" | "ft4233h" => Some(FtdiDeviceType::Ft4233H),
            "tumpa" => Some(FtdiDeviceType::Tumpa),
            "tumpalite" => Some(FtdiDeviceType::TumpaLite),
            _ => None,
        }
    }

    /// Get the name of this device type
    pub fn name(&self) -> &'static str {
        match self {
            FtdiDeviceType::Ft2232H => "FT2232H",
            FtdiDeviceType::Ft4232H => "FT4232H",
            FtdiDeviceType::Ft232H => "FT232H",
            FtdiDeviceType::Ft4233H => "FT4233H",
            FtdiDeviceType::Tumpa => "TUMPA",
            FtdiDeviceType::TumpaLite => "TUMPA Lite",
        }
    }
}

/// FTDI interface/channel selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FtdiInterface {
    /// Channel A
    #[default]
    A,
    /// Channel B
    B,
    /// Channel C
    C,
    /// Channel D
    D,
}

impl FtdiInterface {
    /// Parse interface from character
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(FtdiInterface::A),
            'B' => Some(FtdiInterface::B),
            'C' => Some(FtdiInterface::C),
            'D' => Some(FtdiInterface::D),
            _ => None,
        }
    }

    /// Get the interface index (0-3)
    pub fn index(&self) -> u8 {
        match self {
            FtdiInterface::A => 0,
            FtdiInterface::B => 1,
            FtdiInterface::C => 2,
            FtdiInterface::D => 3,
        }
    }

    /// Get the channel letter
    pub fn letter(&self) -> char {
        (b'A' + self.index()) as char
    }
}

/// Supported FTDI devices for enumeration
pub struct SupportedDevice {
    /// USB vendor ID
    pub vendor_id: u16,
    /// USB product ID
    pub product_id: u16,
    /// Vendor name
    pub vendor_name: &'static str,
    /// Device name
    pub device_name: &'static str,
}

/// List of all supported FTDI devices
pub const SUPPORTED_DEVICES: &[SupportedDevice] = &[
    SupportedDevice {
        vendor_id: FTDI_VID,
        product_id: FTDI_FT2232H_PID,
        vendor_name: "FTDI",
        device_name: "FT2232H",
    },
    SupportedDevice {
        vendor_id: FTDI_VID,
        product_id: FTDI_FT4232H_PID,
        vendor_name: "FTDI",
        device_name: "FT4232H",
    },
    SupportedDevice {
        vendor_id: FTDI_VID,
        product_id: FTDI_FT232H_PID,
        vendor_name: "FTDI",
        device_name: "FT232H",
    },
    SupportedDevice {
        vendor_id: FTDI_VID,
        product_id: FTDI_FT4233H_PID,
        vendor_name: "FTDI",
        device_name: "FT4233H",
    },
    SupportedDevice {
        vendor_id: FTDI_VID,
        product_id: TIAO_TUMPA_PID,
        vendor_name: "TIAO",
        device_name: "USB Multi-Protocol Adapter",
    },
    SupportedDevice {
        vendor_id: FTDI_VID,
        product_id: TIAO_TUMPA_LITE_PID,
        vendor_name: "TIAO",
        device_name: "USB Multi-Protocol Adapter Lite",
    },
];

/// Get device info for a VID/PID pair
pub fn get_device_info(vid: u16, pid: u16) -> Option<&'static SupportedDevice> {
    SUPPORTED_DEVICES
        .iter()
        .find(|d| d.vendor_id == vid && d.product_id == pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_type() {
        assert_eq!(FtdiDeviceType::parse("FT2232H"), Some(FtdiDeviceType::Ft2232H));
        assert_eq!(FtdiDeviceType::parse("232h"), Some(FtdiDeviceType::Ft232H));
        assert_eq!(FtdiDeviceType::parse("ft2232"), None);
    }

    #[test]
    fn test_catalog_covers_every_type() {
        for ty in [
            FtdiDeviceType::Ft2232H,
            FtdiDeviceType::Ft4232H,
            FtdiDeviceType::Ft232H,
            FtdiDeviceType::Ft4233H,
            FtdiDeviceType::Tumpa,
            FtdiDeviceType::TumpaLite,
        ] {
            assert!(get_device_info(ty.vendor_id(), ty.product_id()).is_some(), "{}", ty.name());
            assert!(ty.buffer_size() >= 1024);
        }
    }

    #[test]
    fn test_interface_letters() {
        assert_eq!(FtdiInterface::from_char('b'), Some(FtdiInterface::B));
        assert_eq!(FtdiInterface::D.letter(), 'D');
        assert_eq!(FtdiInterface::from_char('E'), None);
    }
}
