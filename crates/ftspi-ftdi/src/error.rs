//! Error types for the FTDI transport

use thiserror::Error;

/// Result type for FTDI operations
pub type Result<T> = std::result::Result<T, FtdiError>;

/// Errors that can occur during FTDI operations
#[derive(Debug, Error)]
pub enum FtdiError {
    /// No matching FTDI device found
    #[error("No FTDI device found")]
    DeviceNotFound,

    /// Failed to open device
    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    /// USB transfer failed
    #[error("USB transfer failed: {0}")]
    TransferFailed(String),

    /// Failed to configure device
    #[error("Failed to configure device: {0}")]
    ConfigFailed(String),

    /// Invalid device type
    #[error("Invalid device type: {0}")]
    InvalidDeviceType(String),

    /// Invalid channel/port specification
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// SPI engine setup failed
    #[error("SPI setup failed: {0}")]
    Spi(#[from] ftspi_core::Error),

    /// libftdi error
    #[error("libftdi error: {0}")]
    LibFtdi(String),

    /// USB enumeration error
    #[error("USB error: {0}")]
    UsbError(String),
}

impl From<nusb::Error> for FtdiError {
    fn from(e: nusb::Error) -> Self {
        FtdiError::UsbError(e.to_string())
    }
}

impl From<ftdi::Error> for FtdiError {
    fn from(e: ftdi::Error) -> Self {
        FtdiError::LibFtdi(e.to_string())
    }
}
