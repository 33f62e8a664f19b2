//! CLI argument parsing

use clap::{Parser, Subcommand};

/// Parse a string as a hex or decimal u8
pub fn parse_hex_u8(s: &str) -> Result<u8, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u8>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Bytes given on the command line as hex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

fn parse_hex_arg(s: &str) -> Result<HexBytes, String> {
    parse_hex_bytes(s).map(HexBytes)
}

/// Parse a hex byte string such as "9f", "06 02" or "0x9F0000"
pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>, String> {
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    let digits: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '_')
        .collect();

    if !digits.is_ascii() {
        return Err(format!("Invalid hex string '{}'", s));
    }
    if digits.len() % 2 != 0 {
        return Err(format!("Odd number of hex digits in '{}'", s));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| format!("Invalid hex byte '{}': {}", &digits[i..i + 2], e))
        })
        .collect()
}

const PROGRAMMER_HELP: &str =
    "Programmer to use: ftdi[:type=2232h,port=B,divisor=2,cs=3,mode=0,...] or dummy[:...]";

#[derive(Parser)]
#[command(name = "ftspi")]
#[command(author, version, about = "SPI master over FTDI MPSSE", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List supported programmers and attached FTDI devices
    List,

    /// Read the JEDEC manufacturer/device ID
    Rdid {
        /// Programmer to use
        #[arg(short, long, help = PROGRAMMER_HELP)]
        programmer: String,
    },

    /// Read status register 1
    Status {
        /// Programmer to use
        #[arg(short, long, help = PROGRAMMER_HELP)]
        programmer: String,
    },

    /// Raw transfer: clock out bytes, then clock in bytes, under one CS window
    Xfer {
        /// Programmer to use
        #[arg(short, long, help = PROGRAMMER_HELP)]
        programmer: String,

        /// Bytes to send (hex, e.g. "9f" or "03 00 10 00")
        #[arg(short, long, value_parser = parse_hex_arg)]
        write: Option<HexBytes>,

        /// Number of bytes to read after the written ones
        #[arg(short, long, default_value_t = 0)]
        read: usize,
    },

    /// Poll a status register until a masked condition holds
    Wait {
        /// Programmer to use
        #[arg(short, long, help = PROGRAMMER_HELP)]
        programmer: String,

        /// Status command opcode
        #[arg(long, value_parser = parse_hex_u8, default_value = "0x05")]
        cmd: u8,

        /// Mask applied to each sampled byte
        #[arg(long, value_parser = parse_hex_u8, default_value = "0x01")]
        mask: u8,

        /// Value the masked byte must equal
        #[arg(long, value_parser = parse_hex_u8, default_value = "0x00")]
        expected: u8,

        /// Maximum number of samples
        #[arg(long, default_value_t = 1000)]
        max_iterations: u32,
    },
}
