//! SPI clock modes and bit order
//!
//! MPSSE edge names are physical: `WRITE_NEG` shifts data out on the
//! falling SK edge and `READ_NEG` samples on the falling edge. The idle
//! level of SK is not part of the opcode, it is whatever the GPIO value
//! byte holds between commands, so it is tracked separately.
//!
//! | Mode | Idle | Write edge    | Read edge     |
//! |------|------|---------------|---------------|
//! | 0    | low  | `WRITE_NEG`   | rising        |
//! | 1    | low  | rising        | `READ_NEG`    |
//! | 2    | high | rising        | `READ_NEG`    |
//! | 3    | high | `WRITE_NEG`   | rising        |

use core::fmt;

use crate::error::Error;
use crate::mpsse::MpsseFlags;

/// SPI clock polarity/phase mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClockMode {
    /// CPOL=0, CPHA=0: idle low, data set up before the first (rising) edge
    #[default]
    Mode0,
    /// CPOL=0, CPHA=1: idle low, write on rising, read on falling
    Mode1,
    /// CPOL=1, CPHA=0: idle high, data set up before the first (falling) edge
    Mode2,
    /// CPOL=1, CPHA=1: idle high, write on falling, read on rising
    Mode3,
}

impl ClockMode {
    /// Clock polarity: true = idle high
    pub const fn cpol(self) -> bool {
        matches!(self, Self::Mode2 | Self::Mode3)
    }

    /// Clock phase: true = sample on second edge
    pub const fn cpha(self) -> bool {
        matches!(self, Self::Mode1 | Self::Mode3)
    }

    /// Edge flag OR'd into write opcodes
    pub const fn write_edge(self) -> MpsseFlags {
        match self {
            Self::Mode0 | Self::Mode3 => MpsseFlags::WRITE_NEG,
            Self::Mode1 | Self::Mode2 => MpsseFlags::empty(),
        }
    }

    /// Edge flag OR'd into read opcodes
    pub const fn read_edge(self) -> MpsseFlags {
        match self {
            Self::Mode0 | Self::Mode3 => MpsseFlags::empty(),
            Self::Mode1 | Self::Mode2 => MpsseFlags::READ_NEG,
        }
    }

    /// Idle level of the clock line, expressed in the GPIO byte
    ///
    /// Returns `clk_mask` for idle-high modes and 0 otherwise.
    pub const fn clock_idle(self, clk_mask: u8) -> u8 {
        if self.cpol() {
            clk_mask
        } else {
            0
        }
    }

    /// Mode number (0-3)
    pub const fn number(self) -> u8 {
        match self {
            Self::Mode0 => 0,
            Self::Mode1 => 1,
            Self::Mode2 => 2,
            Self::Mode3 => 3,
        }
    }
}

impl TryFrom<u8> for ClockMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Mode0),
            1 => Ok(Self::Mode1),
            2 => Ok(Self::Mode2),
            3 => Ok(Self::Mode3),
            other => Err(Error::InvalidMode(other)),
        }
    }
}

impl fmt::Display for ClockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mode {}", self.number())
    }
}

/// Bit order of shifted bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitOrder {
    /// Most significant bit first (standard for SPI flash)
    #[default]
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

impl BitOrder {
    /// Flag OR'd into every data opcode
    pub const fn flag(self) -> MpsseFlags {
        match self {
            Self::MsbFirst => MpsseFlags::empty(),
            Self::LsbFirst => MpsseFlags::LSB,
        }
    }
}
