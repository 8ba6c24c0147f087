use serde::{Deserialize, Serialize};

/// Whole degrees Celsius as shown on the Chronotherm display.
pub type Temperature = i32;

pub const NO_BUTTON: u8 = 0x00;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Button {
    StartProgram,
    HoldTemp,
    Warmer,
    Cooler,
}

impl Button {
    /// Bit on the port expander wired across this button's contacts.
    pub fn code(self) -> u8 {
        match self {
            Self::StartProgram => 0x01,
            Self::HoldTemp => 0x02,
            Self::Warmer => 0x04,
            Self::Cooler => 0x08,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartProgram => "START_PROGRAM",
            Self::HoldTemp => "HOLD_TEMP",
            Self::Warmer => "WARMER",
            Self::Cooler => "COOLER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThermostatMode {
    /// Device follows its internal week program.
    RunProgram,
    /// Device holds one constant temperature.
    HoldConstant,
}

impl ThermostatMode {
    pub fn button(self) -> Button {
        match self {
            Self::RunProgram => Button::StartProgram,
            Self::HoldConstant => Button::HoldTemp,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RunProgram => "RUN_PROGRAM",
            Self::HoldConstant => "HOLD_CONSTANT",
        }
    }
}
