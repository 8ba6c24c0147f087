use thiserror::Error;

use crate::types::Button;

/// Reasons a command line is rejected. The display text doubles as the
/// outcome reported back to the sender.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Error in date or time: {0}")]
    InvalidDateTime(String),

    #[error("Unknown command parsed from email: {0}")]
    UnknownCommand(String),

    #[error("Unknown parameter parsed from email: {0}")]
    UnknownParameter(String),

    #[error("Command missing")]
    MissingParameter,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    #[error("i2c write to register {register:#04x} failed while pressing {button}: {kind:?}")]
    Bus {
        button: &'static str,
        register: u8,
        kind: embedded_hal::i2c::ErrorKind,
    },

    #[error("i2c expander init failed: {0:?}")]
    Init(embedded_hal::i2c::ErrorKind),
}

impl ActuatorError {
    pub fn bus(button: Button, register: u8, kind: embedded_hal::i2c::ErrorKind) -> Self {
        Self::Bus {
            button: button.as_str(),
            register,
            kind,
        }
    }
}

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("mailbox i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("message {0} not found")]
    NotFound(usize),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),

    #[error("notification encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
