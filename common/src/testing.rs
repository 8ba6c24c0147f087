use embedded_hal::i2c::ErrorKind;

use crate::{actuator::ButtonActuator, error::ActuatorError, types::Button};

#[derive(Debug, Default)]
pub struct RecordingActuator {
    pub presses: Vec<Button>,
    fail_at: Option<usize>,
}

impl RecordingActuator {
    /// Succeeds for the first `presses` calls, then reports a bus fault.
    pub fn failing_at(presses: usize) -> Self {
        Self {
            presses: Vec::new(),
            fail_at: Some(presses),
        }
    }

    pub fn count(&self, button: Button) -> usize {
        self.presses.iter().filter(|pressed| **pressed == button).count()
    }
}

impl ButtonActuator for RecordingActuator {
    fn press(&mut self, button: Button) -> Result<(), ActuatorError> {
        if self.fail_at.is_some_and(|limit| self.presses.len() >= limit) {
            return Err(ActuatorError::bus(button, 0x09, ErrorKind::Other));
        }
        self.presses.push(button);
        Ok(())
    }
}
