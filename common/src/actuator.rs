//! Button actuation through an MCP23008 port expander soldered across the
//! Chronotherm's keypad. Each expander output shorts one button's contacts.

use embedded_hal::{
    delay::DelayNs,
    i2c::{Error as _, I2c},
};
use serde::Serialize;
use tracing::debug;

use crate::{
    config::ThermostatConfig,
    error::ActuatorError,
    types::{Button, NO_BUTTON},
};

const REG_IODIR: u8 = 0x00;
const REG_GPIO: u8 = 0x09;
const ALL_OUTPUTS: u8 = 0x00;

/// One physical button event. Implementations block for the full
/// assert/hold/release/settle cycle before returning.
pub trait ButtonActuator {
    fn press(&mut self, button: Button) -> Result<(), ActuatorError>;
}

impl<T: ButtonActuator + ?Sized> ButtonActuator for &mut T {
    fn press(&mut self, button: Button) -> Result<(), ActuatorError> {
        (**self).press(button)
    }
}

impl<T: ButtonActuator + ?Sized> ButtonActuator for Box<T> {
    fn press(&mut self, button: Button) -> Result<(), ActuatorError> {
        (**self).press(button)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PadDiagnostics {
    #[serde(rename = "i2cAddress")]
    pub i2c_address: u8,
    #[serde(rename = "holdMs")]
    pub hold_ms: u64,
    #[serde(rename = "settleMs")]
    pub settle_ms: u64,
    pub presses: u64,
    #[serde(rename = "failedPresses")]
    pub failed_presses: u64,
    #[serde(rename = "lastError")]
    pub last_error: Option<String>,
}

pub struct Mcp23008ButtonPad<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    hold_ms: u64,
    settle_ms: u64,
    presses: u64,
    failed_presses: u64,
    last_error: Option<String>,
}

impl<I2C, D> Mcp23008ButtonPad<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Configures every expander pin as an output and returns the pad.
    pub fn new(mut i2c: I2C, delay: D, config: &ThermostatConfig) -> Result<Self, ActuatorError> {
        i2c.write(config.i2c_address, &[REG_IODIR, ALL_OUTPUTS])
            .map_err(|err| ActuatorError::Init(err.kind()))?;

        Ok(Self {
            i2c,
            delay,
            address: config.i2c_address,
            hold_ms: config.hold_ms,
            settle_ms: config.settle_ms,
            presses: 0,
            failed_presses: 0,
            last_error: None,
        })
    }

    pub fn diagnostics(&self) -> PadDiagnostics {
        PadDiagnostics {
            i2c_address: self.address,
            hold_ms: self.hold_ms,
            settle_ms: self.settle_ms,
            presses: self.presses,
            failed_presses: self.failed_presses,
            last_error: self.last_error.clone(),
        }
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn write_gpio(&mut self, button: Button, value: u8) -> Result<(), ActuatorError> {
        self.i2c
            .write(self.address, &[REG_GPIO, value])
            .map_err(|err| ActuatorError::bus(button, REG_GPIO, err.kind()))
    }

    fn cycle(&mut self, button: Button) -> Result<(), ActuatorError> {
        self.write_gpio(button, button.code())?;
        self.delay.delay_ms(saturating_ms(self.hold_ms));
        self.write_gpio(button, NO_BUTTON)?;
        self.delay.delay_ms(saturating_ms(self.settle_ms));
        Ok(())
    }
}

impl<I2C, D> ButtonActuator for Mcp23008ButtonPad<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn press(&mut self, button: Button) -> Result<(), ActuatorError> {
        debug!("press {}", button.as_str());
        let result = self.cycle(button);

        match &result {
            Ok(()) => {
                self.presses = self.presses.saturating_add(1);
                self.last_error = None;
            }
            Err(err) => {
                self.failed_presses = self.failed_presses.saturating_add(1);
                self.last_error = Some(err.to_string());
            }
        }

        result
    }
}

fn saturating_ms(ms: u64) -> u32 {
    u32::try_from(ms).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct BusFault;

    impl embedded_hal::i2c::Error for BusFault {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[derive(Default)]
    struct FakeBus {
        writes: Vec<(u8, Vec<u8>)>,
        fail_after: Option<usize>,
    }

    impl ErrorType for FakeBus {
        type Error = BusFault;
    }

    impl I2c for FakeBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for op in operations {
                if let Operation::Write(bytes) = op {
                    if self.fail_after.is_some_and(|limit| self.writes.len() >= limit) {
                        return Err(BusFault);
                    }
                    self.writes.push((address, bytes.to_vec()));
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeDelay {
        waits_ms: Vec<u32>,
    }

    impl DelayNs for FakeDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.waits_ms.push(ns / 1_000_000);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.waits_ms.push(ms);
        }
    }

    #[test]
    fn init_sets_all_pins_to_outputs() {
        let pad = Mcp23008ButtonPad::new(
            FakeBus::default(),
            FakeDelay::default(),
            &ThermostatConfig::default(),
        )
        .unwrap();

        let (bus, _) = pad.release();
        assert_eq!(bus.writes, vec![(0x20, vec![REG_IODIR, ALL_OUTPUTS])]);
    }

    #[test]
    fn press_asserts_holds_releases_and_settles() {
        let mut pad = Mcp23008ButtonPad::new(
            FakeBus::default(),
            FakeDelay::default(),
            &ThermostatConfig::default(),
        )
        .unwrap();

        pad.press(Button::Warmer).unwrap();
        assert_eq!(pad.diagnostics().presses, 1);

        let (bus, delay) = pad.release();
        assert_eq!(
            bus.writes[1..].to_vec(),
            vec![
                (0x20, vec![REG_GPIO, Button::Warmer.code()]),
                (0x20, vec![REG_GPIO, NO_BUTTON]),
            ]
        );
        assert_eq!(delay.waits_ms, vec![300, 600]);
    }

    #[test]
    fn bus_failure_is_reported_and_counted() {
        let bus = FakeBus {
            writes: Vec::new(),
            fail_after: Some(1),
        };
        let mut pad =
            Mcp23008ButtonPad::new(bus, FakeDelay::default(), &ThermostatConfig::default())
                .unwrap();

        let err = pad.press(Button::Cooler).unwrap_err();

        assert_eq!(err, ActuatorError::bus(Button::Cooler, REG_GPIO, ErrorKind::Other));
        let diagnostics = pad.diagnostics();
        assert_eq!(diagnostics.failed_presses, 1);
        assert!(diagnostics.last_error.is_some());
    }
}
