use std::{convert::Infallible, thread, time::Duration};

use anyhow::Context;
use embedded_hal::{
    delay::DelayNs,
    i2c::{Error as _, ErrorKind, ErrorType, I2c, Operation, SevenBitAddress},
};
use linux_embedded_hal::I2cdev;
use tracing::{debug, info};

/// The bus the button pad runs on: a kernel i2c-dev node when one is
/// configured, the logging stand-in otherwise.
pub enum HostBus {
    Device(I2cdev),
    DryRun(DryRunBus),
}

impl HostBus {
    pub fn open(device: Option<&str>) -> anyhow::Result<Self> {
        match device {
            Some(path) => {
                let dev = I2cdev::new(path).with_context(|| format!("failed to open {path}"))?;
                info!("button pad on {path}");
                Ok(Self::Device(dev))
            }
            None => Ok(Self::DryRun(DryRunBus::new())),
        }
    }
}

impl ErrorType for HostBus {
    type Error = ErrorKind;
}

impl I2c<SevenBitAddress> for HostBus {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        match self {
            Self::Device(dev) => {
                I2c::transaction(dev, address, operations).map_err(|err| err.kind())
            }
            Self::DryRun(bus) => match bus.transaction(address, operations) {
                Ok(()) => Ok(()),
                Err(never) => match never {},
            },
        }
    }
}

/// Stand-in bus for hosts without an i2c device: every write is logged and
/// reported as delivered. The button pad on top still keeps real timing.
#[derive(Debug, Default)]
pub struct DryRunBus {
    writes: u64,
}

impl DryRunBus {
    pub fn new() -> Self {
        info!("no i2c device configured; button presses are logged only");
        Self::default()
    }
}

impl ErrorType for DryRunBus {
    type Error = Infallible;
}

impl I2c<SevenBitAddress> for DryRunBus {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    self.writes = self.writes.saturating_add(1);
                    debug!("i2c {address:#04x} <- {bytes:02x?} (write #{})", self.writes);
                }
                Operation::Read(buffer) => buffer.fill(0),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
