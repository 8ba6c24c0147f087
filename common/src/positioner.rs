use tracing::debug;

use crate::{
    actuator::ButtonActuator,
    config::ThermostatConfig,
    error::ActuatorError,
    types::{Button, Temperature},
};

/// Degrees above `max_temp` the device is assumed never to exceed. The reset
/// phase only reaches the floor if this holds.
pub const RESET_HEADROOM: Temperature = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionPlan {
    pub cooler_presses: u32,
    pub warmer_presses: u32,
    pub target: Temperature,
}

/// Drives the display to an absolute setting using only relative presses:
/// slam down to the floor, then count back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperaturePositioner {
    min_temp: Temperature,
    max_temp: Temperature,
}

impl TemperaturePositioner {
    pub fn new(config: &ThermostatConfig) -> Self {
        Self {
            min_temp: config.min_temp,
            max_temp: config.max_temp.max(config.min_temp),
        }
    }

    pub fn clamp(&self, requested: Temperature) -> Temperature {
        requested.min(self.max_temp)
    }

    pub fn plan(&self, requested: Temperature) -> PositionPlan {
        let target = self.clamp(requested);
        let reset_span = self
            .max_temp
            .saturating_add(RESET_HEADROOM)
            .saturating_sub(self.min_temp);

        PositionPlan {
            cooler_presses: u32::try_from(reset_span).unwrap_or(0),
            warmer_presses: u32::try_from(target.saturating_sub(self.min_temp)).unwrap_or(0),
            target,
        }
    }

    /// Runs the whole press sequence. A bus failure aborts mid-sequence and
    /// leaves the device wherever it got to.
    pub fn apply<A>(
        &self,
        actuator: &mut A,
        requested: Temperature,
    ) -> Result<PositionPlan, ActuatorError>
    where
        A: ButtonActuator + ?Sized,
    {
        let plan = self.plan(requested);
        debug!(
            "positioning to {} ({} cooler, {} warmer)",
            plan.target, plan.cooler_presses, plan.warmer_presses
        );

        for _ in 0..plan.cooler_presses {
            actuator.press(Button::Cooler)?;
        }
        for _ in 0..plan.warmer_presses {
            actuator.press(Button::Warmer)?;
        }

        Ok(plan)
    }
}
