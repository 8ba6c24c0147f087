pub mod actuator;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod mailbox;
pub mod positioner;
pub mod queue;
pub mod schedule;
pub mod types;

#[cfg(test)]
mod testing;

pub use actuator::{ButtonActuator, Mcp23008ButtonPad, PadDiagnostics};
pub use command::{CommandParser, ParsedInstruction};
pub use config::{DaemonConfig, MqttConfig, RuntimeConfig, ThermostatConfig};
pub use dispatcher::{ActionDispatcher, Outcome, PassReport, NOTIFY_BODY};
pub use error::{ActuatorError, CommandError, MailboxError, NotifyError};
pub use mailbox::{MailMessage, Mailbox, Notifier};
pub use positioner::{PositionPlan, TemperaturePositioner};
pub use queue::{CommandQueue, PendingCommand};
pub use schedule::{DayMonth, DueAt, Readiness, ScheduleGate};
pub use types::{Button, Temperature, ThermostatMode};
