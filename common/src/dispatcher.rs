use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::{
    actuator::ButtonActuator,
    command::{CommandParser, ParsedInstruction},
    config::ThermostatConfig,
    error::{ActuatorError, CommandError, MailboxError},
    mailbox::{Mailbox, Notifier},
    positioner::{PositionPlan, TemperaturePositioner},
    queue::CommandQueue,
    schedule::{Readiness, ScheduleGate},
    types::{Temperature, ThermostatMode},
};

pub const NOTIFY_BODY: &str = "Sent by heat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Executed {
        arrival: u64,
        raw: String,
        summary: String,
    },
    Rejected {
        arrival: u64,
        raw: String,
        error: CommandError,
    },
}

impl Outcome {
    pub fn subject(&self) -> String {
        match self {
            Self::Executed { summary, .. } => summary.clone(),
            Self::Rejected { error, .. } => error.to_string(),
        }
    }

    pub fn arrival(&self) -> u64 {
        match self {
            Self::Executed { arrival, .. } | Self::Rejected { arrival, .. } => *arrival,
        }
    }

    fn is_silent(&self) -> bool {
        matches!(
            self,
            Self::Rejected {
                error: CommandError::Empty,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub outcomes: Vec<Outcome>,
    pub deferred: usize,
}

impl PassReport {
    pub fn executed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Outcome::Executed { .. }))
            .count()
    }

    pub fn rejected(&self) -> usize {
        self.outcomes.len() - self.executed()
    }
}

/// Owns the pending command queue and the hardware for the lifetime of the
/// process. Only ingestion and [`ActionDispatcher::run_pass`] mutate it.
pub struct ActionDispatcher<A> {
    actuator: A,
    positioner: TemperaturePositioner,
    queue: CommandQueue,
    notifier: Option<Box<dyn Notifier + Send>>,
    notify: bool,
}

impl<A: ButtonActuator> ActionDispatcher<A> {
    pub fn new(actuator: A, config: &ThermostatConfig) -> Self {
        Self {
            actuator,
            positioner: TemperaturePositioner::new(config),
            queue: CommandQueue::new(),
            notifier: None,
            notify: false,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier + Send>, enabled: bool) -> Self {
        self.notifier = Some(notifier);
        self.notify = enabled;
        self
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn enqueue(&mut self, raw: impl Into<String>) -> u64 {
        self.queue.push(raw)
    }

    /// Moves every unread message into the queue and deletes it from the
    /// mailbox. Returns how many command lines were queued.
    ///
    /// A message's lines are queued only after its delete succeeded; one that
    /// cannot be deleted stays in the mailbox untouched and ends ingestion.
    pub fn ingest<M>(&mut self, mailbox: &mut M) -> Result<usize, MailboxError>
    where
        M: Mailbox + ?Sized,
    {
        let messages = mailbox.fetch_unread()?;
        let mut queued = 0;

        for message in messages {
            mailbox.delete(message.id)?;
            for line in message.command_lines() {
                debug!("queued from message {}: {line}", message.id);
                self.queue.push(line);
                queued += 1;
            }
        }

        Ok(queued)
    }

    /// One sweep over the queue in arrival order. Commands that are not yet
    /// due stay put; everything else is removed before it touches hardware,
    /// so a bus failure never causes a second execution.
    pub fn run_pass(&mut self, now: NaiveDateTime) -> Result<PassReport, ActuatorError> {
        let mut report = PassReport::default();

        for arrival in self.queue.snapshot() {
            let Some(pending) = self.queue.get(arrival) else {
                continue;
            };
            let raw = pending.raw.clone();

            let decision = CommandParser::parse(&raw).and_then(|instruction| {
                ScheduleGate::evaluate(instruction.due_at.as_ref(), now)
                    .map(|readiness| (instruction, readiness))
            });

            let outcome = match decision {
                Ok((_, Readiness::NotYet(start))) => {
                    debug!("deferring `{raw}` until {start}");
                    report.deferred += 1;
                    continue;
                }
                Ok((instruction, Readiness::Due)) => {
                    self.queue.remove(arrival);
                    info!("handling command: {raw}");
                    let summary = self.execute(&instruction)?;
                    Outcome::Executed {
                        arrival,
                        raw,
                        summary,
                    }
                }
                Err(error) => {
                    self.queue.remove(arrival);
                    Outcome::Rejected {
                        arrival,
                        raw,
                        error,
                    }
                }
            };

            self.report(&outcome);
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    fn execute(&mut self, instruction: &ParsedInstruction) -> Result<String, ActuatorError> {
        if let Some(mode) = instruction.mode {
            self.actuator.press(mode.button())?;
        }

        let plan = match instruction.temperature {
            Some(requested) => Some(self.positioner.apply(&mut self.actuator, requested)?),
            None => None,
        };

        Ok(describe(instruction.mode, instruction.temperature, plan))
    }

    fn report(&mut self, outcome: &Outcome) {
        if outcome.is_silent() {
            debug!("discarded empty command");
            return;
        }

        let subject = outcome.subject();
        match outcome {
            Outcome::Executed { .. } => info!("{subject}"),
            Outcome::Rejected { raw, .. } => warn!("{subject} (command `{raw}`)"),
        }

        if !self.notify {
            return;
        }
        if let Some(notifier) = self.notifier.as_mut() {
            if let Err(err) = notifier.send(&subject, NOTIFY_BODY) {
                warn!("notification failed: {err:#}");
            }
        }
    }
}

fn describe(
    mode: Option<ThermostatMode>,
    requested: Option<Temperature>,
    plan: Option<PositionPlan>,
) -> String {
    let applied = match (requested, plan) {
        (Some(requested), Some(plan)) if requested != plan.target => {
            Some(format!("{} degrees (limited from {requested})", plan.target))
        }
        (_, Some(plan)) => Some(format!("{} degrees", plan.target)),
        _ => None,
    };

    match (mode, applied) {
        (None, Some(applied)) => format!("Temperature set to {applied}"),
        (None, None) => "Nothing to do".to_string(),
        (Some(ThermostatMode::RunProgram), Some(applied)) => {
            format!("Program started, temperature temporarily set to {applied}")
        }
        (Some(ThermostatMode::RunProgram), None) => "Program started".to_string(),
        (Some(ThermostatMode::HoldConstant), Some(applied)) => {
            format!("Hold Temp pressed, temperature set to a constant {applied}")
        }
        (Some(ThermostatMode::HoldConstant), None) => {
            "Hold Temp pressed, current temperature setting used".to_string()
        }
    }
}
