//! Scripted collaborators for dispatcher tests.

use std::sync::{Arc, Mutex};

use chronotherm_common::{
    ActuatorError, Button, ButtonActuator, MailMessage, Mailbox, MailboxError, Notifier,
    NotifyError,
};

#[derive(Debug, Default)]
pub struct KeypadLog {
    pub presses: Vec<Button>,
}

#[allow(dead_code)]
impl KeypadLog {
    pub fn count(&self, button: Button) -> usize {
        self.presses.iter().filter(|pressed| **pressed == button).count()
    }

    /// Splits the log into one press sequence per executed command, using the
    /// cooler reset run as the boundary.
    pub fn warmer_runs(&self) -> Vec<usize> {
        let mut runs = Vec::new();
        let mut current: Option<usize> = None;
        let mut previous = None;

        for press in &self.presses {
            match press {
                Button::Cooler if previous != Some(Button::Cooler) => {
                    if let Some(run) = current.take() {
                        runs.push(run);
                    }
                    current = Some(0);
                }
                Button::Warmer => {
                    if let Some(run) = current.as_mut() {
                        *run += 1;
                    }
                }
                _ => {}
            }
            previous = Some(*press);
        }

        runs.extend(current);
        runs
    }
}

impl ButtonActuator for KeypadLog {
    fn press(&mut self, button: Button) -> Result<(), ActuatorError> {
        self.presses.push(button);
        Ok(())
    }
}

/// Messages stay in `inbox` until deleted, like a real server mailbox.
#[derive(Debug, Default)]
pub struct ScriptedMailbox {
    pub inbox: Vec<MailMessage>,
    pub deleted: Vec<usize>,
    /// Number of upcoming deletes that fail with a busy error.
    pub failing_deletes: usize,
}

impl Mailbox for ScriptedMailbox {
    fn fetch_unread(&mut self) -> Result<Vec<MailMessage>, MailboxError> {
        Ok(self.inbox.clone())
    }

    fn delete(&mut self, id: usize) -> Result<(), MailboxError> {
        if self.failing_deletes > 0 {
            self.failing_deletes -= 1;
            return Err(MailboxError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "EBUSY",
            )));
        }
        self.inbox.retain(|message| message.id != id);
        self.deleted.push(id);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CapturingNotifier {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
}

#[allow(dead_code)]
impl CapturingNotifier {
    pub fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(subject, _)| subject.clone())
            .collect()
    }
}

impl Notifier for CapturingNotifier {
    fn send(&mut self, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}
