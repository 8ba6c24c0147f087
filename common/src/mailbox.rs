use crate::error::{MailboxError, NotifyError};

/// One unread message as the mailbox hands it over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailMessage {
    pub id: usize,
    pub subject: Option<String>,
    pub body: Option<String>,
    /// Text of an SMS-gateway attachment, when the message carried one.
    pub attachment: Option<String>,
}

impl MailMessage {
    /// Candidate command lines in the order they are queued: subject, each
    /// body line, then the attachment.
    pub fn command_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(subject) = &self.subject {
            lines.push(subject.clone());
        }
        if let Some(body) = &self.body {
            lines.extend(body.split('\n').map(|line| line.trim_end_matches('\r').to_string()));
        }
        if let Some(attachment) = &self.attachment {
            lines.push(attachment.clone());
        }
        lines
    }
}

pub trait Mailbox {
    fn fetch_unread(&mut self) -> Result<Vec<MailMessage>, MailboxError>;

    fn delete(&mut self, id: usize) -> Result<(), MailboxError>;
}

pub trait Notifier {
    fn send(&mut self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

impl<T: Mailbox + ?Sized> Mailbox for &mut T {
    fn fetch_unread(&mut self) -> Result<Vec<MailMessage>, MailboxError> {
        (**self).fetch_unread()
    }

    fn delete(&mut self, id: usize) -> Result<(), MailboxError> {
        (**self).delete(id)
    }
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn send(&mut self, subject: &str, body: &str) -> Result<(), NotifyError> {
        (**self).send(subject, body)
    }
}
