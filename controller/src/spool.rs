//! Mailbox backed by a spool directory: one RFC 822 message per file, dropped
//! there by the MTA (fetchmail, procmail, an SMS gateway hook, ...).

use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chronotherm_common::{MailMessage, Mailbox, MailboxError};
use mailparse::{MailHeaderMap, ParsedMail};
use tracing::{debug, warn};

/// File name SMS gateways give the text of a message forwarded as mail.
const SMS_ATTACHMENT: &str = "text_0.txt";

pub struct SpoolMailbox {
    dir: PathBuf,
    fetched: HashMap<usize, PathBuf>,
}

impl SpoolMailbox {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fetched: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn message_paths(&self) -> Result<Vec<PathBuf>, MailboxError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("spool dir {} does not exist yet", self.dir.display());
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Dotfiles are messages the MTA is still writing.
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            paths.push(entry.path());
        }

        paths.sort();
        Ok(paths)
    }
}

impl Mailbox for SpoolMailbox {
    fn fetch_unread(&mut self) -> Result<Vec<MailMessage>, MailboxError> {
        self.fetched.clear();
        let mut messages = Vec::new();

        for (index, path) in self.message_paths()?.into_iter().enumerate() {
            let id = index + 1;
            let raw = fs::read(&path)?;
            let message = parse_message(id, &raw).unwrap_or_else(|err| {
                warn!("unreadable message {}: {err}", path.display());
                MailMessage {
                    id,
                    ..MailMessage::default()
                }
            });

            if let Some(subject) = &message.subject {
                debug!("subject: {subject}");
            }
            self.fetched.insert(id, path);
            messages.push(message);
        }

        Ok(messages)
    }

    fn delete(&mut self, id: usize) -> Result<(), MailboxError> {
        let path = self.fetched.get(&id).ok_or(MailboxError::NotFound(id))?;
        fs::remove_file(path)?;
        self.fetched.remove(&id);
        Ok(())
    }
}

/// Subject, first `text/plain` part and the decoded SMS attachment. Multipart
/// containers and every other part are skipped.
fn parse_message(id: usize, raw: &[u8]) -> Result<MailMessage, mailparse::MailParseError> {
    let mail = mailparse::parse_mail(raw)?;

    let mut body = None;
    let mut attachment = None;
    for part in mail.parts() {
        if part.ctype.mimetype.starts_with("multipart/") {
            continue;
        }
        if attachment.is_none() && filename(part).as_deref() == Some(SMS_ATTACHMENT) {
            attachment = non_empty(part.get_body()?);
            continue;
        }
        if body.is_none() && part.ctype.mimetype == "text/plain" {
            body = non_empty(part.get_body()?);
        }
    }

    Ok(MailMessage {
        id,
        subject: mail
            .headers
            .get_first_value("Subject")
            .map(|subject| subject.split_whitespace().collect::<Vec<_>>().join(" ")),
        body: body.map(|text| text.trim_end_matches('\n').to_string()),
        attachment: attachment.map(|text| text.trim().to_string()),
    })
}

fn filename(part: &ParsedMail<'_>) -> Option<String> {
    part.get_content_disposition()
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .cloned()
}

fn non_empty(text: String) -> Option<String> {
    let text = text.replace("\r\n", "\n");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn plain_message_yields_subject_and_body_lines() {
        let message = parse_message(
            3,
            b"From: someone@example.com\r\nSubject: heat on\r\n\r\nheat off\r\nheat 9 07:30\r\n",
        )
        .unwrap();

        assert_eq!(
            message,
            MailMessage {
                id: 3,
                subject: Some("heat on".to_string()),
                body: Some("heat off\nheat 9 07:30".to_string()),
                attachment: None,
            }
        );
    }

    #[test]
    fn folded_subject_is_joined() {
        let message = parse_message(1, b"Subject: heat\r\n on 14\r\n\r\n").unwrap();

        assert_eq!(message.subject.as_deref(), Some("heat on 14"));
        assert_eq!(message.body, None);
    }

    #[test]
    fn multipart_sms_uses_text_part_and_decoded_attachment() {
        let raw = concat!(
            "Subject: hi\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"XX\"\r\n",
            "\r\n",
            "--XX\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "heat 12\r\n",
            "--XX\r\n",
            "Content-Type: text/plain; name=text_0.txt\r\n",
            "Content-Disposition: attachment; filename=text_0.txt\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "aGVhdCAxNQ==\r\n",
            "--XX--\r\n",
        );

        let message = parse_message(1, raw.as_bytes()).unwrap();

        assert_eq!(message.command_lines(), vec!["hi", "heat 12", "heat 15"]);
    }

    #[test]
    fn fetches_in_name_order_and_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("002.eml"), "Subject: heat off\n\n").unwrap();
        fs::write(dir.path().join("001.eml"), "Subject: heat on\n\nheat 12\n").unwrap();
        fs::write(dir.path().join(".partial"), "Subject: heat 20\n\n").unwrap();

        let mut mailbox = SpoolMailbox::new(dir.path());
        let messages = mailbox.fetch_unread().unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].command_lines(), vec!["heat on", "heat 12"]);
        assert_eq!(messages[1].subject.as_deref(), Some("heat off"));

        mailbox.delete(messages[0].id).unwrap();
        assert!(!dir.path().join("001.eml").exists());
        assert!(dir.path().join("002.eml").exists());
        assert!(matches!(
            mailbox.delete(messages[0].id),
            Err(MailboxError::NotFound(1))
        ));
    }

    #[test]
    fn missing_spool_dir_is_an_empty_mailbox() {
        let dir = tempfile::tempdir().unwrap();
        let mut mailbox = SpoolMailbox::new(dir.path().join("absent"));

        assert!(mailbox.fetch_unread().unwrap().is_empty());
    }
}
