use std::{thread, time::Duration};

use chrono::Utc;
use chronotherm_common::{MqttConfig, Notifier, NotifyError};
use rumqttc::{Client, Event, Incoming, MqttOptions, QoS};
use serde::Serialize;
use tracing::{info, warn};

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&mut self, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!("notify: {subject} ({body})");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct NotificationPayload<'a> {
    subject: &'a str,
    body: &'a str,
    #[serde(rename = "sentAt")]
    sent_at: String,
}

/// Publishes each outcome as JSON on one MQTT topic. The connection is driven
/// by a background thread so `send` only enqueues.
pub struct MqttNotifier {
    client: Client,
    topic: String,
}

impl MqttNotifier {
    pub fn connect(config: &MqttConfig) -> Self {
        let mut options = MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(30));
        if !config.user.is_empty() {
            options.set_credentials(config.user.clone(), config.pass.clone());
        }

        let (client, mut connection) = Client::new(options, 16);
        thread::spawn(move || {
            for event in connection.iter() {
                match event {
                    Ok(Event::Incoming(Incoming::ConnAck(_))) => info!("mqtt connected"),
                    Ok(_) => {}
                    Err(err) => {
                        warn!("mqtt poll error: {err}");
                        thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        Self {
            client,
            topic: config.topic.clone(),
        }
    }
}

impl Notifier for MqttNotifier {
    fn send(&mut self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let payload = serde_json::to_vec(&NotificationPayload {
            subject,
            body,
            sent_at: Utc::now().to_rfc3339(),
        })?;

        self.client
            .publish(self.topic.clone(), QoS::AtLeastOnce, false, payload)
            .map_err(|err| NotifyError::Transport(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_camel_case_timestamp() {
        let payload = NotificationPayload {
            subject: "Program started",
            body: "Sent by heat",
            sent_at: "2024-12-25T09:01:00+00:00".to_string(),
        };

        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["subject"], "Program started");
        assert_eq!(json["body"], "Sent by heat");
        assert_eq!(json["sentAt"], "2024-12-25T09:01:00+00:00");
    }

    #[test]
    fn log_notifier_never_fails() {
        assert!(LogNotifier.send("Command missing", "Sent by heat").is_ok());
    }
}
