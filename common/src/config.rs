use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Temperature;

/// Highest value the two-digit display can show.
pub const DISPLAY_MAX_TEMP: Temperature = 99;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThermostatConfig {
    /// Lowest setting the Chronotherm accepts.
    pub min_temp: Temperature,
    /// Highest setting this controller will ever drive to.
    pub max_temp: Temperature,
    pub hold_ms: u64,
    pub settle_ms: u64,
    pub i2c_address: u8,
    /// i2c-dev node the expander hangs off, e.g. `/dev/i2c-0`. Unset means
    /// presses are only logged.
    #[serde(default)]
    pub i2c_device: Option<String>,
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            min_temp: 7,
            max_temp: 20,
            hold_ms: 300,
            settle_ms: 600,
            i2c_address: 0x20,
            i2c_device: None,
        }
    }
}

impl ThermostatConfig {
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        if !(0..=DISPLAY_MAX_TEMP).contains(&self.min_temp) {
            self.min_temp = defaults.min_temp;
        }
        self.max_temp = self.max_temp.min(DISPLAY_MAX_TEMP);
        if self.max_temp < self.min_temp {
            self.max_temp = self.min_temp;
        }
        // 7-bit I2C addressing.
        if self.i2c_address > 0x7f {
            self.i2c_address = defaults.i2c_address;
        }
        if self.hold_ms == 0 {
            self.hold_ms = defaults.hold_ms;
        }
        if self
            .i2c_device
            .as_deref()
            .is_some_and(|device| device.trim().is_empty())
        {
            self.i2c_device = None;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaemonConfig {
    pub poll_interval_secs: u64,
    pub notify: bool,
    pub spool_dir: String,
    pub lock_file: String,
    /// IANA zone used for "now" when gating deferred commands; host local time when unset.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 600,
            notify: false,
            spool_dir: "./.chronotherm/spool".to_string(),
            lock_file: "/run/lock/heat.pid".to_string(),
            timezone: None,
        }
    }
}

impl DaemonConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn sanitize(&mut self) {
        if self.poll_interval_secs == 0 {
            self.poll_interval_secs = 1;
        }
        if self.spool_dir.trim().is_empty() {
            self.spool_dir = Self::default().spool_dir;
        }
        if self
            .timezone
            .as_deref()
            .is_some_and(|zone| zone.trim().is_empty())
        {
            self.timezone = None;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MqttConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub client_id: String,
    pub topic: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            port: 1883,
            user: String::new(),
            pass: String::new(),
            client_id: "chronotherm-heat".to_string(),
            topic: "chronotherm/notify".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub thermostat: ThermostatConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub mqtt: MqttConfig,
}

impl RuntimeConfig {
    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_slice(raw)?;
        config.sanitize();
        Ok(config)
    }

    pub fn sanitize(&mut self) {
        self.thermostat.sanitize();
        self.daemon.sanitize();
        if self.mqtt.port == 0 {
            self.mqtt.port = MqttConfig::default().port;
        }
    }
}
