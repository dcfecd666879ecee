//! Connector configuration.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};

use crate::bridge::AppCredential;
use crate::discovery::{BridgeAddress, DiscoveryMethod};
use crate::errors::Error;
use crate::types::LampSet;

type Result<T> = std::result::Result<T, Error>;

/// Process-level settings of the connector.
///
/// Every field has a default, so a JSON file only needs to name what it
/// changes:
///
/// ```
/// use std::time::Duration;
/// use hue_rig::ConnectorConfig;
///
/// let config = ConnectorConfig::from_json_str(r#"{"bridge": "192.168.1.52", "chaser_interval_ms": 500}"#).unwrap();
/// assert_eq!(config.app_name, "mus");
/// assert_eq!(config.chaser_interval, Duration::from_millis(500));
/// assert_eq!(config.bridge_address().unwrap().base_url(), "http://192.168.1.52:80");
/// ```
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectorConfig {
    pub app_name: String,
    pub app_key: String,
    /// Skip discovery and use this bridge.
    pub bridge: Option<IpAddr>,
    pub bridge_port: u16,
    /// Run the link-button handshake instead of reusing `app_key`.
    pub register_app: bool,
    pub discovery_method: DiscoveryMethod,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "discovery_timeout_secs")]
    pub discovery_timeout: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "registration_timeout_secs")]
    pub registration_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "chaser_interval_ms")]
    pub chaser_interval: Duration,
    /// Lamps the chaser cycles through, in order.
    pub chaser_lamps: LampSet,
    /// Brightness change per caret/v gesture.
    pub brightness_step: i32,
    /// Commands that may wait for delivery before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        ConnectorConfig {
            app_name: "mus".to_string(),
            app_key: "newdeveloper".to_string(),
            bridge: None,
            bridge_port: BridgeAddress::DEFAULT_PORT,
            register_app: false,
            discovery_method: DiscoveryMethod::Ssdp,
            discovery_timeout: Duration::from_secs(5),
            registration_timeout: Duration::from_secs(10),
            chaser_interval: Duration::from_secs(1),
            chaser_lamps: LampSet::from_ids(["1", "2", "3", "4"]),
            brightness_step: 51,
            queue_capacity: 64,
        }
    }
}

impl ConnectorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(Error::JsonLoad)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_name.is_empty() {
            return Err(Error::Config("app_name must not be empty".into()));
        }
        if self.chaser_lamps.is_empty() {
            return Err(Error::Config("chaser_lamps must name at least one lamp".into()));
        }
        if self.chaser_interval.is_zero() {
            return Err(Error::Config("chaser_interval_ms must be positive".into()));
        }
        if self.queue_capacity == 0 {
            return Err(Error::Config("queue_capacity must be positive".into()));
        }
        Ok(())
    }

    /// The configured bridge, if discovery should be skipped.
    pub fn bridge_address(&self) -> Option<BridgeAddress> {
        self.bridge
            .map(|ip| BridgeAddress::new(ip).with_port(self.bridge_port))
    }

    pub fn credential(&self) -> AppCredential {
        AppCredential::new(&self.app_name, &self.app_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_json() {
        let json = serde_json::to_string(&ConnectorConfig::default()).unwrap();
        assert!(json.contains("\"chaser_interval_ms\":1000"));
        assert_eq!(
            ConnectorConfig::from_json_str(&json).unwrap(),
            ConnectorConfig::default()
        );
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(matches!(
            ConnectorConfig::from_json_str(r#"{"bridge_ip": "10.0.0.2"}"#),
            Err(Error::JsonLoad(_))
        ));
    }

    #[test]
    fn test_rejects_empty_chaser() {
        assert!(matches!(
            ConnectorConfig::from_json_str(r#"{"chaser_lamps": []}"#),
            Err(Error::Config(_))
        ));
    }
}
