//! Light command payload sent to the bridge.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{AlertMode, Brightness, Color, PowerMode};

/// A sparse light command.
///
/// Only the attributes that were explicitly set are serialized, so a command
/// never overwrites unrelated state on the lamps.
///
/// # Creating Commands
///
/// 1. **From a single attribute** using the [`From`] trait:
///    ```
///    use hue_rig::{LightCommand, PowerMode};
///    let command = LightCommand::from(&PowerMode::On);
///    assert_eq!(serde_json::to_string(&command).unwrap(), r#"{"on":true}"#);
///    ```
///
/// 2. **Builder pattern** for combining multiple attributes:
///    ```
///    use std::str::FromStr;
///    use hue_rig::{LightCommand, Brightness, Color};
///    let mut command = LightCommand::new();
///    command.brightness(&Brightness::create(128).unwrap());
///    command.color(&Color::from_str("ff270d").unwrap());
///    assert!(command.is_valid());
///    ```
#[serde_with::skip_serializing_none]
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LightCommand {
    pub(crate) on: Option<bool>,
    pub(crate) bri: Option<u8>,
    pub(crate) xy: Option<[f64; 2]>,
    pub(crate) alert: Option<AlertMode>,
    #[serde(rename = "transitiontime")]
    pub(crate) transition_time: Option<u16>,
    // Kept alongside `xy` so logs and listeners see the color as requested.
    #[serde(skip)]
    pub(crate) color: Option<Color>,
}

impl LightCommand {
    /// Create a new empty command.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_rig::LightCommand;
    ///
    /// let command = LightCommand::new();
    /// assert_eq!(command.is_valid(), false);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if this command changes at least one lamp attribute.
    ///
    /// A transition time alone changes nothing.
    pub fn is_valid(&self) -> bool {
        self.on.is_some() || self.bri.is_some() || self.xy.is_some() || self.alert.is_some()
    }

    pub fn power(&mut self, power: &PowerMode) {
        self.on = Some(power.is_on());
    }

    pub fn brightness(&mut self, brightness: &Brightness) {
        self.bri = Some(brightness.value);
    }

    /// Set the color; the bridge receives it as CIE xy coordinates.
    pub fn color(&mut self, color: &Color) {
        self.xy = Some(color.to_xy());
        self.color = Some(*color);
    }

    pub fn alert(&mut self, alert: AlertMode) {
        self.alert = Some(alert);
    }

    /// Set the fade duration, rounded down to the bridge's 100 ms steps.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use hue_rig::{LightCommand, PowerMode};
    ///
    /// let mut command = LightCommand::from(&PowerMode::Off);
    /// command.transition(Duration::from_millis(450));
    /// assert_eq!(
    ///     serde_json::to_string(&command).unwrap(),
    ///     r#"{"on":false,"transitiontime":4}"#
    /// );
    /// ```
    pub fn transition(&mut self, duration: Duration) {
        let steps = duration.as_millis() / 100;
        self.transition_time = Some(u16::try_from(steps).unwrap_or(u16::MAX));
    }

    pub fn get_power(&self) -> Option<PowerMode> {
        self.on.map(PowerMode::from)
    }

    pub fn get_brightness(&self) -> Option<Brightness> {
        self.bri.map(|value| Brightness { value })
    }

    pub fn get_color(&self) -> Option<Color> {
        self.color
    }

    pub fn get_alert(&self) -> Option<AlertMode> {
        self.alert
    }
}

impl From<&PowerMode> for LightCommand {
    fn from(power: &PowerMode) -> Self {
        let mut c = LightCommand::new();
        c.power(power);
        c
    }
}

impl From<&Brightness> for LightCommand {
    fn from(brightness: &Brightness) -> Self {
        let mut c = LightCommand::new();
        c.brightness(brightness);
        c
    }
}

impl From<&Color> for LightCommand {
    fn from(color: &Color) -> Self {
        let mut c = LightCommand::new();
        c.color(color);
        c
    }
}

impl From<AlertMode> for LightCommand {
    fn from(alert: AlertMode) -> Self {
        let mut c = LightCommand::new();
        c.alert(alert);
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_set_fields_are_serialized() {
        let command = LightCommand::from(&Brightness::create(51).unwrap());
        assert_eq!(serde_json::to_value(&command).unwrap(), json!({"bri": 51}));

        let command = LightCommand::from(AlertMode::LSelect);
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({"alert": "lselect"})
        );
    }

    #[test]
    fn test_color_and_brightness_share_one_command() {
        let mut command = LightCommand::new();
        command.color(&Color::rgb(0, 0, 255));
        command.brightness(&Brightness::new());

        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["bri"], json!(255));
        assert!(value["xy"].is_array());
        assert!(value.get("on").is_none());
        assert_eq!(command.get_color(), Some(Color::rgb(0, 0, 255)));
    }

    #[test]
    fn test_color_goes_out_with_four_decimals() {
        let command = LightCommand::from(&Color::rgb(255, 0, 0));
        assert_eq!(
            serde_json::to_string(&command).unwrap(),
            r#"{"xy":[0.7006,0.2993]}"#
        );

        let command = LightCommand::from(&Color::rgb(0, 0, 0));
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({"xy": [0.3127, 0.329]})
        );
    }

    #[test]
    fn test_transition_alone_is_not_valid() {
        let mut command = LightCommand::new();
        command.transition(Duration::from_secs(1));
        assert!(!command.is_valid());
    }
}
