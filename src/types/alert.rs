//! Alert (blink) modes supported by the bridge.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter};

/// Alert effect, independent of the power state.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, EnumIter, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertMode {
    /// Stop any running alert.
    #[default]
    None,
    /// Blink once.
    Select,
    /// Keep blinking for about fifteen seconds.
    LSelect,
}

impl AlertMode {
    pub fn is_active(&self) -> bool {
        !matches!(self, AlertMode::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_wire_names() {
        let names: Vec<String> = AlertMode::iter()
            .map(|mode| serde_json::to_value(mode).unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["none", "select", "lselect"]);
        assert_eq!(AlertMode::LSelect.as_ref(), "lselect");
    }
}
