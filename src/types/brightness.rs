//! Brightness level for bridge lamps.

use serde::{Deserialize, Serialize};

/// Brightness level from 0 to 255.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct Brightness {
    pub(crate) value: u8,
}

impl Default for Brightness {
    fn default() -> Self {
        Self::new()
    }
}

impl Brightness {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 255;

    /// Create a brightness at the maximum level.
    pub fn new() -> Self {
        Brightness { value: Self::MAX }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if the level is outside the valid range (0-255).
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_rig::Brightness;
    ///
    /// assert!(Brightness::create(-1).is_none());
    /// assert_eq!(Brightness::create(0).unwrap().value(), 0);
    /// assert_eq!(Brightness::create(255).unwrap().value(), 255);
    /// assert!(Brightness::create(256).is_none());
    /// ```
    pub fn create(level: i32) -> Option<Self> {
        u8::try_from(level).ok().map(|value| Brightness { value })
    }

    /// Returns the maximum level if the value is invalid.
    pub fn create_or(level: i32) -> Self {
        Self::create(level).unwrap_or_default()
    }

    /// Offset this level by `delta`, or `None` if the result leaves the range.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_rig::Brightness;
    ///
    /// let level = Brightness::create(204).unwrap();
    /// assert_eq!(level.offset(51).unwrap().value(), 255);
    /// assert!(level.offset(102).is_none());
    /// ```
    pub fn offset(&self, delta: i32) -> Option<Self> {
        Self::create(i32::from(self.value) + delta)
    }
}
