//! RGB colors given as hex strings, converted to CIE xy for the bridge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// An RGB color with red, green, and blue components (0-255 each).
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

impl Color {
    /// Create a color with the given RGB values.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// Lowercase six digit hex form, without a leading `#`.
    pub fn to_hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    /// Convert to CIE 1931 xy chromaticity coordinates.
    ///
    /// Applies sRGB gamma expansion and the wide gamut conversion matrix the
    /// bridge expects. Black has no chromaticity and maps to the D65 white
    /// point.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_rig::Color;
    ///
    /// let [x, y] = Color::rgb(255, 0, 0).to_xy();
    /// assert!((x - 0.7006).abs() < 0.001);
    /// assert!((y - 0.2993).abs() < 0.001);
    /// ```
    pub fn to_xy(&self) -> [f64; 2] {
        let r = gamma(self.red);
        let g = gamma(self.green);
        let b = gamma(self.blue);

        let x = r * 0.664_511 + g * 0.154_324 + b * 0.162_028;
        let y = r * 0.283_881 + g * 0.668_433 + b * 0.047_685;
        let z = r * 0.000_088 + g * 0.072_310 + b * 0.986_039;

        let sum = x + y + z;
        if sum == 0.0 {
            return [0.3127, 0.3290];
        }
        [round4(x / sum), round4(y / sum)]
    }
}

fn gamma(channel: u8) -> f64 {
    let v = f64::from(channel) / 255.0;
    if v > 0.04045 {
        ((v + 0.055) / 1.055).powf(2.4)
    } else {
        v / 12.92
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

impl FromStr for Color {
    type Err = Error;

    /// Parse from a hex string (e.g., "ff270d" or "#FF270D").
    fn from_str(s: &str) -> Result<Self, Error> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColorString(s.to_string()));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| Error::InvalidColorString(s.to_string()))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
