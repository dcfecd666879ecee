//! Light state tracking.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::payload::LightCommand;
use crate::types::Brightness;

/// Local mirror of the state the connector last requested from the lamps.
///
/// Every field is an atomic so the chaser task and callers on arbitrary
/// threads always observe the latest write.
#[derive(Debug)]
pub struct LightState {
    on: AtomicBool,
    alert: AtomicBool,
    chaser: AtomicBool,
    brightness: AtomicU8,
    chaser_lamp: AtomicUsize,
}

impl Default for LightState {
    fn default() -> Self {
        Self::new()
    }
}

impl LightState {
    /// Off, no alert, no chaser, maximum brightness.
    pub fn new() -> Self {
        LightState {
            on: AtomicBool::new(false),
            alert: AtomicBool::new(false),
            chaser: AtomicBool::new(false),
            brightness: AtomicU8::new(Brightness::MAX),
            chaser_lamp: AtomicUsize::new(1),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    pub fn is_alert_on(&self) -> bool {
        self.alert.load(Ordering::SeqCst)
    }

    pub fn is_chaser_on(&self) -> bool {
        self.chaser.load(Ordering::SeqCst)
    }

    pub fn brightness(&self) -> Brightness {
        Brightness {
            value: self.brightness.load(Ordering::SeqCst),
        }
    }

    /// One-based position of the lamp the chaser lights next.
    pub fn chaser_lamp(&self) -> usize {
        self.chaser_lamp.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> LightSnapshot {
        LightSnapshot {
            is_on: self.is_on(),
            is_alert_on: self.is_alert_on(),
            is_chaser_on: self.is_chaser_on(),
            brightness: self.brightness().value(),
            chaser_lamp: self.chaser_lamp(),
        }
    }

    /// Mirror the attributes a command sets.
    pub(crate) fn update_from_command(&self, command: &LightCommand) {
        if let Some(on) = command.on {
            self.on.store(on, Ordering::SeqCst);
        }
        if let Some(bri) = command.bri {
            self.brightness.store(bri, Ordering::SeqCst);
        }
        if let Some(alert) = command.alert {
            self.alert.store(alert.is_active(), Ordering::SeqCst);
        }
    }

    pub(crate) fn set_chaser_on(&self, on: bool) {
        self.chaser.store(on, Ordering::SeqCst);
    }

    pub(crate) fn set_chaser_lamp(&self, position: usize) {
        self.chaser_lamp.store(position, Ordering::SeqCst);
    }
}

/// Point-in-time copy of a [`LightState`].
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct LightSnapshot {
    pub is_on: bool,
    pub is_alert_on: bool,
    pub is_chaser_on: bool,
    pub brightness: u8,
    pub chaser_lamp: usize,
}
