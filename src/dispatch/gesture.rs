//! Gesture events.

use std::str::FromStr;
use std::sync::Arc;

use log::debug;
use strum_macros::{AsRefStr, EnumIter, EnumString};

use crate::bridge::Connection;
use crate::controller::Controller;
use crate::notify::Notifier;
use crate::transport::Transport;

/// Gestures the recognizer can classify.
///
/// Parsing is case-insensitive and accepts the recognizer's own labels:
///
/// ```
/// use std::str::FromStr;
/// use hue_rig::Gesture;
///
/// assert_eq!(Gesture::from_str("Circle(CW)").unwrap(), Gesture::Circle);
/// assert_eq!(Gesture::from_str("v").unwrap(), Gesture::V);
/// assert_eq!(Gesture::Caret.as_ref(), "caret");
/// assert!(Gesture::from_str("wave").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Gesture {
    /// Toggle the chaser.
    #[strum(to_string = "circle", serialize = "Circle(CW)")]
    Circle,
    /// Stop the chaser, then toggle power.
    #[strum(to_string = "delete")]
    Delete,
    /// Toggle the alert.
    #[strum(to_string = "line")]
    Line,
    /// Brighter.
    #[strum(to_string = "caret")]
    Caret,
    /// Dimmer.
    #[strum(to_string = "v")]
    V,
}

/// Maps gestures onto controller calls.
pub struct GestureDispatcher<T: Transport = Connection> {
    controller: Arc<Controller<T>>,
    notifier: Arc<Notifier>,
    brightness_step: i32,
}

impl<T: Transport> GestureDispatcher<T> {
    pub fn new(controller: Arc<Controller<T>>, notifier: Arc<Notifier>, brightness_step: i32) -> Self {
        GestureDispatcher {
            controller,
            notifier,
            brightness_step,
        }
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    /// Handle a gesture by name; unknown names are ignored.
    pub fn handle_name(&self, name: &str) -> Option<Gesture> {
        match Gesture::from_str(name.trim()) {
            Ok(gesture) => {
                self.handle(gesture);
                Some(gesture)
            }
            Err(_) => {
                debug!("ignoring unknown gesture {name:?}");
                None
            }
        }
    }

    pub fn handle(&self, gesture: Gesture) {
        let controller = &self.controller;
        match gesture {
            Gesture::Circle => {
                if controller.is_chaser_on() {
                    controller.stop_chaser();
                } else {
                    controller.start_chaser();
                }
            }
            Gesture::Delete => {
                controller.stop_chaser();
                if controller.is_on() {
                    controller.switch_off(None);
                } else {
                    controller.switch_on(None);
                }
            }
            Gesture::Line => {
                if controller.is_alert_on() {
                    controller.set_alert_off(None);
                } else {
                    controller.set_alert_on(None);
                }
            }
            Gesture::Caret => self.adjust_brightness(self.brightness_step),
            Gesture::V => self.adjust_brightness(-self.brightness_step),
        }
        self.notifier.notify(gesture.as_ref());
    }

    fn adjust_brightness(&self, delta: i32) {
        match self.controller.state().brightness().offset(delta) {
            Some(level) => self.controller.set_brightness(i32::from(level.value()), None),
            None => debug!("brightness already at the limit, ignoring {delta:+}"),
        }
    }
}
