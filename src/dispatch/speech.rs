//! Speech events.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use strum_macros::{AsRefStr, EnumString};

use crate::bridge::Connection;
use crate::controller::Controller;
use crate::notify::Notifier;
use crate::transport::Transport;
use crate::types::LampSet;

/// Color used to highlight a single lamp named by voice.
const LAMP_HIGHLIGHT: &str = "ff270d";

/// Colors that can be named by voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NamedColor {
    Red,
    Green,
    Blue,
}

impl NamedColor {
    pub fn hex(&self) -> &'static str {
        match self {
            NamedColor::Red => "ff0000",
            NamedColor::Green => "00cc00",
            NamedColor::Blue => "0000ff",
        }
    }
}

/// A recognized spoken command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechCommand {
    On,
    /// Alert off, chaser off, then power off.
    Off,
    /// Stop the chaser and stop listening.
    Stop,
    /// `red`, `green`, `blue` or `color <name>`: color every lamp.
    Color(NamedColor),
    /// `lamp <n>`: highlight one lamp.
    Lamp(u8),
}

impl SpeechCommand {
    /// Parse one or two recognized words.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_rig::{NamedColor, SpeechCommand};
    ///
    /// assert_eq!(SpeechCommand::parse(&["off"]), Some(SpeechCommand::Off));
    /// assert_eq!(SpeechCommand::parse(&["lamp", "two"]), Some(SpeechCommand::Lamp(2)));
    /// assert_eq!(
    ///     SpeechCommand::parse(&["color", "green"]),
    ///     Some(SpeechCommand::Color(NamedColor::Green))
    /// );
    /// assert_eq!(SpeechCommand::parse(&["lamp"]), None);
    /// assert_eq!(SpeechCommand::parse(&["dance"]), None);
    /// ```
    pub fn parse(words: &[&str]) -> Option<Self> {
        let first = words.first()?.to_ascii_lowercase();
        let second = words.get(1).map(|w| w.to_ascii_lowercase());

        match (first.as_str(), second.as_deref()) {
            ("on", _) => Some(SpeechCommand::On),
            ("off", _) => Some(SpeechCommand::Off),
            ("stop", _) => Some(SpeechCommand::Stop),
            ("lamp", Some(number)) => lamp_number(number).map(SpeechCommand::Lamp),
            ("color", Some(name)) => NamedColor::from_str(name).ok().map(SpeechCommand::Color),
            (name, _) => NamedColor::from_str(name).ok().map(SpeechCommand::Color),
        }
    }
}

fn lamp_number(word: &str) -> Option<u8> {
    match word {
        "one" | "1" => Some(1),
        "two" | "2" => Some(2),
        "three" | "3" => Some(3),
        "four" | "4" => Some(4),
        _ => None,
    }
}

/// Maps spoken commands onto controller calls.
///
/// After `stop` the dispatcher ignores every utterance until
/// [`SpeechDispatcher::enable`] is called.
pub struct SpeechDispatcher<T: Transport = Connection> {
    controller: Arc<Controller<T>>,
    notifier: Arc<Notifier>,
    enabled: AtomicBool,
}

impl<T: Transport> SpeechDispatcher<T> {
    pub fn new(controller: Arc<Controller<T>>, notifier: Arc<Notifier>) -> Self {
        SpeechDispatcher {
            controller,
            notifier,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Handle a whole utterance such as `"lamp one"`.
    pub fn handle_utterance(&self, utterance: &str) -> Option<SpeechCommand> {
        let words: Vec<&str> = utterance.split_whitespace().collect();
        self.handle_words(&words)
    }

    /// Handle recognized words; returns the command that was executed.
    pub fn handle_words(&self, words: &[&str]) -> Option<SpeechCommand> {
        if !self.is_enabled() {
            debug!("speech disabled, ignoring {words:?}");
            return None;
        }
        let Some(command) = SpeechCommand::parse(words) else {
            debug!("ignoring unrecognized speech {words:?}");
            return None;
        };

        self.execute(command);
        self.notifier.notify(&words.join(" ").to_ascii_lowercase());
        Some(command)
    }

    fn execute(&self, command: SpeechCommand) {
        let controller = &self.controller;
        match command {
            SpeechCommand::On => controller.switch_on(None),
            SpeechCommand::Off => {
                controller.set_alert_off(None);
                controller.stop_chaser();
                controller.switch_off(None);
            }
            SpeechCommand::Stop => {
                controller.stop_chaser();
                self.disable();
            }
            SpeechCommand::Color(color) => controller.set_color(color.hex(), None),
            SpeechCommand::Lamp(number) => {
                controller.set_color(LAMP_HIGHLIGHT, Some(&LampSet::single(number)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::config::ConnectorConfig;
    use crate::errors::Error;
    use crate::payload::LightCommand;
    use crate::runtime;
    use crate::types::{AlertMode, Color, PowerMode};

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(LightCommand, LampSet)>>,
    }

    impl Transport for Recorder {
        async fn send(&self, command: &LightCommand, lamps: &LampSet) -> Result<(), Error> {
            self.sent
                .lock()
                .unwrap()
                .push((command.clone(), lamps.clone()));
            Ok(())
        }
    }

    fn dispatcher() -> SpeechDispatcher<Recorder> {
        let controller = Arc::new(Controller::new(
            Recorder::default(),
            &ConnectorConfig::default(),
        ));
        SpeechDispatcher::new(controller, Arc::new(Notifier::new()))
    }

    async fn sent(dispatcher: &SpeechDispatcher<Recorder>) -> Vec<(LightCommand, LampSet)> {
        runtime::sleep(Duration::from_millis(10)).await;
        dispatcher.controller.transport().sent.lock().unwrap().clone()
    }

    #[test]
    fn test_parse() {
        assert_eq!(SpeechCommand::parse(&["On"]), Some(SpeechCommand::On));
        assert_eq!(
            SpeechCommand::parse(&["red"]),
            Some(SpeechCommand::Color(NamedColor::Red))
        );
        assert_eq!(SpeechCommand::parse(&["lamp", "4"]), Some(SpeechCommand::Lamp(4)));
        assert_eq!(SpeechCommand::parse(&["lamp", "five"]), None);
        assert_eq!(SpeechCommand::parse(&["color", "purple"]), None);
        assert_eq!(SpeechCommand::parse(&[]), None);
    }

    #[tokio::test]
    async fn test_off_sends_alert_then_power() {
        let dispatcher = dispatcher();
        dispatcher.controller.start_chaser();
        assert_eq!(dispatcher.handle_words(&["off"]), Some(SpeechCommand::Off));
        assert!(!dispatcher.controller.is_chaser_on());

        let commands: Vec<_> = sent(&dispatcher)
            .await
            .into_iter()
            .map(|(c, _)| c)
            .filter(|c| c.get_alert().is_some() || c.get_power() == Some(PowerMode::Off))
            .collect();
        assert_eq!(commands[0].get_alert(), Some(AlertMode::None));
        assert_eq!(commands.last().unwrap().get_power(), Some(PowerMode::Off));
    }

    #[tokio::test]
    async fn test_lamp_highlights_one_lamp() {
        let dispatcher = dispatcher();
        dispatcher.handle_utterance("lamp two");

        let sent = sent(&dispatcher).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.get_color(), Some(Color::rgb(0xff, 0x27, 0x0d)));
        assert_eq!(sent[0].1, LampSet::single("2"));
    }

    #[tokio::test]
    async fn test_named_colors_target_every_lamp() {
        let dispatcher = dispatcher();
        dispatcher.handle_utterance("green");
        dispatcher.handle_utterance("color blue");

        let sent = sent(&dispatcher).await;
        assert_eq!(sent[0].0.get_color(), Some(Color::rgb(0, 0xcc, 0)));
        assert_eq!(sent[1].0.get_color(), Some(Color::rgb(0, 0, 0xff)));
        assert!(sent.iter().all(|(_, lamps)| lamps.is_broadcast()));
    }

    #[tokio::test]
    async fn test_stop_disables_until_enabled() {
        let dispatcher = dispatcher();
        let heard = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&heard);
        dispatcher
            .notifier()
            .subscribe(move |text| sink.lock().unwrap().push(text.to_string()));

        dispatcher.handle_utterance("stop");
        assert!(!dispatcher.is_enabled());
        assert_eq!(dispatcher.handle_utterance("on"), None);
        assert!(!dispatcher.controller.is_on());

        dispatcher.enable();
        assert_eq!(dispatcher.handle_utterance("Lamp One"), Some(SpeechCommand::Lamp(1)));
        assert_eq!(*heard.lock().unwrap(), vec!["stop", "lamp one"]);
    }
}
