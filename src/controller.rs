//! The bridge connector façade driven by the gesture and speech front-ends.

use std::str::FromStr;
use std::sync::Arc;

use log::{debug, warn};

use crate::bridge::{self, Connection};
use crate::chaser::ChaserEngine;
use crate::config::ConnectorConfig;
use crate::errors::Error;
use crate::payload::LightCommand;
use crate::runtime::{Handle, JoinHandle};
use crate::status::{LightSnapshot, LightState};
use crate::transport::{CommandQueue, Transport};
use crate::types::{AlertMode, Brightness, Color, LampSet, PowerMode};

type Result<T> = std::result::Result<T, Error>;

/// Controls the lamps behind one bridge.
///
/// Every command method takes `&self`, returns immediately and may be called
/// from any thread: the command is mirrored into the local [`LightState`] and
/// queued for delivery. Delivery is best effort; a failed send is logged and
/// dropped, never reported to the caller. Commands reach the bridge in the
/// order they were issued.
///
/// `lamps: None` (or an empty [`LampSet`]) targets every lamp.
///
/// Share one controller between front-ends with an [`Arc`].
pub struct Controller<T: Transport = Connection> {
    transport: Arc<T>,
    state: Arc<LightState>,
    queue: CommandQueue,
    chaser: ChaserEngine,
    worker: JoinHandle<()>,
}

impl Controller<Connection> {
    /// Locate the bridge, authenticate and build a controller over it.
    pub async fn connect(config: &ConnectorConfig) -> Result<Self> {
        let connection = bridge::connect(config).await?;
        Ok(Self::new(connection, config))
    }
}

impl<T: Transport> Controller<T> {
    /// Build a controller on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn new(transport: T, config: &ConnectorConfig) -> Self {
        Self::with_handle(transport, config, Handle::current())
    }

    /// Build a controller whose background tasks run on `handle`.
    pub fn with_handle(transport: T, config: &ConnectorConfig, handle: Handle) -> Self {
        let transport = Arc::new(transport);
        let state = Arc::new(LightState::new());
        let (queue, worker) =
            CommandQueue::spawn(Arc::clone(&transport), config.queue_capacity, &handle);
        let chaser = ChaserEngine::new(
            Arc::clone(&state),
            queue.clone(),
            config.chaser_lamps.clone(),
            config.chaser_interval,
            handle,
        );

        Controller {
            transport,
            state,
            queue,
            chaser,
            worker,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> &LightState {
        &self.state
    }

    pub fn snapshot(&self) -> LightSnapshot {
        self.state.snapshot()
    }

    /// Switch every lamp on at maximum brightness.
    pub fn initialize_lights(&self) {
        self.switch_on(None);
        self.set_brightness(i32::from(self.max_brightness()), None);
    }

    pub fn switch_on(&self, lamps: Option<&LampSet>) {
        self.dispatch(LightCommand::from(&PowerMode::On), lamps);
    }

    pub fn switch_off(&self, lamps: Option<&LampSet>) {
        self.dispatch(LightCommand::from(&PowerMode::Off), lamps);
    }

    /// Set the color from a hex string such as `"ff270d"`.
    ///
    /// Brightness is left as it is. An unparseable color is logged and
    /// ignored.
    pub fn set_color(&self, color: &str, lamps: Option<&LampSet>) {
        let Some(color) = parse_color(color) else {
            return;
        };
        self.dispatch(LightCommand::from(&color), lamps);
    }

    /// Set the brightness; levels outside 0..=255 are silently ignored.
    pub fn set_brightness(&self, level: i32, lamps: Option<&LampSet>) {
        let Some(brightness) = Brightness::create(level) else {
            debug!("ignoring brightness {level}");
            return;
        };
        self.dispatch(LightCommand::from(&brightness), lamps);
    }

    /// Set color and brightness in one command.
    ///
    /// Follows the same policy as [`Self::set_brightness`] and
    /// [`Self::set_color`]: if either value is invalid nothing is sent.
    pub fn set_color_and_brightness(&self, color: &str, level: i32, lamps: Option<&LampSet>) {
        let Some(brightness) = Brightness::create(level) else {
            debug!("ignoring color {color} with brightness {level}");
            return;
        };
        let Some(color) = parse_color(color) else {
            return;
        };

        let mut command = LightCommand::from(&color);
        command.brightness(&brightness);
        self.dispatch(command, lamps);
    }

    pub fn set_alert_on(&self, lamps: Option<&LampSet>) {
        self.dispatch(LightCommand::from(AlertMode::LSelect), lamps);
    }

    pub fn set_alert_off(&self, lamps: Option<&LampSet>) {
        self.dispatch(LightCommand::from(AlertMode::None), lamps);
    }

    /// Start the chaser unless it is already running.
    ///
    /// Returns `true` if a new loop was started.
    pub fn start_chaser(&self) -> bool {
        self.chaser.start()
    }

    /// Ask the chaser to stop after its current on/off pair.
    ///
    /// Returns `true` if a loop was running.
    pub fn stop_chaser(&self) -> bool {
        self.chaser.stop()
    }

    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    pub fn is_alert_on(&self) -> bool {
        self.state.is_alert_on()
    }

    pub fn is_chaser_on(&self) -> bool {
        self.state.is_chaser_on()
    }

    /// Whether a chaser loop task is still alive, including one that was
    /// asked to stop and is finishing its last pair.
    pub fn is_chaser_looping(&self) -> bool {
        self.chaser.is_looping()
    }

    pub fn current_brightness(&self) -> u8 {
        self.state.brightness().value()
    }

    pub fn max_brightness(&self) -> u8 {
        Brightness::MAX
    }

    fn dispatch(&self, command: LightCommand, lamps: Option<&LampSet>) {
        self.state.update_from_command(&command);
        self.queue
            .push(command, lamps.cloned().unwrap_or_default());
    }
}

impl<T: Transport> Drop for Controller<T> {
    fn drop(&mut self) {
        self.chaser.stop();
        if !self.worker.is_finished() {
            debug!("controller dropped; command queue drains in the background");
        }
    }
}

fn parse_color(color: &str) -> Option<Color> {
    Color::from_str(color)
        .inspect_err(|e| warn!("ignoring color: {e}"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::runtime;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(LightCommand, LampSet)>>,
    }

    impl Transport for Recorder {
        async fn send(&self, command: &LightCommand, lamps: &LampSet) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((command.clone(), lamps.clone()));
            Ok(())
        }
    }

    impl Recorder {
        fn sent(&self) -> Vec<(LightCommand, LampSet)> {
            self.sent.lock().unwrap().clone()
        }
    }

    struct Failing;

    impl Transport for Failing {
        async fn send(&self, _: &LightCommand, _: &LampSet) -> Result<()> {
            Err(Error::timeout("PUT /groups/0/action"))
        }
    }

    async fn settle() {
        runtime::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn test_out_of_range_brightness_is_ignored() {
        let controller = Controller::new(Recorder::default(), &ConnectorConfig::default());
        for level in [-255, -1, 256, 1000, i32::MIN, i32::MAX] {
            controller.set_brightness(level, None);
        }
        settle().await;

        assert_eq!(controller.current_brightness(), 255);
        assert!(controller.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn test_in_range_brightness_is_applied() {
        let controller = Controller::new(Recorder::default(), &ConnectorConfig::default());
        for level in [0, 1, 51, 128, 254, 255] {
            controller.set_brightness(level, None);
            assert_eq!(i32::from(controller.current_brightness()), level);
        }
        settle().await;
        assert_eq!(controller.transport().sent().len(), 6);
    }

    #[tokio::test]
    async fn test_power_is_idempotent_but_resent() {
        let controller = Controller::new(Recorder::default(), &ConnectorConfig::default());
        controller.switch_on(None);
        controller.switch_on(None);
        assert!(controller.is_on());
        controller.switch_off(None);
        assert!(!controller.is_on());
        settle().await;

        let powers: Vec<_> = controller
            .transport()
            .sent()
            .iter()
            .map(|(c, _)| c.get_power())
            .collect();
        assert_eq!(
            powers,
            vec![Some(PowerMode::On), Some(PowerMode::On), Some(PowerMode::Off)]
        );
    }

    #[tokio::test]
    async fn test_color_keeps_brightness_and_targets_lamps() {
        let controller = Controller::new(Recorder::default(), &ConnectorConfig::default());
        controller.set_brightness(100, None);
        controller.set_color("ff270d", Some(&LampSet::single("2")));
        controller.set_color("not a color", None);
        settle().await;

        assert_eq!(controller.current_brightness(), 100);
        let sent = controller.transport().sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].0.get_color(), Some(Color::rgb(255, 39, 13)));
        assert_eq!(sent[1].0.get_brightness(), None);
        assert_eq!(sent[1].1, LampSet::single("2"));
    }

    #[tokio::test]
    async fn test_color_and_brightness_uses_the_same_bounds() {
        let controller = Controller::new(Recorder::default(), &ConnectorConfig::default());
        controller.set_color_and_brightness("0000ff", 300, None);
        controller.set_color_and_brightness("0000ff", 80, None);
        settle().await;

        let sent = controller.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.get_brightness().unwrap().value(), 80);
        assert_eq!(controller.current_brightness(), 80);
    }

    #[tokio::test]
    async fn test_alert_toggles() {
        let controller = Controller::new(Recorder::default(), &ConnectorConfig::default());
        controller.set_alert_on(None);
        assert!(controller.is_alert_on());
        controller.set_alert_off(None);
        assert!(!controller.is_alert_on());
        settle().await;

        let alerts: Vec<_> = controller
            .transport()
            .sent()
            .iter()
            .map(|(c, _)| c.get_alert())
            .collect();
        assert_eq!(alerts, vec![Some(AlertMode::LSelect), Some(AlertMode::None)]);
    }

    #[tokio::test]
    async fn test_send_failures_do_not_reach_the_caller() {
        let controller = Controller::new(Failing, &ConnectorConfig::default());
        controller.switch_on(None);
        settle().await;
        assert!(controller.is_on());
    }

    #[tokio::test]
    async fn test_full_queue_drops_commands() {
        let config = ConnectorConfig {
            queue_capacity: 1,
            ..ConnectorConfig::default()
        };
        let controller = Controller::new(Recorder::default(), &config);
        // The worker cannot run before this test yields.
        for _ in 0..5 {
            controller.switch_on(None);
        }
        settle().await;
        assert_eq!(controller.transport().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_chaser_without_lamps_never_starts() {
        let config = ConnectorConfig {
            chaser_lamps: LampSet::all(),
            ..ConnectorConfig::default()
        };
        let controller = Controller::new(Recorder::default(), &config);

        assert!(!controller.start_chaser());
        settle().await;
        assert!(!controller.is_chaser_on());
        assert!(!controller.is_chaser_looping());
        assert!(!controller.start_chaser());
        assert!(controller.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn test_usable_from_foreign_threads() {
        let controller = Arc::new(Controller::new(
            Recorder::default(),
            &ConnectorConfig::default(),
        ));
        let remote = Arc::clone(&controller);
        std::thread::spawn(move || {
            remote.switch_on(None);
            remote.set_brightness(10, None);
        })
        .join()
        .unwrap();
        settle().await;

        assert!(controller.is_on());
        assert_eq!(controller.current_brightness(), 10);
        assert_eq!(controller.transport().sent().len(), 2);
    }
}
