//! # hue_rig
//!
//! A connector for Philips Hue bridges plus a small effects engine, driven
//! by gesture and speech front-ends.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use hue_rig::{ConnectorConfig, Controller, Gesture, GestureDispatcher, Notifier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hue_rig::Error> {
//!     let config = ConnectorConfig::from_json_file("hue-rig.json")?;
//!
//!     // Locate the bridge, authenticate and start the command worker.
//!     let controller = Arc::new(Controller::connect(&config).await?);
//!     controller.initialize_lights();
//!     controller.set_color("ff270d", None);
//!
//!     let gestures = GestureDispatcher::new(
//!         Arc::clone(&controller),
//!         Arc::new(Notifier::new()),
//!         config.brightness_step,
//!     );
//!     gestures.handle(Gesture::Circle);
//!     Ok(())
//! }
//! ```
//!
//! ## Overview
//!
//! - **Discovery**: find the bridge over SSDP or the vendor's cloud lookup
//!   with [`locate`]; anything but exactly one bridge is an error
//! - **Registration**: the link-button handshake in [`register`], or
//!   [`initialize`] with a stored key
//! - **Controller**: [`Controller`] mirrors every command into a
//!   [`LightState`] and queues it for delivery; callers never block and send
//!   failures are only logged
//! - **Chaser**: a background loop that walks an on/off pulse across lamps
//! - **Dispatchers**: [`GestureDispatcher`] and [`SpeechDispatcher`] map
//!   recognized events onto controller calls and announce them through a
//!   [`Notifier`]
//!
//! ## Communication
//!
//! Commands travel as JSON over the bridge's HTTP interface. A command for
//! every lamp goes to the broadcast group `0`; a targeted command is sent to
//! each lamp's state resource.

mod bridge;
mod chaser;
mod config;
mod controller;
mod discovery;
pub mod dispatch;
mod errors;
mod history;
mod notify;
mod payload;
pub mod response;
pub mod runtime;
mod status;
mod transport;
mod types;

// Re-export public API
pub use bridge::{AppCredential, Connection, connect, initialize, register};
pub use config::ConnectorConfig;
pub use controller::Controller;
pub use discovery::{
    BridgeAddress, DiscoveryMethod, locate, locate_bridge, locate_bridge_cloud, probe_ssdp,
    select_single,
};
pub use dispatch::{Gesture, GestureDispatcher, NamedColor, SpeechCommand, SpeechDispatcher};
pub use errors::{DiscoveryError, Error, RegistrationError};
pub use history::{HistoryEntry, HistorySummary, MessageHistory, MessageType};
pub use notify::{CommandCallback, ListenerId, Notifier};
pub use payload::LightCommand;
pub use status::{LightSnapshot, LightState};
pub use transport::Transport;
pub use types::{AlertMode, Brightness, Color, LampId, LampSet, PowerMode};
