//! CLI application for a Hue bridge.
//!
//! One-shot commands talk to the bridge directly and report failures. The
//! `chaser` and `listen` commands run the controller, so their sends are
//! best effort.
//!
//! Run with: cargo run --example rig_cli -- --help

use std::io::BufRead;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use hue_rig::{
    AlertMode, Brightness, Color, Connection, ConnectorConfig, Controller, DiscoveryMethod,
    GestureDispatcher, LampSet, LightCommand, Notifier, PowerMode, SpeechDispatcher, connect,
    locate, register,
};

#[derive(Parser)]
#[command(name = "rig-cli")]
#[command(about = "Drive Philips Hue lamps from the command line", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bridge IP address (skips discovery)
    #[arg(short, long, global = true)]
    ip: Option<IpAddr>,

    /// Application key registered on the bridge
    #[arg(short, long, global = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the bridge on the network
    Discover {
        /// Use the cloud lookup service instead of SSDP
        #[arg(long)]
        cloud: bool,
    },

    /// Press the link button, then run this to obtain an application key
    Register,

    /// Show the bridge configuration and its lamps
    Status,

    /// Turn lamps on
    On {
        #[arg(short, long)]
        lamp: Option<String>,
    },

    /// Turn lamps off
    Off {
        #[arg(short, long)]
        lamp: Option<String>,
    },

    /// Set a hex color such as ff270d
    Color {
        hex: String,
        #[arg(short, long)]
        lamp: Option<String>,
    },

    /// Set brightness (0-255)
    Brightness {
        level: u8,
        #[arg(short, long)]
        lamp: Option<String>,
    },

    /// Start or stop the breathing alert
    Alert {
        #[arg(long)]
        off: bool,
    },

    /// Run the chaser for a while
    Chaser {
        /// Seconds to run (default: 10)
        #[arg(short, long, default_value = "10")]
        seconds: u64,
    },

    /// Read events from stdin: `g <gesture>` or `s <words>`, one per line
    Listen,
}

fn lamps(lamp: Option<String>) -> LampSet {
    lamp.map(LampSet::single).unwrap_or_default()
}

fn load_config(cli: &Cli) -> Result<ConnectorConfig, hue_rig::Error> {
    let mut config = match &cli.config {
        Some(path) => ConnectorConfig::from_json_file(path)?,
        None => ConnectorConfig::default(),
    };
    if cli.ip.is_some() {
        config.bridge = cli.ip;
    }
    if let Some(key) = &cli.key {
        config.app_key = key.clone();
    }
    Ok(config)
}

async fn send(
    connection: &Connection,
    command: LightCommand,
    lamps: LampSet,
) -> Result<(), hue_rig::Error> {
    connection.send_command(&command, &lamps).await?;
    println!("Sent to {lamps}");
    Ok(())
}

fn listen(gestures: &GestureDispatcher, speech: &SpeechDispatcher) -> std::io::Result<()> {
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        match line.trim().split_once(' ') {
            Some(("g", gesture)) => {
                if gestures.handle_name(gesture).is_none() {
                    eprintln!("Unknown gesture: {gesture}");
                }
            }
            Some(("s", words)) => {
                if speech.handle_utterance(words).is_none() {
                    eprintln!("Ignored: {words}");
                }
            }
            _ if line.trim() == "quit" => break,
            _ => eprintln!("Expected `g <gesture>` or `s <words>`"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Discover { cloud } => {
            let method = if cloud {
                DiscoveryMethod::Cloud
            } else {
                DiscoveryMethod::Ssdp
            };
            println!(
                "Looking for a bridge (timeout: {}s)...",
                config.discovery_timeout.as_secs()
            );
            let bridge = locate(method, config.discovery_timeout).await?;
            println!("Found bridge at {bridge}");
        }

        Commands::Register => {
            let address = match config.bridge_address() {
                Some(address) => address,
                None => locate(config.discovery_method, config.discovery_timeout).await?,
            };
            let connection = register(
                &address,
                &config.app_name,
                &config.app_key,
                config.registration_timeout,
            )
            .await?;
            println!("Registered; application key: {}", connection.credential().key);
        }

        Commands::Status => {
            let connection = connect(&config).await?;
            let bridge = connection.config().await?;
            println!("Bridge at {}", connection.address());
            if let Some(name) = bridge.get("name").and_then(|n| n.as_str()) {
                println!("  Name: {name}");
            }
            println!("  Lamps: {}", connection.lamp_ids().await?);
            let summary = connection.history().summary();
            println!(
                "  Messages: {} sent, {} received",
                summary.send_count, summary.receive_count
            );
        }

        Commands::On { lamp } => {
            let connection = connect(&config).await?;
            send(&connection, LightCommand::from(&PowerMode::On), lamps(lamp)).await?;
        }

        Commands::Off { lamp } => {
            let connection = connect(&config).await?;
            send(&connection, LightCommand::from(&PowerMode::Off), lamps(lamp)).await?;
        }

        Commands::Color { hex, lamp } => {
            let color = Color::from_str(&hex)?;
            let connection = connect(&config).await?;
            send(&connection, LightCommand::from(&color), lamps(lamp)).await?;
        }

        Commands::Brightness { level, lamp } => {
            let brightness = Brightness::create_or(i32::from(level));
            let connection = connect(&config).await?;
            send(&connection, LightCommand::from(&brightness), lamps(lamp)).await?;
        }

        Commands::Alert { off } => {
            let alert = if off {
                AlertMode::None
            } else {
                AlertMode::LSelect
            };
            let connection = connect(&config).await?;
            send(&connection, LightCommand::from(alert), LampSet::all()).await?;
        }

        Commands::Chaser { seconds } => {
            let controller = Controller::connect(&config).await?;
            controller.start_chaser();
            println!("Chasing over {} for {seconds}s...", config.chaser_lamps);
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            controller.stop_chaser();
            while controller.is_chaser_looping() {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }

        Commands::Listen => {
            let controller = Arc::new(Controller::connect(&config).await?);
            controller.initialize_lights();

            let notifier = Arc::new(Notifier::new());
            notifier.subscribe(|command| println!("> {command}"));
            let gestures = GestureDispatcher::new(
                Arc::clone(&controller),
                Arc::clone(&notifier),
                config.brightness_step,
            );
            let speech = SpeechDispatcher::new(Arc::clone(&controller), notifier);

            tokio::task::spawn_blocking(move || listen(&gestures, &speech)).await??;
            controller.stop_chaser();
        }
    }

    Ok(())
}
