//! Registration against the bridge and the authenticated connection.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::ConnectorConfig;
use crate::discovery::{self, BridgeAddress};
use crate::errors::Error;
use crate::history::{MessageHistory, MessageType};
use crate::payload::LightCommand;
use crate::response::{parse_reply, parse_username};
use crate::transport::Transport;
use crate::types::{LampId, LampSet};

type Result<T> = std::result::Result<T, Error>;

/// Application name and the key the bridge knows it by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCredential {
    pub app_name: String,
    pub key: String,
}

impl AppCredential {
    pub fn new(app_name: &str, key: &str) -> Self {
        AppCredential {
            app_name: app_name.to_string(),
            key: key.to_string(),
        }
    }
}

/// An authenticated handle to one bridge.
///
/// Obtained from [`register`], [`initialize`] or [`connect`]. Every request
/// and reply is recorded in a bounded [`MessageHistory`].
#[derive(Debug)]
pub struct Connection {
    address: BridgeAddress,
    credential: AppCredential,
    client: reqwest::Client,
    history: Arc<Mutex<MessageHistory>>,
}

/// Run the link-button handshake and return a fresh connection.
///
/// The bridge only accepts the handshake shortly after its physical link
/// button was pressed; otherwise this fails with
/// [`RegistrationError::LinkButtonNotPressed`](crate::RegistrationError::LinkButtonNotPressed).
/// The whole exchange is bounded by `timeout`.
pub async fn register(
    address: &BridgeAddress,
    app_name: &str,
    app_key: &str,
    timeout: Duration,
) -> Result<Connection> {
    let client = build_client(timeout)?;
    let url = format!("{}/api", address.base_url());
    let body = json!({ "devicetype": format!("{app_name}#{app_key}") });

    debug!("registering {app_name} at {address}");
    let reply = exchange(&client, Method::POST, &url, Some(&body)).await?;
    let key = parse_username(reply)?;

    info!("registered {app_name} at {address}");
    Ok(Connection::new(
        address.clone(),
        AppCredential::new(app_name, &key),
        client,
    ))
}

/// Reuse a previously registered credential without the handshake.
///
/// Makes one request to confirm the bridge is reachable and still knows the
/// key.
pub async fn initialize(
    address: &BridgeAddress,
    credential: &AppCredential,
    timeout: Duration,
) -> Result<Connection> {
    let connection = Connection::new(address.clone(), credential.clone(), build_client(timeout)?);
    let config = connection.config().await?;
    let name = config.get("name").and_then(Value::as_str).unwrap_or("bridge");
    info!("connected {} to {name} at {address}", credential.app_name);
    Ok(connection)
}

/// Find (or take from the configuration) the bridge and authenticate.
pub async fn connect(config: &ConnectorConfig) -> Result<Connection> {
    config.validate()?;
    let address = match config.bridge_address() {
        Some(address) => address,
        None => discovery::locate(config.discovery_method, config.discovery_timeout).await?,
    };

    if config.register_app {
        register(
            &address,
            &config.app_name,
            &config.app_key,
            config.registration_timeout,
        )
        .await
    } else {
        initialize(&address, &config.credential(), config.registration_timeout).await
    }
}

impl Connection {
    fn new(address: BridgeAddress, credential: AppCredential, client: reqwest::Client) -> Self {
        Connection {
            address,
            credential,
            client,
            history: Arc::new(Mutex::new(MessageHistory::new())),
        }
    }

    pub fn address(&self) -> &BridgeAddress {
        &self.address
    }

    pub fn credential(&self) -> &AppCredential {
        &self.credential
    }

    pub fn history(&self) -> MessageHistory {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_history(&self) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// The bridge configuration (name, software version, whitelist, ...).
    pub async fn config(&self) -> Result<Value> {
        let mut payloads = self.request(Method::GET, "/config", None).await?;
        Ok(payloads.pop().unwrap_or(Value::Null))
    }

    /// Identifiers of every lamp the bridge knows.
    pub async fn lamp_ids(&self) -> Result<LampSet> {
        let payloads = self.request(Method::GET, "/lights", None).await?;
        let Some(Value::Object(lights)) = payloads.into_iter().next() else {
            return Ok(LampSet::all());
        };
        let mut ids: Vec<&String> = lights.keys().collect();
        ids.sort_by(|a, b| (a.len(), a).cmp(&(b.len(), b)));
        Ok(ids.into_iter().map(|id| LampId::new(id.as_str())).collect())
    }

    /// Send a command to the given lamps, or to group 0 (all lamps) for a
    /// broadcast.
    pub async fn send_command(&self, command: &LightCommand, lamps: &LampSet) -> Result<()> {
        if !command.is_valid() {
            return Err(Error::NoAttribute);
        }
        let body = serde_json::to_value(command).map_err(Error::JsonDump)?;

        if lamps.is_broadcast() {
            self.request(Method::PUT, "/groups/0/action", Some(&body))
                .await?;
            return Ok(());
        }

        let body = &body;
        let results = join_all(lamps.iter().map(|lamp| {
            let path = format!("/lights/{lamp}/state");
            async move { self.request(Method::PUT, &path, Some(body)).await }
        }))
        .await;

        results.into_iter().try_for_each(|r| r.map(|_| ()))
    }

    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Vec<Value>> {
        let label = format!("{method} {path}");
        let url = format!(
            "{}/api/{}{}",
            self.address.base_url(),
            self.credential.key,
            path
        );

        self.record(MessageType::Send, &label, body.unwrap_or(&Value::Null));
        let reply = match exchange(&self.client, method, &url, body).await {
            Ok(reply) => reply,
            Err(e) => {
                self.record_error(&e);
                return Err(e);
            }
        };
        self.record(MessageType::Receive, &label, &reply);

        parse_reply(reply).inspect_err(|e| self.record_error(e))
    }

    fn record(&self, msg_type: MessageType, label: &str, message: &Value) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(msg_type, label, message);
    }

    fn record_error(&self, err: &Error) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_error(&err.to_string());
    }
}

impl Transport for Connection {
    async fn send(&self, command: &LightCommand, lamps: &LampSet) -> Result<()> {
        self.send_command(command, lamps).await
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    // The bridge always sits on the local network.
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .no_proxy()
        .build()?)
}

async fn exchange(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<&Value>,
) -> Result<Value> {
    let mut request = client.request(method.clone(), url);
    if let Some(body) = body {
        request = request.json(body);
    }

    let action = format!("{method} {url}");
    let http_error = |e: reqwest::Error| {
        if e.is_timeout() {
            Error::timeout(&action)
        } else {
            Error::Http(e)
        }
    };

    let response = request
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(http_error)?;
    debug!("{action} -> {}", response.status());
    response.json().await.map_err(http_error)
}
