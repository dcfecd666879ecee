//! Bridge discovery via SSDP multicast or the vendor lookup service.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use log::{debug, error, info};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::errors::{DiscoveryError, Error};
use crate::runtime::{self, AsyncUdpSocket, Instant, UdpSocket};

type Result<T> = std::result::Result<T, Error>;

const SSDP_ADDR: &str = "239.255.255.250:1900";
const SSDP_SEARCH: &str = "M-SEARCH * HTTP/1.1\r\n\
    HOST: 239.255.255.250:1900\r\n\
    MAN: \"ssdp:discover\"\r\n\
    MX: 3\r\n\
    ST: libhue:idl\r\n\r\n";
const CLOUD_URL: &str = "https://discovery.meethue.com/";
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Network location of one bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeAddress {
    pub ip: IpAddr,
    pub port: u16,
    /// Bridge id as advertised during discovery, if known.
    #[serde(default)]
    pub id: Option<String>,
}

impl BridgeAddress {
    pub const DEFAULT_PORT: u16 = 80;

    pub fn new(ip: IpAddr) -> Self {
        BridgeAddress {
            ip,
            port: Self::DEFAULT_PORT,
            id: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }

    /// Base URL of the bridge's REST interface, e.g. `http://192.168.1.52:80`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.socket_addr())
    }
}

impl From<SocketAddr> for BridgeAddress {
    fn from(addr: SocketAddr) -> Self {
        BridgeAddress::new(addr.ip()).with_port(addr.port())
    }
}

impl fmt::Display for BridgeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} ({id})", self.socket_addr()),
            None => write!(f, "{}", self.socket_addr()),
        }
    }
}

/// How to look for the bridge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMethod {
    /// Multicast probe on the local network.
    #[default]
    Ssdp,
    /// Ask the vendor's lookup service which bridges share our public IP.
    Cloud,
}

/// Locate exactly one bridge with the given method.
pub async fn locate(method: DiscoveryMethod, timeout: Duration) -> Result<BridgeAddress> {
    match method {
        DiscoveryMethod::Ssdp => locate_bridge(timeout).await,
        DiscoveryMethod::Cloud => locate_bridge_cloud(timeout).await,
    }
}

/// Locate the single bridge on the local network using SSDP.
///
/// Fails with [`DiscoveryError::NoneFound`] if nothing answers within
/// `discovery_timeout` and with [`DiscoveryError::MultipleFound`] if more
/// than one bridge answers.
///
/// # Examples
///
/// ```ignore
/// use std::time::Duration;
/// use hue_rig::locate_bridge;
///
/// let bridge = locate_bridge(Duration::from_secs(5)).await?;
/// println!("bridge at {bridge}");
/// ```
pub async fn locate_bridge(discovery_timeout: Duration) -> Result<BridgeAddress> {
    select_single(probe_ssdp(discovery_timeout).await?)
}

/// Send an SSDP search and collect every bridge that answers in time.
pub async fn probe_ssdp(discovery_timeout: Duration) -> Result<Vec<BridgeAddress>> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|e| Error::socket("bind", e))?;

    socket
        .set_multicast_ttl(2)
        .map_err(|e| Error::socket("set_multicast_ttl", e))?;

    socket
        .send_to(SSDP_SEARCH.as_bytes(), SSDP_ADDR)
        .await
        .map_err(|e| Error::socket("send_to", e))?;

    Ok(collect_answers(&socket, discovery_timeout).await)
}

/// Receive SSDP answers until `discovery_timeout` elapses.
///
/// Receive errors are logged and retried after a short pause, so a socket
/// that keeps failing cannot spin until the deadline.
async fn collect_answers<S: AsyncUdpSocket>(
    socket: &S,
    discovery_timeout: Duration,
) -> Vec<BridgeAddress> {
    let mut found = Vec::new();
    let start = Instant::now();
    let mut buffer = [0u8; 2048];
    let recv_timeout = Duration::from_millis(500);

    while start.elapsed() < discovery_timeout {
        let wait = recv_timeout.min(discovery_timeout.saturating_sub(start.elapsed()));
        match runtime::timeout(wait, socket.recv_from(&mut buffer)).await {
            Ok(Ok((size, addr))) => {
                let Ok(response) = String::from_utf8(buffer[..size].to_vec()) else {
                    continue;
                };
                match parse_ssdp_response(&response, addr) {
                    Some(bridge) => found.push(bridge),
                    None => debug!("ignoring SSDP answer from {addr}"),
                }
            }
            Ok(Err(e)) => {
                error!("SSDP receive failed: {e}");
                let left = discovery_timeout.saturating_sub(start.elapsed());
                runtime::sleep(RECV_ERROR_BACKOFF.min(left)).await;
            }
            // Recheck the overall deadline.
            Err(_) => continue,
        }
    }

    found
}

#[derive(Debug, Deserialize)]
struct CloudBridge {
    id: String,
    internalipaddress: String,
}

/// Locate the single bridge through the vendor lookup service.
pub async fn locate_bridge_cloud(timeout: Duration) -> Result<BridgeAddress> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let entries: Vec<CloudBridge> = client
        .get(CLOUD_URL)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let candidates = entries
        .into_iter()
        .filter_map(|entry| {
            let ip = entry.internalipaddress.parse().ok()?;
            Some(BridgeAddress {
                id: Some(entry.id.to_ascii_lowercase()),
                ..BridgeAddress::new(ip)
            })
        })
        .collect();
    select_single(candidates)
}

/// Apply the exactly-one policy to a list of discovery answers.
///
/// Answers are de-duplicated by bridge id, falling back to the IP when an
/// answer has no id, since a bridge answers a single probe several times.
///
/// # Examples
///
/// ```
/// use std::net::{IpAddr, Ipv4Addr};
/// use hue_rig::{BridgeAddress, DiscoveryError, Error, select_single};
///
/// let bridge = BridgeAddress::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 52)));
/// let picked = select_single(vec![bridge.clone(), bridge.clone()]).unwrap();
/// assert_eq!(picked, bridge);
///
/// assert!(matches!(
///     select_single(vec![]),
///     Err(Error::Discovery(DiscoveryError::NoneFound))
/// ));
/// ```
pub fn select_single(candidates: Vec<BridgeAddress>) -> Result<BridgeAddress> {
    let mut unique: Vec<BridgeAddress> = Vec::new();
    for candidate in candidates {
        match unique.iter_mut().find(|known| same_bridge(known, &candidate)) {
            // Prefer the answer that carries the bridge id.
            Some(known) if known.id.is_none() => *known = candidate,
            Some(_) => {}
            None => unique.push(candidate),
        }
    }

    match unique.len() {
        0 => Err(DiscoveryError::NoneFound.into()),
        1 => {
            let bridge = unique.pop().ok_or(DiscoveryError::NoneFound)?;
            info!("found bridge at {bridge}");
            Ok(bridge)
        }
        n => Err(DiscoveryError::MultipleFound(n).into()),
    }
}

/// Two answers name the same bridge when their ids match, or, if either
/// lacks an id, when they come from the same IP.
fn same_bridge(a: &BridgeAddress, b: &BridgeAddress) -> bool {
    match (&a.id, &b.id) {
        (Some(x), Some(y)) => x == y,
        _ => a.ip == b.ip,
    }
}

/// Parse one SSDP answer, keeping it only if it comes from a Hue bridge.
pub(crate) fn parse_ssdp_response(response: &str, source: SocketAddr) -> Option<BridgeAddress> {
    let mut lines = response.lines();
    if !lines.next()?.contains(" 200 ") {
        return None;
    }

    let mut bridge_id = None;
    let mut server = String::new();
    let mut location = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "hue-bridgeid" => bridge_id = Some(value.to_ascii_lowercase()),
            "server" => server = value.to_string(),
            "location" => location = Url::parse(value).ok(),
            _ => {}
        }
    }

    if bridge_id.is_none() && !server.contains("IpBridge") {
        return None;
    }

    let mut bridge = BridgeAddress::new(source.ip());
    if let Some(url) = location {
        if let Some(ip) = url.host_str().and_then(|h| h.parse().ok()) {
            bridge.ip = ip;
        }
        bridge.port = url.port_or_known_default().unwrap_or(BridgeAddress::DEFAULT_PORT);
    }
    bridge.id = bridge_id;
    Some(bridge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn source() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::new(192, 168, 1, 52), 1900))
    }

    fn bridge(last: u8, id: Option<&str>) -> BridgeAddress {
        BridgeAddress {
            id: id.map(String::from),
            ..BridgeAddress::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, last)))
        }
    }

    #[test]
    fn test_parse_bridge_answer() {
        let answer = "HTTP/1.1 200 OK\r\n\
            CACHE-CONTROL: max-age=100\r\n\
            LOCATION: http://192.168.1.52:80/description.xml\r\n\
            SERVER: Linux/3.14.0 UPnP/1.0 IpBridge/1.26.0\r\n\
            hue-bridgeid: 001788FFFE100491\r\n\
            ST: upnp:rootdevice\r\n\r\n";

        let parsed = parse_ssdp_response(answer, source()).unwrap();
        assert_eq!(parsed.ip, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 52)));
        assert_eq!(parsed.port, 80);
        assert_eq!(parsed.id.as_deref(), Some("001788fffe100491"));
    }

    #[test]
    fn test_ignore_other_devices() {
        let answer = "HTTP/1.1 200 OK\r\n\
            LOCATION: http://192.168.1.20:49152/desc.xml\r\n\
            SERVER: Linux UPnP/1.0 SomeTV/2.0\r\n\r\n";
        assert!(parse_ssdp_response(answer, source()).is_none());
        assert!(parse_ssdp_response("NOTIFY * HTTP/1.1\r\n\r\n", source()).is_none());
    }

    #[test]
    fn test_exactly_one_policy() {
        assert_eq!(
            select_single(vec![]).unwrap_err(),
            Error::Discovery(DiscoveryError::NoneFound)
        );
        assert_eq!(
            select_single(vec![bridge(52, Some("a")), bridge(53, Some("b"))]).unwrap_err(),
            Error::Discovery(DiscoveryError::MultipleFound(2))
        );
        assert_eq!(
            select_single(vec![bridge(52, Some("a"))]).unwrap(),
            bridge(52, Some("a"))
        );
    }

    #[test]
    fn test_repeated_answers_count_once() {
        let picked = select_single(vec![
            bridge(52, Some("a")),
            bridge(52, Some("a")),
            bridge(52, Some("a")),
        ])
        .unwrap();
        assert_eq!(picked.id.as_deref(), Some("a"));
    }

    #[test]
    fn test_answers_with_and_without_id_are_one_bridge() {
        let picked = select_single(vec![bridge(52, None), bridge(52, Some("a"))]).unwrap();
        assert_eq!(picked.id.as_deref(), Some("a"));

        let picked = select_single(vec![bridge(52, Some("a")), bridge(52, None)]).unwrap();
        assert_eq!(picked.id.as_deref(), Some("a"));

        assert_eq!(
            select_single(vec![bridge(52, Some("a")), bridge(53, None)]).unwrap_err(),
            Error::Discovery(DiscoveryError::MultipleFound(2))
        );
    }

    struct RefusingSocket {
        receives: AtomicUsize,
    }

    impl AsyncUdpSocket for RefusingSocket {
        async fn bind(_: &str) -> io::Result<Self> {
            Ok(RefusingSocket {
                receives: AtomicUsize::new(0),
            })
        }

        async fn send_to(&self, buf: &[u8], _: &str) -> io::Result<usize> {
            Ok(buf.len())
        }

        async fn recv_from(&self, _: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
            self.receives.fetch_add(1, Ordering::SeqCst);
            Err(io::Error::from(io::ErrorKind::ConnectionRefused))
        }

        fn set_multicast_ttl(&self, _: u32) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_errors_back_off() {
        let socket = RefusingSocket::bind("0.0.0.0:0").await.unwrap();
        let found = collect_answers(&socket, Duration::from_secs(1)).await;

        assert!(found.is_empty());
        let receives = socket.receives.load(Ordering::SeqCst);
        assert!((1..=11).contains(&receives), "{receives} receives");
    }

    #[test]
    fn test_base_url() {
        assert_eq!(bridge(52, None).base_url(), "http://192.168.1.52:80");
    }
}
