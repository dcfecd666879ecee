/// Why bridge discovery did not produce exactly one bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    /// No bridge answered within the discovery window.
    #[error("no bridge found on the local network; check that it is powered and connected")]
    NoneFound,

    /// More than one bridge answered; the connector refuses to pick one.
    #[error("found {0} bridges on the local network; configure the bridge address explicitly")]
    MultipleFound(usize),
}

/// Why the bridge refused to hand out a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The physical link button was not pressed before registering.
    #[error("link button not pressed; press the button on the bridge and register again")]
    LinkButtonNotPressed,

    /// The stored application key is not (or no longer) known to the bridge.
    #[error("application key is not authorized on this bridge; register the application again")]
    Unauthorized,
}

/// All error types that can occur when talking to the bridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A network socket operation failed.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// An HTTP request to the bridge or the discovery service failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A bounded network operation did not finish in time.
    #[error("{0} timed out")]
    Timeout(String),

    /// The bridge answered with an API error item.
    #[error("bridge error {kind} at {address}: {description}")]
    Bridge {
        kind: u16,
        address: String,
        description: String,
    },

    /// The bridge answered with something that is neither a success nor an error.
    #[error("unexpected bridge response: {0}")]
    UnexpectedResponse(String),

    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// Attempted to send a [`crate::LightCommand`] with no attributes set.
    #[error("invalid command; no attributes set")]
    NoAttribute,

    /// Failed to parse a [`crate::Color`] from a string.
    #[error("invalid color string: {0}")]
    InvalidColorString(String),

    /// The configuration could not be read or is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new bridge API error
    pub fn bridge(kind: u16, address: &str, description: &str) -> Self {
        Error::Bridge {
            kind,
            address: address.to_string(),
            description: description.to_string(),
        }
    }

    /// Create a new timeout error
    pub fn timeout(action: &str) -> Self {
        Error::Timeout(action.to_string())
    }

    /// Returns `true` if the user has to act (press the link button, pick a
    /// bridge) before trying again.
    pub fn is_user_actionable(&self) -> bool {
        matches!(self, Error::Discovery(_) | Error::Registration(_))
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_messages_carry_remediation() {
        let err = Error::from(DiscoveryError::MultipleFound(2));
        assert!(err.to_string().contains("found 2 bridges"));
        assert!(err.is_user_actionable());
    }

    #[test]
    fn test_link_button_is_user_actionable() {
        let err = Error::from(RegistrationError::LinkButtonNotPressed);
        assert!(err.is_user_actionable());
        assert!(!Error::timeout("register").is_user_actionable());
    }
}
