//! Bridge API response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Error, RegistrationError};

type Result<T> = std::result::Result<T, Error>;

/// One item of the array the bridge answers with.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ApiItem {
    /// The request (or one attribute of it) was applied.
    Success(Value),
    /// The request (or one attribute of it) was rejected.
    Error(ApiError),
}

/// An error item reported by the bridge.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: u16,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
}

impl ApiError {
    pub const UNAUTHORIZED_USER: u16 = 1;
    pub const LINK_BUTTON_NOT_PRESSED: u16 = 101;
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        match err.kind {
            ApiError::LINK_BUTTON_NOT_PRESSED => RegistrationError::LinkButtonNotPressed.into(),
            ApiError::UNAUTHORIZED_USER => RegistrationError::Unauthorized.into(),
            kind => Error::bridge(kind, &err.address, &err.description),
        }
    }
}

/// Split a bridge reply into its success payloads.
///
/// Object replies (such as `GET config`) are returned as a single payload.
/// The first error item fails the whole reply.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use hue_rig::{Error, RegistrationError, response::parse_reply};
///
/// let ok = parse_reply(json!([{"success": {"username": "abc"}}])).unwrap();
/// assert_eq!(ok, vec![json!({"username": "abc"})]);
///
/// let err = parse_reply(json!([{"error": {"type": 101, "address": "", "description": "link button not pressed"}}]));
/// assert!(matches!(err, Err(Error::Registration(RegistrationError::LinkButtonNotPressed))));
/// ```
pub fn parse_reply(reply: Value) -> Result<Vec<Value>> {
    if !reply.is_array() {
        return Ok(vec![reply]);
    }

    let items: Vec<ApiItem> = serde_json::from_value(reply).map_err(Error::JsonLoad)?;
    let mut payloads = Vec::with_capacity(items.len());
    for item in items {
        match item {
            ApiItem::Success(value) => payloads.push(value),
            ApiItem::Error(err) => return Err(err.into()),
        }
    }
    Ok(payloads)
}

/// Extract the application key from a registration reply.
pub(crate) fn parse_username(reply: Value) -> Result<String> {
    parse_reply(reply.clone())?
        .iter()
        .find_map(|payload| payload.get("username").and_then(Value::as_str))
        .map(String::from)
        .ok_or_else(|| Error::UnexpectedResponse(reply.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unauthorized_user() {
        let reply = json!([{"error": {"type": 1, "address": "/config", "description": "unauthorized user"}}]);
        assert_eq!(
            parse_reply(reply).unwrap_err(),
            Error::Registration(RegistrationError::Unauthorized)
        );
    }

    #[test]
    fn test_other_errors_keep_details() {
        let reply = json!([
            {"success": {"/lights/1/state/on": true}},
            {"error": {"type": 201, "address": "/lights/1/state/bri", "description": "device is set to off"}}
        ]);
        assert_eq!(
            parse_reply(reply).unwrap_err(),
            Error::bridge(201, "/lights/1/state/bri", "device is set to off")
        );
    }

    #[test]
    fn test_parse_username() {
        let reply = json!([{"success": {"username": "83b7780291a6ceffbe0bd049104df"}}]);
        assert_eq!(parse_username(reply).unwrap(), "83b7780291a6ceffbe0bd049104df");

        let empty = json!([]);
        assert!(matches!(
            parse_username(empty),
            Err(Error::UnexpectedResponse(_))
        ));
    }
}
