//! Classification of inbound status messages.
//!
//! A single message can carry list data, an error, progress and a completion
//! status at the same time. Parsing keeps every part; callers decide which
//! parts to act on.

use serde_json::Value;
use tracing::warn;

use crate::error::{InstallationError, ProxyError};
use crate::types::Message;

const CURRENT_LIST_KEY: &str = "CurrentList";
const ERROR_KEY: &str = "Error";
const ERROR_DESCRIPTION_KEY: &str = "ErrorDescription";
const PERCENT_COMPLETE_KEY: &str = "PercentComplete";
const STATUS_KEY: &str = "Status";

/// Status value that terminates an operation stream.
pub const STATUS_COMPLETE: &str = "Complete";

/// Error reported by the device inside a status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceError {
    pub code: String,
    pub description: Option<String>,
}

impl From<DeviceError> for InstallationError {
    fn from(error: DeviceError) -> Self {
        InstallationError::Device {
            code: error.code,
            description: error.description,
        }
    }
}

/// One parsed status message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseMessage {
    pub current_list: Option<Vec<Value>>,
    pub error: Option<DeviceError>,
    pub percent_complete: Option<u8>,
    pub status: Option<String>,
    pub complete: bool,
}

/// The single most significant part of a message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal<'a> {
    Error(&'a DeviceError),
    Progress(u8),
    Complete,
    List(&'a [Value]),
}

impl ResponseMessage {
    /// Parse a raw message. Unknown keys are ignored; known keys with the
    /// wrong shape are rejected.
    pub fn parse(message: &Message) -> Result<Self, ProxyError> {
        let current_list = match message.get(CURRENT_LIST_KEY) {
            None => None,
            Some(Value::Array(entries)) => Some(entries.clone()),
            Some(other) => return Err(malformed(CURRENT_LIST_KEY, "an array", other)),
        };

        let error = match message.get(ERROR_KEY) {
            None => None,
            Some(Value::String(code)) => Some(DeviceError {
                code: code.clone(),
                description: optional_string(message, ERROR_DESCRIPTION_KEY)?,
            }),
            Some(other) => return Err(malformed(ERROR_KEY, "a string", other)),
        };

        let percent_complete = match message.get(PERCENT_COMPLETE_KEY) {
            None => None,
            Some(value) => Some(parse_percent(value)?),
        };

        let status = optional_string(message, STATUS_KEY)?;
        let complete = status.as_deref() == Some(STATUS_COMPLETE);

        Ok(Self {
            current_list,
            error,
            percent_complete,
            status,
            complete,
        })
    }

    /// Precedence: error, then progress, then completion, then list data.
    pub fn signal(&self) -> Option<Signal<'_>> {
        if let Some(error) = &self.error {
            return Some(Signal::Error(error));
        }
        if let Some(percent) = self.percent_complete {
            return Some(Signal::Progress(percent));
        }
        if self.complete {
            return Some(Signal::Complete);
        }
        self.current_list.as_deref().map(Signal::List)
    }
}

fn optional_string(message: &Message, key: &str) -> Result<Option<String>, ProxyError> {
    match message.get(key) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(malformed(key, "a string", other)),
    }
}

fn parse_percent(value: &Value) -> Result<u8, ProxyError> {
    let raw = value
        .as_u64()
        .ok_or_else(|| malformed(PERCENT_COMPLETE_KEY, "an unsigned integer", value))?;
    if raw > 100 {
        warn!(raw, "PercentComplete above 100, clamping");
    }
    Ok(raw.min(100) as u8)
}

fn malformed(key: &str, expected: &str, got: &Value) -> ProxyError {
    ProxyError::MalformedResponse(format!("{key} should be {expected}, got {got}"))
}
