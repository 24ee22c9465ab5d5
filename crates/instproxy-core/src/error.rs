//! Error types for installation proxy operations.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures reported by a command or file-transfer channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Receive timed out after {0:?}")]
    Timeout(Duration),

    #[error("Channel closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// The device refused an operation, or an operation stream ended unfinished.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallationError {
    #[error("{code}: {}", .description.as_deref().unwrap_or("no description"))]
    Device {
        code: String,
        description: Option<String>,
    },

    #[error("Installation or command did not complete successfully")]
    Incomplete,
}

impl InstallationError {
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Device { code, .. } => Some(code),
            Self::Incomplete => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Device { description, .. } => description.as_deref(),
            Self::Incomplete => None,
        }
    }
}

/// Error returned by every [`InstallationProxyClient`](crate::client::InstallationProxyClient) operation.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Channel error: {0}")]
    Channel(ChannelError),

    #[error("Timed out after {0:?} waiting for the device")]
    Timeout(Duration),

    #[error("Installation failed: {0}")]
    Installation(#[from] InstallationError),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Failed to read {}: {source}", .path.display())]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to package directory {}: {source}", .path.display())]
    Packaging {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl From<ChannelError> for ProxyError {
    fn from(error: ChannelError) -> Self {
        match error {
            ChannelError::Timeout(after) => Self::Timeout(after),
            other => Self::Channel(other),
        }
    }
}

impl ProxyError {
    /// The device-side failure, if this error carries one.
    pub fn installation(&self) -> Option<&InstallationError> {
        match self {
            Self::Installation(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_timeout_maps_to_proxy_timeout() {
        let error = ProxyError::from(ChannelError::Timeout(Duration::from_secs(3)));
        assert!(matches!(error, ProxyError::Timeout(d) if d == Duration::from_secs(3)));
    }

    #[test]
    fn other_channel_errors_stay_channel_errors() {
        let error = ProxyError::from(ChannelError::Closed);
        assert!(matches!(error, ProxyError::Channel(ChannelError::Closed)));
    }

    #[test]
    fn device_error_display_includes_code_and_description() {
        let error = InstallationError::Device {
            code: "APIInternalError".to_string(),
            description: Some("bad".to_string()),
        };
        assert_eq!(error.to_string(), "APIInternalError: bad");
        assert_eq!(error.code(), Some("APIInternalError"));
        assert_eq!(error.description(), Some("bad"));
    }

    #[test]
    fn incomplete_has_no_code_or_description() {
        let error = InstallationError::Incomplete;
        assert_eq!(error.code(), None);
        assert_eq!(error.description(), None);
    }
}
