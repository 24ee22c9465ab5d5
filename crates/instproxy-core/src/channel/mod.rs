//! Collaborator contracts for the session channel and the file-transfer channel.
//!
//! Implementations own transport details (framing, encoding, session setup).
//! The client only drives them, one operation at a time.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::TimeoutConfig;
use crate::error::ChannelError;
use crate::types::Message;

/// Structured-message channel to the installation service.
#[async_trait]
pub trait CommandChannel: Send {
    async fn send(&mut self, message: Message) -> Result<(), ChannelError>;

    /// Next message, or `None` once the service has closed the stream.
    ///
    /// Fails with [`ChannelError::Timeout`] when the current receive deadline
    /// passes.
    async fn receive(&mut self) -> Result<Option<Message>, ChannelError>;

    /// Switch the receive deadline to the long value.
    fn extend_timeout(&mut self);

    /// Switch the receive deadline back to the default value.
    fn reset_timeout(&mut self);
}

/// Pushes a payload to a path on the device.
#[async_trait]
pub trait FileTransferChannel: Send {
    /// Write `contents` to `remote_path`, calling `on_progress` with 0..=100
    /// as the transfer advances.
    async fn set_file_contents(
        &mut self,
        remote_path: &str,
        contents: &[u8],
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<(), ChannelError>;
}

/// Receive deadline switching between a default and an extended duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveDeadline {
    default: Duration,
    extended: Duration,
    is_extended: bool,
}

impl ReceiveDeadline {
    pub fn new(default: Duration, extended: Duration) -> Self {
        Self {
            default,
            extended,
            is_extended: false,
        }
    }

    pub fn from_config(config: &TimeoutConfig) -> Self {
        Self::new(config.default_timeout(), config.extended_timeout())
    }

    pub fn current(&self) -> Duration {
        if self.is_extended {
            self.extended
        } else {
            self.default
        }
    }

    pub fn is_extended(&self) -> bool {
        self.is_extended
    }

    pub fn extend(&mut self) {
        self.is_extended = true;
    }

    pub fn reset(&mut self) {
        self.is_extended = false;
    }
}

impl Default for ReceiveDeadline {
    fn default() -> Self {
        Self::from_config(&TimeoutConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_switches_between_default_and_extended() {
        let mut deadline = ReceiveDeadline::new(Duration::from_secs(5), Duration::from_secs(60));
        assert_eq!(deadline.current(), Duration::from_secs(5));

        deadline.extend();
        assert!(deadline.is_extended());
        assert_eq!(deadline.current(), Duration::from_secs(60));

        deadline.reset();
        assert!(!deadline.is_extended());
        assert_eq!(deadline.current(), Duration::from_secs(5));
    }
}
