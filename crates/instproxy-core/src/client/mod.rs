//! Installation proxy client.
//!
//! Drives Browse, Install, Upgrade and Uninstall over a [`CommandChannel`],
//! staging archives through a [`FileTransferChannel`] first when needed.
//!
//! Each operation takes `&mut self`, so a client runs one operation at a
//! time. The remote staging path is a single location shared by every
//! operation and by every client talking to the same device; concurrent
//! installs against one device overwrite each other's archive.

mod browse;
mod install;
pub mod progress;
mod uninstall;
mod watch;

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::channel::{CommandChannel, FileTransferChannel};
use crate::config::{DEFAULT_STAGING_PATH, ProxyConfig};
use crate::error::ProxyError;
use crate::protocol::{Command, CommandName};
use crate::source::{DirectoryPackager, FsLocalSource, LocalSource};

pub use progress::ProgressPhase;

/// Which package command to issue after staging an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallKind {
    Install,
    Upgrade,
}

impl InstallKind {
    pub fn command_name(self) -> CommandName {
        match self {
            Self::Install => CommandName::Install,
            Self::Upgrade => CommandName::Upgrade,
        }
    }
}

/// Client for the device installation service.
pub struct InstallationProxyClient<C, T, S = FsLocalSource> {
    channel: C,
    transfer: T,
    source: S,
    packager: Option<Arc<dyn DirectoryPackager>>,
    staging_path: String,
    cancel: CancellationToken,
}

impl<C, T> InstallationProxyClient<C, T>
where
    C: CommandChannel,
    T: FileTransferChannel,
{
    /// Create a client reading install inputs from the local filesystem,
    /// staging archives at the default path, with no directory packager.
    pub fn new(channel: C, transfer: T) -> Self {
        Self {
            channel,
            transfer,
            source: FsLocalSource,
            packager: None,
            staging_path: DEFAULT_STAGING_PATH.to_string(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_config(channel: C, transfer: T, config: &ProxyConfig) -> Self {
        Self::new(channel, transfer).with_staging_path(config.staging_path.clone())
    }
}

impl<C, T, S> InstallationProxyClient<C, T, S>
where
    C: CommandChannel,
    T: FileTransferChannel,
    S: LocalSource,
{
    /// Replace the source install inputs are read from.
    pub fn with_source<S2: LocalSource>(self, source: S2) -> InstallationProxyClient<C, T, S2> {
        InstallationProxyClient {
            channel: self.channel,
            transfer: self.transfer,
            source,
            packager: self.packager,
            staging_path: self.staging_path,
            cancel: self.cancel,
        }
    }

    /// Enable installs from application directories.
    pub fn with_packager(mut self, packager: Arc<dyn DirectoryPackager>) -> Self {
        self.packager = Some(packager);
        self
    }

    pub fn with_staging_path(mut self, staging_path: impl Into<String>) -> Self {
        self.staging_path = staging_path.into();
        self
    }

    /// Abort in-flight operations when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn staging_path(&self) -> &str {
        &self.staging_path
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    pub fn into_parts(self) -> (C, T) {
        (self.channel, self.transfer)
    }

    async fn send(&mut self, command: Command) -> Result<(), ProxyError> {
        let name = command.name();
        let message = command.into_message()?;
        debug!(command = name.as_str(), "sending command");
        until_cancelled(&self.cancel, self.channel.send(message)).await??;
        Ok(())
    }
}

/// Run `future` unless `token` is cancelled first.
///
/// Cancellation is checked before the future is polled, so an already
/// cancelled token never lets a send through.
pub(crate) async fn until_cancelled<F: Future>(
    token: &CancellationToken,
    future: F,
) -> Result<F::Output, ProxyError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ProxyError::Cancelled),
        output = future => Ok(output),
    }
}
