//! Completion watch loop shared by install, upgrade and uninstall.

use std::ops::{Deref, DerefMut};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::progress::{ProgressPhase, ProgressReporter};
use super::until_cancelled;
use crate::channel::CommandChannel;
use crate::error::{InstallationError, ProxyError};
use crate::protocol::ResponseMessage;

/// Receive status messages until the device reports completion or an error.
///
/// Progress is reported and the loop continues; a `Status: Complete` in the
/// same message still ends it. A stream that ends first is an
/// [`InstallationError::Incomplete`].
pub(crate) async fn watch_completion<C: CommandChannel>(
    channel: &mut C,
    cancel: &CancellationToken,
    phase: ProgressPhase,
    reporter: &mut ProgressReporter<'_>,
) -> Result<(), ProxyError> {
    while let Some(raw) = until_cancelled(cancel, channel.receive()).await?? {
        let response = ResponseMessage::parse(&raw)?;

        if let Some(error) = response.error {
            warn!(
                code = %error.code,
                description = error.description.as_deref().unwrap_or(""),
                "device reported an error"
            );
            return Err(InstallationError::from(error).into());
        }

        if let Some(percent) = response.percent_complete {
            info!(percent, "{}% complete", percent);
            reporter.report(phase, percent);
        }

        if response.complete {
            return Ok(());
        }

        if let Some(status) = response.status.as_deref() {
            debug!(status, "operation status");
        }
    }

    warn!("device closed the stream before completion");
    Err(InstallationError::Incomplete.into())
}

/// Keeps a channel on its extended receive deadline while alive.
///
/// The default deadline comes back on drop, whichever way the watch ends.
pub(crate) struct ExtendedTimeout<'a, C: CommandChannel> {
    channel: &'a mut C,
}

impl<'a, C: CommandChannel> ExtendedTimeout<'a, C> {
    pub(crate) fn new(channel: &'a mut C) -> Self {
        channel.extend_timeout();
        Self { channel }
    }
}

impl<C: CommandChannel> Deref for ExtendedTimeout<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.channel
    }
}

impl<C: CommandChannel> DerefMut for ExtendedTimeout<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.channel
    }
}

impl<C: CommandChannel> Drop for ExtendedTimeout<'_, C> {
    fn drop(&mut self) {
        self.channel.reset_timeout();
    }
}
