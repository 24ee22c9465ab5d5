//! Browse: list installed applications.

use tracing::{debug, warn};

use super::{InstallationProxyClient, until_cancelled};
use crate::channel::{CommandChannel, FileTransferChannel};
use crate::error::{InstallationError, ProxyError};
use crate::protocol::{Command, ResponseMessage};
use crate::source::LocalSource;
use crate::types::{BrowseResult, ClientOptions};

impl<C, T, S> InstallationProxyClient<C, T, S>
where
    C: CommandChannel,
    T: FileTransferChannel,
    S: LocalSource,
{
    /// List installed applications.
    ///
    /// Entries from every message are collected in arrival order until the
    /// device reports `Status: Complete`. If the stream ends before that, the
    /// entries received so far are returned rather than an error.
    pub async fn browse(
        &mut self,
        options: ClientOptions,
        attributes: Option<Vec<String>>,
    ) -> Result<BrowseResult, ProxyError> {
        self.send(Command::browse(options, attributes)).await?;

        let mut result = BrowseResult::new();
        while let Some(raw) = until_cancelled(&self.cancel, self.channel.receive()).await?? {
            let response = ResponseMessage::parse(&raw)?;

            if let Some(error) = response.error {
                warn!(code = %error.code, "browse failed on device");
                return Err(InstallationError::from(error).into());
            }

            if let Some(chunk) = response.current_list {
                debug!(count = chunk.len(), "received browse chunk");
                result.extend_chunk(chunk);
            }

            if response.complete {
                debug!(entries = result.len(), "browse complete");
                return Ok(result);
            }
        }

        debug!(
            entries = result.len(),
            "browse stream ended before completion, returning partial list"
        );
        Ok(result)
    }
}
