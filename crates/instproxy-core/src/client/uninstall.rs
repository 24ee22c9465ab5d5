//! Uninstall by bundle identifier.

use tracing::info;

use super::progress::{ProgressPhase, ProgressReporter};
use super::watch::watch_completion;
use super::InstallationProxyClient;
use crate::channel::{CommandChannel, FileTransferChannel};
use crate::error::ProxyError;
use crate::protocol::Command;
use crate::source::LocalSource;
use crate::types::ClientOptions;

impl<C, T, S> InstallationProxyClient<C, T, S>
where
    C: CommandChannel,
    T: FileTransferChannel,
    S: LocalSource,
{
    /// Uninstall the application with the given bundle identifier.
    ///
    /// Runs on the default receive deadline. Device progress is reported
    /// unscaled.
    pub async fn uninstall(
        &mut self,
        bundle_identifier: &str,
        options: ClientOptions,
        progress: Option<&mut (dyn FnMut(u8) + Send)>,
    ) -> Result<(), ProxyError> {
        let mut reporter = ProgressReporter::new(progress);

        self.send(Command::uninstall(bundle_identifier, options)).await?;
        watch_completion(
            &mut self.channel,
            &self.cancel,
            ProgressPhase::Whole,
            &mut reporter,
        )
        .await?;

        info!(bundle_identifier, "uninstall complete");
        Ok(())
    }
}
