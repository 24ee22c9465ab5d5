//! Install and upgrade from a local archive or application directory.

use std::path::Path;
use std::time::Instant;

use tracing::info;

use super::progress::{ProgressPhase, ProgressReporter};
use super::watch::{ExtendedTimeout, watch_completion};
use super::{InstallKind, InstallationProxyClient, until_cancelled};
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
    /// Install the application at `path`.
    ///
    /// `path` is either an archive file or, when a packager is configured, an
    /// application directory. Progress runs 0..50 during the upload and
    /// 50..100 while the device installs.
    pub async fn install(
        &mut self,
        path: &Path,
        options: ClientOptions,
        progress: Option<&mut (dyn FnMut(u8) + Send)>,
    ) -> Result<(), ProxyError> {
        self.install_from_local(InstallKind::Install, path, options, progress)
            .await
    }

    /// Upgrade an installed application from `path`. Same flow as
    /// [`install`](Self::install).
    pub async fn upgrade(
        &mut self,
        path: &Path,
        options: ClientOptions,
        progress: Option<&mut (dyn FnMut(u8) + Send)>,
    ) -> Result<(), ProxyError> {
        self.install_from_local(InstallKind::Upgrade, path, options, progress)
            .await
    }

    async fn install_from_local(
        &mut self,
        kind: InstallKind,
        path: &Path,
        options: ClientOptions,
        progress: Option<&mut (dyn FnMut(u8) + Send)>,
    ) -> Result<(), ProxyError> {
        let mut reporter = ProgressReporter::new(progress);

        let started = Instant::now();
        let payload = self.resolve_payload(path).await?;
        info!(
            path = %path.display(),
            bytes = payload.len(),
            elapsed_ms = elapsed_ms(started),
            "package read"
        );

        let started = Instant::now();
        {
            let mut on_progress = |raw: u8| reporter.report(ProgressPhase::Transfer, raw);
            let upload =
                self.transfer
                    .set_file_contents(&self.staging_path, &payload, &mut on_progress);
            until_cancelled(&self.cancel, upload).await??;
        }
        info!(
            staging_path = %self.staging_path,
            elapsed_ms = elapsed_ms(started),
            "package transferred"
        );

        let command = Command::package(kind.command_name(), options, &self.staging_path);
        let started = Instant::now();
        self.send(command).await?;
        info!(
            command = kind.command_name().as_str(),
            elapsed_ms = elapsed_ms(started),
            "command sent"
        );

        let started = Instant::now();
        let outcome = {
            let mut channel = ExtendedTimeout::new(&mut self.channel);
            watch_completion(
                &mut *channel,
                &self.cancel,
                ProgressPhase::Completion,
                &mut reporter,
            )
            .await
        };
        info!(
            succeeded = outcome.is_ok(),
            elapsed_ms = elapsed_ms(started),
            "completion watched"
        );
        outcome
    }

    async fn resolve_payload(&self, path: &Path) -> Result<Vec<u8>, ProxyError> {
        if until_cancelled(&self.cancel, self.source.is_directory(path)).await? {
            let Some(packager) = &self.packager else {
                return Err(ProxyError::Unsupported(format!(
                    "{} is a directory and no directory packager is configured",
                    path.display()
                )));
            };
            return until_cancelled(&self.cancel, packager.pack(path))
                .await?
                .map_err(|source| ProxyError::Packaging {
                    path: path.to_path_buf(),
                    source,
                });
        }

        until_cancelled(&self.cancel, self.source.read(path))
            .await?
            .map_err(|source| ProxyError::LocalRead {
                path: path.to_path_buf(),
                source,
            })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
