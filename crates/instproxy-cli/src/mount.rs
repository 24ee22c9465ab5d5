//! File transfer into a locally mounted device filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use instproxy_core::channel::FileTransferChannel;
use instproxy_core::error::ChannelError;

const CHUNK_SIZE: usize = 64 * 1024;

/// Writes staged archives beneath the mount point of the device's media
/// filesystem.
#[derive(Debug, Clone)]
pub struct MountedFileTransfer {
    root: PathBuf,
    chunk_size: usize,
}

impl MountedFileTransfer {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            chunk_size: CHUNK_SIZE,
        }
    }

    #[cfg(test)]
    fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn local_path(&self, remote_path: &str) -> Result<PathBuf, ChannelError> {
        let relative = Path::new(remote_path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(ChannelError::Transport(format!(
                "Refusing to write outside the mount: {remote_path}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileTransferChannel for MountedFileTransfer {
    async fn set_file_contents(
        &mut self,
        remote_path: &str,
        contents: &[u8],
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<(), ChannelError> {
        let target = self.local_path(remote_path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(&target).await?;
        if contents.is_empty() {
            on_progress(100);
        }

        let total = contents.len();
        let mut written = 0usize;
        for chunk in contents.chunks(self.chunk_size) {
            file.write_all(chunk).await?;
            written += chunk.len();
            on_progress((written * 100 / total) as u8);
        }
        file.flush().await?;

        debug!(target = %target.display(), bytes = total, "archive staged");
        Ok(())
    }
}
