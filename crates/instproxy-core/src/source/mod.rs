//! Local install inputs: archive files on disk, or directories turned into
//! archives by an injected packager.

use std::path::Path;

use async_trait::async_trait;

/// Read access to install inputs on the local machine.
#[async_trait]
pub trait LocalSource: Send + Sync {
    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;

    async fn is_directory(&self, path: &Path) -> bool;
}

/// Builds an installable archive from an application directory.
///
/// No packager ships with this crate; callers that need directory installs
/// provide one.
#[async_trait]
pub trait DirectoryPackager: Send + Sync {
    async fn pack(&self, path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;
}

/// [`LocalSource`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLocalSource;

#[async_trait]
impl LocalSource for FsLocalSource {
    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn is_directory(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }
}
