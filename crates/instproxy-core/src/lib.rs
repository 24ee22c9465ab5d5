//! Instproxy Core Library
//!
//! Client-side handler for a device application-management service: list
//! installed applications, install, upgrade and uninstall over a session-scoped
//! structured-message channel, with progress and completion tracking.

pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod source;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Client
    pub use crate::client::{InstallKind, InstallationProxyClient};

    // Collaborators
    pub use crate::channel::{CommandChannel, FileTransferChannel, ReceiveDeadline};
    pub use crate::source::{DirectoryPackager, FsLocalSource, LocalSource};

    // Messages
    pub use crate::protocol::{Command, CommandName, DeviceError, ResponseMessage, Signal};
    pub use crate::types::{BrowseResult, ClientOptions, Message};

    // Errors
    pub use crate::error::{ChannelError, InstallationError, ProxyError};

    // Configuration
    pub use crate::config::{ConfigStore, ProxyConfig, TimeoutConfig};
}
