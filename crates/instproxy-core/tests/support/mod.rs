//! Test doubles for the installation proxy collaborators.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use instproxy_core::channel::{CommandChannel, FileTransferChannel, ReceiveDeadline};
use instproxy_core::error::ChannelError;
use instproxy_core::source::{DirectoryPackager, LocalSource};
use instproxy_core::types::Message;

/// Build a message from a JSON object literal.
pub fn message(value: Value) -> Message {
    match value {
        Value::Object(map) => map,
        other => panic!("test message must be an object, got {other}"),
    }
}

/// One scripted step of a device response stream.
pub enum Step {
    Message(Message),
    Timeout,
    Fail,
    /// Cancel the token, then never yield a message.
    CancelAndStall(CancellationToken),
}

/// Command channel replaying a fixed response script.
///
/// Once the script is exhausted every receive reports end of stream.
pub struct ScriptedChannel {
    script: VecDeque<Step>,
    pub sent: Vec<Message>,
    pub deadline: ReceiveDeadline,
    pub extend_calls: usize,
    pub reset_calls: usize,
    /// Whether the deadline was extended at each receive, in order.
    pub receive_extended: Vec<bool>,
    pub fail_send: bool,
}

impl ScriptedChannel {
    pub fn new(messages: Vec<Value>) -> Self {
        Self::with_steps(
            messages
                .into_iter()
                .map(|value| Step::Message(message(value)))
                .collect(),
        )
    }

    pub fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            script: steps.into(),
            sent: Vec::new(),
            deadline: ReceiveDeadline::new(Duration::from_secs(10), Duration::from_secs(300)),
            extend_calls: 0,
            reset_calls: 0,
            receive_extended: Vec::new(),
            fail_send: false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[async_trait]
impl CommandChannel for ScriptedChannel {
    async fn send(&mut self, message: Message) -> Result<(), ChannelError> {
        if self.fail_send {
            return Err(ChannelError::Transport("send rejected".to_string()));
        }
        self.sent.push(message);
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<Message>, ChannelError> {
        self.receive_extended.push(self.deadline.is_extended());
        match self.script.pop_front() {
            None => Ok(None),
            Some(Step::Message(message)) => Ok(Some(message)),
            Some(Step::Timeout) => Err(ChannelError::Timeout(self.deadline.current())),
            Some(Step::Fail) => Err(ChannelError::Closed),
            Some(Step::CancelAndStall(token)) => {
                token.cancel();
                std::future::pending().await
            }
        }
    }

    fn extend_timeout(&mut self) {
        self.extend_calls += 1;
        self.deadline.extend();
    }

    fn reset_timeout(&mut self) {
        self.reset_calls += 1;
        self.deadline.reset();
    }
}

/// File transfer that records uploads and reports scripted progress steps.
pub struct RecordingTransfer {
    pub steps: Vec<u8>,
    pub uploads: Vec<(String, Vec<u8>)>,
    pub fail: bool,
}

impl RecordingTransfer {
    pub fn new(steps: Vec<u8>) -> Self {
        Self {
            steps,
            uploads: Vec::new(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            steps: Vec::new(),
            uploads: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl FileTransferChannel for RecordingTransfer {
    async fn set_file_contents(
        &mut self,
        remote_path: &str,
        contents: &[u8],
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<(), ChannelError> {
        if self.fail {
            return Err(ChannelError::Transport("device storage full".to_string()));
        }
        for step in &self.steps {
            on_progress(*step);
        }
        self.uploads
            .push((remote_path.to_string(), contents.to_vec()));
        Ok(())
    }
}

/// In-memory local files and directories.
#[derive(Clone, Default)]
pub struct MemorySource {
    files: HashMap<PathBuf, Vec<u8>>,
    directories: HashSet<PathBuf>,
    reads: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, contents: &[u8]) -> Self {
        self.files.insert(PathBuf::from(path), contents.to_vec());
        self
    }

    pub fn with_directory(mut self, path: &str) -> Self {
        self.directories.insert(PathBuf::from(path));
        self
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalSource for MemorySource {
    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files.get(path).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }

    async fn is_directory(&self, path: &Path) -> bool {
        self.directories.contains(path)
    }
}

/// Packager returning fixed archive bytes, or failing.
pub struct FixedPackager {
    pub archive: Option<Vec<u8>>,
    pub packed: Arc<AtomicUsize>,
}

impl FixedPackager {
    pub fn new(archive: &[u8]) -> Self {
        Self {
            archive: Some(archive.to_vec()),
            packed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            archive: None,
            packed: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl DirectoryPackager for FixedPackager {
    async fn pack(&self, _path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        self.packed.fetch_add(1, Ordering::SeqCst);
        self.archive
            .clone()
            .ok_or_else(|| "missing Info.plist".into())
    }
}
