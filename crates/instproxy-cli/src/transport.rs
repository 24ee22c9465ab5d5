//! Line-delimited JSON command channel.
//!
//! Each message is one JSON object per line. End of input is a clean end of
//! stream; a receive that outlasts the current deadline is a timeout. Bytes of
//! a line cut short by a timeout are kept, and the next receive resumes it.

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::debug;

use instproxy_core::channel::{CommandChannel, ReceiveDeadline};
use instproxy_core::error::ChannelError;
use instproxy_core::types::Message;

pub struct JsonLinesChannel<R, W> {
    reader: BufReader<R>,
    writer: W,
    deadline: ReceiveDeadline,
    pending: Vec<u8>,
}

impl JsonLinesChannel<OwnedReadHalf, OwnedWriteHalf> {
    pub async fn connect(addr: &str, deadline: ReceiveDeadline) -> Result<Self, ChannelError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();
        debug!(addr, "connected to installation service relay");
        Ok(Self::new(reader, writer, deadline))
    }
}

impl<R, W> JsonLinesChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W, deadline: ReceiveDeadline) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            deadline,
            pending: Vec::new(),
        }
    }
}

#[async_trait]
impl<R, W> CommandChannel for JsonLinesChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: Message) -> Result<(), ChannelError> {
        let mut data = serde_json::to_vec(&message)
            .map_err(|e| ChannelError::Transport(format!("Failed to encode message: {e}")))?;
        data.push(b'\n');
        self.writer.write_all(&data).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<Message>, ChannelError> {
        let limit = self.deadline.current();
        loop {
            // read_until appends, so a partial line survives a timed-out read.
            let read = tokio::time::timeout(limit, self.reader.read_until(b'\n', &mut self.pending))
                .await
                .map_err(|_| ChannelError::Timeout(limit))??;
            if read == 0 && self.pending.is_empty() {
                return Ok(None);
            }

            let decoded = match self.pending.trim_ascii() {
                [] => None,
                line => Some(serde_json::from_slice::<Value>(line)),
            };
            self.pending.clear();
            let Some(decoded) = decoded else {
                continue;
            };

            return match decoded {
                Ok(Value::Object(map)) => Ok(Some(map)),
                Ok(other) => Err(ChannelError::Transport(format!(
                    "Expected a JSON object, got: {other}"
                ))),
                Err(e) => Err(ChannelError::Transport(format!(
                    "Failed to decode message: {e}"
                ))),
            };
        }
    }

    fn extend_timeout(&mut self) {
        self.deadline.extend();
    }

    fn reset_timeout(&mut self) {
        self.deadline.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use tokio::io::{AsyncReadExt, duplex};

    fn deadline() -> ReceiveDeadline {
        ReceiveDeadline::new(Duration::from_millis(50), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn send_writes_one_json_object_per_line() {
        let (ours, mut theirs) = duplex(1024);
        let (reader, writer) = tokio::io::split(ours);
        let mut channel = JsonLinesChannel::new(reader, writer, deadline());

        let mut message = Message::new();
        message.insert("Command".to_string(), json!("Browse"));
        channel.send(message).await.unwrap();
        drop(channel);

        let mut written = String::new();
        theirs.read_to_string(&mut written).await.unwrap();
        assert_eq!(written, "{\"Command\":\"Browse\"}\n");
    }

    #[tokio::test]
    async fn receive_skips_blank_lines_and_ends_cleanly() {
        let (ours, mut theirs) = duplex(1024);
        let (reader, writer) = tokio::io::split(ours);
        let mut channel = JsonLinesChannel::new(reader, writer, deadline());

        theirs
            .write_all(b"\n{\"Status\":\"Complete\"}\n")
            .await
            .unwrap();
        drop(theirs);

        let first = channel.receive().await.unwrap().unwrap();
        assert_eq!(first["Status"], json!("Complete"));
        assert!(channel.receive().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn receive_times_out_on_current_deadline() {
        let (ours, _theirs) = duplex(1024);
        let (reader, writer) = tokio::io::split(ours);
        let mut channel = JsonLinesChannel::new(reader, writer, deadline());

        let err = channel.receive().await.unwrap_err();

        assert!(matches!(err, ChannelError::Timeout(d) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn receive_resumes_line_cut_short_by_timeout() {
        let (ours, mut theirs) = duplex(1024);
        let (reader, writer) = tokio::io::split(ours);
        let mut channel = JsonLinesChannel::new(reader, writer, deadline());

        theirs.write_all(b"{\"Status\":").await.unwrap();
        let err = channel.receive().await.unwrap_err();
        assert!(matches!(err, ChannelError::Timeout(_)));

        theirs.write_all(b"\"Complete\"}\n").await.unwrap();
        let message = channel.receive().await.unwrap().unwrap();
        assert_eq!(message["Status"], json!("Complete"));
    }

    #[tokio::test]
    async fn receive_rejects_non_object_lines() {
        let (ours, mut theirs) = duplex(1024);
        let (reader, writer) = tokio::io::split(ours);
        let mut channel = JsonLinesChannel::new(reader, writer, deadline());

        theirs.write_all(b"[1,2,3]\n").await.unwrap();

        let err = channel.receive().await.unwrap_err();
        assert!(matches!(err, ChannelError::Transport(_)));
    }
}
