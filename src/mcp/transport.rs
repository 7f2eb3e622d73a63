//! Transports for the MCP server.
//!
//! The server core only needs a way to push a JSON document to the client,
//! expressed by the [`Transport`] trait. Inbound messages are handed to
//! [`McpServer::handle_message`](crate::mcp::McpServer::handle_message) by
//! whatever owns the input side.
//!
//! This module also implements the stdio transport as specified by MCP:
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//! - stdin: receives messages from client
//! - stdout: sends messages to client
//! - stderr: may be used for logging (not MCP messages)
//!
//! # Thread Safety
//!
//! Outbound messages go through an unbounded queue drained by a single
//! writer task, so notifiers may send from any thread without interleaving
//! partial lines on stdout.

use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// The outbound half of a message channel to the client.
pub trait Transport: Send + Sync {
    /// Delivers one JSON document to the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be serialised or the channel
    /// is closed.
    fn send(&self, message: &Value) -> io::Result<()>;
}

/// Serialises a message to a single line of JSON.
///
/// # Errors
///
/// Returns an error if serialisation fails.
pub fn encode_line(message: &Value) -> io::Result<String> {
    let json = serde_json::to_string(message)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    // MCP spec: messages must not contain embedded newlines
    debug_assert!(
        !json.contains('\n'),
        "JSON message must not contain embedded newlines"
    );

    Ok(json)
}

/// A cloneable handle that queues serialised messages for the writer task.
#[derive(Debug, Clone)]
pub struct OutboundQueue {
    tx: mpsc::UnboundedSender<String>,
}

impl OutboundQueue {
    /// Creates a queue and the receiver its writer task drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for OutboundQueue {
    fn send(&self, message: &Value) -> io::Result<()> {
        let line = encode_line(message)?;
        self.tx
            .send(line)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "outbound queue closed"))
    }
}

/// Writes queued lines to `writer` until every queue handle is dropped.
///
/// # Errors
///
/// Returns an error if writing fails.
pub async fn drain_to<W>(mut rx: mpsc::UnboundedReceiver<String>, mut writer: W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

/// A stdio-based MCP transport.
///
/// Reads JSON-RPC messages from stdin; writes go through an [`OutboundQueue`]
/// drained to stdout by [`StdioTransport::spawn_writer`].
pub struct StdioTransport {
    /// Buffered reader for stdin.
    reader: BufReader<tokio::io::Stdin>,
    /// Queue handle for stdout.
    outbound: OutboundQueue,
    /// Receiver drained by the writer task, until spawned.
    pending: Option<mpsc::UnboundedReceiver<String>>,
}

impl StdioTransport {
    /// Creates a new stdio transport.
    #[must_use]
    pub fn new() -> Self {
        let (outbound, rx) = OutboundQueue::new();
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            outbound,
            pending: Some(rx),
        }
    }

    /// Returns a handle for sending messages to stdout.
    #[must_use]
    pub fn outbound(&self) -> OutboundQueue {
        self.outbound.clone()
    }

    /// Spawns the task that writes queued messages to stdout.
    ///
    /// Returns `None` if the writer was already spawned. Must be called from
    /// within a Tokio runtime.
    pub fn spawn_writer(&mut self) -> Option<tokio::task::JoinHandle<io::Result<()>>> {
        let rx = self.pending.take()?;
        Some(tokio::spawn(drain_to(rx, tokio::io::stdout())))
    }

    /// Reads the next message line from stdin.
    ///
    /// Returns `None` if stdin is closed (EOF).
    ///
    /// # Errors
    ///
    /// Returns an error if reading from stdin fails.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            // EOF - stdin closed
            return Ok(None);
        }

        // Remove the trailing newline
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        Ok(Some(line))
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}
