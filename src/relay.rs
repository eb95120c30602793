//! Relay loop
//!
//! The data plane: a single-threaded event loop multiplexing two readiness
//! sources (line input from the terminal, datagrams on the ephemeral
//! socket) with no timeout, servicing one ready source per iteration.
//!
//! ```text
//! READY ──socket readable──► inbound transfer ──ok──► READY
//!   │                                          └─err─► TERMINATED(failure)
//!   └────stdin readable────► outbound transfer ──ok──► READY
//!                                              ├─eof─► TERMINATED(clean)
//!                                              └─err─► TERMINATED(failure)
//! ```
//!
//! Which source wins a round when both are ready is decided by `select!`'s
//! pseudo-random polling order; fairness between the two is a property of
//! the primitive, not an application policy. Each transfer completes in
//! full before the loop waits again.
//!
//! Input is read through a bounded line reader with fgets semantics: a line
//! longer than the buffer is silently cut at the boundary and the remainder
//! surfaces as the next line. Truncation is an accepted limitation of the
//! wire contract, not an error.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::lifecycle::BoundSocket;
use crate::MSG_BUFFER;

/// Unrecoverable transfer failures; each terminates the loop.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to receive datagram")]
    Recv(#[source] io::Error),

    #[error("failed to write to standard output")]
    Stdout(#[source] io::Error),

    #[error("failed to send datagram to {path}")]
    Send {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("short send to {path}: sent {sent} of {len} bytes")]
    ShortSend {
        path: PathBuf,
        sent: usize,
        len: usize,
    },
}

/// Bounded line reader over an async byte source.
///
/// Returns one line per call, trailing newline included when one was read.
/// At most `capacity - 1` content bytes are returned per line; a longer
/// line is cut there and its remainder is returned by later calls. All
/// pending bytes live in the struct, so a [`LineReader::next_line`] future
/// dropped mid-wait (a lost `select!` round) loses nothing.
pub struct LineReader<R> {
    source: R,
    pending: Vec<u8>,
    capacity: usize,
    eof: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(source: R) -> Self {
        Self::with_capacity(source, MSG_BUFFER)
    }

    pub fn with_capacity(source: R, capacity: usize) -> Self {
        debug_assert!(capacity > 1);
        Self {
            source,
            pending: Vec::new(),
            capacity,
            eof: false,
        }
    }

    /// Read the next line, up to `capacity - 1` bytes.
    ///
    /// Returns `Ok(None)` on end-of-input with no pending bytes.
    pub async fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let limit = self.capacity - 1;

        loop {
            // A complete line already buffered, or a full buffer's worth
            // without one, is returned without touching the source.
            let window = limit.min(self.pending.len());
            if let Some(pos) = self.pending[..window].iter().position(|&b| b == b'\n') {
                return Ok(Some(self.pending.drain(..=pos).collect()));
            }
            if self.pending.len() >= limit {
                return Ok(Some(self.pending.drain(..limit).collect()));
            }

            if self.eof {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                // Final line without a trailing newline.
                return Ok(Some(std::mem::take(&mut self.pending)));
            }

            let mut chunk = [0u8; MSG_BUFFER];
            let n = self.source.read(&mut chunk).await?;
            if n == 0 {
                self.eof = true;
            } else {
                self.pending.extend_from_slice(&chunk[..n]);
            }
        }
    }
}

/// The relay between the terminal and the datagram socket.
///
/// Owns the bound ephemeral socket for its lifetime. Generic over the
/// terminal endpoints so tests can drive the loop through in-memory pipes.
pub struct Relay<R, W> {
    bound: BoundSocket,
    target: PathBuf,
    input: LineReader<R>,
    output: W,
}

impl<R, W> Relay<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(bound: BoundSocket, target: PathBuf, input: R, output: W) -> Self {
        Self {
            bound,
            target,
            input: LineReader::new(input),
            output,
        }
    }

    /// Path of the local ephemeral socket.
    pub fn local_path(&self) -> &Path {
        self.bound.socket_path()
    }

    /// Run until end-of-input (clean) or an unrecoverable transfer error.
    ///
    /// Returns the bound socket either way so the caller can tear it down.
    pub async fn run(mut self) -> (BoundSocket, Result<(), RelayError>) {
        let mut buf = [0u8; MSG_BUFFER];

        let result = loop {
            tokio::select! {
                // One byte of headroom, matching the bounded-buffer
                // contract on the outbound side.
                received = self.bound.socket().recv(&mut buf[..MSG_BUFFER - 1]) => {
                    match received {
                        Ok(n) => {
                            if let Err(e) = Self::print_datagram(&mut self.output, &buf[..n]).await {
                                break Err(e);
                            }
                        }
                        Err(e) => break Err(RelayError::Recv(e)),
                    }
                }
                line = self.input.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if let Err(e) = self.forward_line(&line).await {
                                break Err(e);
                            }
                        }
                        Ok(None) => {
                            debug!("End of input, terminating cleanly");
                            break Ok(());
                        }
                        Err(e) => {
                            // A transient line-reading issue is not fatal.
                            warn!(error = %e, "Failed to read line from input");
                        }
                    }
                }
            }
        };

        (self.bound, result)
    }

    /// Inbound transfer: one received datagram becomes `payload + "\n"` on
    /// the output, written and flushed before the next readiness wait.
    async fn print_datagram(output: &mut W, payload: &[u8]) -> Result<(), RelayError> {
        output.write_all(payload).await.map_err(RelayError::Stdout)?;
        output.write_all(b"\n").await.map_err(RelayError::Stdout)?;
        output.flush().await.map_err(RelayError::Stdout)?;
        Ok(())
    }

    /// Outbound transfer: one line becomes one datagram at the target.
    ///
    /// Datagram sockets deliver atomically, but the contract still verifies
    /// the byte count sent equals the byte count intended.
    async fn forward_line(&self, line: &[u8]) -> Result<(), RelayError> {
        let sent = self
            .bound
            .socket()
            .send_to(line, &self.target)
            .await
            .map_err(|source| RelayError::Send {
                path: self.target.clone(),
                source,
            })?;

        if sent != line.len() {
            return Err(RelayError::ShortSend {
                path: self.target.clone(),
                sent,
                len: line.len(),
            });
        }
        Ok(())
    }
}
