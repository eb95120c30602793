//! dgprobe: interactive console for UNIX domain datagram sockets
//!
//! Bridges a text terminal and a datagram socket: every line typed on
//! standard input is sent as one datagram to a fixed target socket, and
//! every datagram received on the tool's own ephemeral socket is printed
//! to standard output followed by a newline.
//!
//! # Architecture
//!
//! ```text
//! stdin ──line──► ┌───────────┐ ──datagram──► target socket
//!                 │   Relay   │
//! stdout ◄─"D\n"─ └───────────┘ ◄──datagram── <cwd>/dgprobe.XXXXXX/socket
//! ```
//!
//! The relay is a single-threaded `select!` loop over exactly two readiness
//! sources with no timeout. The ephemeral socket lives in a uniquely named
//! scratch directory under the current working directory and both are
//! removed on exit, leaving no filesystem residue.

pub mod cli;
pub mod lifecycle;
pub mod relay;
pub mod signals;

pub use cli::Cli;
pub use lifecycle::{BoundSocket, LifecycleError, TeardownError};
pub use relay::{LineReader, Relay, RelayError};

/// Size of the per-message buffer, in bytes.
///
/// A single datagram or input line never carries more than `MSG_BUFFER - 1`
/// payload bytes; longer input is cut at the boundary (see [`relay`]).
pub const MSG_BUFFER: usize = 768;
