//! Command-line interface
//!
//! The invocation contract is deliberately narrow: exactly one positional
//! argument, the target socket path. `-h` prints usage and build metadata
//! and the binary treats that as a failing run (the console never starts),
//! so the entrypoint uses [`Cli::try_parse`] and routes the rendered help
//! to stderr itself rather than letting clap exit.

use std::path::PathBuf;

use clap::Parser;

/// Interactive console for UNIX domain datagram sockets.
///
/// Lines from standard input are sent as datagrams to SOCK; datagrams
/// arriving on a private ephemeral socket are printed to standard output.
#[derive(Debug, Parser)]
#[command(name = "dgprobe", version, after_help = build_details())]
pub struct Cli {
    /// Path to a datagram UNIX domain socket
    #[arg(value_name = "SOCK")]
    pub socket: PathBuf,
}

/// Build metadata appended to the help text.
fn build_details() -> String {
    format!(
        "Details:\n  \
         Version: {}\n  \
         Authors: {}\n  \
         License: {}\n  \
         Debug Assertions: {}",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_AUTHORS"),
        env!("CARGO_PKG_LICENSE"),
        cfg!(debug_assertions),
    )
}
