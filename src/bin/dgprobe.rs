//! dgprobe binary
//!
//! Operator console for UNIX domain datagram sockets.
//!
//! # Usage
//!
//! ```bash
//! # Relay between the terminal and a service socket
//! dgprobe /run/service/control.sock
//!
//! # With verbose logging (diagnostics go to stderr; stdout is data)
//! RUST_LOG=debug dgprobe /run/service/control.sock
//! ```
//!
//! Startup order: parse arguments, mask signals, create the ephemeral
//! socket, run the relay loop, destroy the socket. The process exits 0
//! only when the loop ended cleanly (stdin EOF) and teardown succeeded.
//! All signals are blocked for the entire run; the console stops via
//! end-of-input or an I/O failure, not via interrupts.

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use dgprobe::{signals, BoundSocket, Cli, Relay};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Help and usage errors both go to stderr with a failing status; the
    // console never starts for either.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprint!("{}", err.render());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dgprobe=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    signals::block_all().context("failed to block signals")?;

    let bound = BoundSocket::create().context("failed to create ephemeral socket")?;
    info!(local = ?bound.socket_path(), target = ?cli.socket, "Relay starting");

    let relay = Relay::new(bound, cli.socket, tokio::io::stdin(), tokio::io::stdout());
    let (bound, outcome) = relay.run().await;

    // Teardown runs regardless of the loop outcome; a loop failure is the
    // error that gets reported.
    let teardown = bound.destroy();

    if let Err(e) = &outcome {
        error!(error = %e, "Relay terminated with failure");
    }
    outcome.context("relay failed")?;
    teardown.context("teardown failed")?;

    info!("Relay finished cleanly");
    Ok(())
}
