//! Whole-process signal blocking
//!
//! The console deliberately runs with every blockable signal masked for its
//! entire lifetime: an interrupt cannot stop it mid-relay, so the process
//! only exits via end-of-input on stdin or an I/O failure. The mask is
//! installed on the main thread before any runtime worker threads exist and
//! is inherited by threads spawned afterwards.

use std::io;

use nix::sys::signal::SigSet;

/// Block delivery of all blockable signals for the rest of the process run.
///
/// `SIGKILL` and `SIGSTOP` cannot be masked; the kernel silently ignores
/// them in the set.
pub fn block_all() -> io::Result<()> {
    SigSet::all().thread_block()?;
    Ok(())
}
