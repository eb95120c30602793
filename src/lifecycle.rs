//! Socket lifecycle management
//!
//! The console binds its ephemeral datagram socket inside a uniquely named
//! scratch directory beneath the current working directory:
//!
//! ```text
//! <cwd>/dgprobe.XXXXXX/socket
//! ```
//!
//! Create and destroy bracket the relay loop. Any failure during creation
//! aborts startup; teardown attempts every step in order (close the socket,
//! unlink the socket file, remove the directory) and aggregates failures
//! rather than stopping at the first one. The directory is process-exclusive
//! by protocol, though nothing prevents another process from interacting
//! with the socket if it discovers the generated path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::net::UnixDatagram;
use tracing::{debug, warn};

/// Directory name template, completed by the mkdtemp-style suffix.
const DIR_PREFIX: &str = "dgprobe.";

/// File name of the ephemeral socket inside the scratch directory.
const SOCKET_NAME: &str = "socket";

/// Fatal errors while setting up the ephemeral socket.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to resolve working directory")]
    WorkingDir(#[source] io::Error),

    #[error("failed to create scratch directory under {base}")]
    CreateDir {
        base: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to bind datagram socket at {path}")]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Aggregated teardown failures.
///
/// Every step is attempted in order; each failure is recorded and reported
/// together once all steps ran.
#[derive(Debug, Error)]
#[error("teardown incomplete: {}", describe(.steps))]
pub struct TeardownError {
    /// Failed steps, in the order they were attempted.
    pub steps: Vec<(&'static str, io::Error)>,
}

fn describe(steps: &[(&'static str, io::Error)]) -> String {
    steps
        .iter()
        .map(|(step, err)| format!("{step}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// An open datagram socket bound inside its scratch directory.
///
/// Exactly one instance exists per process run. The scratch directory's
/// lifetime strictly contains the socket's; [`BoundSocket::destroy`] tears
/// both down.
#[derive(Debug)]
pub struct BoundSocket {
    socket: UnixDatagram,
    socket_path: PathBuf,
    dir: PathBuf,
}

impl BoundSocket {
    /// Create the scratch directory under the current working directory and
    /// bind the ephemeral socket inside it.
    pub fn create() -> Result<Self, LifecycleError> {
        let base = std::env::current_dir().map_err(LifecycleError::WorkingDir)?;
        Self::create_in(&base)
    }

    /// Create the scratch directory under `base` and bind the ephemeral
    /// socket inside it.
    ///
    /// The directory is materialized atomically (mkdtemp); a non-writable
    /// or missing `base` fails here, before the relay ever runs.
    pub fn create_in(base: &Path) -> Result<Self, LifecycleError> {
        let dir = tempfile::Builder::new()
            .prefix(DIR_PREFIX)
            .tempdir_in(base)
            .map_err(|source| LifecycleError::CreateDir {
                base: base.to_path_buf(),
                source,
            })?
            // Teardown is explicit; disarm the drop-based cleanup.
            .keep();

        let socket_path = dir.join(SOCKET_NAME);
        let socket = match UnixDatagram::bind(&socket_path) {
            Ok(socket) => socket,
            Err(source) => {
                // Bind failed after the directory was created: remove it so
                // no partial state outlives the error.
                if let Err(e) = fs::remove_dir(&dir) {
                    warn!(dir = ?dir, error = %e, "Failed to remove scratch directory");
                }
                return Err(LifecycleError::Bind {
                    path: socket_path,
                    source,
                });
            }
        };

        debug!(path = ?socket_path, "Ephemeral socket bound");
        Ok(Self {
            socket,
            socket_path,
            dir,
        })
    }

    /// The bound socket handle.
    pub fn socket(&self) -> &UnixDatagram {
        &self.socket
    }

    /// Path of the socket file inside the scratch directory.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Path of the scratch directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Tear down the socket and its scratch directory.
    ///
    /// Strict order: close the socket, unlink the socket file, remove the
    /// now-empty directory. Each failing step is logged and recorded; all
    /// steps are attempted regardless.
    pub fn destroy(self) -> Result<(), TeardownError> {
        let mut steps: Vec<(&'static str, io::Error)> = Vec::new();

        // Dropping the handle closes the descriptor; close(2) errors are
        // not observable through drop.
        drop(self.socket);

        if let Err(e) = fs::remove_file(&self.socket_path) {
            warn!(path = ?self.socket_path, error = %e, "Failed to unlink socket file");
            steps.push(("unlink socket file", e));
        }

        if let Err(e) = fs::remove_dir(&self.dir) {
            warn!(dir = ?self.dir, error = %e, "Failed to remove scratch directory");
            steps.push(("remove scratch directory", e));
        }

        if steps.is_empty() {
            debug!(dir = ?self.dir, "Scratch directory removed");
            Ok(())
        } else {
            Err(TeardownError { steps })
        }
    }
}
