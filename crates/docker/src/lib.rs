//! Local Docker orchestration.
//!
//! Thin layer over the docker and az CLIs: availability probing, port
//! checks, compose lifecycle and image build/push. Output of the
//! external tools is captured and mapped onto the shared error type so
//! the CLI boundary can print remediation hints.

pub mod compose;
pub mod image;
pub mod process;

pub use compose::{run_app, stop_app, wait_healthy};
pub use image::{build_app, push_image};
pub use process::{docker, run_command, CommandOutput};

use aifabrix_common::{Error, Result};
use std::net::TcpListener;

/// Check docker is installed and the daemon is reachable.
pub fn ensure_docker() -> Result<()> {
    if which::which("docker").is_err() {
        return Err(Error::DockerNotFound);
    }
    let info = process::docker(&["info", "--format", "{{.ServerVersion}}"], None)?;
    if !info.success() {
        return Err(Error::DockerNotRunning);
    }
    Ok(())
}

/// Check a host port is free before any container is started.
pub fn check_port_free(port: u16) -> Result<()> {
    match TcpListener::bind(("0.0.0.0", port)) {
        Ok(listener) => {
            drop(listener);
            Ok(())
        }
        Err(_) => Err(Error::PortInUse { port }),
    }
}
