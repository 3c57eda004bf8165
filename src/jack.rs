//! External JACK tooling collaborators
//!
//! Everything that actually talks to the graph goes through the
//! [`GraphBackend`] trait; the production implementation shells out to the
//! JACK example clients through `pw-jack` so it works against PipeWire's JACK
//! emulation as well as a native server.

use async_trait::async_trait;
use std::process::Output;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Wrapper binary that places the JACK clients inside the PipeWire JACK world
const JACK_WRAPPER: &str = "pw-jack";

/// A graph query that could not be completed
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} failed: {message}")]
    Failed {
        command: &'static str,
        message: String,
    },
}

/// Query and connect operations against the live port graph
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Raw port listing with types and properties (`jack_lsp -pt` shape)
    async fn list_ports(&self) -> Result<String, QueryError>;

    /// Raw existing-connection listing (`jack_lsp -c` shape)
    async fn list_connections(&self) -> Result<String, QueryError>;

    /// Request a new connection from `source` to `dest`
    async fn connect(&self, source: &str, dest: &str) -> Result<(), QueryError>;
}

/// Production backend: `pw-jack jack_lsp` / `pw-jack jack_connect` subprocesses
pub struct JackCli;

impl JackCli {
    async fn run(command: &'static str, args: &[&str]) -> Result<Output, QueryError> {
        debug!("running {} {} {}", JACK_WRAPPER, command, args.join(" "));
        Command::new(JACK_WRAPPER)
            .arg(command)
            .args(args)
            .output()
            .await
            .map_err(|source| QueryError::Spawn { command, source })
    }

    async fn run_checked(command: &'static str, args: &[&str]) -> Result<String, QueryError> {
        let output = Self::run(command, args).await?;
        if !output.status.success() {
            return Err(QueryError::Failed {
                command,
                message: failure_message(command, &output),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Stderr text if the tool printed any, otherwise a generic exit diagnostic
fn failure_message(command: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("{} exited with {}", command, output.status)
    } else {
        stderr.to_string()
    }
}

#[async_trait]
impl GraphBackend for JackCli {
    async fn list_ports(&self) -> Result<String, QueryError> {
        Self::run_checked("jack_lsp", &["-pt"]).await
    }

    async fn list_connections(&self) -> Result<String, QueryError> {
        Self::run_checked("jack_lsp", &["-c"]).await
    }

    async fn connect(&self, source: &str, dest: &str) -> Result<(), QueryError> {
        let output = Self::run("jack_connect", &[source, dest]).await?;
        if !output.status.success() {
            return Err(QueryError::Failed {
                command: "jack_connect",
                message: failure_message("jack_connect", &output),
            });
        }
        Ok(())
    }
}
