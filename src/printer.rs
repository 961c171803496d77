//! Submission of spooled files to the system print queue

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::config::PrintConfig;
use crate::error::{PrinterError, Result};

/// Sends a file on disk to a printer
#[async_trait]
pub trait Printer: Send + Sync {
    /// Returns once the job has been accepted; a rejected job is an error
    async fn print(&self, path: &Path) -> Result<()>;
}

/// Runs an external command (`lp --` by default) with the file as last argument
#[derive(Debug, Clone)]
pub struct CommandPrinter {
    command: String,
    args: Vec<String>,
}

impl CommandPrinter {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &PrintConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl Printer for CommandPrinter {
    async fn print(&self, path: &Path) -> Result<()> {
        debug!("Running {} {:?} {:?}", self.command, self.args, path);

        let status = Command::new(&self.command)
            .args(&self.args)
            .arg(path)
            .status()
            .await
            .map_err(|e| PrinterError::PrintError {
                command: self.command.clone(),
                path: path.to_path_buf(),
                status: format!("failed to spawn: {}", e),
            })?;

        if !status.success() {
            return Err(PrinterError::PrintError {
                command: self.command.clone(),
                path: path.to_path_buf(),
                status: status.to_string(),
            });
        }

        Ok(())
    }
}
