//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::attachment::AttachmentHandler;
use crate::auth::{self, TokenStore};
use crate::client::GmailMailClient;
use crate::config::{default_config_path, Config};
use crate::error::{PrinterError, Result};
use crate::pipeline::{PrintPipeline, RunReport};
use crate::printer::CommandPrinter;

#[derive(Parser, Debug)]
#[command(name = "eprinter")]
#[command(version)]
#[command(about = "Automatically print email attachments", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print attachments of matching messages and label them (default)
    Run {
        /// Search and fetch only; nothing is printed or labeled
        #[arg(long)]
        dry_run: bool,
    },

    /// Load the credentials and generate an OAuth2 token
    Setup {
        /// OAuth2 client credentials downloaded from the Google Cloud console
        credentials: PathBuf,

        /// Replace an existing token
        #[arg(long)]
        force: bool,
    },

    /// Generate example configuration file
    InitConfig {
        /// Path to create config file (defaults to --config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// The subcommand to execute; a bare invocation prints
    pub fn resolved_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Run { dry_run: false })
    }
}

/// Authenticate from stored credentials and run the print pipeline
pub async fn run_print(config_path: &Path, dry_run: bool) -> Result<RunReport> {
    let config = Config::load(config_path).await?;

    let store = TokenStore::new(config.token_path());
    let hub = auth::initialize_gmail_hub(&config.credentials_path(), &store).await?;
    info!("Authenticated with Gmail API");

    let spool_base = std::env::current_dir()?;
    let handler = AttachmentHandler::new(
        spool_base,
        Box::new(CommandPrinter::from_config(&config.print)),
    );

    PrintPipeline::new(Arc::new(GmailMailClient::new(hub)), handler, config)
        .with_dry_run(dry_run)
        .run()
        .await
}

/// One-time interactive authorization
///
/// Copies `credentials` into the program folder, then persists the token
/// obtained from the pasted authorization code. With `force`, an existing
/// token stays in place until the new one has been obtained.
pub async fn run_setup(config_path: &Path, credentials: &Path, force: bool) -> Result<()> {
    let config = Config::load(config_path).await?;
    let store = TokenStore::new(config.token_path());

    if store.exists() && !force {
        return Err(PrinterError::AuthError(format!(
            "Token already exists at {:?}. Use --force to replace it.",
            store.path()
        )));
    }

    let secret = auth::load_credentials(credentials).await?;
    auth::install_credentials(credentials, &config.credentials_path()).await?;
    auth::authorize_interactive(secret, &store).await?;

    info!("Setup completed successfully");
    Ok(())
}

/// Write an example configuration, refusing to clobber one without `force`
pub async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(PrinterError::ConfigError(format!(
            "Configuration file already exists at {:?}. Use --force to overwrite.",
            output
        )));
    }

    Config::create_example(output).await
}
