//! eprinter
//!
//! Prints the attachments of Gmail messages sent by allow-listed senders with
//! allow-listed subject keywords, then labels each message so it is never
//! printed twice.
//!
//! # Overview
//!
//! A run is strictly sequential:
//! - **Configuration**: TOML file with the allow-lists and the printed label
//! - **Authentication**: OAuth2 token obtained once by `eprinter setup`
//! - **Search**: `has:attachment -label:<printed> from:(..) subject:(..)`
//! - **Printing**: each attachment is spooled to a temporary directory and
//!   handed to `lp`
//! - **Labelling**: the printed label is applied once all attachments printed
//!
//! # Example Usage
//!
//! ```no_run
//! use eprinter::{auth, auth::TokenStore, config::Config};
//! use eprinter::{AttachmentHandler, CommandPrinter, GmailMailClient, PrintPipeline};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!
//!     let store = TokenStore::new(config.token_path());
//!     let hub = auth::initialize_gmail_hub(&config.credentials_path(), &store).await?;
//!
//!     let handler = AttachmentHandler::new(
//!         std::env::current_dir()?,
//!         Box::new(CommandPrinter::from_config(&config.print)),
//!     );
//!     let report = PrintPipeline::new(Arc::new(GmailMailClient::new(hub)), handler, config)
//!         .run()
//!         .await?;
//!     println!("{} attachments printed", report.attachments_printed);
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`attachment`] - Spooling and printing of single attachments
//! - [`auth`] - OAuth2 setup, token persistence and Gmail API initialization
//! - [`cli`] - Command-line interface and command handlers
//! - [`client`] - Gmail API client behind the [`MailClient`] trait
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types and result aliases
//! - [`labels`] - Find-or-create of the printed label
//! - [`models`] - Core data structures
//! - [`pipeline`] - The print run
//! - [`printer`] - Print command invocation
//! - [`query`] - Gmail search query construction

pub mod attachment;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod labels;
pub mod models;
pub mod pipeline;
pub mod printer;
pub mod query;

// Re-export commonly used types for convenience
pub use error::{PrinterError, Result};

pub use attachment::AttachmentHandler;
pub use client::{GmailMailClient, MailClient};
pub use config::{Config, PrintConfig};
pub use models::{AttachmentBody, LabelInfo, Message, MessagePart, MessageSummary, PartBody};
pub use pipeline::{PrintPipeline, RunReport};
pub use printer::{CommandPrinter, Printer};
