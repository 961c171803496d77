use anyhow::Result;
use clap::Parser;
use eprinter::cli::{self, Cli, Commands};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Exit with proper code on error
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Multiple dependencies pull in rustls crypto providers, so pick one explicitly
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    match cli.resolved_command() {
        Commands::Run { dry_run } => {
            if dry_run {
                println!("Running in DRY RUN mode - nothing will be printed or labeled");
            }

            let report = cli::run_print(&cli.config, dry_run).await?;

            println!("Run ID: {}", report.run_id);
            println!("Messages matched: {}", report.messages_matched);
            println!("Messages printed: {}", report.messages_printed);
            println!("Messages skipped: {}", report.messages_skipped);
            println!("Attachments printed: {}", report.attachments_printed);
            Ok(())
        }

        Commands::Setup { credentials, force } => {
            cli::run_setup(&cli.config, &credentials, force).await?;
            println!("Setup completed successfully.");
            Ok(())
        }

        Commands::InitConfig { output, force } => {
            let output = output.unwrap_or_else(|| cli.config.clone());
            cli::init_config(&output, force).await?;

            println!("Created example configuration file at: {:?}", output);
            println!("\nPlease edit this file before running eprinter:");
            println!("  - allowed_emails: senders whose attachments are printed");
            println!("  - allowed_email_subjects: one-word subject keywords");
            println!("  - printed_label: label applied after printing");
            Ok(())
        }
    }
}

/// Logs go to stderr; RUST_LOG overrides the verbosity flag
fn init_tracing(verbose: bool, json: bool) {
    let default_directive = if verbose { "eprinter=debug" } else { "eprinter=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
