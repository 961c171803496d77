use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PrinterError, Result};

/// Name of the folder under the home directory holding program data
pub const PROGRAM_FOLDER_NAME: &str = ".eprinter";

/// Email format accepted in `allowed_emails`
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Folder holding credentials.json and token.json
    #[serde(default = "default_program_folder")]
    pub program_folder: PathBuf,
    /// Senders whose attachments get printed
    #[serde(default)]
    pub allowed_emails: Vec<String>,
    /// Single-word subject keywords that select a message
    #[serde(default)]
    pub allowed_email_subjects: Vec<String>,
    /// Label marking a message as already printed
    #[serde(default)]
    pub printed_label: String,
    #[serde(default)]
    pub print: PrintConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintConfig {
    #[serde(default = "default_print_command")]
    pub command: String,
    /// Arguments placed before the file path
    #[serde(default = "default_print_args")]
    pub args: Vec<String>,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            command: default_print_command(),
            args: default_print_args(),
        }
    }
}

/// `~/.eprinter`, or `./.eprinter` when no home directory can be found
pub fn default_program_folder() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(PROGRAM_FOLDER_NAME)
}

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    default_program_folder().join("config.toml")
}

fn default_print_command() -> String {
    "lp".to_string()
}

fn default_print_args() -> Vec<String> {
    vec!["--".to_string()]
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            PrinterError::ConfigError(format!(
                "Unable to read configuration file {:?}: {}",
                path, e
            ))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| PrinterError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                PrinterError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| PrinterError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| PrinterError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    ///
    /// All-or-nothing: the first failing field is reported and the
    /// configuration must not be used.
    pub fn validate(&self) -> Result<()> {
        if self.allowed_emails.is_empty() {
            return Err(PrinterError::ConfigError(
                "allowed_emails should never be empty".to_string(),
            ));
        }
        for email in &self.allowed_emails {
            if !is_valid_email(email) {
                return Err(PrinterError::ConfigError(format!(
                    "allowed_emails contains an invalid address: '{}'",
                    email
                )));
            }
        }

        if self.allowed_email_subjects.is_empty() {
            return Err(PrinterError::ConfigError(
                "allowed_email_subjects should never be empty".to_string(),
            ));
        }
        for subject in &self.allowed_email_subjects {
            if subject.trim().is_empty() {
                return Err(PrinterError::ConfigError(
                    "allowed_email_subjects cannot contain empty strings".to_string(),
                ));
            }
            if subject.chars().any(char::is_whitespace) {
                return Err(PrinterError::ConfigError(format!(
                    "allowed email subject '{}' should have only one word",
                    subject
                )));
            }
        }

        if self.printed_label.trim().is_empty() {
            return Err(PrinterError::ConfigError(
                "printed_label should never be empty".to_string(),
            ));
        }

        if self.print.command.trim().is_empty() {
            return Err(PrinterError::ConfigError(
                "print.command cannot be empty".to_string(),
            ));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.program_folder.join("credentials.json")
    }

    pub fn token_path(&self) -> PathBuf {
        self.program_folder.join("token.json")
    }

    /// Configuration written by `init-config`; placeholders must be edited
    pub fn example() -> Self {
        Self {
            program_folder: default_program_folder(),
            allowed_emails: vec!["scanner@example.com".to_string()],
            allowed_email_subjects: vec!["Invoice".to_string()],
            printed_label: "Printed".to_string(),
            print: PrintConfig::default(),
        }
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        Self::example().save(path).await
    }
}

/// Check an address against the accepted email format
pub fn is_valid_email(address: &str) -> bool {
    address.len() <= 254 && EMAIL_PATTERN.is_match(address)
}
