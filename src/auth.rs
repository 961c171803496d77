//! OAuth2 credentials, token persistence and Gmail hub construction

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use google_gmail1::yup_oauth2::authenticator_delegate::InstalledFlowDelegate;
use google_gmail1::yup_oauth2::storage::{TokenInfo, TokenStorage};
use google_gmail1::yup_oauth2::{
    read_application_secret, ApplicationSecret, InstalledFlowAuthenticator,
    InstalledFlowReturnMethod,
};
use google_gmail1::{hyper_rustls, hyper_util, Gmail};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{PrinterError, Result};

/// Read/write access to messages, used for search, fetch and labelling
pub const MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Label listing and creation
pub const LABELS_SCOPE: &str = "https://www.googleapis.com/auth/gmail.labels";

/// Scopes granted during setup and requested on every run
pub const REQUIRED_SCOPES: &[&str] = &[MODIFY_SCOPE, LABELS_SCOPE];

/// Type alias for Gmail Hub to simplify type signatures
pub type GmailHub =
    Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// OAuth2 token as persisted in `token.json`
///
/// `{"access_token", "token_type", "refresh_token", "expiry"}` with `expiry`
/// in RFC 3339. A zero time (`0001-01-01T00:00:00Z`) means no expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Token {
    /// Expiry with the zero-time sentinel mapped to "never"
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry.filter(|expiry| expiry.year() > 1)
    }
}

impl From<TokenInfo> for Token {
    fn from(info: TokenInfo) -> Self {
        Self {
            access_token: info.access_token.unwrap_or_default(),
            token_type: default_token_type(),
            refresh_token: info.refresh_token,
            expiry: info
                .expires_at
                .and_then(|at| DateTime::<Utc>::from_timestamp(at.unix_timestamp(), 0)),
            id_token: info.id_token,
        }
    }
}

impl From<Token> for TokenInfo {
    fn from(token: Token) -> Self {
        let expires_at = token
            .expires_at()
            .and_then(|at| time::OffsetDateTime::from_unix_timestamp(at.timestamp()).ok());
        TokenInfo {
            access_token: Some(token.access_token).filter(|t| !t.is_empty()),
            refresh_token: token.refresh_token,
            expires_at,
            id_token: token.id_token,
        }
    }
}

/// Load the provider-issued OAuth2 client descriptor (`credentials.json`)
pub async fn load_credentials(path: &Path) -> Result<ApplicationSecret> {
    read_application_secret(path)
        .await
        .map_err(|e| PrinterError::AuthError(format!("Failed to read credentials {:?}: {}", path, e)))
}

/// Copy the credentials file into the program folder with owner-only permissions
pub async fn install_credentials(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let content = tokio::fs::read(source).await?;
    write_private(destination, &content).await?;
    info!("Installed credentials at {:?}", destination);
    Ok(())
}

/// Token persisted as a single JSON object on local disk
///
/// Also serves as the authenticator's storage, so a refreshed token is
/// rewritten through the same path as the initial one.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the persisted token; a missing file means setup never ran
    pub async fn load_token(&self) -> Result<Token> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PrinterError::AuthError(format!(
                    "No token found at {:?}. Run `eprinter setup <credentials.json>` first",
                    self.path
                )));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            PrinterError::AuthError(format!("Token file {:?} is corrupt: {}", self.path, e))
        })
    }

    /// Serialize and write the token, overwriting any existing file
    pub async fn save_token(&self, token: &Token) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(token)?;
        write_private(&self.path, &json).await?;
        debug!("Saved token to {:?}", self.path);
        Ok(())
    }

    pub async fn remove(&self) -> Result<()> {
        if self.exists() {
            tokio::fs::remove_file(&self.path).await?;
        }
        Ok(())
    }

    /// Sibling file a new token is written to before it replaces this one
    fn staging(&self) -> TokenStore {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".new");
        TokenStore::new(self.path.with_file_name(name))
    }
}

#[async_trait]
impl TokenStorage for TokenStore {
    async fn set(&self, _scopes: &[&str], token: TokenInfo) -> anyhow::Result<()> {
        self.save_token(&Token::from(token)).await?;
        Ok(())
    }

    async fn get(&self, _scopes: &[&str]) -> Option<TokenInfo> {
        self.load_token().await.ok().map(TokenInfo::from)
    }
}

/// Prints the consent URL and blocks until the operator pastes the code
struct PasteCodeDelegate {
    redirect_uri: Option<String>,
}

impl InstalledFlowDelegate for PasteCodeDelegate {
    fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    fn present_user_url<'a>(
        &'a self,
        url: &'a str,
        need_code: bool,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<String, String>> + Send + 'a>> {
        Box::pin(async move {
            println!("Go to the following link in your browser:\n\n  {}\n", url);
            if !need_code {
                return Ok(String::new());
            }

            let code = tokio::task::spawn_blocking(|| {
                inquire::Text::new("Authorization code:")
                    .with_help_message("Copy the `code` value shown after granting access")
                    .prompt()
            })
            .await
            .map_err(|e| e.to_string())?
            .map_err(|e| e.to_string())?;

            Ok(code.trim().to_string())
        })
    }
}

/// Used by unattended runs: consent is never requested outside `setup`
struct NoPromptDelegate;

impl InstalledFlowDelegate for NoPromptDelegate {
    fn present_user_url<'a>(
        &'a self,
        _url: &'a str,
        _need_code: bool,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<String, String>> + Send + 'a>> {
        Box::pin(async {
            Err("stored token is no longer valid; run `eprinter setup` again".to_string())
        })
    }
}

/// Perform the one-time authorization-code exchange and persist the token
///
/// Blocks on operator input with no timeout. The new token is written next
/// to `store` and only replaces an existing token once the exchange succeeded.
pub async fn authorize_interactive(secret: ApplicationSecret, store: &TokenStore) -> Result<Token> {
    let redirect_uri = secret.redirect_uris.first().cloned();
    let staging = store.staging();
    staging.remove().await?;

    let auth = InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::Interactive)
        .with_storage(Box::new(staging.clone()))
        .flow_delegate(Box::new(PasteCodeDelegate { redirect_uri }))
        .build()
        .await
        .map_err(|e| PrinterError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    if let Err(e) = auth.token(REQUIRED_SCOPES).await {
        staging.remove().await?;
        return Err(PrinterError::AuthError(format!(
            "Unable to retrieve token from web: {}",
            e
        )));
    }

    tokio::fs::rename(staging.path(), store.path()).await?;
    info!("Saved token in {:?}", store.path());
    store.load_token().await
}

/// Initialize the Gmail API hub from stored credentials and token
///
/// The token must already exist. Expired access tokens are refreshed by the
/// authenticator and written back through `store`.
pub async fn initialize_gmail_hub(credentials_path: &Path, store: &TokenStore) -> Result<GmailHub> {
    let secret = load_credentials(credentials_path).await?;

    // Fails with the setup hint when the token is missing or unreadable.
    store.load_token().await?;

    let auth = InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::Interactive)
        .with_storage(Box::new(store.clone()))
        .flow_delegate(Box::new(NoPromptDelegate))
        .build()
        .await
        .map_err(|e| PrinterError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    // Refresh up front so an unusable token fails before any mailbox call
    auth.token(REQUIRED_SCOPES)
        .await
        .map_err(|e| PrinterError::AuthError(format!("Failed to obtain token: {}", e)))?;

    // HTTP/1 works better with google-gmail1 than the HTTP/2 default
    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| PrinterError::AuthError(format!("Failed to load TLS roots: {}", e)))?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    Ok(Gmail::new(client, auth))
}

/// Write a file readable and writable by its owner only
///
/// New files are created with mode 0600; an existing file is tightened
/// before any content is written.
async fn write_private(path: &Path, content: &[u8]) -> Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    if path.exists() {
        secure_file(path).await?;
    }

    let mut file = options.open(path).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    Ok(())
}

/// Sets file permissions to 0600 (read/write for owner only)
#[cfg(unix)]
pub async fn secure_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Windows uses ACLs; the file inherits the profile directory's
#[cfg(windows)]
pub async fn secure_file(_path: &Path) -> Result<()> {
    Ok(())
}
