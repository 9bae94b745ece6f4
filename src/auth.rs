use crate::common::error::SheetError;
use hyper;
use hyper_rustls;
use oauth2::authenticator::Authenticator;
use oauth2::authenticator_delegate::{DefaultInstalledFlowDelegate, InstalledFlowDelegate};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tracing::info;
use yup_oauth2 as oauth2;

/// Read-only access is all the fetcher ever needs.
pub const SPREADSHEET_READONLY_SCOPE: &str =
    "https://www.googleapis.com/auth/spreadsheets.readonly";

/// The OAuth2 redirect lands on this local port. Remote users are expected
/// to forward it from their workstation before starting the flow.
pub const OAUTH_CALLBACK_PORT: u16 = 8080;

const CLIENT_SECRETS_FILE: &str = "client_secrets.json";
const TOKEN_CACHE_FILE: &str = "tokencache.json";

/// Location of the client secrets file and the persisted token cache.
///
/// Defaults to `~/.config/sheetframe`; tests point this at a temp directory
/// instead of touching the real home.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    config_dir: PathBuf,
}

impl AuthConfig {
    pub fn new() -> Result<AuthConfig, SheetError> {
        let base = dirs::config_dir().ok_or(SheetError::ConfigDirUnavailable)?;
        Ok(AuthConfig {
            config_dir: base.join("sheetframe"),
        })
    }

    pub fn with_dir<P: Into<PathBuf>>(dir: P) -> AuthConfig {
        AuthConfig {
            config_dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn client_secrets_path(&self) -> PathBuf {
        self.config_dir.join(CLIENT_SECRETS_FILE)
    }

    pub fn token_cache_path(&self) -> PathBuf {
        self.config_dir.join(TOKEN_CACHE_FILE)
    }

    /// Drop the cached token so the next connect runs the interactive flow
    /// again. A missing cache file is not an error.
    pub fn clear_token_cache(&self) -> io::Result<()> {
        match std::fs::remove_file(self.token_cache_path()) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// async function to be pinned by the `present_user_url` method of the trait
/// we use the existing `DefaultInstalledFlowDelegate::present_user_url` method as a fallback for
/// when the browser did not open for example, the user still see's the URL.
async fn browser_user_url(url: &str, need_code: bool) -> Result<String, String> {
    println!();
    println!("{}", "=".repeat(70));
    println!("OAUTH2 AUTHENTICATION REQUIRED");
    println!("{}", "=".repeat(70));
    println!();
    println!("If connected over SSH, reconnect with the callback port forwarded:");
    println!(
        "  ssh -L {port}:localhost:{port} user@server",
        port = OAUTH_CALLBACK_PORT
    );
    println!();
    println!("Copy the URL below into a browser on your LOCAL machine.");
    println!("After granting access, the browser redirects and auth completes.");
    println!();
    if webbrowser::open(url).is_ok() {
        println!("webbrowser was successfully opened.");
    }
    let def_delegate = DefaultInstalledFlowDelegate;
    def_delegate.present_user_url(url, need_code).await
}

/// our custom delegate struct we will implement a flow delegate trait for:
/// in this case we will implement the `InstalledFlowDelegated` trait
#[derive(Copy, Clone)]
struct InstalledFlowBrowserDelegate;

/// here we implement only the present_user_url method with the added webbrowser opening
/// the other behaviour of the trait does not need to be changed.
impl InstalledFlowDelegate for InstalledFlowBrowserDelegate {
    /// the actual presenting of URL and browser opening happens in the function defined above here
    /// we only pin it
    fn present_user_url<'a>(
        &'a self,
        url: &'a str,
        need_code: bool,
    ) -> Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>> {
        Box::pin(browser_user_url(url, need_code))
    }
}

/// An authenticated session handle for the Sheets API.
///
/// Wraps a yup-oauth2 installed-flow authenticator which owns the credential
/// decision tree: reuse the cached token if valid, refresh it if expired,
/// fall back to the interactive browser flow otherwise.
#[derive(Clone)]
pub struct SheetsAuth {
    auth: Authenticator<hyper_rustls::HttpsConnector<hyper::client::connect::HttpConnector>>,
}

impl std::fmt::Debug for SheetsAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsAuth").finish_non_exhaustive()
    }
}

impl SheetsAuth {
    pub fn authenticator(
        &self,
    ) -> Authenticator<hyper_rustls::HttpsConnector<hyper::client::connect::HttpConnector>> {
        self.auth.clone()
    }

    /// Authenticate against the default config directory.
    pub async fn connect() -> Result<SheetsAuth, SheetError> {
        Self::connect_with(&AuthConfig::new()?).await
    }

    /// Authenticate using the given config location.
    ///
    /// The client secrets file must already exist; the token cache is
    /// created or rewritten by the underlying OAuth2 client. One token
    /// acquisition is forced here so cache and refresh problems surface
    /// immediately instead of on the first API call.
    pub async fn connect_with(config: &AuthConfig) -> Result<SheetsAuth, SheetError> {
        let secrets_path = config.client_secrets_path();
        if !secrets_path.exists() {
            return Err(SheetError::MissingClientSecrets { path: secrets_path });
        }

        let secret = oauth2::read_application_secret(&secrets_path)
            .await
            .map_err(|e| SheetError::InvalidClientSecrets {
                path: secrets_path.clone(),
                cause: anyhow::Error::new(e),
            })?;

        let token_path = config.token_cache_path();
        let had_cached_token = token_path.exists();

        let auth = oauth2::InstalledFlowAuthenticator::builder(
            secret,
            oauth2::InstalledFlowReturnMethod::HTTPPortRedirect(OAUTH_CALLBACK_PORT),
        )
        .persist_tokens_to_disk(token_path.clone())
        .flow_delegate(Box::new(InstalledFlowBrowserDelegate))
        .build()
        .await
        .map_err(|e| SheetError::AuthFlow {
            port: OAUTH_CALLBACK_PORT,
            cause: anyhow::Error::new(e),
        })?;

        // Force one acquisition. A failure with a cache present means the
        // refresh went bad; without one the interactive flow itself failed.
        if let Err(e) = auth.token(&[SPREADSHEET_READONLY_SCOPE]).await {
            return Err(if had_cached_token {
                SheetError::TokenRefresh {
                    token_path,
                    cause: anyhow::Error::new(e),
                }
            } else {
                SheetError::AuthFlow {
                    port: OAUTH_CALLBACK_PORT,
                    cause: anyhow::Error::new(e),
                }
            });
        }

        info!("Google Sheets authentication successful");
        Ok(SheetsAuth { auth })
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;
