use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Error kinds surfaced by this crate. Every variant carries the remediation
/// hints a caller needs to fix the problem, so the Display text is suitable
/// for direct presentation to an operator.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error(
        "OAuth2 client secrets not found at: {}\n\n\
         To set up Google Sheets access:\n\
         1. Download OAuth2 client credentials from Google Cloud Console\n\
         2. Save as: {}\n\
         3. Restrict permissions: chmod 600 {}",
        path.display(), path.display(), path.display()
    )]
    MissingClientSecrets { path: PathBuf },

    #[error("could not determine the user configuration directory; set HOME and retry")]
    ConfigDirUnavailable,

    #[error(
        "OAuth2 client secrets at {} could not be read: {cause}\n\n\
         The file exists but is not a valid client secrets JSON.\n\
         Re-download the OAuth2 client credentials from Google Cloud Console\n\
         and save them over it.",
        path.display()
    )]
    InvalidClientSecrets { path: PathBuf, cause: anyhow::Error },

    #[error(
        "failed to refresh OAuth2 credentials: {cause}\n\n\
         Try deleting the token cache and re-authenticating:\n  \
         rm {}\n\
         Then run again.",
        token_path.display()
    )]
    TokenRefresh {
        token_path: PathBuf,
        cause: anyhow::Error,
    },

    #[error(
        "OAuth2 authorization failed: {cause}\n\n\
         Possible causes:\n\
         1. Port {port} is already in use on this machine\n\
         2. SSH port forwarding not set up (ssh -L {port}:localhost:{port} user@server)\n\
         3. User cancelled authentication\n\
         4. Invalid client secrets file"
    )]
    AuthFlow { port: u16, cause: anyhow::Error },

    #[error(
        "spreadsheet not found: {sheet_id}\n\n\
         Possible causes:\n\
         1. The sheet ID is incorrect\n\
         2. The sheet is not shared with your Google account\n\
         3. The sheet has been deleted\n\n\
         To fix:\n\
         1. Verify the sheet ID in the URL\n\
         2. Ask the sheet owner to share it with your email"
    )]
    SpreadsheetNotFound { sheet_id: String },

    #[error(
        "worksheet {selector} not found\n\n\
         Available worksheets (title, gid): {available:?}\n\n\
         Select a different tab by index or gid."
    )]
    WorksheetNotFound {
        selector: String,
        available: Vec<(String, i32)>,
    },

    #[error(
        "Google Sheets API error (code {code}): {message}\n\n\
         Possible causes:\n\
         1. API rate limit exceeded\n\
         2. Google Sheets API not enabled in your project\n\
         3. Temporary API outage\n\n\
         To fix:\n\
         1. Wait a few seconds and try again\n\
         2. Enable the Google Sheets API in Google Cloud Console"
    )]
    Api { code: u16, message: String },

    #[error(
        "worksheet '{title}' is empty\n\n\
         The worksheet contains no data. Please check:\n\
         1. You're reading the correct worksheet tab\n\
         2. The data hasn't been moved or deleted"
    )]
    EmptyWorksheet { title: String },

    #[error("could not build dataframe: {0}")]
    DataFrame(#[from] polars::error::PolarsError),
}

const UNKNOWN_CODE: u16 = 500;
const UNKNOWN_MESSAGE: &str = "Unknown error";

impl SheetError {
    /// Classify a google-sheets4 error into one of our kinds. Bad requests
    /// carry a JSON payload with the HTTP status; 403/404 on a spreadsheet
    /// read both present as "no such sheet for you" to the caller.
    pub(crate) fn from_api_error(err: google_sheets4::Error, sheet_id: &str) -> SheetError {
        match err {
            google_sheets4::Error::BadRequest(value) => {
                let parsed: BadRequest =
                    serde_json::from_value(value).unwrap_or(BadRequest { error: None });
                let (code, message) = parsed.code_message();
                match code {
                    403 | 404 => SheetError::SpreadsheetNotFound {
                        sheet_id: sheet_id.to_string(),
                    },
                    _ => SheetError::Api { code, message },
                }
            }
            other => SheetError::Api {
                code: UNKNOWN_CODE,
                message: other.to_string(),
            },
        }
    }
}

/// Google API response BadRequest
///
/// Err(Bad Request: {"error":{"code":404,"errors":[{"domain":"global","message":"Requested entity was not found.","reason":"notFound"}],"message":"Requested entity was not found."}}
///
#[derive(Debug, Deserialize, Serialize)]
pub struct BadRequest {
    pub error: Option<GoogleError>,
}

impl BadRequest {
    fn code_message(&self) -> (u16, String) {
        self.error
            .as_ref()
            .map(|e| {
                (
                    e.code.unwrap_or(UNKNOWN_CODE),
                    e.message
                        .as_ref()
                        .map(|m| m.clone())
                        .unwrap_or(String::from(UNKNOWN_MESSAGE)),
                )
            })
            .unwrap_or((UNKNOWN_CODE, String::from(UNKNOWN_MESSAGE)))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GoogleError {
    pub code: Option<u16>,
    pub errors: Option<Vec<ErrorDetail>>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorDetail {
    pub domain: Option<String>,
    pub message: Option<String>,
    pub reason: Option<String>,
}
