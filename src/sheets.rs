use crate::auth::{AuthConfig, SheetsAuth};
use crate::common::error::SheetError;
use async_trait::async_trait;
use google_sheets4 as sheets4;
use hyper;
use hyper_rustls;
use polars::prelude::*;
use sheets4::Sheets;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// One tab of a spreadsheet, as listed in its metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Worksheet {
    pub title: String,
    /// The `gid` URL parameter identifying the tab.
    pub gid: i32,
}

/// Parameters for a fetch. The worksheet is selected by zero-based tab
/// index unless a gid is given, in which case the gid wins.
#[derive(Clone, Debug)]
pub struct FetchParam {
    _sheet_id: String,
    _worksheet_index: usize,
    _worksheet_gid: Option<i32>,
}

impl FetchParam {
    pub fn new(sheet_id: &str) -> Self {
        FetchParam {
            _sheet_id: sheet_id.to_string(),
            _worksheet_index: 0,
            _worksheet_gid: Default::default(),
        }
    }

    pub fn worksheet_index(&mut self, index: usize) -> &mut Self {
        self._worksheet_index = index;
        self
    }

    pub fn worksheet_gid(&mut self, gid: i32) -> &mut Self {
        self._worksheet_gid = Some(gid);
        self
    }

    pub fn sheet_id(&self) -> &str {
        &self._sheet_id
    }
}

/// The two Sheets API calls the fetcher needs, behind a trait so tests can
/// substitute a faked client for the real hub.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SheetsApi {
    /// Worksheet roster of a spreadsheet, in tab order.
    async fn worksheets(&self, sheet_id: &str) -> Result<Vec<Worksheet>, SheetError>;

    /// Every cell of the named worksheet, as rows of strings.
    async fn values(
        &self,
        sheet_id: &str,
        worksheet_title: &str,
    ) -> Result<Vec<Vec<String>>, SheetError>;
}

pub struct SpreadSheet {
    api: Sheets<hyper_rustls::HttpsConnector<hyper::client::connect::HttpConnector>>,
}

impl std::fmt::Debug for SpreadSheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpreadSheet").finish_non_exhaustive()
    }
}

impl SpreadSheet {
    pub fn new(auth: SheetsAuth) -> Result<SpreadSheet, SheetError> {
        let client = hyper::Client::builder().build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .expect("no native root CA certificates found")
                .https_only()
                .enable_http1()
                .enable_http2()
                .build(),
        );
        let hub = Sheets::new(client, auth.authenticator());
        Ok(SpreadSheet { api: hub })
    }

    /// Open a client without a pre-authenticated session handle: runs the
    /// credential manager against the default config location first.
    pub async fn connect() -> Result<SpreadSheet, SheetError> {
        Self::new(SheetsAuth::connect().await?)
    }

    /// Like [`SpreadSheet::connect`], but against the given config location.
    pub async fn connect_with(config: &AuthConfig) -> Result<SpreadSheet, SheetError> {
        Self::new(SheetsAuth::connect_with(config).await?)
    }

    /// Fetch the selected worksheet and materialize it as a dataframe.
    pub async fn fetch_dataframe(&self, p: &FetchParam) -> Result<DataFrame, SheetError> {
        fetch_dataframe(self, p).await
    }
}

#[async_trait]
impl SheetsApi for SpreadSheet {
    async fn worksheets(&self, sheet_id: &str) -> Result<Vec<Worksheet>, SheetError> {
        // https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets/get
        let result = self
            .api
            .spreadsheets()
            .get(sheet_id)
            .doit()
            .await
            .map_err(|e| SheetError::from_api_error(e, sheet_id))?;

        Ok(result
            .1
            .sheets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| s.properties)
            .filter_map(|p| match (p.title, p.sheet_id) {
                (Some(title), Some(gid)) => Some(Worksheet { title, gid }),
                _ => None,
            })
            .collect())
    }

    async fn values(
        &self,
        sheet_id: &str,
        worksheet_title: &str,
    ) -> Result<Vec<Vec<String>>, SheetError> {
        // https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets.values/get
        let result = self
            .api
            .spreadsheets()
            .values_get(sheet_id, &quote_a1_sheet_name(worksheet_title))
            .doit()
            .await
            .map_err(|e| SheetError::from_api_error(e, sheet_id))?;

        Ok(result
            .1
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }
}

/// A bare sheet name is a valid A1 range covering the whole tab, but names
/// with spaces or punctuation must be single-quoted, with embedded quotes
/// doubled.
fn quote_a1_sheet_name(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Cells arrive as JSON scalars; render everything to its string form.
fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Fetch a worksheet through any [`SheetsApi`] implementation and convert
/// it to a dataframe: first row becomes the (deduplicated) column labels,
/// the remaining rows the body.
pub async fn fetch_dataframe<A: SheetsApi + Sync>(
    api: &A,
    p: &FetchParam,
) -> Result<DataFrame, SheetError> {
    info!(sheet_id = %p.sheet_id(), "opening spreadsheet");
    let worksheets = api.worksheets(p.sheet_id()).await?;
    let worksheet = resolve_worksheet(&worksheets, p)?;

    info!(worksheet = %worksheet.title, "reading worksheet");
    let mut all_values = api.values(p.sheet_id(), &worksheet.title).await?;
    if all_values.is_empty() {
        return Err(SheetError::EmptyWorksheet {
            title: worksheet.title.clone(),
        });
    }

    let raw_headers = all_values.remove(0);
    warn_on_duplicates(&raw_headers);
    let headers = make_columns_unique(&raw_headers);

    let df = to_dataframe(&headers, &all_values)?;
    info!(rows = df.height(), cols = df.width(), "loaded worksheet");
    Ok(df)
}

fn resolve_worksheet<'a>(
    worksheets: &'a [Worksheet],
    p: &FetchParam,
) -> Result<&'a Worksheet, SheetError> {
    let roster = || {
        worksheets
            .iter()
            .map(|w| (w.title.clone(), w.gid))
            .collect::<Vec<_>>()
    };
    match p._worksheet_gid {
        Some(gid) => worksheets.iter().find(|w| w.gid == gid).ok_or_else(|| {
            SheetError::WorksheetNotFound {
                selector: format!("gid {}", gid),
                available: roster(),
            }
        }),
        None => worksheets.get(p._worksheet_index).ok_or_else(|| {
            SheetError::WorksheetNotFound {
                selector: format!("index {}", p._worksheet_index),
                available: roster(),
            }
        }),
    }
}

fn warn_on_duplicates(raw_headers: &[String]) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for h in raw_headers {
        *counts.entry(h.as_str()).or_default() += 1;
    }
    let duplicates: Vec<&str> = counts
        .iter()
        .filter(|(_, &c)| c > 1)
        .map(|(name, _)| *name)
        .collect();
    if !duplicates.is_empty() {
        warn!(
            ?duplicates,
            "duplicate column names; suffixes added to make unique"
        );
    }
}

/// Make column names unique by appending suffixes to duplicates.
///
/// The k-th repeat of a name becomes `{name}_{k}`; first occurrences pass
/// through untouched. When a generated name would collide with a name
/// already emitted (input holding both `a` twice and a literal `a_1`),
/// the counter keeps advancing until the name is free, so the output is
/// always pairwise distinct.
///
/// Example: `["a", "b", "a", "a"]` -> `["a", "b", "a_1", "a_2"]`
pub fn make_columns_unique(columns: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(columns.len());

    for col in columns {
        let mut candidate = match seen.get(col) {
            None => {
                seen.insert(col.clone(), 0);
                col.clone()
            }
            Some(&k) => {
                seen.insert(col.clone(), k + 1);
                format!("{}_{}", col, k + 1)
            }
        };
        while taken.contains(&candidate) {
            let next = seen[col] + 1;
            seen.insert(col.clone(), next);
            candidate = format!("{}_{}", col, next);
        }
        taken.insert(candidate.clone());
        unique.push(candidate);
    }

    unique
}

/// One UTF-8 column per header. Rows shorter than the header are padded
/// with empty cells; surplus cells past the header width are dropped.
fn to_dataframe(headers: &[String], rows: &[Vec<String>]) -> Result<DataFrame, SheetError> {
    let columns = headers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let cells: Vec<&str> = rows
                .iter()
                .map(|row| row.get(i).map(String::as_str).unwrap_or(""))
                .collect();
            Column::new(name.as_str().into(), cells)
        })
        .collect::<Vec<Column>>();
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
#[path = "sheets_test.rs"]
mod sheets_test;
