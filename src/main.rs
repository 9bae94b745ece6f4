use anyhow::Result;
use clap::Parser;
use sheetframe::auth::SheetsAuth;
use sheetframe::sheets::{FetchParam, SpreadSheet};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[clap(version, about = "Fetch a Google Sheets worksheet as a dataframe")]
struct Cli {
    /// Sheet ID from the spreadsheet URL
    #[clap(short = 's', long = "sheet")]
    sheet_id: String,

    /// Worksheet tab index, zero-based (ignored when --gid is given)
    #[clap(short = 'i', long = "index", default_value = "0")]
    index: usize,

    /// Worksheet gid from the URL 'gid' parameter; takes precedence over --index
    #[clap(short = 'g', long = "gid")]
    gid: Option<i32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let auth = SheetsAuth::connect().await?;
    let spreadsheet = SpreadSheet::new(auth)?;

    let mut param = FetchParam::new(&cli.sheet_id);
    param.worksheet_index(cli.index);
    if let Some(gid) = cli.gid {
        param.worksheet_gid(gid);
    }

    let df = spreadsheet.fetch_dataframe(&param).await?;
    println!("{}", df);
    Ok(())
}
