use sheetframe::{auth, sheets};

#[tokio::main]
async fn main() {
    let spauth = auth::SheetsAuth::connect().await.unwrap();
    let spreadsheet = sheets::SpreadSheet::new(spauth).unwrap();
    let sheet_id = "1MYnMn4p3nRk51T4sMYyzUrKYAcgaMJsnTvu5AGv9UBo";
    let mut params = sheets::FetchParam::new(sheet_id);
    params.worksheet_index(0);
    //params.worksheet_gid(123456);
    let df = spreadsheet.fetch_dataframe(&params).await.unwrap();
    println!("{:?}", df);
}
