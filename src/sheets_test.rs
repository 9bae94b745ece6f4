#[cfg(test)]
mod tests {
    #![allow(clippy::all)]
    use super::super::*;
    use polars::df;
    use rstest::rstest;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[rstest]
    #[case(&["a", "b", "a", "a"], &["a", "b", "a_1", "a_2"])]
    #[case(&["x", "x", "x"], &["x", "x_1", "x_2"])]
    #[case(&[], &[])]
    #[case(&["a", "b", "c"], &["a", "b", "c"])]
    #[case(&["", "", ""], &["", "_1", "_2"])]
    fn test_make_columns_unique_examples(#[case] input: &[&str], #[case] expected: &[&str]) {
        assert_eq!(make_columns_unique(&cols(input)), cols(expected));
    }

    #[test]
    fn test_make_columns_unique_preserves_length_and_order() {
        let input = cols(&["id", "name", "id", "value", "name", "id"]);
        let output = make_columns_unique(&input);
        assert_eq!(output.len(), input.len());
        // first occurrences keep their position untouched
        assert_eq!(output[0], "id");
        assert_eq!(output[1], "name");
        assert_eq!(output[3], "value");
    }

    #[test]
    fn test_make_columns_unique_output_is_pairwise_distinct() {
        let input = cols(&["a", "a", "a_1", "a", "a_2", "b", "b", "b_1"]);
        let output = make_columns_unique(&input);
        let distinct: std::collections::HashSet<&String> = output.iter().collect();
        assert_eq!(distinct.len(), output.len(), "output: {:?}", output);
    }

    #[test]
    fn test_make_columns_unique_identity_on_unique_input() {
        let input = cols(&["alpha", "beta", "gamma"]);
        assert_eq!(make_columns_unique(&input), input);
    }

    #[test]
    fn test_make_columns_unique_generated_name_collision() {
        // A literal "a_1" already emitted takes the slot the second "a"
        // would get; the counter advances past it.
        let input = cols(&["a", "a_1", "a"]);
        assert_eq!(make_columns_unique(&input), cols(&["a", "a_1", "a_2"]));
    }

    #[test]
    fn test_quote_a1_sheet_name() {
        assert_eq!(quote_a1_sheet_name("Sheet1"), "'Sheet1'");
        assert_eq!(quote_a1_sheet_name("My Data"), "'My Data'");
        assert_eq!(quote_a1_sheet_name("it's"), "'it''s'");
    }

    #[test]
    fn test_cell_to_string_renders_scalars() {
        use serde_json::json;
        assert_eq!(cell_to_string(json!("text")), "text");
        assert_eq!(cell_to_string(json!(42)), "42");
        assert_eq!(cell_to_string(json!(1.5)), "1.5");
        assert_eq!(cell_to_string(json!(true)), "true");
        assert_eq!(cell_to_string(serde_json::Value::Null), "");
    }

    #[test]
    fn test_fetch_param_defaults() {
        let p = FetchParam::new("sheet123");
        assert_eq!(p.sheet_id(), "sheet123");
        assert_eq!(p._worksheet_index, 0);
        assert!(p._worksheet_gid.is_none());
    }

    fn two_tab_roster() -> Vec<Worksheet> {
        vec![
            Worksheet {
                title: "Sheet1".to_string(),
                gid: 0,
            },
            Worksheet {
                title: "Data".to_string(),
                gid: 123456,
            },
        ]
    }

    #[tokio::test]
    async fn test_fetch_unknown_index_lists_available_worksheets() {
        let mut api = MockSheetsApi::new();
        api.expect_worksheets().returning(|_| Ok(two_tab_roster()));

        let mut p = FetchParam::new("sheet123");
        p.worksheet_index(5);
        let err = fetch_dataframe(&api, &p).await.unwrap_err();
        match &err {
            SheetError::WorksheetNotFound {
                selector,
                available,
            } => {
                assert_eq!(selector, "index 5");
                assert_eq!(
                    available,
                    &vec![("Sheet1".to_string(), 0), ("Data".to_string(), 123456)]
                );
            }
            other => panic!("unexpected kind: {:?}", other),
        }
        // The message itself enumerates the roster as a remediation aid.
        let text = err.to_string();
        assert!(text.contains("Sheet1"));
        assert!(text.contains("123456"));
    }

    #[tokio::test]
    async fn test_fetch_unknown_gid_lists_available_worksheets() {
        let mut api = MockSheetsApi::new();
        api.expect_worksheets().returning(|_| Ok(two_tab_roster()));

        let mut p = FetchParam::new("sheet123");
        p.worksheet_gid(999);
        let err = fetch_dataframe(&api, &p).await.unwrap_err();
        match err {
            SheetError::WorksheetNotFound { selector, .. } => {
                assert_eq!(selector, "gid 999");
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_gid_takes_precedence_over_index() {
        let mut api = MockSheetsApi::new();
        api.expect_worksheets().returning(|_| Ok(two_tab_roster()));
        api.expect_values()
            .withf(|_, title| title == "Data")
            .returning(|_, _| Ok(vec![row(&["h"]), row(&["v"])]));

        // Index points at the first tab, but the gid selects "Data".
        let mut p = FetchParam::new("sheet123");
        p.worksheet_index(0).worksheet_gid(123456);
        let df = fetch_dataframe(&api, &p).await.unwrap();
        assert_eq!(df.get_column_names_str(), vec!["h"]);
        assert_eq!(df.height(), 1);
    }

    #[tokio::test]
    async fn test_empty_worksheet_is_a_distinct_error() {
        let mut api = MockSheetsApi::new();
        api.expect_worksheets().returning(|_| Ok(two_tab_roster()));
        api.expect_values().returning(|_, _| Ok(vec![]));

        let p = FetchParam::new("sheet123");
        let err = fetch_dataframe(&api, &p).await.unwrap_err();
        match err {
            SheetError::EmptyWorksheet { title } => assert_eq!(title, "Sheet1"),
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_spreadsheet_not_found_propagates() {
        let mut api = MockSheetsApi::new();
        api.expect_worksheets().returning(|sheet_id| {
            Err(SheetError::SpreadsheetNotFound {
                sheet_id: sheet_id.to_string(),
            })
        });

        let p = FetchParam::new("gone");
        let err = fetch_dataframe(&api, &p).await.unwrap_err();
        assert!(matches!(err, SheetError::SpreadsheetNotFound { .. }));
    }

    #[tokio::test]
    async fn test_fetch_builds_dataframe_with_deduplicated_headers() {
        let mut api = MockSheetsApi::new();
        api.expect_worksheets().returning(|_| Ok(two_tab_roster()));
        api.expect_values().returning(|_, _| {
            Ok(vec![
                row(&["name", "value", "name"]),
                row(&["x", "1", "left"]),
                row(&["y", "2", "right"]),
            ])
        });

        let p = FetchParam::new("sheet123");
        let df = fetch_dataframe(&api, &p).await.unwrap();
        let expected = df!(
            "name" => ["x", "y"],
            "value" => ["1", "2"],
            "name_1" => ["left", "right"],
        )
        .unwrap();
        assert!(df.equals(&expected), "got: {:?}", df);
    }

    #[tokio::test]
    async fn test_ragged_rows_are_padded_and_truncated() {
        let mut api = MockSheetsApi::new();
        api.expect_worksheets().returning(|_| Ok(two_tab_roster()));
        api.expect_values().returning(|_, _| {
            Ok(vec![
                row(&["a", "b"]),
                row(&["1"]),
                row(&["2", "3", "surplus"]),
            ])
        });

        let p = FetchParam::new("sheet123");
        let df = fetch_dataframe(&api, &p).await.unwrap();
        let expected = df!(
            "a" => ["1", "2"],
            "b" => ["", "3"],
        )
        .unwrap();
        assert!(df.equals(&expected), "got: {:?}", df);
    }

    #[tokio::test]
    async fn test_connect_without_session_handle_runs_credential_manager() {
        // No pre-authenticated handle supplied: the constructor goes
        // through the credential manager, which here fails its secrets
        // precondition against an empty config dir.
        let dir = tempfile::tempdir().unwrap();
        let err = SpreadSheet::connect_with(&AuthConfig::with_dir(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, SheetError::MissingClientSecrets { .. }));
    }

    #[tokio::test]
    async fn test_header_only_worksheet_yields_empty_bodied_frame() {
        let mut api = MockSheetsApi::new();
        api.expect_worksheets().returning(|_| Ok(two_tab_roster()));
        api.expect_values()
            .returning(|_, _| Ok(vec![row(&["a", "b"])]));

        let p = FetchParam::new("sheet123");
        let df = fetch_dataframe(&api, &p).await.unwrap();
        assert_eq!(df.get_column_names_str(), vec!["a", "b"]);
        assert_eq!(df.height(), 0);
    }
}
