use ecomdash::table::{RowSet, cell_text, numeric_value};
use serde_json::json;

// Helper to build a row set the way the gateway produces one
fn sample_orders() -> RowSet {
    RowSet::from_records(&[
        json!({"order_id": "1", "status": "shipped"}),
        json!({"order_id": "2", "status": "cancelled"}),
    ])
}

fn test_from_records() {
    println!("\n====== Testing RowSet::from_records ======");
    let rows = sample_orders();
    assert_eq!(rows.columns, vec!["order_id", "status"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(cell_text(&rows.rows[0][1]), "shipped");
    println!("✓ Columns preserved in record order");

    // Missing keys become nulls, extra keys are ignored
    let ragged = RowSet::from_records(&[
        json!({"a": 1, "b": 2}),
        json!({"a": 3, "c": 9}),
    ]);
    assert_eq!(ragged.columns, vec!["a", "b"]);
    assert!(ragged.rows[1][1].is_null());
    println!("✓ Missing keys render as nulls");

    let empty = RowSet::from_records(&[]);
    assert!(empty.is_empty());
    assert_eq!(empty.column_count(), 0);
    println!("✓ Empty record array yields an empty row set");
}

fn test_search_filter() {
    println!("\n====== Testing filter_contains ======");
    let rows = sample_orders();

    let hits = rows.filter_contains("ship");
    assert_eq!(hits.len(), 1);
    assert_eq!(cell_text(&hits.rows[0][0]), "1");
    println!("✓ Substring \"ship\" keeps only the shipped order");

    let case_insensitive = rows.filter_contains("CANCEL");
    assert_eq!(case_insensitive.len(), 1);
    assert_eq!(cell_text(&case_insensitive.rows[0][0]), "2");
    println!("✓ Matching is case-insensitive");

    let everything = rows.filter_contains("  ");
    assert_eq!(everything.len(), 2);
    println!("✓ Blank needle keeps every row");

    let nothing = rows.filter_contains("zzz");
    assert!(nothing.is_empty());
    assert_eq!(nothing.columns, rows.columns);
    println!("✓ No match yields an empty set with the same columns");
}

fn test_csv_export() {
    println!("\n====== Testing to_csv ======");
    let rows = RowSet::from_records(&[
        json!({"name": "acme, inc", "note": "said \"hi\"", "count": 3}),
        json!({"name": "plain", "note": null, "count": 4}),
    ]);
    let csv = rows.to_csv();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "name,note,count");
    assert_eq!(lines[1], "\"acme, inc\",\"said \"\"hi\"\"\",3");
    assert_eq!(lines[2], "plain,,4");
    println!("✓ Commas and quotes escaped, nulls render empty");
}

fn test_numeric_detection() {
    println!("\n====== Testing numeric detection ======");
    assert_eq!(numeric_value(&json!(12.5)), Some(12.5));
    assert_eq!(numeric_value(&json!("42")), Some(42.0));
    assert_eq!(numeric_value(&json!(" 3.25 ")), Some(3.25));
    assert_eq!(numeric_value(&json!("n/a")), None);
    assert_eq!(numeric_value(&json!(null)), None);
    println!("✓ JSON numbers and numeric strings both count");

    // Direct-connection results arrive as text
    let rows = RowSet::from_records(&[
        json!({"state": "SP", "label": "big", "orders": "41746"}),
        json!({"state": "RJ", "label": "mid", "orders": "12852"}),
    ]);
    assert!(!rows.is_numeric_column(0));
    assert!(!rows.is_numeric_column(1));
    assert!(rows.is_numeric_column(2));
    assert_eq!(rows.first_numeric_column(1), Some(2));
    println!("✓ First numeric column found past the label columns");

    let no_numeric = RowSet::from_records(&[json!({"a": "x", "b": "y"})]);
    assert_eq!(no_numeric.first_numeric_column(1), None);
    println!("✓ All-text row set has no numeric column");
}

fn main() {
    test_from_records();
    test_search_filter();
    test_csv_export();
    test_numeric_detection();
    println!("\nAll row set tests passed!");
}
