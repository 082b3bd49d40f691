use ecomdash::chart::{
    ChartDecision, GraphType, MAX_CHART_ROWS, ViewChartPolicy, plan_default_chart,
    plan_table_chart, render_chart, suggest_chart, view_chart_policy,
};
use ecomdash::table::RowSet;
use serde_json::{Value, json};

fn status_counts() -> RowSet {
    RowSet::from_records(&[
        json!({"order_status": "delivered", "order_count": 96478}),
        json!({"order_status": "shipped", "order_count": 1107}),
        json!({"order_status": "canceled", "order_count": 625}),
    ])
}

fn test_heuristic_happy_path() {
    println!("\n====== Testing the default heuristic ======");
    let rows = status_counts();
    assert_eq!(suggest_chart(&rows), ChartDecision::Plot { x: 0, y: 1 });
    println!("✓ First column charts against the first numeric column");

    // A text column between the label and the numbers is skipped over
    let rows = RowSet::from_records(&[
        json!({"seller_id": "s1", "seller_state": "SP", "revenue": "5099.90"}),
    ]);
    assert_eq!(suggest_chart(&rows), ChartDecision::Plot { x: 0, y: 2 });
    println!("✓ Non-numeric middle columns are passed over");
}

fn test_heuristic_skips() {
    println!("\n====== Testing heuristic skip reasons ======");
    let one_column = RowSet::from_records(&[json!({"total_reviews": 99224})]);
    assert_eq!(suggest_chart(&one_column), ChartDecision::NotEnoughColumns);
    assert!(
        ChartDecision::NotEnoughColumns
            .skip_reason()
            .unwrap()
            .contains("columns")
    );
    println!("✓ Fewer than 2 columns: chart skipped with a message");

    let all_text = RowSet::from_records(&[json!({"a": "x", "b": "y"})]);
    assert_eq!(suggest_chart(&all_text), ChartDecision::NoNumericColumn);
    println!("✓ No numeric column: chart skipped with a message");

    let mut huge = RowSet::new(vec!["id".to_string(), "value".to_string()]);
    for i in 0..(MAX_CHART_ROWS + 1) {
        huge.rows
            .push(vec![Value::from(i as u64), Value::from(i as u64)]);
    }
    assert_eq!(
        suggest_chart(&huge),
        ChartDecision::TooManyRows(MAX_CHART_ROWS + 1)
    );
    println!("✓ More than {} rows: chart skipped regardless of columns", MAX_CHART_ROWS);
}

fn test_view_overrides() {
    println!("\n====== Testing per-view chart policies ======");
    match view_chart_policy("view_seller_geolocation") {
        ViewChartPolicy::Fixed {
            graph_type,
            x_column,
            y_column,
            ..
        } => {
            assert_eq!(graph_type, GraphType::Scatter);
            assert_eq!(x_column, Some("geolocation_lng"));
            assert_eq!(y_column, Some("geolocation_lat"));
        }
        _ => panic!("seller geolocation should have a fixed scatter policy"),
    }
    println!("✓ Seller geolocation renders as a lng/lat scatter plot");

    assert!(matches!(
        view_chart_policy("view_dashboard_kpis"),
        ViewChartPolicy::Skip(_)
    ));
    assert!(matches!(
        view_chart_policy("orders"),
        ViewChartPolicy::Heuristic
    ));
    println!("✓ KPI views skip charting, plain tables use the heuristic");

    let geo = RowSet::from_records(&[
        json!({"seller_id": "s1", "geolocation_lat": -23.54, "geolocation_lng": -46.64}),
        json!({"seller_id": "s2", "geolocation_lat": -22.90, "geolocation_lng": -43.17}),
    ]);
    let plan = plan_table_chart("view_seller_geolocation", &geo).unwrap();
    assert_eq!(plan.x, geo.column_index("geolocation_lng").unwrap());
    assert_eq!(plan.y, geo.column_index("geolocation_lat").unwrap());
    println!("✓ Fixed policies resolve named columns to indices");

    let err = plan_table_chart("view_dashboard_kpis", &status_counts()).unwrap_err();
    assert!(err.contains("tiles"));
    println!("✓ Skip policies surface their reason");
}

fn test_rendering() {
    println!("\n====== Testing PNG rendering ======");
    let rows = status_counts();
    let plan = plan_default_chart("Orders by status", &rows).unwrap();

    // Font discovery depends on the host; a missing font stack is
    // reported, not treated as a test failure.
    match render_chart(&rows, &plan) {
        Ok(png_data) => {
            assert!(!png_data.is_empty());
            assert!(png_data.starts_with(b"\x89PNG\r\n\x1a\n"));
            println!("✓ Bar chart rendered to {} PNG bytes", png_data.len());
        }
        Err(e) => println!("~ chart rendering unavailable on this host ({})", e),
    }
}

fn main() {
    test_heuristic_happy_path();
    test_heuristic_skips();
    test_view_overrides();
    test_rendering();
    println!("\nAll chart tests passed!");
}
