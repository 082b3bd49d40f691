use std::fs;
use std::io;
use std::path::Path;

use lazy_static::lazy_static;

/// Where a catalog entry's rows come from: a shipped SQL file or a
/// precomputed database view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuerySource {
    File(&'static str),
    View(&'static str),
}

pub struct CatalogEntry {
    pub label: &'static str,
    pub source: QuerySource,
}

pub struct TaskGroup {
    pub name: &'static str,
    pub entries: Vec<CatalogEntry>,
}

/// Base tables exposed for raw browsing
pub const BASE_TABLES: &[&str] = &[
    "customers",
    "orders",
    "order_items",
    "order_payments",
    "order_reviews",
    "products",
    "sellers",
    "geolocation",
];

/// Precomputed views exposed for raw browsing
pub const VIEWS: &[&str] = &[
    "view_dashboard_kpis",
    "view_seller_geolocation",
    "view_high_order_customers",
    "view_total_orders_summary",
    "view_review_score_1_count",
    "view_total_reviews",
];

lazy_static! {
    static ref TASK_GROUPS: Vec<TaskGroup> = vec![
        TaskGroup {
            name: "Catalog Exploration",
            entries: vec![
                entry("Orders by status", QuerySource::File("orders_by_status.sql")),
                entry(
                    "Customers by state",
                    QuerySource::File("customers_by_state.sql"),
                ),
                entry(
                    "Top product categories",
                    QuerySource::File("top_product_categories.sql"),
                ),
                entry(
                    "Payment type breakdown",
                    QuerySource::File("payment_type_breakdown.sql"),
                ),
            ],
        },
        TaskGroup {
            name: "Operations & Analysis",
            entries: vec![
                entry("Monthly revenue", QuerySource::File("monthly_revenue.sql")),
                entry(
                    "Average delivery days by state",
                    QuerySource::File("average_delivery_days.sql"),
                ),
                entry(
                    "Top sellers by revenue",
                    QuerySource::File("top_sellers_by_revenue.sql"),
                ),
                entry(
                    "Review score distribution",
                    QuerySource::File("review_score_distribution.sql"),
                ),
                entry(
                    "High-order customers",
                    QuerySource::View("view_high_order_customers"),
                ),
            ],
        },
        TaskGroup {
            name: "Performance Views",
            entries: vec![
                entry("Dashboard KPIs", QuerySource::View("view_dashboard_kpis")),
                entry(
                    "Seller geolocation",
                    QuerySource::View("view_seller_geolocation"),
                ),
                entry(
                    "Total orders summary",
                    QuerySource::View("view_total_orders_summary"),
                ),
                entry(
                    "One-star review count",
                    QuerySource::View("view_review_score_1_count"),
                ),
                entry("Total reviews", QuerySource::View("view_total_reviews")),
            ],
        },
    ];
}

fn entry(label: &'static str, source: QuerySource) -> CatalogEntry {
    CatalogEntry { label, source }
}

pub fn task_groups() -> &'static [TaskGroup] {
    &TASK_GROUPS
}

/// Looks up a catalog entry by its display label
pub fn find_entry(label: &str) -> Option<&'static CatalogEntry> {
    TASK_GROUPS
        .iter()
        .flat_map(|group| group.entries.iter())
        .find(|entry| entry.label == label)
}

/// Reads a catalog SQL file from the queries directory
pub fn load_query(queries_dir: &str, file: &str) -> io::Result<String> {
    fs::read_to_string(Path::new(queries_dir).join(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn labels_are_unique() {
        let mut seen = HashSet::new();
        for group in task_groups() {
            for entry in &group.entries {
                assert!(seen.insert(entry.label), "duplicate label {}", entry.label);
            }
        }
    }

    #[test]
    fn find_entry_matches_exact_label() {
        let entry = find_entry("Orders by status").unwrap();
        assert_eq!(entry.source, QuerySource::File("orders_by_status.sql"));
        assert!(find_entry("no such query").is_none());
    }

    #[test]
    fn every_file_entry_exists_on_disk() {
        for group in task_groups() {
            for entry in &group.entries {
                if let QuerySource::File(file) = entry.source {
                    let sql = load_query("queries", file)
                        .unwrap_or_else(|e| panic!("missing {}: {}", file, e));
                    assert!(
                        sql.to_lowercase().contains("select"),
                        "{} is not a SELECT statement",
                        file
                    );
                }
            }
        }
    }

    #[test]
    fn view_entries_reference_known_views() {
        for group in task_groups() {
            for entry in &group.entries {
                if let QuerySource::View(view) = entry.source {
                    assert!(VIEWS.contains(&view), "unknown view {}", view);
                }
            }
        }
    }
}
