use std::time::{Duration, Instant};

use ecomdash::cache::TableCache;
use ecomdash::table::RowSet;
use serde_json::json;

fn orders_snapshot(status: &str) -> RowSet {
    RowSet::from_records(&[json!({"order_id": "1", "status": status})])
}

fn first_status(rows: &RowSet) -> String {
    rows.rows[0][1].as_str().unwrap_or_default().to_string()
}

// The cache takes the current instant as an argument, so these tests
// drive the clock by hand instead of sleeping.
fn test_hit_within_ttl() {
    println!("\n====== Testing cache hits inside the TTL ======");
    let mut cache = TableCache::new(Duration::from_secs(60));
    let t0 = Instant::now();

    cache.insert("orders", orders_snapshot("shipped"), t0);

    let at_30s = cache.get("orders", t0 + Duration::from_secs(30)).unwrap();
    assert_eq!(first_status(&at_30s), "shipped");
    println!("✓ Fetch at +30s returns the stored copy");

    // The underlying table may have changed; the cached copy wins until
    // the entry expires or the cache is cleared.
    let again = cache.get("orders", t0 + Duration::from_secs(59)).unwrap();
    assert_eq!(first_status(&again), "shipped");
    println!("✓ Second fetch inside the window returns identical data");

    let at_exact_ttl = cache.get("orders", t0 + Duration::from_secs(60));
    assert!(at_exact_ttl.is_some());
    println!("✓ Entry is still valid exactly at the TTL boundary");
}

fn test_expiry() {
    println!("\n====== Testing expiry ======");
    let mut cache = TableCache::new(Duration::from_secs(60));
    let t0 = Instant::now();

    cache.insert("orders", orders_snapshot("shipped"), t0);
    assert!(cache.get("orders", t0 + Duration::from_secs(61)).is_none());
    println!("✓ Entry expires after the TTL");

    // A refetch replaces the stale entry and restarts the clock
    cache.insert("orders", orders_snapshot("delivered"), t0 + Duration::from_secs(61));
    let fresh = cache.get("orders", t0 + Duration::from_secs(62)).unwrap();
    assert_eq!(first_status(&fresh), "delivered");
    println!("✓ Refetch after expiry reflects current data");
}

fn test_refresh_clears_everything() {
    println!("\n====== Testing the refresh action ======");
    let mut cache = TableCache::new(Duration::from_secs(60));
    let t0 = Instant::now();

    cache.insert("orders", orders_snapshot("shipped"), t0);
    cache.insert("sellers", orders_snapshot("unused"), t0);
    assert_eq!(cache.len(), 2);

    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.get("orders", t0 + Duration::from_secs(1)).is_none());
    assert!(cache.get("sellers", t0 + Duration::from_secs(1)).is_none());
    println!("✓ Refresh drops every entry at once");

    cache.insert("orders", orders_snapshot("delivered"), t0 + Duration::from_secs(2));
    let fresh = cache.get("orders", t0 + Duration::from_secs(3)).unwrap();
    assert_eq!(first_status(&fresh), "delivered");
    println!("✓ Next fetch after refresh sees the new data");
}

fn test_keys_are_independent() {
    println!("\n====== Testing per-table keys ======");
    let mut cache = TableCache::new(Duration::from_secs(60));
    let t0 = Instant::now();

    cache.insert("orders", orders_snapshot("shipped"), t0);
    assert!(cache.get("order_items", t0 + Duration::from_secs(1)).is_none());
    println!("✓ A miss on one table does not touch another");
}

fn main() {
    test_hit_within_ttl();
    test_expiry();
    test_refresh_clears_everything();
    test_keys_are_independent();
    println!("\nAll cache tests passed!");
}
