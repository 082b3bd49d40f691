use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::debug;

use crate::table::RowSet;

struct CachedTable {
    stored_at: Instant,
    rows: RowSet,
}

/// Time-boxed cache of table fetches, keyed by table name
///
/// Entries expire after a fixed TTL; there is no per-key invalidation and
/// no size bound. `clear` empties the whole cache at once (the UI refresh
/// action). Lookups take the current instant as an argument so expiry is
/// deterministic under test.
pub struct TableCache {
    ttl: Duration,
    entries: HashMap<String, CachedTable>,
}

impl TableCache {
    pub fn new(ttl: Duration) -> Self {
        TableCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached copy for `table` if it was stored within the TTL
    pub fn get(&self, table: &str, now: Instant) -> Option<RowSet> {
        let entry = self.entries.get(table)?;
        if now.duration_since(entry.stored_at) <= self.ttl {
            debug!("cache hit for {} ({} rows)", table, entry.rows.len());
            Some(entry.rows.clone())
        } else {
            debug!("cache entry for {} expired", table);
            None
        }
    }

    /// Stores a fresh copy for `table`, replacing any previous entry
    pub fn insert(&mut self, table: &str, rows: RowSet, now: Instant) {
        self.entries.insert(
            table.to_string(),
            CachedTable {
                stored_at: now,
                rows,
            },
        );
    }

    /// Drops every entry; the next fetch of any table re-reads the source
    pub fn clear(&mut self) {
        debug!("clearing {} cached table(s)", self.entries.len());
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
