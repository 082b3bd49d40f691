/*!
# E-commerce Analytics Dashboard

A browser-based business-intelligence dashboard over an e-commerce
relational schema, built in Rust.

## Overview

The application lets a user browse and visualize analytics data stored in
a relational database: predefined catalog queries, raw table and view
browsing, and ad-hoc SQL execution, rendered as searchable tables,
downloadable CSV, and server-side charts.

## Architecture

Three thin layers behind a single web server:

### Presentation Layer
- **Technologies**: HTML, CSS, JavaScript, axum
- **Key Components**:
  - Overview page - KPI tiles from precomputed views
  - Table browser - Raw tables and views with search and CSV export
  - Query runner - Catalog queries grouped by task
  - SQL editor - Free-text query execution

### Query Catalog
- Static mapping from human-readable labels to either a SQL file under
  `queries/` or a precomputed database view

### Data-Access Layer
- **Gateway variant**: REST calls against a hosted front-end
  (`rest/v1/{table}`, `rest/v1/rpc/run_custom_query`) with API-key
  headers
- **Direct variant**: per-request scoped database connections over the
  simple-query protocol
- **Table cache**: time-boxed (60 s by default), keyed by table name,
  cleared as a whole by the refresh action

## Key Features

- Predefined analytics queries over orders, customers, payments, reviews
- Raw table browsing with case-insensitive substring search
- Ad-hoc SQL with success/error feedback
- Default bar-chart heuristic plus fixed per-view chart overrides
- CSV download of any displayed result

## Modules

- **table**: `RowSet` and its operations (search, CSV, numeric detection)
- **config**: environment-sourced configuration struct
- **db**: gateway and direct-connection adapters, typed fetch errors
- **cache**: time-boxed table cache
- **catalog**: task groups, query files, table/view lists
- **chart**: chart heuristic, per-view overrides, PNG rendering
- **app**: routing and handlers

## REST API Endpoints

- `/api/catalog` - Task groups and browsable tables/views
- `/api/overview` - KPI and summary sections
- `/api/table/{name}` - Fetch a table or view (cached)
- `/api/query/{label}` - Run a catalog entry
- `/api/sql` - Execute ad-hoc SQL
- `/api/chart/...`, `/api/export/...` - PNG charts and CSV downloads
- `/api/refresh` - Clear the table cache
*/

// Re-export all modules so they appear in the documentation
pub mod app;
pub mod cache;
pub mod catalog;
pub mod chart;
pub mod config;
pub mod db;
pub mod table;

/// Re-export the most used types to make them easier to use
pub use cache::TableCache;
pub use config::DashboardConfig;
pub use db::{DataSources, FetchError, SqlOutput};
pub use table::RowSet;
