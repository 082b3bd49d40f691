use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::cache::TableCache;
use crate::catalog::{self, CatalogEntry, QuerySource};
use crate::chart;
use crate::config::DashboardConfig;
use crate::db::{DataSources, FetchError, SqlOutput};
use crate::table::RowSet;

pub struct AppState {
    config: DashboardConfig,
    sources: DataSources,
    cache: Mutex<TableCache>,
}

#[derive(Deserialize)]
struct BrowseQuery {
    search: Option<String>,
    select: Option<String>,
}

#[derive(Deserialize)]
struct SqlRequest {
    query: String,
}

#[derive(Serialize)]
struct MessageResponse {
    status: &'static str,
    message: String,
}

/// Uniform payload for every tabular endpoint
///
/// `status` is "ok" or "error"; an empty result is "ok" with an
/// informational message, and a failed fetch carries its error kind so
/// the UI can style it.
#[derive(Serialize)]
struct TableResponse {
    status: &'static str,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    row_count: usize,
    cached: bool,
    message: Option<String>,
    error_kind: Option<&'static str>,
    chart_url: Option<String>,
    chart_note: Option<String>,
}

impl TableResponse {
    fn message_only(message: String) -> Self {
        TableResponse {
            status: "ok",
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            cached: false,
            message: Some(message),
            error_kind: None,
            chart_url: None,
            chart_note: None,
        }
    }

    fn from_error(error: FetchError) -> Self {
        error!("fetch failed: {}", error);
        TableResponse {
            status: "error",
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            cached: false,
            message: Some(error.to_string()),
            error_kind: Some(error.kind()),
            chart_url: None,
            chart_note: None,
        }
    }

    fn from_rows(
        rows: RowSet,
        cached: bool,
        search: Option<&str>,
        chart: Option<Result<String, String>>,
    ) -> Self {
        let total = rows.len();
        let displayed = match search {
            Some(needle) => rows.filter_contains(needle),
            None => rows,
        };
        let message = if total == 0 {
            Some("query returned no rows".to_string())
        } else if displayed.len() < total {
            Some(format!("showing {} of {} rows", displayed.len(), total))
        } else {
            None
        };
        let (chart_url, chart_note) = match chart {
            Some(Ok(url)) => (Some(url), None),
            Some(Err(note)) => (None, Some(note)),
            None => (None, None),
        };
        let row_count = displayed.rows.len();
        TableResponse {
            status: "ok",
            columns: displayed.columns,
            rows: displayed.rows,
            row_count,
            cached,
            message,
            error_kind: None,
            chart_url,
            chart_note,
        }
    }
}

pub async fn run(config: DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sources = DataSources::from_config(&config)?;
    info!("data sources: {}", sources.describe());

    let cache = Mutex::new(TableCache::new(config.cache_ttl));
    let addr = config.addr.clone();
    let app_state = Arc::new(AppState {
        config,
        sources,
        cache,
    });

    // Build router
    let app = Router::new()
        .route("/", get(serve_dashboard))
        .route("/api/catalog", get(api_catalog))
        .route("/api/overview", get(api_overview))
        .route("/api/table/:name", get(api_table))
        .route("/api/query/:label", get(api_query))
        .route("/api/sql", post(api_sql))
        .route("/api/refresh", post(api_refresh))
        .route("/api/chart/table/:name", get(api_chart_table))
        .route("/api/chart/query/:label", get(api_chart_query))
        .route("/api/export/table/:name", get(api_export_table))
        .route("/api/export/query/:label", get(api_export_query))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(app_state);

    // Start server
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(include_str!("./static/dashboard.html"))
}

#[derive(Serialize)]
struct CatalogEntryInfo {
    label: &'static str,
    kind: &'static str,
    target: &'static str,
}

#[derive(Serialize)]
struct CatalogGroup {
    name: &'static str,
    entries: Vec<CatalogEntryInfo>,
}

#[derive(Serialize)]
struct CatalogResponse {
    groups: Vec<CatalogGroup>,
    tables: Vec<&'static str>,
    views: Vec<&'static str>,
}

async fn api_catalog() -> Json<CatalogResponse> {
    let groups = catalog::task_groups()
        .iter()
        .map(|group| CatalogGroup {
            name: group.name,
            entries: group
                .entries
                .iter()
                .map(|entry| match entry.source {
                    QuerySource::File(file) => CatalogEntryInfo {
                        label: entry.label,
                        kind: "file",
                        target: file,
                    },
                    QuerySource::View(view) => CatalogEntryInfo {
                        label: entry.label,
                        kind: "view",
                        target: view,
                    },
                })
                .collect(),
        })
        .collect();

    Json(CatalogResponse {
        groups,
        tables: catalog::BASE_TABLES.to_vec(),
        views: catalog::VIEWS.to_vec(),
    })
}

/// Fetches a table through the cache; only the default projection is
/// cached so a custom `select` never poisons the shared copy
async fn fetch_table_cached(
    state: &AppState,
    table: &str,
    select: &str,
) -> (Result<RowSet, FetchError>, bool) {
    if select == "*" {
        let hit = state.cache.lock().unwrap().get(table, Instant::now());
        if let Some(rows) = hit {
            return (Ok(rows), true);
        }
    }

    match state.sources.fetch_table(table, select, &[]).await {
        Ok(rows) => {
            if select == "*" {
                state
                    .cache
                    .lock()
                    .unwrap()
                    .insert(table, rows.clone(), Instant::now());
            }
            (Ok(rows), false)
        }
        Err(error) => (Err(error), false),
    }
}

async fn run_catalog_entry(
    state: &AppState,
    entry: &CatalogEntry,
) -> (Result<RowSet, FetchError>, bool) {
    match entry.source {
        QuerySource::View(view) => fetch_table_cached(state, view, "*").await,
        QuerySource::File(file) => {
            let sql = match catalog::load_query(&state.config.queries_dir, file) {
                Ok(sql) => sql,
                Err(source) => {
                    return (
                        Err(FetchError::QueryFile {
                            name: file.to_string(),
                            source,
                        }),
                        false,
                    );
                }
            };
            let result = match state.sources.run_sql(&sql).await {
                Ok(SqlOutput::Rows(rows)) => Ok(rows),
                Ok(SqlOutput::Message(_)) => Ok(RowSet::default()),
                Err(error) => Err(error),
            };
            (result, false)
        }
    }
}

async fn api_table(
    Path(name): Path<String>,
    Query(params): Query<BrowseQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<TableResponse> {
    let select = params.select.as_deref().unwrap_or("*");
    let (result, cached) = fetch_table_cached(&state, &name, select).await;
    Json(match result {
        Ok(rows) => {
            let chart = match chart::plan_table_chart(&name, &rows) {
                Ok(_) => Ok(format!("/api/chart/table/{}", name)),
                Err(note) => Err(note),
            };
            TableResponse::from_rows(rows, cached, params.search.as_deref(), Some(chart))
        }
        Err(error) => TableResponse::from_error(error),
    })
}

async fn api_query(
    Path(label): Path<String>,
    Query(params): Query<BrowseQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<TableResponse> {
    let Some(entry) = catalog::find_entry(&label) else {
        return Json(TableResponse {
            status: "error",
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            cached: false,
            message: Some(format!("unknown query: {}", label)),
            error_kind: Some("unknown-query"),
            chart_url: None,
            chart_note: None,
        });
    };

    let (result, cached) = run_catalog_entry(&state, entry).await;
    Json(match result {
        Ok(rows) => {
            let plan = match entry.source {
                QuerySource::View(view) => chart::plan_table_chart(view, &rows),
                QuerySource::File(_) => chart::plan_default_chart(entry.label, &rows),
            };
            let chart = match plan {
                Ok(_) => Ok(format!("/api/chart/query/{}", label)),
                Err(note) => Err(note),
            };
            TableResponse::from_rows(rows, cached, params.search.as_deref(), Some(chart))
        }
        Err(error) => TableResponse::from_error(error),
    })
}

async fn api_sql(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SqlRequest>,
) -> Json<TableResponse> {
    Json(match state.sources.run_sql(&request.query).await {
        Ok(SqlOutput::Rows(rows)) => {
            let mut response = TableResponse::from_rows(rows, false, None, None);
            if response.message.is_none() {
                response.message = Some("query executed successfully".to_string());
            }
            response
        }
        Ok(SqlOutput::Message(message)) => TableResponse::message_only(message),
        Err(error) => TableResponse::from_error(error),
    })
}

async fn api_refresh(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    let cleared = {
        let mut cache = state.cache.lock().unwrap();
        let count = cache.len();
        cache.clear();
        count
    };
    info!("cache refresh requested; {} entries dropped", cleared);
    Json(MessageResponse {
        status: "ok",
        message: format!("cache cleared ({} entries dropped)", cleared),
    })
}

async fn api_chart_table(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let (result, _) = fetch_table_cached(&state, &name, "*").await;
    let rows = match result {
        Ok(rows) => rows,
        Err(error) => return chart_failure(StatusCode::BAD_GATEWAY, error.to_string()),
    };
    let plan = match chart::plan_table_chart(&name, &rows) {
        Ok(plan) => plan,
        Err(note) => return chart_failure(StatusCode::UNPROCESSABLE_ENTITY, note),
    };
    render_chart_response(&rows, &plan)
}

async fn api_chart_query(
    Path(label): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(entry) = catalog::find_entry(&label) else {
        return chart_failure(StatusCode::NOT_FOUND, format!("unknown query: {}", label));
    };
    let (result, _) = run_catalog_entry(&state, entry).await;
    let rows = match result {
        Ok(rows) => rows,
        Err(error) => return chart_failure(StatusCode::BAD_GATEWAY, error.to_string()),
    };
    let plan = match entry.source {
        QuerySource::View(view) => chart::plan_table_chart(view, &rows),
        QuerySource::File(_) => chart::plan_default_chart(entry.label, &rows),
    };
    let plan = match plan {
        Ok(plan) => plan,
        Err(note) => return chart_failure(StatusCode::UNPROCESSABLE_ENTITY, note),
    };
    render_chart_response(&rows, &plan)
}

fn render_chart_response(rows: &RowSet, plan: &chart::ChartPlan) -> Response {
    match chart::render_chart(rows, plan) {
        Ok(png_data) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from(png_data))
            .unwrap(),
        Err(error) => {
            error!("chart rendering failed: {}", error);
            chart_failure(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}

fn chart_failure(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(MessageResponse {
            status: "error",
            message,
        }),
    )
        .into_response()
}

async fn api_export_table(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let (result, _) = fetch_table_cached(&state, &name, "*").await;
    csv_response(&name, result)
}

async fn api_export_query(
    Path(label): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(entry) = catalog::find_entry(&label) else {
        return chart_failure(StatusCode::NOT_FOUND, format!("unknown query: {}", label));
    };
    let (result, _) = run_catalog_entry(&state, entry).await;
    csv_response(&label, result)
}

fn csv_response(name: &str, result: Result<RowSet, FetchError>) -> Response {
    match result {
        Ok(rows) => {
            let filename = format!(
                "{}_{}.csv",
                sanitize_filename(name),
                Utc::now().format("%Y%m%d")
            );
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                )
                .body(Body::from(rows.to_csv()))
                .unwrap()
        }
        Err(error) => {
            error!("export failed: {}", error);
            chart_failure(StatusCode::BAD_GATEWAY, error.to_string())
        }
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

// Views shown on the overview page; each section renders (or fails)
// independently of the others.
const OVERVIEW_VIEWS: &[(&str, &str)] = &[
    ("KPIs", "view_dashboard_kpis"),
    ("Total orders", "view_total_orders_summary"),
    ("Total reviews", "view_total_reviews"),
    ("One-star reviews", "view_review_score_1_count"),
];

#[derive(Serialize)]
struct OverviewSection {
    title: &'static str,
    view: &'static str,
    status: &'static str,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    message: Option<String>,
    error_kind: Option<&'static str>,
}

async fn api_overview(State(state): State<Arc<AppState>>) -> Json<Vec<OverviewSection>> {
    let mut sections = Vec::new();
    for &(title, view) in OVERVIEW_VIEWS {
        let (result, _) = fetch_table_cached(&state, view, "*").await;
        sections.push(match result {
            Ok(rows) => OverviewSection {
                title,
                view,
                status: "ok",
                message: if rows.is_empty() {
                    Some("view returned no rows".to_string())
                } else {
                    None
                },
                columns: rows.columns,
                rows: rows.rows,
                error_kind: None,
            },
            Err(error) => {
                error!("overview section {} failed: {}", view, error);
                OverviewSection {
                    title,
                    view,
                    status: "error",
                    columns: Vec::new(),
                    rows: Vec::new(),
                    message: Some(error.to_string()),
                    error_kind: Some(error.kind()),
                }
            }
        });
    }
    Json(sections)
}
