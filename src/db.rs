use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use serde_json::{Value, json};
use thiserror::Error;
use tokio_postgres::{NoTls, SimpleQueryMessage};

use crate::config::DashboardConfig;
use crate::table::RowSet;

lazy_static! {
    static ref IDENT_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref TRAILING_SEPARATOR: Regex = Regex::new(r";\s*$").unwrap();
}

/// Failure kinds surfaced by the data-access layer
///
/// The presentation layer decides how to render each kind; nothing here
/// is retried or escalated.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status} for {what}: {body}")]
    Gateway {
        what: String,
        status: u16,
        body: String,
    },

    #[error("unexpected gateway payload: {0}")]
    Payload(String),

    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("no data source configured for {0}")]
    NotConfigured(&'static str),

    #[error("invalid table or column name: {0}")]
    InvalidIdentifier(String),

    #[error("empty SQL statement")]
    EmptyStatement,

    #[error("failed to read query file {name}: {source}")]
    QueryFile {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Coarse category used by the UI to pick error/warning/info styling
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Http(_) => "connectivity",
            FetchError::Gateway { .. } | FetchError::Payload(_) => "gateway",
            FetchError::Database(_) | FetchError::InvalidIdentifier(_) => "query",
            FetchError::NotConfigured(_) | FetchError::QueryFile { .. } => "configuration",
            FetchError::EmptyStatement => "empty-statement",
        }
    }
}

/// Result of running raw SQL: a table, or an acknowledgement message
#[derive(Debug, Clone)]
pub enum SqlOutput {
    Rows(RowSet),
    Message(String),
}

/// Client for the hosted REST gateway in front of the database
pub struct Gateway {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl Gateway {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ecomdash/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Gateway {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    /// Fetches a table or view as `GET {base}/rest/v1/{table}`
    ///
    /// `select` is the column projection (`*` by default); `filters` are
    /// passed through as extra query parameters. Any non-200 response is
    /// total failure; a 200 with an empty array is an empty row set.
    pub async fn fetch_table(
        &self,
        table: &str,
        select: &str,
        filters: &[(String, String)],
    ) -> Result<RowSet, FetchError> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let mut request = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .query(&[("select", select)]);
        for (key, value) in filters {
            request = request.query(&[(key.as_str(), value.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("gateway GET {} -> {} ({} bytes)", table, status, body.len());
        decode_rows(table, status, &body)
    }

    /// Runs raw SQL through the gateway's `run_custom_query` procedure
    ///
    /// The response is either a JSON array of row objects or a single
    /// object carrying a `message` field.
    pub async fn run_custom_query(&self, sql: &str) -> Result<SqlOutput, FetchError> {
        let url = format!("{}/rest/v1/rpc/run_custom_query", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({ "query_text": sql }))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("gateway rpc -> {} ({} bytes)", status, body.len());
        decode_rpc(status, &body)
    }
}

/// Direct database access from a connection string
///
/// Each statement runs on its own scoped connection: connect, execute,
/// drop. The simple-query protocol is used so every value arrives as
/// text regardless of column type, which covers arbitrary user SQL.
pub struct DirectDb {
    database_url: String,
}

impl DirectDb {
    pub fn new(database_url: impl Into<String>) -> Self {
        DirectDb {
            database_url: database_url.into(),
        }
    }

    pub async fn run_sql(&self, sql: &str) -> Result<SqlOutput, FetchError> {
        let (client, connection) = tokio_postgres::connect(&self.database_url, NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!("connection closed: {}", e);
            }
        });

        let messages = client.simple_query(sql).await?;
        Ok(collect_simple_query(messages))
    }

    /// `SELECT {select} FROM {table}` with identifier validation
    pub async fn fetch_table(&self, table: &str, select: &str) -> Result<RowSet, FetchError> {
        if !IDENT_REGEX.is_match(table) {
            return Err(FetchError::InvalidIdentifier(table.to_string()));
        }
        let projection = if select == "*" {
            "*".to_string()
        } else {
            let columns: Vec<&str> = select.split(',').map(str::trim).collect();
            for column in &columns {
                if !IDENT_REGEX.is_match(column) {
                    return Err(FetchError::InvalidIdentifier((*column).to_string()));
                }
            }
            columns.join(", ")
        };

        match self
            .run_sql(&format!("SELECT {} FROM {}", projection, table))
            .await?
        {
            SqlOutput::Rows(rows) => Ok(rows),
            SqlOutput::Message(_) => Ok(RowSet::default()),
        }
    }
}

/// The configured data sources and the rules for picking between them
///
/// Table fetches prefer the gateway; raw SQL prefers the direct
/// connection. Either source alone is enough to run the dashboard.
pub struct DataSources {
    gateway: Option<Gateway>,
    direct: Option<DirectDb>,
}

impl DataSources {
    pub fn from_config(config: &DashboardConfig) -> Result<Self, FetchError> {
        let gateway = match (&config.supabase_url, &config.supabase_api_key) {
            (Some(url), Some(key)) => Some(Gateway::new(url.clone(), key.clone())?),
            _ => None,
        };
        let direct = config.database_url.clone().map(DirectDb::new);

        if gateway.is_none() && direct.is_none() {
            return Err(FetchError::NotConfigured("any operation"));
        }
        if direct.is_some() {
            // Analyst SQL runs against a live credentialed connection;
            // the trust assumption is surfaced here, not hidden.
            warn!(
                "ad-hoc SQL executes unsanitized against DATABASE_URL; \
                 expose this dashboard to trusted users only"
            );
        }

        Ok(DataSources { gateway, direct })
    }

    /// Short description of the configured sources for the startup log
    pub fn describe(&self) -> &'static str {
        match (&self.gateway, &self.direct) {
            (Some(_), Some(_)) => "gateway + direct connection",
            (Some(_), None) => "gateway only",
            (None, Some(_)) => "direct connection only",
            (None, None) => "none",
        }
    }

    pub async fn fetch_table(
        &self,
        table: &str,
        select: &str,
        filters: &[(String, String)],
    ) -> Result<RowSet, FetchError> {
        if let Some(gateway) = &self.gateway {
            return gateway.fetch_table(table, select, filters).await;
        }
        if let Some(direct) = &self.direct {
            return direct.fetch_table(table, select).await;
        }
        Err(FetchError::NotConfigured("table browsing"))
    }

    pub async fn run_sql(&self, sql: &str) -> Result<SqlOutput, FetchError> {
        let sql = prepare_sql(sql)?;
        if let Some(direct) = &self.direct {
            return direct.run_sql(&sql).await;
        }
        if let Some(gateway) = &self.gateway {
            return gateway.run_custom_query(&sql).await;
        }
        Err(FetchError::NotConfigured("SQL execution"))
    }
}

/// Strips a trailing statement separator and rejects empty statements
pub fn prepare_sql(sql: &str) -> Result<String, FetchError> {
    let trimmed = TRAILING_SEPARATOR.replace(sql.trim(), "");
    if trimmed.trim().is_empty() {
        return Err(FetchError::EmptyStatement);
    }
    Ok(trimmed.into_owned())
}

fn decode_rows(what: &str, status: u16, body: &str) -> Result<RowSet, FetchError> {
    if status != 200 {
        return Err(FetchError::Gateway {
            what: what.to_string(),
            status,
            body: body.chars().take(200).collect(),
        });
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Payload(e.to_string()))?;
    match value.as_array() {
        Some(records) => Ok(RowSet::from_records(records)),
        None => Err(FetchError::Payload(
            "expected a JSON array of rows".to_string(),
        )),
    }
}

fn decode_rpc(status: u16, body: &str) -> Result<SqlOutput, FetchError> {
    if status != 200 {
        return Err(FetchError::Gateway {
            what: "run_custom_query".to_string(),
            status,
            body: body.chars().take(200).collect(),
        });
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Payload(e.to_string()))?;
    match &value {
        Value::Array(records) => Ok(SqlOutput::Rows(RowSet::from_records(records))),
        Value::Object(object) => match object.get("message").and_then(Value::as_str) {
            Some(message) => Ok(SqlOutput::Message(message.to_string())),
            None => Err(FetchError::Payload(
                "expected a row array or a message object".to_string(),
            )),
        },
        _ => Err(FetchError::Payload(
            "expected a row array or a message object".to_string(),
        )),
    }
}

fn collect_simple_query(messages: Vec<SimpleQueryMessage>) -> SqlOutput {
    let mut rows = RowSet::default();
    let mut produced_rows = false;
    let mut affected: u64 = 0;

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                rows.columns = columns.iter().map(|c| c.name().to_string()).collect();
                produced_rows = true;
            }
            SimpleQueryMessage::Row(row) => {
                if rows.columns.is_empty() {
                    rows.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                }
                produced_rows = true;
                rows.rows.push(
                    (0..row.len())
                        .map(|i| match row.get(i) {
                            Some(text) => Value::String(text.to_string()),
                            None => Value::Null,
                        })
                        .collect(),
                );
            }
            SimpleQueryMessage::CommandComplete(count) => affected += count,
            _ => {}
        }
    }

    if produced_rows {
        SqlOutput::Rows(rows)
    } else {
        SqlOutput::Message(format!("statement executed, {} row(s) affected", affected))
    }
}
