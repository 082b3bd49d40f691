use serde::Serialize;
use serde_json::Value;

/// Tabular query result: named columns and loosely typed rows
///
/// Every data source in the application produces a `RowSet`. The REST
/// gateway returns JSON records, so cells keep their JSON types; the
/// direct database connection uses the simple-query protocol, so its
/// cells arrive as strings. Display, search, CSV export and charting all
/// work on this one structure.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RowSet {
    /// Column names, in display order
    pub columns: Vec<String>,

    /// Row values, one `Vec` per row, aligned with `columns`
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        RowSet {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a row set from a JSON array of row objects
    ///
    /// Column order is taken from the first record; later records may
    /// list keys in any order and may omit keys (missing cells become
    /// null). An empty array yields an empty row set, not an error.
    pub fn from_records(records: &[Value]) -> Self {
        let columns: Vec<String> = match records.first().and_then(Value::as_object) {
            Some(first) => first.keys().cloned().collect(),
            None => return RowSet::default(),
        };

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let object = match record.as_object() {
                Some(object) => object,
                None => continue,
            };
            rows.push(
                columns
                    .iter()
                    .map(|column| object.get(column).cloned().unwrap_or(Value::Null))
                    .collect(),
            );
        }

        RowSet { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Index of a column by name, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// True if the column's first non-null cell holds a numeric value
    ///
    /// Direct-connection results arrive as text, so numeric strings count
    /// as numeric here.
    pub fn is_numeric_column(&self, index: usize) -> bool {
        self.rows
            .iter()
            .filter_map(|row| row.get(index))
            .find(|cell| !cell.is_null())
            .is_some_and(|cell| numeric_value(cell).is_some())
    }

    /// First numeric column at or after `start`, used to pick a chart y-axis
    pub fn first_numeric_column(&self, start: usize) -> Option<usize> {
        (start..self.columns.len()).find(|&index| self.is_numeric_column(index))
    }

    /// Keeps only the rows where some cell contains `needle`
    ///
    /// The match is a case-insensitive substring test across every column.
    /// An empty needle keeps everything.
    pub fn filter_contains(&self, needle: &str) -> RowSet {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }

        let rows = self
            .rows
            .iter()
            .filter(|row| {
                row.iter()
                    .any(|cell| cell_text(cell).to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();

        RowSet {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Renders the row set as CSV
    ///
    /// The header row holds the column names. Values containing commas,
    /// quotes or newlines are quoted, with embedded quotes doubled.
    pub fn to_csv(&self) -> String {
        let mut csv_content = String::new();

        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                csv_content.push(',');
            }
            csv_content.push_str(&escape_csv(column));
        }
        csv_content.push('\n');

        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    csv_content.push(',');
                }
                csv_content.push_str(&escape_csv(&cell_text(cell)));
            }
            csv_content.push('\n');
        }

        csv_content
    }
}

/// Display text for a cell; null renders as an empty string
pub fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Numeric reading of a cell: JSON numbers, or strings that parse as f64
pub fn numeric_value(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        let escaped = value.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        value.to_string()
    }
}
