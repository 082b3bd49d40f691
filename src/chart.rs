use plotters::prelude::*;

use crate::table::{RowSet, cell_text, numeric_value};

/// Row sets larger than this are never charted; rendering tens of
/// thousands of bars helps nobody and stalls the page.
pub const MAX_CHART_ROWS: usize = 20_000;

const MAX_LABEL_CHARS: usize = 14;

/// Available chart types
///
/// The dashboard defaults to bar charts; line and scatter are used by
/// per-view overrides (time series and geolocation).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphType {
    /// Line chart - Shows a trend across ordered categories
    Line,

    /// Bar chart - Compares values across categories with vertical bars
    Bar,

    /// Scatter plot - Shows the relationship between two numeric columns
    Scatter,
}

/// Configuration options for chart rendering
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,

    /// Type of chart to render
    pub graph_type: GraphType,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Chart".to_string(),
            x_label: "X".to_string(),
            y_label: "Y".to_string(),
            width: 800,
            height: 450,
            graph_type: GraphType::Bar,
        }
    }
}

/// Outcome of the default chart heuristic
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChartDecision {
    /// Chart the column at index `x` against the numeric column at `y`
    Plot { x: usize, y: usize },
    NotEnoughColumns,
    NoNumericColumn,
    TooManyRows(usize),
}

impl ChartDecision {
    /// Informational message shown in place of a skipped chart
    pub fn skip_reason(&self) -> Option<String> {
        match self {
            ChartDecision::Plot { .. } => None,
            ChartDecision::NotEnoughColumns => {
                Some("not enough columns to create a chart".to_string())
            }
            ChartDecision::NoNumericColumn => {
                Some("no suitable numeric column found for charting".to_string())
            }
            ChartDecision::TooManyRows(count) => Some(format!(
                "dataset too large ({} rows); chart skipped",
                count
            )),
        }
    }
}

/// Default chart selection: first column on the x-axis, first numeric
/// column after it on the y-axis
pub fn suggest_chart(rows: &RowSet) -> ChartDecision {
    if rows.column_count() < 2 {
        return ChartDecision::NotEnoughColumns;
    }
    if rows.len() > MAX_CHART_ROWS {
        return ChartDecision::TooManyRows(rows.len());
    }
    match rows.first_numeric_column(1) {
        Some(y) => ChartDecision::Plot { x: 0, y },
        None => ChartDecision::NoNumericColumn,
    }
}

/// How a named view should be charted, when the default heuristic is not
/// the right answer
pub enum ViewChartPolicy {
    /// Use `suggest_chart`
    Heuristic,

    /// Never chart this view
    Skip(&'static str),

    /// Fixed chart type and column choice for this view
    Fixed {
        graph_type: GraphType,
        x_column: Option<&'static str>,
        y_column: Option<&'static str>,
        title: &'static str,
    },
}

pub fn view_chart_policy(view: &str) -> ViewChartPolicy {
    match view {
        "view_seller_geolocation" => ViewChartPolicy::Fixed {
            graph_type: GraphType::Scatter,
            x_column: Some("geolocation_lng"),
            y_column: Some("geolocation_lat"),
            title: "Seller locations",
        },
        "view_total_orders_summary" => ViewChartPolicy::Fixed {
            graph_type: GraphType::Bar,
            x_column: None,
            y_column: None,
            title: "Total orders summary",
        },
        "view_high_order_customers" => ViewChartPolicy::Fixed {
            graph_type: GraphType::Bar,
            x_column: None,
            y_column: None,
            title: "High-order customers",
        },
        "view_dashboard_kpis" => {
            ViewChartPolicy::Skip("single-row KPI view; shown as tiles instead")
        }
        "view_review_score_1_count" | "view_total_reviews" => {
            ViewChartPolicy::Skip("single-figure view; nothing to chart")
        }
        _ => ViewChartPolicy::Heuristic,
    }
}

/// A fully resolved chart: column indices plus rendering options
#[derive(Clone, Debug)]
pub struct ChartPlan {
    pub x: usize,
    pub y: usize,
    pub options: ChartOptions,
}

/// Plans a chart using the default heuristic only
pub fn plan_default_chart(title: &str, rows: &RowSet) -> Result<ChartPlan, String> {
    match suggest_chart(rows) {
        ChartDecision::Plot { x, y } => Ok(ChartPlan {
            x,
            y,
            options: ChartOptions {
                title: title.to_string(),
                x_label: rows.columns[x].clone(),
                y_label: rows.columns[y].clone(),
                ..ChartOptions::default()
            },
        }),
        decision => Err(decision.skip_reason().unwrap_or_default()),
    }
}

/// Plans a chart for a named table or view, honoring per-view overrides
///
/// Overrides still respect the row cap, and fall back to heuristic
/// column picks when a named column is missing from the result.
pub fn plan_table_chart(name: &str, rows: &RowSet) -> Result<ChartPlan, String> {
    match view_chart_policy(name) {
        ViewChartPolicy::Skip(reason) => Err(reason.to_string()),
        ViewChartPolicy::Heuristic => plan_default_chart(name, rows),
        ViewChartPolicy::Fixed {
            graph_type,
            x_column,
            y_column,
            title,
        } => {
            if rows.column_count() < 2 {
                return Err(ChartDecision::NotEnoughColumns
                    .skip_reason()
                    .unwrap_or_default());
            }
            if rows.len() > MAX_CHART_ROWS {
                return Err(ChartDecision::TooManyRows(rows.len())
                    .skip_reason()
                    .unwrap_or_default());
            }
            let x = x_column.and_then(|c| rows.column_index(c)).unwrap_or(0);
            let y = y_column
                .and_then(|c| rows.column_index(c))
                .or_else(|| rows.first_numeric_column(x + 1))
                .ok_or_else(|| {
                    ChartDecision::NoNumericColumn
                        .skip_reason()
                        .unwrap_or_default()
                })?;
            Ok(ChartPlan {
                x,
                y,
                options: ChartOptions {
                    title: title.to_string(),
                    x_label: rows.columns[x].clone(),
                    y_label: rows.columns[y].clone(),
                    graph_type,
                    ..ChartOptions::default()
                },
            })
        }
    }
}

/// Renders a planned chart to PNG bytes
///
/// Rows whose y-cell (or both cells, for scatter) fail to parse as
/// numbers are dropped before drawing; a chart with nothing left to draw
/// is an error the caller shows inline.
pub fn render_chart(rows: &RowSet, plan: &ChartPlan) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    match plan.options.graph_type {
        GraphType::Bar => create_bar_chart(&labelled_points(rows, plan)?, &plan.options),
        GraphType::Line => create_line_chart(&labelled_points(rows, plan)?, &plan.options),
        GraphType::Scatter => {
            let points: Vec<(f64, f64)> = rows
                .rows
                .iter()
                .filter_map(|row| {
                    let x = numeric_value(row.get(plan.x)?)?;
                    let y = numeric_value(row.get(plan.y)?)?;
                    Some((x, y))
                })
                .collect();
            if points.is_empty() {
                return Err("no plottable values in the selected columns".into());
            }
            create_scatter_chart(&points, &plan.options)
        }
    }
}

fn labelled_points(
    rows: &RowSet,
    plan: &ChartPlan,
) -> Result<Vec<(String, f64)>, Box<dyn std::error::Error>> {
    let points: Vec<(String, f64)> = rows
        .rows
        .iter()
        .filter_map(|row| {
            let label = cell_text(row.get(plan.x)?);
            let y = numeric_value(row.get(plan.y)?)?;
            Some((label, y))
        })
        .collect();
    if points.is_empty() {
        return Err("no plottable values in the selected columns".into());
    }
    Ok(points)
}

/// Creates a bar chart from labelled data points
///
/// Bars are drawn on an index axis with the category labels rendered as
/// tick marks (truncated for display).
fn create_bar_chart(
    points: &[(String, f64)],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let scratch = tempfile::Builder::new()
        .prefix("ecomdash_chart")
        .suffix(".png")
        .tempfile()?;
    {
        let root =
            BitMapBackend::new(scratch.path(), (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let count = points.len();
        let (min_y, max_y) = y_bounds(points.iter().map(|(_, y)| *y));
        let labels: Vec<String> = points
            .iter()
            .map(|(label, _)| truncate_label(label))
            .collect();

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(60)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..count as f64 - 0.5, min_y..max_y)?;

        chart
            .configure_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_labels(count.min(12))
            .x_label_formatter(&|x| label_at(&labels, *x))
            .draw()?;

        chart.draw_series(points.iter().enumerate().map(|(i, (_, y))| {
            Rectangle::new([(i as f64 - 0.4, 0.0), (i as f64 + 0.4, *y)], BLUE.filled())
        }))?;

        root.present()?;
    }

    let png_data = std::fs::read(scratch.path())?;
    Ok(png_data)
}

/// Creates a line chart from labelled data points
fn create_line_chart(
    points: &[(String, f64)],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let scratch = tempfile::Builder::new()
        .prefix("ecomdash_chart")
        .suffix(".png")
        .tempfile()?;
    {
        let root =
            BitMapBackend::new(scratch.path(), (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let count = points.len();
        let (min_y, max_y) = y_bounds(points.iter().map(|(_, y)| *y));
        let labels: Vec<String> = points
            .iter()
            .map(|(label, _)| truncate_label(label))
            .collect();

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(60)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..count as f64 - 0.5, min_y..max_y)?;

        chart
            .configure_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_labels(count.min(12))
            .x_label_formatter(&|x| label_at(&labels, *x))
            .draw()?;

        chart.draw_series(LineSeries::new(
            points.iter().enumerate().map(|(i, (_, y))| (i as f64, *y)),
            &BLUE,
        ))?;

        root.present()?;
    }

    let png_data = std::fs::read(scratch.path())?;
    Ok(png_data)
}

/// Creates a scatter plot from numeric data points
fn create_scatter_chart(
    points: &[(f64, f64)],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let scratch = tempfile::Builder::new()
        .prefix("ecomdash_chart")
        .suffix(".png")
        .tempfile()?;
    {
        let root =
            BitMapBackend::new(scratch.path(), (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let (min_x, max_x) = axis_bounds(points.iter().map(|(x, _)| *x));
        let (min_y, max_y) = axis_bounds(points.iter().map(|(_, y)| *y));

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(min_x..max_x, min_y..max_y)?;

        chart
            .configure_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()?;

        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, GREEN.filled())),
        )?;

        root.present()?;
    }

    let png_data = std::fs::read(scratch.path())?;
    Ok(png_data)
}

fn label_at(labels: &[String], position: f64) -> String {
    let index = position.round();
    if index < 0.0 || (position - index).abs() > 0.3 {
        return String::new();
    }
    labels
        .get(index as usize)
        .cloned()
        .unwrap_or_default()
}

fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        label.to_string()
    } else {
        let mut truncated: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
        truncated.push('…');
        truncated
    }
}

/// Y range for bar/line charts: always includes zero, padded at the top
fn y_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min_y = 0.0f64;
    let mut max_y = f64::MIN;
    for value in values {
        min_y = min_y.min(value);
        max_y = max_y.max(value);
    }
    if max_y == f64::MIN {
        max_y = 1.0;
    }
    let pad = ((max_y - min_y).abs() * 0.05).max(1.0);
    (min_y, max_y + pad)
}

/// Axis range for scatter plots, padded on both ends
fn axis_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min_v = f64::MAX;
    let mut max_v = f64::MIN;
    for value in values {
        min_v = min_v.min(value);
        max_v = max_v.max(value);
    }
    if min_v > max_v {
        return (0.0, 1.0);
    }
    let pad = ((max_v - min_v).abs() * 0.05).max(1.0);
    (min_v - pad, max_v + pad)
}
