//! Presentation of reports and export of the comparative chart table.
//!
//! Rounding to two decimals happens here and nowhere else.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::{Category, CohortRates, CohortStatistics};
use crate::analyzers::utility::round2;
use crate::report::Report;

const NO_DATA: &str = "no data";

/// One row of the chart table. Empty cohorts keep their row with no values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub category: Category,
    pub schools: usize,
    pub approval_rate: Option<f64>,
    pub failure_rate: Option<f64>,
    pub dropout_rate: Option<f64>,
    pub retention_rate: Option<f64>,
}

#[derive(Serialize)]
struct ChartTable<'a> {
    generated_at: DateTime<Utc>,
    rows: &'a [ChartRow],
}

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &Report) {
    debug!("{:#?}", report);
}

/// Builds the category × rate table, rounded, in display order.
pub fn chart_rows(stats: &CohortStatistics) -> Vec<ChartRow> {
    Category::SELECTABLE
        .iter()
        .map(|&category| match stats.get(category) {
            Some(r) => ChartRow {
                category,
                schools: r.schools,
                approval_rate: Some(round2(r.approval)),
                failure_rate: Some(round2(r.failure)),
                dropout_rate: Some(round2(r.dropout)),
                retention_rate: Some(round2(r.retention)),
            },
            None => ChartRow {
                category,
                schools: 0,
                approval_rate: None,
                failure_rate: None,
                dropout_rate: None,
                retention_rate: None,
            },
        })
        .collect()
}

/// Human-readable summary of a prediction and its cohort.
pub fn render_summary(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Predicted total score: {:.2}", report.predicted_score);
    let _ = writeln!(out);
    let _ = writeln!(out, "Mean rates for {} schools:", report.category);
    out.push_str(&render_rates(report.selected.as_ref()));

    if let Some(dropped) = report.dropped {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Rows excluded: {} (unclassified {}, incomplete {}, rate out of range {})",
            dropped.total(),
            dropped.unclassified,
            dropped.missing_field,
            dropped.rate_out_of_range
        );
    }
    out
}

fn render_rates(rates: Option<&CohortRates>) -> String {
    let Some(r) = rates else {
        return format!("  {NO_DATA}\n");
    };
    format!(
        "  Approval rate:  {:.2}%\n  Failure rate:   {:.2}%\n  Dropout rate:   {:.2}%\n  Retention rate: {:.2}%\n  Schools:        {}\n",
        r.approval, r.failure, r.dropout, r.retention, r.schools
    )
}

/// Fixed-width comparative table of every selectable category.
pub fn render_table(stats: &CohortStatistics) -> String {
    let fmt = |v: Option<f64>| v.map_or_else(|| NO_DATA.to_string(), |v| format!("{v:.2}%"));

    let mut out = format!(
        "{:<10}{:>9}{:>12}{:>12}{:>12}{:>12}\n",
        "Category", "Schools", "Approval", "Failure", "Dropout", "Retention"
    );
    for row in chart_rows(stats) {
        let _ = writeln!(
            out,
            "{:<10}{:>9}{:>12}{:>12}{:>12}{:>12}",
            row.category.label(),
            row.schools,
            fmt(row.approval_rate),
            fmt(row.failure_rate),
            fmt(row.dropout_rate),
            fmt(row.retention_rate)
        );
    }
    out
}

/// Writes the chart table for the plotting tool; `.json` paths get JSON,
/// anything else CSV.
pub fn write_chart(path: &str, stats: &CohortStatistics) -> Result<()> {
    let rows = chart_rows(stats);
    let is_json = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        write_chart_json(path, &rows)?;
    } else {
        write_chart_csv(path, &rows)?;
    }
    info!(path, rows = rows.len(), "Chart table written");
    Ok(())
}

pub fn write_chart_csv(path: &str, rows: &[ChartRow]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

pub fn write_chart_json(path: &str, rows: &[ChartRow]) -> Result<()> {
    let table = ChartTable {
        generated_at: Utc::now(),
        rows,
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &table)?;
    Ok(())
}
