//! `chanweek summarize <csv>` — aggregate an already-downloaded raw export.
//!
//! The offline half of the pipeline, for retrying a single week whose
//! acquisition succeeded but whose aggregation (or sheet sync) needs to be
//! redone by hand.

use crate::calendar::WeekRange;
use crate::error::Error;
use crate::report::summary::{aggregate, write_summary_csv, SUMMARY_HEADERS};
use crate::report::read_raw_rows;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Run the summarize command.
pub fn run(
    input: &Path,
    since: &str,
    until: &str,
    country: &str,
    output: Option<&Path>,
) -> Result<()> {
    let start = parse_ymd(since)?;
    let end = parse_ymd(until)?;
    if end < start {
        return Err(Error::InvalidRange {
            since: start,
            until: end,
        }
        .into());
    }
    let week = WeekRange { start, end };

    let rows = read_raw_rows(input)?;
    let summary = aggregate(&rows, &week, country, chrono::Local::now().date_naive());

    let output = output.map(PathBuf::from).unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "export".to_string());
        input.with_file_name(format!("{stem}_SUMMARY.csv"))
    });
    write_summary_csv(&output, std::slice::from_ref(&summary))?;

    println!("Summary for {} ({} raw rows):", week, rows.len());
    for (header, value) in SUMMARY_HEADERS.iter().zip(summary.to_record()) {
        println!("  {header:<22} {value}");
    }
    println!();
    println!("Saved: {}", output.display());
    Ok(())
}

fn parse_ymd(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("expected YYYY-MM-DD, got '{s}'"))
}
