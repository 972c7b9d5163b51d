// Copyright 2026 Chanweek Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run orchestration — one browser session, week by week.
//!
//! A failed week is recorded and skipped, never fatal: the point of the
//! weekly loop is that one bad export does not cost the rest of the range.
//! Successful rows are pushed to the spreadsheet immediately, one per week,
//! so a long run surfaces partial progress and never buffers unbounded
//! state.

use crate::acquisition::WeekExporter;
use crate::alert::Alerter;
use crate::calendar::{partition, WeekRange};
use crate::config::Config;
use crate::error::Error;
use crate::report::summary::{aggregate, write_summary_csv, SummaryRow, SUMMARY_HEADERS};
use crate::report::read_raw_rows;
use crate::sheets::{SheetsClient, SyncMode};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// One week that did not produce a summary row.
#[derive(Debug)]
pub struct WeekFailure {
    pub week: WeekRange,
    pub reason: String,
}

/// Everything a run produced.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Summary rows for the weeks that succeeded, in chronological order.
    pub rows: Vec<SummaryRow>,
    /// Weeks that failed, with enough context to retry them manually.
    pub failures: Vec<WeekFailure>,
    /// Combined summary CSV, when at least one week succeeded.
    pub combined_path: Option<PathBuf>,
}

/// Drive the full range: partition, export, aggregate, persist, sync.
pub async fn run_weeks(
    cfg: &Config,
    exporter: &mut dyn WeekExporter,
    sheets: Option<&SheetsClient>,
    alerter: &dyn Alerter,
) -> Result<RunOutcome> {
    // Range problems are fatal before any acquisition starts.
    let weeks = partition(cfg.since, cfg.until, cfg.week_start_day)?;

    let mut outcome = RunOutcome::default();
    // One-way latch: only the first successfully synced week may overwrite.
    let mut overwrite_pending = cfg.sheet_mode == SyncMode::Overwrite;

    for week in weeks {
        tracing::info!("processing week {week}");
        let summary = match process_week(cfg, exporter, &week).await {
            Ok(summary) => summary,
            Err(e) => {
                let reason = format!("{e:#}");
                tracing::warn!("week {week} failed: {reason}");
                alerter
                    .alert(
                        "weekly export failed",
                        &format!("week {week} failed: {reason}"),
                    )
                    .await;
                outcome.failures.push(WeekFailure { week, reason });
                continue;
            }
        };

        if let (Some(client), Some(sheet_id)) = (sheets, cfg.sheet_id.as_deref()) {
            let mode = if overwrite_pending {
                SyncMode::Overwrite
            } else {
                SyncMode::Append
            };
            match client
                .upload_row(
                    sheet_id,
                    &cfg.sheet_tab,
                    &SUMMARY_HEADERS,
                    &summary.to_record(),
                    mode,
                )
                .await
            {
                Ok(()) => overwrite_pending = false,
                Err(e) => {
                    // The local artifacts are the durable record; a sync
                    // failure is reported but changes nothing else.
                    let sync_err = Error::SyncFailed(format!("{e:#}"));
                    tracing::warn!("week {week}: {sync_err}");
                    alerter
                        .alert("spreadsheet sync failed", &format!("week {week}: {sync_err}"))
                        .await;
                }
            }
        }

        outcome.rows.push(summary);
    }

    if !outcome.rows.is_empty() {
        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let path = cfg.download_dir.join(format!(
            "weekly_summary_{}_{}_{}_{stamp}.csv",
            cfg.country, cfg.since, cfg.until
        ));
        write_summary_csv(&path, &outcome.rows)?;
        tracing::info!("combined summary saved: {}", path.display());
        outcome.combined_path = Some(path);
    }

    tracing::info!(
        "run complete: {} week(s) succeeded, {} failed",
        outcome.rows.len(),
        outcome.failures.len()
    );
    Ok(outcome)
}

/// Export one week and fold it into a summary row, writing both local
/// artifacts.
async fn process_week(
    cfg: &Config,
    exporter: &mut dyn WeekExporter,
    week: &WeekRange,
) -> Result<SummaryRow> {
    let raw_path = exporter.export_week(week).await?;
    let rows = read_raw_rows(&raw_path)?;
    let summary = aggregate(&rows, week, &cfg.country, chrono::Local::now().date_naive());

    let summary_path = summary_path_for(&raw_path);
    write_summary_csv(&summary_path, std::slice::from_ref(&summary))
        .with_context(|| format!("failed to write {}", summary_path.display()))?;
    tracing::info!("saved weekly summary: {}", summary_path.display());

    Ok(summary)
}

/// `foo.csv` → `foo_SUMMARY.csv`, beside the raw artifact.
fn summary_path_for(raw: &PathBuf) -> PathBuf {
    let stem = raw
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "export".to_string());
    raw.with_file_name(format!("{stem}_SUMMARY.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_path_beside_raw() {
        let raw = PathBuf::from("/tmp/dl/channel_perf_acme_US_2025-09-01_2025-09-07_x.csv");
        assert_eq!(
            summary_path_for(&raw),
            PathBuf::from("/tmp/dl/channel_perf_acme_US_2025-09-01_2025-09-07_x_SUMMARY.csv")
        );
    }
}
