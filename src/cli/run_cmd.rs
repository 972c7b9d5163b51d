//! `chanweek run` — the full weekly export pipeline.

use crate::acquisition::{login, ExportAcquisition};
use crate::alert;
use crate::browser::chromium::ChromiumDriver;
use crate::browser::AdminDriver;
use crate::config::{Config, RunArgs};
use crate::orchestrator;
use crate::session::SessionStore;
use crate::sheets::SheetsClient;
use anyhow::{Context, Result};
use tracing::info;

/// Run the pipeline end to end for the configured range.
pub async fn run(args: &RunArgs) -> Result<()> {
    let cfg = Config::resolve(args)?;

    info!("range: {} → {} (inclusive)", cfg.since, cfg.until);
    info!("download dir: {}", cfg.download_dir.display());
    if cfg.upload_to_sheet {
        info!(
            "sheet upload: tab '{}' mode {:?}",
            cfg.sheet_tab, cfg.sheet_mode
        );
    }

    std::fs::create_dir_all(&cfg.download_dir)
        .with_context(|| format!("cannot create {}", cfg.download_dir.display()))?;

    let alerter = alert::from_config(&cfg);
    let store = SessionStore::new(&cfg.session_file);

    let mut driver: Box<dyn AdminDriver> = Box::new(
        ChromiumDriver::launch(cfg.headless)
            .await
            .context("browser launch failed")?,
    );
    driver.prepare_downloads(&cfg.download_dir).await?;

    if let Err(e) = login::ensure_authenticated(driver.as_mut(), &cfg, &store).await {
        alerter
            .alert("run aborted", &format!("authentication failed: {e:#}"))
            .await;
        let _ = driver.close().await;
        return Err(e);
    }

    let sheets = match (&cfg.upload_to_sheet, &cfg.sheets_token) {
        (true, Some(token)) => Some(SheetsClient::new(token.clone())),
        (true, None) => {
            tracing::warn!("UPLOAD_TO_SHEET is set but no SHEETS_TOKEN; skipping sheet sync");
            None
        }
        _ => None,
    };

    let mut exporter = ExportAcquisition::new(driver, cfg.clone());
    let outcome =
        orchestrator::run_weeks(&cfg, &mut exporter, sheets.as_ref(), alerter.as_ref()).await;
    let _ = exporter.into_driver().close().await;
    let outcome = outcome?;

    println!();
    println!(
        "Done: {} week(s) summarized, {} failed.",
        outcome.rows.len(),
        outcome.failures.len()
    );
    for failure in &outcome.failures {
        println!("  failed {} — {}", failure.week, failure.reason);
    }
    if let Some(path) = &outcome.combined_path {
        println!("Combined summary: {}", path.display());
    }

    Ok(())
}
