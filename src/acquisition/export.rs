//! The per-week export state machine.
//!
//! Linear progression with a terminal failure state that is scoped to the
//! week being exported:
//!
//! `Init → SessionLoaded|Unauthenticated → Authenticated → ReportPageLoaded
//!  → ExportDialogOpen → FormatSelected → DownloadTriggered → DownloadSaved`
//!
//! Authentication happens once per run (see [`super::login`]); this module
//! drives the per-week tail of the machine. Every wait is bounded.

use super::locators::{probe_js, CHOOSE_CSV_FORMAT, CONFIRM_EXPORT, OPEN_EXPORT_DIALOG, REPORT_MARKER};
use super::{run_step, WeekExporter};
use crate::browser::{wait_for_probe, AdminDriver};
use crate::calendar::WeekRange;
use crate::config::Config;
use crate::error::Error;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

/// States of the per-week acquisition machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Init,
    SessionLoaded,
    Unauthenticated,
    Authenticated,
    ReportPageLoaded,
    ExportDialogOpen,
    FormatSelected,
    DownloadTriggered,
    DownloadSaved,
}

impl std::fmt::Display for AcquisitionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AcquisitionState::Init => "init",
            AcquisitionState::SessionLoaded => "session-loaded",
            AcquisitionState::Unauthenticated => "unauthenticated",
            AcquisitionState::Authenticated => "authenticated",
            AcquisitionState::ReportPageLoaded => "report-page-loaded",
            AcquisitionState::ExportDialogOpen => "export-dialog-open",
            AcquisitionState::FormatSelected => "format-selected",
            AcquisitionState::DownloadTriggered => "download-triggered",
            AcquisitionState::DownloadSaved => "download-saved",
        };
        f.write_str(name)
    }
}

/// Drives one authenticated browser session through weekly exports.
pub struct ExportAcquisition {
    driver: Box<dyn AdminDriver>,
    cfg: Config,
    state: AcquisitionState,
}

impl ExportAcquisition {
    /// Wrap an already-authenticated driver.
    pub fn new(driver: Box<dyn AdminDriver>, cfg: Config) -> Self {
        Self {
            driver,
            cfg,
            state: AcquisitionState::Authenticated,
        }
    }

    /// Current machine state (the last state reached).
    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    /// Take the driver back to close it.
    pub fn into_driver(self) -> Box<dyn AdminDriver> {
        self.driver
    }

    fn advance(&mut self, state: AcquisitionState) {
        tracing::debug!("acquisition: {} → {state}", self.state);
        self.state = state;
    }

    async fn run_export_flow(&mut self, week: &WeekRange) -> Result<PathBuf> {
        let url = self.cfg.report_url(week);
        tracing::info!("navigating to report for {week}");
        self.driver.navigate(&url, self.cfg.nav_timeout_ms).await?;

        if !wait_for_probe(
            self.driver.as_mut(),
            &probe_js(REPORT_MARKER),
            self.cfg.nav_timeout_ms,
        )
        .await
        {
            return Err(Error::NavigationTimeout {
                url,
                timeout_ms: self.cfg.nav_timeout_ms,
            }
            .into());
        }
        self.advance(AcquisitionState::ReportPageLoaded);
        // Let the report hydrate before poking at its buttons.
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        let before = snapshot_csvs(&self.cfg.download_dir);

        run_step(
            self.driver.as_mut(),
            &OPEN_EXPORT_DIALOG,
            self.cfg.candidate_timeout_ms,
            self.cfg.step_timeout_ms,
        )
        .await?;
        self.advance(AcquisitionState::ExportDialogOpen);
        tokio::time::sleep(Duration::from_millis(500)).await;

        match run_step(
            self.driver.as_mut(),
            &CHOOSE_CSV_FORMAT,
            self.cfg.candidate_timeout_ms,
            self.cfg.step_timeout_ms,
        )
        .await
        {
            Ok(()) => {}
            Err(e) if !CHOOSE_CSV_FORMAT.required => {
                tracing::debug!("format picker not present ({e}); dialog defaults to CSV");
            }
            Err(e) => return Err(e.into()),
        }
        self.advance(AcquisitionState::FormatSelected);

        run_step(
            self.driver.as_mut(),
            &CONFIRM_EXPORT,
            self.cfg.candidate_timeout_ms,
            self.cfg.step_timeout_ms,
        )
        .await?;
        self.advance(AcquisitionState::DownloadTriggered);

        let downloaded = wait_for_new_csv(
            &self.cfg.download_dir,
            &before,
            self.cfg.download_timeout_ms,
        )
        .await?;

        let dest = self.cfg.download_dir.join(artifact_name(&self.cfg, week));
        std::fs::rename(&downloaded, &dest)
            .with_context(|| format!("failed to move download to {}", dest.display()))?;
        self.advance(AcquisitionState::DownloadSaved);
        tracing::info!("saved raw export: {}", dest.display());
        Ok(dest)
    }
}

#[async_trait]
impl WeekExporter for ExportAcquisition {
    async fn export_week(&mut self, week: &WeekRange) -> Result<PathBuf> {
        // Each week restarts from the authenticated state; the previous
        // week's page is irrelevant because the report URL is fully
        // parameterized.
        self.state = AcquisitionState::Authenticated;
        self.run_export_flow(week).await
    }
}

/// Deterministic, collision-resistant raw artifact name.
fn artifact_name(cfg: &Config, week: &WeekRange) -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    format!(
        "channel_perf_{}_{}_{}_{}_{stamp}.csv",
        cfg.store_slug, cfg.country, week.start, week.end
    )
}

/// Names of the CSV files currently in the download directory.
fn snapshot_csvs(dir: &Path) -> HashSet<String> {
    let mut names = HashSet::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".csv") {
                names.insert(name);
            }
        }
    }
    names
}

/// Wait for a CSV that was not in `before` to appear and stop growing.
async fn wait_for_new_csv(
    dir: &Path,
    before: &HashSet<String>,
    timeout_ms: u64,
) -> Result<PathBuf> {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let mut last_size: Option<(PathBuf, u64)> = None;

    loop {
        for name in snapshot_csvs(dir) {
            if before.contains(&name) {
                continue;
            }
            let path = dir.join(&name);
            let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            match &last_size {
                // Same file, same size across two polls: the write is done.
                Some((p, s)) if *p == path && *s == size && size > 0 => return Ok(path),
                _ => last_size = Some((path, size)),
            }
        }

        if Instant::now() >= deadline {
            return Err(Error::DownloadTimeout(Duration::from_millis(timeout_ms)).into());
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_for_new_csv_picks_up_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.csv"), "stale").unwrap();
        let before = snapshot_csvs(dir.path());

        std::fs::write(dir.path().join("fresh.csv"), "a,b\n1,2\n").unwrap();
        let found = wait_for_new_csv(dir.path(), &before, 10_000).await.unwrap();
        assert!(found.ends_with("fresh.csv"));
    }

    #[tokio::test]
    async fn test_wait_for_new_csv_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let before = snapshot_csvs(dir.path());
        let err = wait_for_new_csv(dir.path(), &before, 1_200).await.unwrap_err();
        let err = err.downcast_ref::<Error>().expect("taxonomy error");
        assert!(matches!(err, Error::DownloadTimeout(_)));
    }

    #[tokio::test]
    async fn test_wait_ignores_preexisting_csvs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.csv"), "stale").unwrap();
        let before = snapshot_csvs(dir.path());
        let err = wait_for_new_csv(dir.path(), &before, 1_200).await;
        assert!(err.is_err());
    }
}
