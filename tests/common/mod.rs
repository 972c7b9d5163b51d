//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chanweek::acquisition::WeekExporter;
use chanweek::calendar::WeekRange;
use chanweek::config::Config;
use chanweek::error::Error;
use chanweek::sheets::SyncMode;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A config pointing every path into `dir`, with short test timeouts.
pub fn test_config(dir: &Path, since: NaiveDate, until: NaiveDate) -> Config {
    Config {
        store_slug: "acme-co".into(),
        admin_host: "admin.example.com".into(),
        since,
        until,
        country: "US".into(),
        week_start_day: 0,
        headless: true,
        auto_login: false,
        email: None,
        password: None,
        otp: None,
        download_dir: dir.to_path_buf(),
        session_file: dir.join("session.json"),
        upload_to_sheet: false,
        sheet_id: None,
        sheet_tab: "summary".into(),
        sheet_mode: SyncMode::Append,
        sheets_token: None,
        alert_webhook: None,
        nav_timeout_ms: 2_000,
        candidate_timeout_ms: 300,
        step_timeout_ms: 900,
        download_timeout_ms: 3_000,
    }
}

/// Week exporter that writes a canned raw CSV per week and fails on demand.
pub struct ScriptedExporter {
    pub dir: PathBuf,
    pub fail_weeks: Vec<usize>,
    pub calls: usize,
}

impl ScriptedExporter {
    pub fn new(dir: &Path, fail_weeks: Vec<usize>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            fail_weeks,
            calls: 0,
        }
    }
}

#[async_trait]
impl WeekExporter for ScriptedExporter {
    async fn export_week(&mut self, week: &WeekRange) -> Result<PathBuf> {
        let index = self.calls;
        self.calls += 1;

        if self.fail_weeks.contains(&index) {
            return Err(Error::DownloadTimeout(Duration::from_millis(1)).into());
        }

        let path = self.dir.join(format!("raw_{}.csv", week.start));
        let sales = (index + 1) * 100;
        std::fs::write(
            &path,
            format!(
                "Referring Platform,Channel,Type,Sales,Cost\n\
                 ,google,paid,{sales},10\n\
                 ,direct,,25,\n"
            ),
        )?;
        Ok(path)
    }
}
