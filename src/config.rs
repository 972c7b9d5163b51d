// Copyright 2026 Chanweek Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run configuration.
//!
//! Everything the pipeline needs is resolved exactly once (CLI flag, then
//! environment variable, then default) into one immutable [`Config`]. No
//! component reads process state after this point.

use crate::error::Error;
use crate::sheets::SyncMode;
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;

/// Default `since` when neither flag nor env provides one: the earliest
/// week the ledger tracks.
const DEFAULT_SINCE: &str = "2025-09-01";

/// CLI arguments for the `run` subcommand. Every flag falls back to an
/// environment variable so the tool can run from a plain `.env`-style shell.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Store slug as it appears in the admin URL (env: SHOPIFY_STORE_SLUG)
    #[arg(long)]
    pub store: Option<String>,

    /// Range start, YYYY-MM-DD (env: SINCE)
    #[arg(long)]
    pub since: Option<String>,

    /// Range end, YYYY-MM-DD, inclusive (env: UNTIL, default today)
    #[arg(long)]
    pub until: Option<String>,

    /// Report country code (env: COUNTRY, default US)
    #[arg(long)]
    pub country: Option<String>,

    /// First day of the week, 0=Monday … 6=Sunday (env: WEEK_START)
    #[arg(long)]
    pub week_start: Option<u8>,

    /// Run the browser headless (env: CHROME_HEADLESS)
    #[arg(long)]
    pub headless: bool,

    /// Attempt automated credential login (env: AUTO_LOGIN)
    #[arg(long)]
    pub auto_login: bool,

    /// Directory for raw and summary CSV artifacts (env: DOWNLOAD_DIR)
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// Session state file path (env: CHANWEEK_SESSION_FILE)
    #[arg(long)]
    pub session_file: Option<PathBuf>,

    /// Push each summary row to the spreadsheet (env: UPLOAD_TO_SHEET)
    #[arg(long)]
    pub upload: bool,

    /// Spreadsheet identifier (env: SHEET_ID)
    #[arg(long)]
    pub sheet_id: Option<String>,

    /// Spreadsheet tab name (env: SHEET_NAME)
    #[arg(long)]
    pub sheet_tab: Option<String>,

    /// Sheet write mode: append or overwrite (env: SHEET_MODE)
    #[arg(long)]
    pub sheet_mode: Option<String>,
}

/// The resolved, immutable run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_slug: String,
    pub admin_host: String,
    pub since: NaiveDate,
    pub until: NaiveDate,
    pub country: String,
    pub week_start_day: u8,
    pub headless: bool,
    pub auto_login: bool,
    pub email: Option<String>,
    pub password: Option<String>,
    pub otp: Option<String>,
    pub download_dir: PathBuf,
    pub session_file: PathBuf,
    pub upload_to_sheet: bool,
    pub sheet_id: Option<String>,
    pub sheet_tab: String,
    pub sheet_mode: SyncMode,
    pub sheets_token: Option<String>,
    pub alert_webhook: Option<String>,
    pub nav_timeout_ms: u64,
    pub candidate_timeout_ms: u64,
    pub step_timeout_ms: u64,
    pub download_timeout_ms: u64,
}

impl Config {
    /// Resolve the full configuration from CLI args and environment.
    pub fn resolve(args: &RunArgs) -> Result<Config> {
        let store_slug = args
            .store
            .clone()
            .or_else(|| env_str("SHOPIFY_STORE_SLUG"))
            .ok_or(Error::MissingConfig("store slug (--store / SHOPIFY_STORE_SLUG)"))?;

        let since_raw = args
            .since
            .clone()
            .or_else(|| env_str("SINCE"))
            .unwrap_or_else(|| DEFAULT_SINCE.to_string());
        let until_raw = args
            .until
            .clone()
            .or_else(|| env_str("UNTIL"))
            .unwrap_or_else(|| Local::now().date_naive().to_string());

        let since = parse_ymd(&since_raw).context("invalid --since")?;
        let until = parse_ymd(&until_raw).context("invalid --until")?;

        let week_start_day = args
            .week_start
            .or_else(|| env_str("WEEK_START").and_then(|s| s.parse().ok()))
            .unwrap_or(0);
        if week_start_day > 6 {
            bail!("week start day must be 0 (Monday) through 6 (Sunday), got {week_start_day}");
        }

        let download_dir = args
            .download_dir
            .clone()
            .or_else(|| env_str("DOWNLOAD_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("./downloads"));

        let session_file = args
            .session_file
            .clone()
            .or_else(|| env_str("CHANWEEK_SESSION_FILE").map(PathBuf::from))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".chanweek")
                    .join("session.json")
            });

        let sheet_mode = args
            .sheet_mode
            .clone()
            .or_else(|| env_str("SHEET_MODE"))
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(SyncMode::Append);

        let sheets_token = env_str("SHEETS_TOKEN").or_else(|| {
            env_str("SHEETS_TOKEN_FILE")
                .and_then(|p| std::fs::read_to_string(p).ok())
                .map(|s| s.trim().to_string())
        });

        Ok(Config {
            store_slug,
            admin_host: env_str("ADMIN_HOST").unwrap_or_else(|| "admin.shopify.com".to_string()),
            since,
            until,
            country: args
                .country
                .clone()
                .or_else(|| env_str("COUNTRY"))
                .unwrap_or_else(|| "US".to_string()),
            week_start_day,
            headless: args.headless || env_flag("CHROME_HEADLESS"),
            auto_login: args.auto_login || env_flag("AUTO_LOGIN"),
            email: env_str("SHOPIFY_EMAIL"),
            password: env_str("SHOPIFY_PASSWORD"),
            otp: env_str("SHOPIFY_OTP"),
            download_dir,
            session_file,
            upload_to_sheet: args.upload || env_flag("UPLOAD_TO_SHEET"),
            sheet_id: args.sheet_id.clone().or_else(|| env_str("SHEET_ID")),
            sheet_tab: args
                .sheet_tab
                .clone()
                .or_else(|| env_str("SHEET_NAME"))
                .unwrap_or_else(|| "summary".to_string()),
            sheet_mode,
            sheets_token,
            alert_webhook: env_str("ALERT_WEBHOOK"),
            nav_timeout_ms: env_ms("NAV_TIMEOUT_MS", 60_000),
            candidate_timeout_ms: env_ms("CANDIDATE_TIMEOUT_MS", 8_000),
            step_timeout_ms: env_ms("STEP_TIMEOUT_MS", 20_000),
            download_timeout_ms: env_ms("DOWNLOAD_TIMEOUT_MS", 180_000),
        })
    }

    /// Admin home URL for login and session checks.
    pub fn admin_url(&self) -> String {
        format!("https://{}/store/{}", self.admin_host, self.store_slug)
    }

    /// Fully parameterized channel-report URL for one week.
    pub fn report_url(&self, week: &crate::calendar::WeekRange) -> String {
        format!(
            "https://{host}/store/{slug}/marketing/reports/channels\
             ?attributionModel=last_click_non_direct\
             &since={since}&until={until}\
             &sortColumn=sessions&sortDirection=desc\
             &country={country}",
            host = self.admin_host,
            slug = self.store_slug,
            since = week.start,
            until = week.end,
            country = self.country,
        )
    }
}

fn parse_ymd(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("expected YYYY-MM-DD, got '{s}'"))
}

fn env_str(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Truthy env flag: `1`, `true`, `yes` (any case).
fn env_flag(key: &str) -> bool {
    env_str(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn env_ms(key: &str, default: u64) -> u64 {
    env_str(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekRange;

    fn args() -> RunArgs {
        RunArgs {
            store: Some("acme-co".into()),
            since: Some("2025-09-01".into()),
            until: Some("2025-09-30".into()),
            country: Some("US".into()),
            week_start: Some(0),
            download_dir: Some(PathBuf::from("/tmp/dl")),
            session_file: Some(PathBuf::from("/tmp/session.json")),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_requires_store_slug() {
        let a = RunArgs {
            store: None,
            ..args()
        };
        // Only meaningful when the env var is also unset, as in CI.
        if std::env::var("SHOPIFY_STORE_SLUG").is_err() {
            let err = Config::resolve(&a).unwrap_err();
            let err = err.downcast_ref::<Error>().expect("taxonomy error");
            assert!(matches!(err, Error::MissingConfig(_)));
        }
    }

    #[test]
    fn test_resolve_rejects_bad_week_start() {
        let a = RunArgs {
            week_start: Some(7),
            ..args()
        };
        assert!(Config::resolve(&a).is_err());
    }

    #[test]
    fn test_report_url_shape() {
        let cfg = Config::resolve(&args()).unwrap();
        let week = WeekRange {
            start: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 9, 7).unwrap(),
        };
        let url = cfg.report_url(&week);
        assert!(url.starts_with(
            "https://admin.shopify.com/store/acme-co/marketing/reports/channels?"
        ));
        assert!(url.contains("attributionModel=last_click_non_direct"));
        assert!(url.contains("since=2025-09-01&until=2025-09-07"));
        assert!(url.contains("sortColumn=sessions&sortDirection=desc"));
        assert!(url.contains("country=US"));
    }
}
