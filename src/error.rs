// Copyright 2026 Chanweek Contributors
// SPDX-License-Identifier: Apache-2.0

//! Failure taxonomy for the export pipeline.
//!
//! Range and configuration errors are fatal and abort before any
//! acquisition. Everything else is scoped to the week that raised it;
//! the orchestrator logs and moves on.

use chrono::NaiveDate;
use std::time::Duration;

/// All errors the pipeline distinguishes by name.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid date range: until {until} is before since {since}")]
    InvalidRange { since: NaiveDate, until: NaiveDate },

    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    #[error("raw export is missing required columns; found: {found:?}")]
    MissingColumns { found: Vec<String> },

    #[error("no UI element matched for step '{step}' ({candidates} locators tried)")]
    UiElementNotFound {
        step: &'static str,
        candidates: usize,
    },

    #[error("download did not complete within {0:?}")]
    DownloadTimeout(Duration),

    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("spreadsheet sync failed: {0}")]
    SyncFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let e = Error::InvalidRange {
            since: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            until: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
        };
        let msg = e.to_string();
        assert!(msg.contains("2025-08-01"));
        assert!(msg.contains("2025-09-01"));

        let e = Error::UiElementNotFound {
            step: "export-dialog",
            candidates: 3,
        };
        assert!(e.to_string().contains("export-dialog"));
        assert!(e.to_string().contains("3 locators"));
    }
}
