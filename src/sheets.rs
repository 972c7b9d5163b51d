// Copyright 2026 Chanweek Contributors
// SPDX-License-Identifier: Apache-2.0

//! Spreadsheet sync over the Google Sheets v4 REST surface.
//!
//! Two write modes. `overwrite` clears the tab and writes header + rows;
//! `append` probes `A1` and writes the header only when the tab is empty,
//! otherwise rows go after the last existing row. The orchestrator issues at
//! most one overwrite per run, so a tab never accumulates duplicate headers.
//!
//! Token acquisition (OAuth) is out of scope: the bearer token arrives via
//! configuration. The base URL is injectable for tests.

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::time::Duration;

/// Default Sheets API endpoint.
const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

/// How a batch of rows lands in the target tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Append,
    Overwrite,
}

impl std::str::FromStr for SyncMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(SyncMode::Append),
            "overwrite" => Ok(SyncMode::Overwrite),
            other => bail!("unknown sheet mode '{other}' (expected append or overwrite)"),
        }
    }
}

/// Minimal Sheets v4 client.
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SheetsClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(SHEETS_BASE_URL, token)
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Create the tab if the spreadsheet does not have it yet.
    pub async fn ensure_tab(&self, spreadsheet_id: &str, tab: &str) -> Result<()> {
        let url = format!("{}/v4/spreadsheets/{spreadsheet_id}", self.base_url);
        let meta: serde_json::Value = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("failed to fetch spreadsheet metadata")?
            .error_for_status()
            .context("spreadsheet metadata request rejected")?
            .json()
            .await
            .context("spreadsheet metadata is not JSON")?;

        let exists = meta["sheets"]
            .as_array()
            .map(|sheets| {
                sheets
                    .iter()
                    .any(|s| s["properties"]["title"].as_str() == Some(tab))
            })
            .unwrap_or(false);
        if exists {
            return Ok(());
        }

        tracing::info!("creating missing spreadsheet tab '{tab}'");
        let url = format!(
            "{}/v4/spreadsheets/{spreadsheet_id}:batchUpdate",
            self.base_url
        );
        self.http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({
                "requests": [{ "addSheet": { "properties": { "title": tab } } }]
            }))
            .send()
            .await
            .context("failed to create tab")?
            .error_for_status()
            .context("tab creation rejected")?;
        Ok(())
    }

    /// Write one summary row to the tab in the given mode.
    pub async fn upload_row(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        header: &[&str],
        row: &[String],
        mode: SyncMode,
    ) -> Result<()> {
        self.ensure_tab(spreadsheet_id, tab).await?;

        match mode {
            SyncMode::Overwrite => {
                self.clear(spreadsheet_id, tab).await?;
                self.update_at_a1(spreadsheet_id, tab, header, row).await?;
                tracing::info!("uploaded (overwrite) to tab '{tab}'");
            }
            SyncMode::Append => {
                if self.tab_is_empty(spreadsheet_id, tab).await? {
                    self.update_at_a1(spreadsheet_id, tab, header, row).await?;
                    tracing::info!("uploaded (new tab) to '{tab}'");
                } else {
                    self.append_values(spreadsheet_id, tab, row).await?;
                    tracing::info!("appended 1 row to '{tab}'");
                }
            }
        }
        Ok(())
    }

    async fn clear(&self, spreadsheet_id: &str, tab: &str) -> Result<()> {
        let url = format!(
            "{}/v4/spreadsheets/{spreadsheet_id}/values/{tab}!A:ZZ:clear",
            self.base_url
        );
        self.http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({}))
            .send()
            .await
            .context("failed to clear tab")?
            .error_for_status()
            .context("tab clear rejected")?;
        Ok(())
    }

    async fn tab_is_empty(&self, spreadsheet_id: &str, tab: &str) -> Result<bool> {
        let url = format!(
            "{}/v4/spreadsheets/{spreadsheet_id}/values/{tab}!A1:A1",
            self.base_url
        );
        let body: serde_json::Value = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("failed to probe tab")?
            .error_for_status()
            .context("tab probe rejected")?
            .json()
            .await
            .context("tab probe response is not JSON")?;

        let has_values = body["values"]
            .as_array()
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        Ok(!has_values)
    }

    async fn update_at_a1(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        header: &[&str],
        row: &[String],
    ) -> Result<()> {
        let url = format!(
            "{}/v4/spreadsheets/{spreadsheet_id}/values/{tab}!A1?valueInputOption=USER_ENTERED",
            self.base_url
        );
        self.http
            .put(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "values": [header, row] }))
            .send()
            .await
            .context("failed to write values")?
            .error_for_status()
            .context("values write rejected")?;
        Ok(())
    }

    async fn append_values(&self, spreadsheet_id: &str, tab: &str, row: &[String]) -> Result<()> {
        let url = format!(
            "{}/v4/spreadsheets/{spreadsheet_id}/values/{tab}!A1:append\
             ?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.base_url
        );
        self.http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .context("failed to append values")?
            .error_for_status()
            .context("values append rejected")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_mode_parsing() {
        assert_eq!("append".parse::<SyncMode>().unwrap(), SyncMode::Append);
        assert_eq!(
            " Overwrite ".parse::<SyncMode>().unwrap(),
            SyncMode::Overwrite
        );
        assert!("replace".parse::<SyncMode>().is_err());
    }
}
