// Copyright 2026 Chanweek Contributors
// SPDX-License-Identifier: Apache-2.0

//! Browser seam for the acquisition flow.
//!
//! `AdminDriver` abstracts the handful of capabilities the export flow needs
//! from the engine: bounded navigation, JS evaluation, cookie capture and
//! restore, and routing downloads into a directory. The Chromium
//! implementation lives in [`chromium`]; tests drive the state machine with
//! a scripted fake instead.

pub mod chromium;

use crate::session::SessionCookie;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// A live admin-UI browser session.
#[async_trait]
pub trait AdminDriver: Send {
    /// Navigate to a URL, bounded by `timeout_ms`.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()>;

    /// Evaluate JavaScript in the page and return the JSON result.
    async fn eval(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Current page URL.
    async fn current_url(&mut self) -> Result<String>;

    /// Capture the context's cookies.
    async fn cookies(&mut self) -> Result<Vec<SessionCookie>>;

    /// Restore previously captured cookies into the context.
    async fn restore_cookies(&mut self, cookies: &[SessionCookie]) -> Result<()>;

    /// Route downloads into `dir` for the rest of the session.
    async fn prepare_downloads(&mut self, dir: &Path) -> Result<()>;

    /// Close the page and browser.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Poll a boolean JS probe until it reports true or the timeout expires.
///
/// Returns whether the probe ever succeeded; evaluation errors count as a
/// false probe (the page may be mid-navigation).
pub async fn wait_for_probe(
    driver: &mut dyn AdminDriver,
    probe_js: &str,
    timeout_ms: u64,
) -> bool {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);
    loop {
        match driver.eval(probe_js).await {
            Ok(v) if v.as_bool() == Some(true) => return true,
            _ => {}
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    }
}
