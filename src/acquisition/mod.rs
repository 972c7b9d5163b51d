// Copyright 2026 Chanweek Contributors
// SPDX-License-Identifier: Apache-2.0

//! Weekly export acquisition — the browser-driving half of the pipeline.

pub mod export;
pub mod locators;
pub mod login;

pub use self::export::{AcquisitionState, ExportAcquisition};

use self::locators::{click_js, Locator, StepSpec};
use crate::browser::AdminDriver;
use crate::calendar::WeekRange;
use crate::error::Error;
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;

/// Anything that can turn a week range into a raw export file.
///
/// The production implementation is [`ExportAcquisition`]; tests substitute
/// a scripted exporter to exercise the orchestrator's failure isolation.
#[async_trait]
pub trait WeekExporter: Send {
    async fn export_week(&mut self, week: &WeekRange) -> Result<PathBuf>;
}

/// Try one candidate locator: click attempts every 300ms until the window
/// closes. Evaluation errors count as a miss; the page may still be
/// settling.
async fn attempt_candidate(
    driver: &mut dyn AdminDriver,
    locator: &Locator,
    window_ms: u64,
) -> bool {
    let js = click_js(locator);
    let deadline = Instant::now() + Duration::from_millis(window_ms);
    loop {
        if let Ok(value) = driver.eval(&js).await {
            let clicked = value
                .as_object()
                .and_then(|o| o.get("success"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            if clicked {
                return true;
            }
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
}

/// Run one fallback chain: candidates in table order, each bounded by
/// `candidate_ms`, the whole step bounded by `step_ms`.
pub async fn run_step(
    driver: &mut dyn AdminDriver,
    step: &StepSpec,
    candidate_ms: u64,
    step_ms: u64,
) -> Result<(), Error> {
    let step_deadline = Instant::now() + Duration::from_millis(step_ms);

    for locator in step.candidates {
        let now = Instant::now();
        if now >= step_deadline {
            break;
        }
        let remaining = (step_deadline - now).as_millis() as u64;
        let window = candidate_ms.min(remaining);

        if attempt_candidate(driver, locator, window).await {
            tracing::debug!("step '{}' advanced via {:?}", step.name, locator);
            return Ok(());
        }
        tracing::debug!("step '{}': candidate {:?} missed", step.name, locator);
    }

    Err(Error::UiElementNotFound {
        step: step.name,
        candidates: step.candidates.len(),
    })
}
