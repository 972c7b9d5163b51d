//! Unauthenticated → Authenticated.
//!
//! Order of preference: a restored session, automated credential
//! submission, then a manual login pause. The session file is written
//! exactly once per run, immediately after a fresh login succeeds.

use super::locators::{
    fill_js, probe_js, ADMIN_MARKER, EMAIL_FIELD, LOGIN_SUBMIT, OTP_FIELD, PASSWORD_FIELD,
};
use super::{run_step, AcquisitionState};
use crate::browser::{wait_for_probe, AdminDriver};
use crate::config::Config;
use crate::error::Error;
use crate::session::{SessionState, SessionStore};
use anyhow::{Context, Result};
use chrono::Utc;

/// How the run became authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// A persisted session was restored and still works.
    Restored,
    /// A fresh login happened; the session file was (re)written.
    FreshLogin,
}

/// Window for the second-factor probe. Kept short: most logins have none.
const OTP_PROBE_MS: u64 = 8_000;

/// Window for the admin shell to appear after a login submission.
const ADMIN_SHELL_MS: u64 = 60_000;

/// Establish an authenticated admin session, reusing the stored one when it
/// still works.
pub async fn ensure_authenticated(
    driver: &mut dyn AdminDriver,
    cfg: &Config,
    store: &SessionStore,
) -> Result<AuthOutcome> {
    tracing::debug!("login: {}", AcquisitionState::Init);
    if let Some(state) = store.load()? {
        tracing::debug!("login: {}", AcquisitionState::SessionLoaded);
        tracing::info!(
            "restoring session from {} ({} cookies)",
            store.path().display(),
            state.cookies.len()
        );
        driver.restore_cookies(&state.cookies).await?;
        driver.navigate(&cfg.admin_url(), cfg.nav_timeout_ms).await?;

        if wait_for_probe(driver, &probe_js(ADMIN_MARKER), cfg.nav_timeout_ms).await {
            tracing::debug!("login: {}", AcquisitionState::Authenticated);
            return Ok(AuthOutcome::Restored);
        }
        // Expiry is detected, never predicted: the blob loaded fine but the
        // admin shell did not come up, so the session is dead upstream.
        tracing::warn!("stored session no longer reaches the admin UI; logging in fresh");
    } else {
        driver.navigate(&cfg.admin_url(), cfg.nav_timeout_ms).await?;
    }
    tracing::debug!("login: {}", AcquisitionState::Unauthenticated);

    let authenticated = if cfg.auto_login && cfg.email.is_some() && cfg.password.is_some() {
        match automated_login(driver, cfg).await {
            Ok(()) => true,
            Err(e) if !cfg.headless => {
                tracing::warn!("automated login failed ({e}); falling back to manual login");
                false
            }
            Err(e) => return Err(e),
        }
    } else {
        false
    };

    if !authenticated {
        if cfg.headless {
            return Err(Error::AuthenticationFailed(
                "no usable session, and a headless run cannot pause for manual login".into(),
            )
            .into());
        }
        manual_login_pause(driver, cfg).await?;
    }

    tracing::debug!("login: {}", AcquisitionState::Authenticated);
    let state = capture_session(driver).await?;
    store.save(&state)?;
    tracing::info!("saved session to {}", store.path().display());
    Ok(AuthOutcome::FreshLogin)
}

/// Drive the credential form: identifier, secret, optional second factor.
async fn automated_login(driver: &mut dyn AdminDriver, cfg: &Config) -> Result<()> {
    let email = cfg.email.as_deref().unwrap_or_default();
    let password = cfg.password.as_deref().unwrap_or_default();

    if !fill_field(driver, EMAIL_FIELD, email, cfg.candidate_timeout_ms).await {
        return Err(Error::AuthenticationFailed("email field never appeared".into()).into());
    }
    run_step(driver, &LOGIN_SUBMIT, cfg.candidate_timeout_ms, cfg.step_timeout_ms)
        .await
        .map_err(|_| Error::AuthenticationFailed("could not submit email form".into()))?;

    if !fill_field(driver, PASSWORD_FIELD, password, cfg.step_timeout_ms).await {
        return Err(Error::AuthenticationFailed("password field never appeared".into()).into());
    }
    run_step(driver, &LOGIN_SUBMIT, cfg.candidate_timeout_ms, cfg.step_timeout_ms)
        .await
        .map_err(|_| Error::AuthenticationFailed("could not submit password form".into()))?;

    // Second factor, when the account has one.
    if wait_for_probe(driver, &probe_js(OTP_FIELD), OTP_PROBE_MS).await {
        let code = match cfg.otp.clone() {
            Some(code) => code,
            None if !cfg.headless => prompt_line("Enter the 2FA code: ").await?,
            None => {
                return Err(Error::AuthenticationFailed(
                    "second-factor challenge with no code source".into(),
                )
                .into())
            }
        };
        fill_field(driver, OTP_FIELD, code.trim(), cfg.candidate_timeout_ms).await;
        run_step(driver, &LOGIN_SUBMIT, cfg.candidate_timeout_ms, cfg.step_timeout_ms)
            .await
            .map_err(|_| Error::AuthenticationFailed("could not submit 2FA form".into()))?;
    }

    if wait_for_probe(driver, &probe_js(ADMIN_MARKER), ADMIN_SHELL_MS).await {
        Ok(())
    } else {
        Err(Error::AuthenticationFailed("admin shell never appeared after login".into()).into())
    }
}

/// First-run human checkpoint: the one unbounded wait in the whole pipeline.
async fn manual_login_pause(driver: &mut dyn AdminDriver, cfg: &Config) -> Result<()> {
    println!();
    println!("FIRST RUN: log in to the admin in the opened browser window,");
    println!("then come back here and press Enter.");
    prompt_line("Press Enter once you are logged in... ").await?;

    if wait_for_probe(driver, &probe_js(ADMIN_MARKER), cfg.nav_timeout_ms).await {
        Ok(())
    } else {
        Err(Error::AuthenticationFailed("manual login did not reach the admin UI".into()).into())
    }
}

/// Capture cookies plus the current origin's localStorage.
async fn capture_session(driver: &mut dyn AdminDriver) -> Result<SessionState> {
    let cookies = driver.cookies().await?;
    let local_storage: Vec<(String, String)> = driver
        .eval("Object.entries(localStorage)")
        .await
        .ok()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    Ok(SessionState {
        saved_at: Some(Utc::now()),
        cookies,
        local_storage,
    })
}

/// Fill the first matching field, waiting for it to appear first.
async fn fill_field(
    driver: &mut dyn AdminDriver,
    selector: &str,
    value: &str,
    timeout_ms: u64,
) -> bool {
    if !wait_for_probe(driver, &probe_js(selector), timeout_ms).await {
        return false;
    }
    match driver.eval(&fill_js(selector, value)).await {
        Ok(v) => v
            .as_object()
            .and_then(|o| o.get("success"))
            .and_then(|s| s.as_bool())
            .unwrap_or(false),
        Err(_) => false,
    }
}

/// Read one line from stdin without blocking the runtime.
async fn prompt_line(prompt: &str) -> Result<String> {
    use std::io::Write;
    print!("{prompt}");
    std::io::stdout().flush().ok();

    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .context("failed to read from stdin")?;
        Ok(line)
    })
    .await
    .context("stdin task failed")?
}
