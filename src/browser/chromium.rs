//! Chromium implementation of the admin driver, via chromiumoxide.

use super::AdminDriver;
use crate::error::Error;
use crate::session::SessionCookie;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. CHANWEEK_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("CHANWEEK_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.chanweek/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".chanweek/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".chanweek/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".chanweek/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".chanweek/chromium/chrome-linux64/chrome"),
                home.join(".chanweek/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// One Chromium browser with a single page, driven for the whole run.
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
}

impl ChromiumDriver {
    /// Launch Chromium and open the single page the run will use.
    pub async fn launch(headless: bool) -> Result<Self> {
        let chrome_path = find_chromium()
            .context("Chromium not found. Set CHANWEEK_CHROMIUM_PATH or install Chrome.")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");
        if headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Drain CDP events for the lifetime of the browser.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;

        Ok(Self { browser, page })
    }
}

#[async_trait]
impl AdminDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()> {
        let result = tokio::time::timeout(
            std::time::Duration::from_millis(timeout_ms),
            self.page.goto(url),
        )
        .await;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;
                Ok(())
            }
            Ok(Err(e)) => Err(anyhow::anyhow!("navigation failed: {e}")),
            Err(_) => Err(Error::NavigationTimeout {
                url: url.to_string(),
                timeout_ms,
            }
            .into()),
        }
    }

    async fn eval(&mut self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS evaluation failed")?;
        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn current_url(&mut self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn cookies(&mut self) -> Result<Vec<SessionCookie>> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .context("failed to read cookies")?;
        Ok(cookies
            .into_iter()
            .map(|c| SessionCookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                secure: c.secure,
                http_only: c.http_only,
            })
            .collect())
    }

    async fn restore_cookies(&mut self, cookies: &[SessionCookie]) -> Result<()> {
        let mut params = Vec::with_capacity(cookies.len());
        for c in cookies {
            let param = CookieParam::builder()
                .name(&c.name)
                .value(&c.value)
                .domain(&c.domain)
                .path(&c.path)
                .secure(c.secure)
                .http_only(c.http_only)
                .build()
                .map_err(|e| anyhow::anyhow!("invalid cookie '{}': {e}", c.name))?;
            params.push(param);
        }
        self.page
            .set_cookies(params)
            .await
            .context("failed to restore cookies")?;
        Ok(())
    }

    async fn prepare_downloads(&mut self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create download dir: {}", dir.display()))?;
        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(dir.to_string_lossy().to_string())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build download params: {e}"))?;
        self.page
            .execute(params)
            .await
            .context("failed to set download behavior")?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let _ = self.page.close().await;
        let mut browser = self.browser;
        let _ = browser.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_navigate_and_eval() {
        let mut driver = ChromiumDriver::launch(true)
            .await
            .expect("failed to launch driver");

        driver
            .navigate("data:text/html,<h1>Hello</h1><button>Export</button>", 10_000)
            .await
            .expect("navigation failed");

        let result = driver
            .eval("document.querySelector('h1').textContent")
            .await
            .expect("eval failed");
        assert_eq!(result.as_str().unwrap(), "Hello");

        let probe = driver
            .eval("!!document.querySelector('button')")
            .await
            .expect("probe failed");
        assert_eq!(probe.as_bool(), Some(true));

        Box::new(driver).close().await.expect("close failed");
    }
}
