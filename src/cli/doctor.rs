//! Environment readiness check.

use crate::browser::chromium::find_chromium;
use crate::session::SessionStore;
use anyhow::Result;
use std::path::PathBuf;

/// Check Chromium availability, session state, and artifact paths.
pub fn run() -> Result<()> {
    println!("Chanweek Doctor");
    println!("===============");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    // Chromium
    let chromium = find_chromium();
    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Set CHANWEEK_CHROMIUM_PATH or install Chrome."
        ),
    }

    // Session state
    let store = match std::env::var("CHANWEEK_SESSION_FILE") {
        Ok(p) => SessionStore::new(PathBuf::from(p)),
        Err(_) => SessionStore::default_store(),
    };
    match store.load() {
        Ok(Some(state)) => {
            let age = state
                .saved_at
                .map(|t| format!("saved {}", t.format("%Y-%m-%d %H:%M UTC")))
                .unwrap_or_else(|| "age unknown".to_string());
            println!(
                "[OK] Session file: {} ({} cookies, {age})",
                store.path().display(),
                state.cookies.len()
            );
        }
        Ok(None) => println!(
            "[??] No usable session at {} — first run will need a login",
            store.path().display()
        ),
        Err(e) => println!("[!!] Session file unreadable: {e}"),
    }

    // Download dir
    let download_dir = std::env::var("DOWNLOAD_DIR").unwrap_or_else(|_| "./downloads".into());
    let dir = PathBuf::from(&download_dir);
    if dir.exists() || std::fs::create_dir_all(&dir).is_ok() {
        println!("[OK] Download dir writable: {}", dir.display());
    } else {
        println!("[!!] Cannot create download dir: {}", dir.display());
    }

    // Sheets token
    let token = std::env::var("SHEETS_TOKEN").is_ok() || std::env::var("SHEETS_TOKEN_FILE").is_ok();
    if token {
        println!("[OK] Sheets token configured");
    } else {
        println!("[??] No sheets token — summary rows stay local");
    }

    println!();
    if chromium.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}
