// Copyright 2026 Chanweek Contributors
// SPDX-License-Identifier: Apache-2.0

//! Persisted authenticated-session state.
//!
//! The admin login survives across runs as a JSON blob of cookies plus the
//! admin origin's localStorage. The file is read whole once at run start and
//! written whole at most once per run, immediately after a fresh login.
//! Expiry is detected (a restored session that no longer reaches the admin
//! UI), never predicted.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One browser cookie, reduced to the fields needed to restore a login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
}

/// The whole persisted session: cookies plus admin-origin localStorage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub saved_at: Option<DateTime<Utc>>,
    pub cookies: Vec<SessionCookie>,
    #[serde(default)]
    pub local_storage: Vec<(String, String)>,
}

impl SessionState {
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// Filesystem home of a [`SessionState`].
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default store at `~/.chanweek/session.json`.
    pub fn default_store() -> Self {
        let path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".chanweek")
            .join("session.json");
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted session, if one exists.
    ///
    /// A corrupt file is treated as absent (the run falls back to a fresh
    /// login) rather than aborting: the file is a cache, not a record.
    pub fn load(&self) -> Result<Option<SessionState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read session file: {}", self.path.display()))?;
        match serde_json::from_str::<SessionState>(&data) {
            Ok(state) if !state.is_empty() => Ok(Some(state)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!(
                    "session file {} is unreadable ({e}); starting unauthenticated",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }

    /// Overwrite the stored session with a freshly captured one.
    pub fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write session file: {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> SessionState {
        SessionState {
            saved_at: Some(Utc::now()),
            cookies: vec![SessionCookie {
                name: "_session".into(),
                value: "abc123".into(),
                domain: ".admin.example.com".into(),
                path: "/".into(),
                secure: true,
                http_only: true,
            }],
            local_storage: vec![("theme".into(), "dark".into())],
        }
    }

    #[test]
    fn test_load_absent_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested/session.json"));

        store.save(&sample_state()).unwrap();
        let loaded = store.load().unwrap().expect("state should load");
        assert_eq!(loaded.cookies.len(), 1);
        assert_eq!(loaded.cookies[0].name, "_session");
        assert_eq!(loaded.local_storage, vec![("theme".into(), "dark".into())]);
    }

    #[test]
    fn test_corrupt_file_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = SessionStore::new(&path);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_empty_state_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&SessionState::default()).unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
