//! Durable client-side pointer to the active remote dataset session.
//!
//! The refinery service keeps uploaded datasets for 24 hours; this module
//! keeps the matching client-side record `{upload result, session id,
//! timestamp}` as a single JSON file under the app data directory and
//! enforces the same retention window on load. Its absence means there is
//! nothing to preview or export, so callers route the user back to the
//! upload step.

use crate::api::UploadResponse;
use crate::error::{Result, ResultExt as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the session record (the fixed storage key).
pub const SESSION_STORAGE_KEY: &str = "prima_active_session.json";

/// Retention window measured from the record's timestamp.
pub const SESSION_RETENTION_HOURS: i64 = 24;

/// The persisted record: the upload result plus a creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub status: String,
    pub rows_processed: u64,
    pub session_id: String,
    pub message: String,

    /// Milliseconds since the epoch; drives the 24-hour expiry.
    #[serde(rename = "_timestamp")]
    pub timestamp_ms: i64,
}

impl SessionRecord {
    /// Build a record from an upload response, stamped with the current
    /// time.
    pub fn from_upload(upload: &UploadResponse) -> Self {
        Self {
            status: upload.status.clone(),
            rows_processed: upload.rows_processed,
            session_id: upload.session_id.clone(),
            message: upload.message.clone(),
            timestamp_ms: Utc::now().timestamp_millis(),
        }
    }

    fn is_expired(&self, now_ms: i64) -> bool {
        let retention_ms = SESSION_RETENTION_HOURS * 60 * 60 * 1000;
        now_ms - self.timestamp_ms > retention_ms
    }
}

/// File-backed store holding at most one [`SessionRecord`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// A store at an explicit path (tests and embedders).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store at the platform-standard location.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(crate::config::base_dir()?.join(SESSION_STORAGE_KEY)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the upload result with a current timestamp, replacing any
    /// previous record.
    pub fn save(&self, upload: &UploadResponse) -> Result<SessionRecord> {
        let record = SessionRecord::from_upload(upload);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&record)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write session record to {}", self.path.display()))?;
        Ok(record)
    }

    /// Return the record if present and within the retention window.
    ///
    /// Expired and unparseable records are evicted (the file is removed)
    /// and reported as absent.
    pub fn load(&self) -> Option<SessionRecord> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let record: SessionRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("evicting unreadable session record: {e}");
                self.evict();
                return None;
            }
        };

        if record.is_expired(Utc::now().timestamp_millis()) {
            tracing::info!(session_id = %record.session_id, "session expired, evicting");
            self.evict();
            return None;
        }

        Some(record)
    }

    /// Remove the record unconditionally.
    pub fn clear(&self) {
        self.evict();
    }

    fn evict(&self) {
        if self.path.exists()
            && let Err(e) = std::fs::remove_file(&self.path)
        {
            tracing::warn!("failed to remove session record: {e}");
        }
    }
}
