/// Append-only CSV record of deletion attempts.
///
/// Columns: `timestamp,action,path,size_bytes,outcome,detail`. The header
/// is written once when the file is created; later runs append rows.
use crate::error::{Error, Result};
use crate::model::AssetPath;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Delete,
    DeleteAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Deleted,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub action: AuditAction,
    pub path: AssetPath,
    pub size_bytes: u64,
    pub outcome: AuditOutcome,
    pub detail: String,
}

impl AuditRecord {
    pub fn new(
        action: AuditAction,
        path: &AssetPath,
        size_bytes: u64,
        outcome: AuditOutcome,
        detail: impl Into<String>,
    ) -> Self {
        Self::at(Utc::now(), action, path, size_bytes, outcome, detail)
    }

    pub fn at(
        time: DateTime<Utc>,
        action: AuditAction,
        path: &AssetPath,
        size_bytes: u64,
        outcome: AuditOutcome,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: time.to_rfc3339_opts(SecondsFormat::Secs, true),
            action,
            path: path.clone(),
            size_bytes,
            outcome,
            detail: detail.into(),
        }
    }
}

pub struct AuditLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl AuditLog {
    /// Open `path` for appending, creating it (with a header row) if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let is_new = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| Error::io(path, err))?;
        let writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        debug!(path = %path.display(), is_new, "audit log opened");
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one row and flush it to disk.
    pub fn record(&mut self, record: &AuditRecord) -> Result<()> {
        self.writer
            .serialize(record)
            .map_err(|err| Error::Audit(format!("{}: {err}", self.path.display())))?;
        self.writer
            .flush()
            .map_err(|err| Error::Audit(format!("{}: {err}", self.path.display())))
    }
}
