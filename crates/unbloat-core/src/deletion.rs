/// Directory removal and per-item deletion outcomes.
///
/// Removal goes through the [`Storage`] port so frontends and tests can
/// substitute the filesystem. A directory is removed first, then its
/// sidecar metadata file; a missing sidecar is fine, a sidecar that cannot
/// be removed after the directory is gone is reported but does not undo
/// the deletion.
use crate::model::AssetPath;
use crate::walker::FsWalker;
use crate::warning::Warning;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Destructive filesystem operations.
pub trait Storage {
    fn remove_dir_all(&mut self, dir: &AssetPath) -> io::Result<()>;
    fn remove_file(&mut self, file: &AssetPath) -> io::Result<()>;
}

/// [`Storage`] backed by the real filesystem below a project root.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    project_root: PathBuf,
}

impl LocalStorage {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }
}

impl Storage for LocalStorage {
    fn remove_dir_all(&mut self, dir: &AssetPath) -> io::Result<()> {
        std::fs::remove_dir_all(dir.to_fs_path(&self.project_root))
    }

    fn remove_file(&mut self, file: &AssetPath) -> io::Result<()> {
        std::fs::remove_file(file.to_fs_path(&self.project_root))
    }
}

/// A directory removed from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedDirectory {
    pub path: AssetPath,
    /// Size recorded at analysis time; this is what the total drops by.
    pub size_bytes: u64,
    /// Candidates below this directory that went with it.
    pub nested: Vec<AssetPath>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionFailure {
    pub path: AssetPath,
    pub reason: String,
}

/// Outcome of a delete or delete-all request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub deleted: Vec<DeletedDirectory>,
    pub failed: Vec<DeletionFailure>,
    pub warnings: Vec<Warning>,
    /// The user declined the confirmation; nothing was attempted.
    pub declined: bool,
    /// Stopped before every candidate was attempted.
    pub cancelled: bool,
}

impl DeletionReport {
    pub fn declined() -> Self {
        Self {
            declined: true,
            ..Self::default()
        }
    }

    pub fn bytes_freed(&self) -> u64 {
        self.deleted.iter().map(|d| d.size_bytes).sum()
    }

    pub fn is_complete(&self) -> bool {
        !self.declined && !self.cancelled && self.failed.is_empty()
    }
}

/// What happened to a directory's sidecar file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidecarOutcome {
    Removed,
    Missing,
    Failed(String),
}

/// A successful removal as seen on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// Bytes found below the directory just before it was removed.
    pub measured_bytes: u64,
    pub sidecar: SidecarOutcome,
}

impl Removal {
    /// Warnings to surface for this removal, given the size recorded at analysis.
    pub fn warnings(&self, path: &AssetPath, recorded: u64, sidecar_path: &AssetPath) -> Vec<Warning> {
        let mut out = Vec::new();
        if self.measured_bytes != recorded {
            out.push(Warning::SizeMismatch {
                path: path.clone(),
                recorded,
                measured: self.measured_bytes,
            });
        }
        if let SidecarOutcome::Failed(message) = &self.sidecar {
            out.push(Warning::SidecarNotRemoved {
                path: sidecar_path.clone(),
                message: message.clone(),
            });
        }
        out
    }
}

/// Measure, then remove `dir` and its sidecar.
///
/// Returns the failure reason when the directory itself could not be
/// measured or removed; in that case nothing was deleted.
pub fn remove_directory(
    storage: &mut dyn Storage,
    walker: &FsWalker,
    dir: &AssetPath,
    sidecar_extension: &str,
) -> Result<Removal, String> {
    let measured_bytes = walker.directory_size(dir).map_err(|err| err.to_string())?;
    storage
        .remove_dir_all(dir)
        .map_err(|err| format!("failed to remove directory: {err}"))?;

    let sidecar_path = dir.sidecar(sidecar_extension);
    let sidecar = match storage.remove_file(&sidecar_path) {
        Ok(()) => SidecarOutcome::Removed,
        Err(err) if err.kind() == io::ErrorKind::NotFound => SidecarOutcome::Missing,
        Err(err) => {
            warn!("{dir} removed but {sidecar_path} was not: {err}");
            SidecarOutcome::Failed(err.to_string())
        }
    };
    debug!(%dir, measured_bytes, ?sidecar, "directory removed");
    Ok(Removal {
        measured_bytes,
        sidecar,
    })
}
