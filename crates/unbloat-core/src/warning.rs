/// Non-fatal problems surfaced alongside results.
use crate::model::AssetPath;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A file or directory could not be read during a walk.
    UnreadableEntry { path: String, message: String },
    /// The index could not read a file while building; anything referenced
    /// only through it may look unused.
    IndexIncomplete { path: String, message: String },
    /// The index had no usable data for a file; it was treated as used.
    IndexUnavailable { path: AssetPath, message: String },
    /// A scene could not be opened and was left out of a reference check.
    SceneOpenFailure { scene: AssetPath, reason: String },
    /// The directory was deleted but its sidecar file was not.
    SidecarNotRemoved { path: AssetPath, message: String },
    /// The size measured at deletion differs from the size recorded at analysis.
    SizeMismatch {
        path: AssetPath,
        recorded: u64,
        measured: u64,
    },
    /// The index could not be refreshed after a structural change.
    RefreshFailed { message: String },
    /// A deletion happened but its audit row could not be written.
    AuditWriteFailed { message: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreadableEntry { path, message } => write!(f, "unreadable {path}: {message}"),
            Self::IndexIncomplete { path, message } => {
                write!(f, "index skipped {path} ({message}); its references are unknown")
            }
            Self::IndexUnavailable { path, message } => {
                write!(f, "no index data for {path} ({message}); treated as used")
            }
            Self::SceneOpenFailure { scene, reason } => {
                write!(f, "scene {scene} skipped: {reason}")
            }
            Self::SidecarNotRemoved { path, message } => {
                write!(f, "{path} deleted but its metadata file was not: {message}")
            }
            Self::SizeMismatch {
                path,
                recorded,
                measured,
            } => write!(
                f,
                "{path} changed size since analysis ({recorded} -> {measured} bytes)"
            ),
            Self::RefreshFailed { message } => write!(f, "index refresh failed: {message}"),
            Self::AuditWriteFailed { message } => write!(f, "audit log not updated: {message}"),
        }
    }
}
