/// Error taxonomy for the analysis engine.
///
/// Only [`Error`] aborts an operation. Per-file, per-scene and per-item
/// problems are reported as warnings or failure lists inside the returned
/// results so a single bad item never stops a large scan.
use crate::model::AssetPath;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scan root does not exist or is not a directory: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("{0} is not a removal candidate")]
    UnknownCandidate(AssetPath),

    #[error("asset index error: {0}")]
    Index(#[from] IndexError),

    #[error("invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("audit log error: {0}")]
    Audit(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures of the dependency index collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The index has no data for this asset (not yet imported, or the
    /// index is mid-rebuild).
    #[error("no dependency data for {0}")]
    StaleOrUnavailable(AssetPath),

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
}

/// Per-scene failures raised by a scene host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("failed to open scene {scene}: {reason}")]
    OpenFailure { scene: AssetPath, reason: String },

    #[error("malformed scene {scene} at line {line}: {reason}")]
    Parse {
        scene: AssetPath,
        line: usize,
        reason: String,
    },
}

impl SceneError {
    pub fn scene(&self) -> &AssetPath {
        match self {
            Self::OpenFailure { scene, .. } | Self::Parse { scene, .. } => scene,
        }
    }
}
