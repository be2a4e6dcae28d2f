/// Unbloat Core: asset usage analysis, reference checks and removal.
///
/// This crate contains all business logic with zero UI dependencies.
/// Frontends drive a [`Coordinator`] and supply its collaborators
/// (dependency index, scene host, prompts, storage) as trait objects.
///
/// # Modules
///
/// - [`model`]: Asset paths, removal candidates and size accounting.
/// - [`walker`]: Filesystem enumeration and sizes.
/// - [`index`]: Dependency index port plus in-memory and Unity adapters.
/// - [`classifier`]: Per-directory usage classification.
/// - [`scenes`]: Scene graphs, scene hosts and the confirmatory reference scan.
/// - [`deletion`]: Directory removal and deletion reports.
/// - [`coordinator`]: The analysis session that owns the candidate set.
pub mod audit;
pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod deletion;
pub mod error;
pub mod index;
pub mod model;
pub mod progress;
pub mod prompt;
pub mod scenes;
pub mod walker;
pub mod warning;

pub use config::AnalysisConfig;
pub use coordinator::{AnalysisReport, Coordinator, Ports};
pub use deletion::{DeletionReport, LocalStorage, Storage};
pub use error::{Error, IndexError, Result, SceneError};
pub use index::{AssetIndex, ObjectRef};
pub use model::{AssetPath, DirectoryCandidate};
pub use prompt::Prompt;
pub use scenes::{ReferenceCheck, SceneCatalog, SceneHost};
pub use warning::Warning;
