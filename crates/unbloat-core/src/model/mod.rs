/// Data model: asset paths, removal candidates and size accounting.
pub mod asset_path;
pub mod candidate;
pub mod size;

pub use asset_path::AssetPath;
pub use candidate::{CandidateSet, CandidateStatus, DirectoryCandidate, Resolution};
pub use size::{format_count, format_size, SizeAggregator};
