/// Analysis configuration.
///
/// Read from `unbloat.json` in the project root when present; every field
/// has a default so an empty object (or no file at all) is valid.
use crate::error::{Error, Result};
use crate::model::AssetPath;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "unbloat.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Directory (relative to the project root) whose subdirectories are analysed.
    pub asset_root: String,
    /// Extension of the per-asset metadata sidecar files.
    pub sidecar_extension: String,
    /// Directories never reported, together with everything below them.
    pub ignored_directories: Vec<String>,
    /// Report only the outermost candidate when nested directories are all unused.
    pub collapse_nested: bool,
    /// Append a CSV row here for every deletion attempt.
    pub audit_log: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            asset_root: "Assets".to_string(),
            sidecar_extension: "meta".to_string(),
            ignored_directories: Vec::new(),
            collapse_nested: false,
            audit_log: None,
        }
    }
}

impl AnalysisConfig {
    /// Load `unbloat.json` from `project_root`, falling back to defaults
    /// when the file does not exist.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE_NAME);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no {CONFIG_FILE_NAME} in {}, using defaults", project_root.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(Error::io(path, err)),
        };
        Self::from_json(&text).map_err(|message| Error::Config { path, message })
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    pub fn asset_root(&self) -> AssetPath {
        AssetPath::new(&self.asset_root)
    }

    /// `true` if `path` is one of the ignored directories or lies below one.
    pub fn is_ignored(&self, path: &AssetPath) -> bool {
        self.ignored_directories
            .iter()
            .any(|dir| path.is_within(&AssetPath::new(dir)))
    }
}
