/// File-based index for Unity projects.
///
/// Every imported asset has a `<asset>.meta` sidecar carrying a `guid:`
/// line. Text-serialised assets (scenes, prefabs, materials, ...) refer to
/// other assets by writing that guid, e.g.
/// `m_Texture: {fileID: 2800000, guid: 0f1e..., type: 3}`; assembly
/// definitions use `"GUID:0f1e..."`. Scanning both gives a reference graph
/// without running the editor.
///
/// Project settings (`ProjectSettings/*.asset`) are scanned as referrers
/// too, so scenes listed in the build settings and assets wired into
/// graphics or input settings always have a dependent.
///
/// Binary-serialised assets are not parsed; references held only in them
/// are invisible to this index.
use super::{collect_dependents, AssetIndex, ObjectRef};
use crate::error::IndexError;
use crate::model::AssetPath;
use crate::walker::{FsWalker, SkippedEntry};
use crate::warning::Warning;
use compact_str::CompactString;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Extensions of assets Unity stores as YAML (or JSON) text when the
/// project uses "Force Text" serialisation.
const TEXT_ASSET_EXTENSIONS: &[&str] = &[
    "unity",
    "prefab",
    "asset",
    "mat",
    "controller",
    "overrideController",
    "anim",
    "mask",
    "playable",
    "spriteatlas",
    "physicMaterial",
    "physicsMaterial2D",
    "shadergraph",
    "shadersubgraph",
    "lighting",
    "mixer",
    "guiskin",
    "fontsettings",
    "flare",
    "brush",
    "terrainlayer",
    "signal",
    "preset",
    "asmdef",
    "asmref",
];

const GUID_LEN: usize = 32;

/// Project-level settings directory, a sibling of the asset root.
const SETTINGS_ROOT: &str = "ProjectSettings";

#[derive(Debug)]
pub struct UnityProjectIndex {
    walker: FsWalker,
    asset_root: AssetPath,
    sidecar_extension: String,
    guids: HashMap<CompactString, AssetPath>,
    /// asset → assets it references, in first-seen order.
    forward: HashMap<AssetPath, Vec<AssetPath>>,
    /// asset → assets referencing it.
    reverse: HashMap<AssetPath, Vec<AssetPath>>,
    built: bool,
    /// Files skipped during the last build.
    unreadable: Vec<SkippedEntry>,
}

impl UnityProjectIndex {
    /// Create an index over `asset_root` below `project_root`.
    ///
    /// The index is empty until [`AssetIndex::refresh`] is called; queries
    /// before that fail with [`IndexError::StaleOrUnavailable`].
    pub fn new(
        project_root: impl Into<PathBuf>,
        asset_root: AssetPath,
        sidecar_extension: &str,
    ) -> Self {
        Self {
            walker: FsWalker::new(project_root),
            asset_root,
            sidecar_extension: sidecar_extension.to_string(),
            guids: HashMap::new(),
            forward: HashMap::new(),
            reverse: HashMap::new(),
            built: false,
            unreadable: Vec::new(),
        }
    }

    /// Convenience: create and build in one step.
    pub fn open(
        project_root: impl Into<PathBuf>,
        asset_root: AssetPath,
        sidecar_extension: &str,
    ) -> Result<Self, IndexError> {
        let mut index = Self::new(project_root, asset_root, sidecar_extension);
        index.refresh()?;
        Ok(index)
    }

    pub fn guid_count(&self) -> usize {
        self.guids.len()
    }

    /// Files that could not be read during the last build.
    pub fn read_errors(&self) -> usize {
        self.unreadable.len()
    }

    /// Assets referenced by `path`, in first-seen order.
    pub fn references_of(&self, path: &AssetPath) -> &[AssetPath] {
        self.forward.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Script guid → class name, taken from the file stem of each `.cs`
    /// asset. Unity requires the two to match for MonoBehaviours.
    pub fn script_names(&self) -> HashMap<CompactString, String> {
        self.guids
            .iter()
            .filter(|(_, path)| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("cs")))
            .map(|(guid, path)| {
                let name = path.file_name();
                let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
                (guid.clone(), stem.to_string())
            })
            .collect()
    }

    fn rebuild(&mut self) -> Result<(), IndexError> {
        self.guids.clear();
        self.forward.clear();
        self.reverse.clear();
        self.unreadable.clear();

        let listing = self
            .walker
            .list_files(&self.asset_root)
            .map_err(|err| IndexError::Io {
                path: self.asset_root.to_string(),
                message: err.to_string(),
            })?;
        self.unreadable.extend(listing.skipped);

        // Pass 1: guid table from sidecars.
        let extension = self.sidecar_extension.clone();
        for file in listing.entries.iter().filter(|f| f.is_sidecar(&extension)) {
            let Some(text) = self.read_text(file) else {
                continue;
            };
            match parse_meta_guid(&text) {
                Some(guid) => {
                    self.guids.insert(guid, strip_sidecar(file, &extension));
                }
                None => debug!("no guid in {file}"),
            }
        }

        // Pass 2: references from text assets and project settings.
        let mut referrers: Vec<AssetPath> = listing
            .entries
            .into_iter()
            .filter(is_text_asset)
            .collect();
        referrers.extend(self.settings_files());
        for file in &referrers {
            let Some(text) = self.read_text(file) else {
                continue;
            };
            if !looks_serialised(file, &text) {
                continue;
            }
            for guid in parse_guid_references(&text) {
                let Some(target) = self.guids.get(&guid).cloned() else {
                    continue;
                };
                if target == *file {
                    continue;
                }
                let targets = self.forward.entry(file.clone()).or_default();
                if targets.contains(&target) {
                    continue;
                }
                targets.push(target.clone());
                self.reverse.entry(target).or_default().push(file.clone());
            }
        }

        self.built = true;
        info!(
            guids = self.guids.len(),
            referrers = self.forward.len(),
            read_errors = self.unreadable.len(),
            "asset index built"
        );
        Ok(())
    }

    /// `ProjectSettings/*.asset`, or nothing when the project has no
    /// settings directory.
    fn settings_files(&mut self) -> Vec<AssetPath> {
        let settings = AssetPath::new(SETTINGS_ROOT);
        if !self.walker.is_directory(&settings) {
            return Vec::new();
        }
        match self.walker.list_files(&settings) {
            Ok(listing) => {
                self.unreadable.extend(listing.skipped);
                listing
                    .entries
                    .into_iter()
                    .filter(|f| f.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("asset")))
                    .collect()
            }
            Err(err) => {
                warn!("skipping {SETTINGS_ROOT}: {err}");
                self.unreadable.push(SkippedEntry {
                    path: SETTINGS_ROOT.to_string(),
                    message: err.to_string(),
                });
                Vec::new()
            }
        }
    }

    fn read_text(&mut self, file: &AssetPath) -> Option<String> {
        let path = file.to_fs_path(self.walker.project_root());
        match std::fs::read(&path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) => {
                warn!("skipping unreadable asset {file}: {err}");
                self.unreadable.push(SkippedEntry {
                    path: file.to_string(),
                    message: err.to_string(),
                });
                None
            }
        }
    }
}

impl AssetIndex for UnityProjectIndex {
    fn dependents_of(
        &self,
        path: &AssetPath,
        transitive: bool,
    ) -> Result<Vec<AssetPath>, IndexError> {
        if !self.built {
            return Err(IndexError::StaleOrUnavailable(path.clone()));
        }
        Ok(collect_dependents(&self.reverse, path, transitive))
    }

    fn asset_path_of(&self, reference: &ObjectRef) -> Option<AssetPath> {
        self.guids.get(&reference.guid).cloned()
    }

    fn refresh(&mut self) -> Result<(), IndexError> {
        self.built = false;
        self.rebuild()
    }

    fn warnings(&self) -> Vec<Warning> {
        self.unreadable
            .iter()
            .map(|entry| Warning::IndexIncomplete {
                path: entry.path.clone(),
                message: entry.message.clone(),
            })
            .collect()
    }
}

fn is_text_asset(path: &AssetPath) -> bool {
    path.extension()
        .is_some_and(|ext| TEXT_ASSET_EXTENSIONS.iter().any(|t| t.eq_ignore_ascii_case(ext)))
}

/// YAML assets start with a `%YAML` directive; assembly definitions are JSON.
fn looks_serialised(path: &AssetPath, text: &str) -> bool {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("asmdef") || ext.eq_ignore_ascii_case("asmref"));
    is_json || text.trim_start().starts_with("%YAML")
}

fn strip_sidecar(sidecar: &AssetPath, extension: &str) -> AssetPath {
    let s = sidecar.as_str();
    let cut = s.len() - extension.len() - 1;
    AssetPath::new(&s[..cut])
}

/// The asset's own guid: the top-level `guid:` line of a sidecar.
pub fn parse_meta_guid(text: &str) -> Option<CompactString> {
    text.lines().find_map(|line| {
        let rest = line.strip_prefix("guid:")?;
        let guid = rest.trim();
        is_guid(guid).then(|| CompactString::new(guid))
    })
}

/// Every guid mentioned in a serialised asset, in order, duplicates kept.
///
/// Recognises `guid: <hex>` (YAML) and `GUID:<hex>` (assembly definitions).
pub fn parse_guid_references(text: &str) -> Vec<CompactString> {
    let mut out = Vec::new();
    for marker in ["guid:", "GUID:"] {
        let mut rest = text;
        while let Some(pos) = rest.find(marker) {
            rest = &rest[pos + marker.len()..];
            let candidate = rest.trim_start_matches(' ');
            let bytes = candidate.as_bytes();
            // Checked on bytes first so the slice below lands on a char boundary.
            if bytes.len() >= GUID_LEN && bytes[..GUID_LEN].iter().all(u8::is_ascii_hexdigit) {
                let boundary = bytes
                    .get(GUID_LEN)
                    .is_none_or(|b| !b.is_ascii_hexdigit());
                if boundary {
                    out.push(CompactString::new(&candidate[..GUID_LEN]));
                }
            }
        }
    }
    out
}

fn is_guid(s: &str) -> bool {
    s.len() == GUID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}
