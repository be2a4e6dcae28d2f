/// Dependency index: the asset-metadata collaborator.
///
/// The engine never reads reference data itself; it asks an [`AssetIndex`]
/// who depends on a file and which asset an object reference points at.
/// Two implementations ship with the crate:
///
/// - [`MemoryAssetIndex`]: explicit edges, for tests and embedding.
/// - [`UnityProjectIndex`]: built from `.meta` guids and text-serialised
///   assets on disk.
pub mod memory;
pub mod unity;

pub use memory::MemoryAssetIndex;
pub use unity::UnityProjectIndex;

use crate::error::IndexError;
use crate::model::AssetPath;
use crate::warning::Warning;
use compact_str::CompactString;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// An object reference as stored in a serialised field: the guid of the
/// asset file plus the local id of the object inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectRef {
    pub guid: CompactString,
    pub file_id: i64,
}

impl ObjectRef {
    pub fn new(guid: &str, file_id: i64) -> Self {
        Self {
            guid: CompactString::new(guid),
            file_id,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{fileID: {}, guid: {}}}", self.file_id, self.guid)
    }
}

pub trait AssetIndex {
    /// Assets that reference `path`, directly or (if `transitive`) through
    /// any chain of references.
    ///
    /// Implementations may or may not include `path` itself in the result;
    /// callers must not rely on either convention.
    fn dependents_of(
        &self,
        path: &AssetPath,
        transitive: bool,
    ) -> Result<Vec<AssetPath>, IndexError>;

    /// Asset file an object reference resolves to, if known.
    fn asset_path_of(&self, reference: &ObjectRef) -> Option<AssetPath>;

    /// Re-read index data after structural changes (e.g. deletions).
    fn refresh(&mut self) -> Result<(), IndexError>;

    /// Problems met while the index was last built. Non-empty means some
    /// references may be missing from the graph.
    fn warnings(&self) -> Vec<Warning> {
        Vec::new()
    }
}

/// Breadth-first walk over a reverse-edge map.
///
/// Returns dependents in discovery order. Cycles terminate because each
/// node is visited once; `start` is never part of the result.
pub(crate) fn collect_dependents(
    reverse: &HashMap<AssetPath, Vec<AssetPath>>,
    start: &AssetPath,
    transitive: bool,
) -> Vec<AssetPath> {
    let mut seen: HashSet<&AssetPath> = HashSet::new();
    let mut out = Vec::new();
    let mut queue: VecDeque<&AssetPath> = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let Some(direct) = reverse.get(current) else {
            continue;
        };
        for dependent in direct {
            if seen.insert(dependent) {
                out.push(dependent.clone());
                if transitive {
                    queue.push_back(dependent);
                }
            }
        }
    }
    out
}
