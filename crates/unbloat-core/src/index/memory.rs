/// In-memory asset index with explicit reference edges.
use super::{collect_dependents, AssetIndex, ObjectRef};
use crate::error::IndexError;
use crate::model::AssetPath;
use crate::warning::Warning;
use compact_str::CompactString;
use std::cell::Cell;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct MemoryAssetIndex {
    /// target → assets that reference it directly.
    reverse: HashMap<AssetPath, Vec<AssetPath>>,
    guids: HashMap<CompactString, AssetPath>,
    unavailable: HashSet<AssetPath>,
    /// Files the index pretends it could not read while building.
    incomplete: Vec<Warning>,
    /// Report the queried asset among its own dependents, as some asset
    /// databases do.
    self_reporting: bool,
    queries: Cell<usize>,
    refreshes: usize,
}

impl MemoryAssetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include the queried path in every `dependents_of` result.
    pub fn with_self_reporting(mut self) -> Self {
        self.self_reporting = true;
        self
    }

    /// Record that `from` references `to`.
    pub fn add_reference(&mut self, from: &str, to: &str) {
        let from = AssetPath::new(from);
        let list = self.reverse.entry(AssetPath::new(to)).or_default();
        if !list.contains(&from) {
            list.push(from);
        }
    }

    /// Map `guid` to the asset at `path`.
    pub fn register_guid(&mut self, guid: &str, path: &str) {
        self.guids
            .insert(CompactString::new(guid), AssetPath::new(path));
    }

    /// Make lookups for `path` fail as if the index had no data for it.
    pub fn mark_unavailable(&mut self, path: &str) {
        self.unavailable.insert(AssetPath::new(path));
    }

    /// Report `path` as skipped while the index was built.
    pub fn mark_incomplete(&mut self, path: &str, message: &str) {
        self.incomplete.push(Warning::IndexIncomplete {
            path: path.to_string(),
            message: message.to_string(),
        });
    }

    /// Number of `dependents_of` calls served so far.
    pub fn query_count(&self) -> usize {
        self.queries.get()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }
}

impl AssetIndex for MemoryAssetIndex {
    fn dependents_of(
        &self,
        path: &AssetPath,
        transitive: bool,
    ) -> Result<Vec<AssetPath>, IndexError> {
        self.queries.set(self.queries.get() + 1);
        if self.unavailable.contains(path) {
            return Err(IndexError::StaleOrUnavailable(path.clone()));
        }
        let mut deps = collect_dependents(&self.reverse, path, transitive);
        if self.self_reporting {
            deps.insert(0, path.clone());
        }
        Ok(deps)
    }

    fn asset_path_of(&self, reference: &ObjectRef) -> Option<AssetPath> {
        self.guids.get(&reference.guid).cloned()
    }

    fn refresh(&mut self) -> Result<(), IndexError> {
        self.refreshes += 1;
        Ok(())
    }

    fn warnings(&self) -> Vec<Warning> {
        self.incomplete.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_reporting_prepends_queried_path() {
        let mut index = MemoryAssetIndex::new().with_self_reporting();
        index.add_reference("Assets/Scene.unity", "Assets/Foo/a.png");
        let deps = index
            .dependents_of(&AssetPath::new("Assets/Foo/a.png"), true)
            .unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].as_str(), "Assets/Foo/a.png");
    }

    #[test]
    fn unavailable_paths_error() {
        let mut index = MemoryAssetIndex::new();
        index.mark_unavailable("Assets/new.png");
        assert_eq!(
            index.dependents_of(&AssetPath::new("Assets/new.png"), true),
            Err(IndexError::StaleOrUnavailable(AssetPath::new("Assets/new.png")))
        );
        assert_eq!(index.query_count(), 1);
    }

    #[test]
    fn guid_lookup() {
        let mut index = MemoryAssetIndex::new();
        index.register_guid("abc", "Assets/Foo/a.png");
        assert_eq!(
            index.asset_path_of(&ObjectRef::new("abc", 2800000)),
            Some(AssetPath::new("Assets/Foo/a.png"))
        );
        assert_eq!(index.asset_path_of(&ObjectRef::new("zzz", 0)), None);
    }
}
