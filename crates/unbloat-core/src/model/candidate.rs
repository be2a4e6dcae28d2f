/// Removal candidates and the size total that must always agree with them.
///
/// [`CandidateSet`] is the only place where the candidate list and
/// [`SizeAggregator`] are mutated, and every mutation updates both in the
/// same call. Other components describe what they want to happen as a
/// [`Resolution`] and the coordinator commits it here.
use super::asset_path::AssetPath;
use super::size::SizeAggregator;
use serde::Serialize;
use tracing::{debug, warn};

/// Lifecycle status of a directory candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    /// No references found; still eligible for removal.
    Unused,
    /// The user chose to keep it without checking.
    Skipped,
    /// A scene reference was found during the confirmatory scan.
    ConfirmedUsed,
}

/// A directory flagged as unreferenced, with the bytes it occupies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryCandidate {
    pub path: AssetPath,
    pub size_bytes: u64,
    pub status: CandidateStatus,
}

/// A proposed change to the candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Skip(AssetPath),
    ConfirmUsed(AssetPath),
    /// The directory is gone from disk.
    Deleted(AssetPath),
}

impl Resolution {
    pub fn path(&self) -> &AssetPath {
        match self {
            Self::Skip(p) | Self::ConfirmUsed(p) | Self::Deleted(p) => p,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CandidateSet {
    entries: Vec<DirectoryCandidate>,
    /// Entries that left the set through a skip or a confirmed reference.
    resolved: Vec<DirectoryCandidate>,
    total: SizeAggregator,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unused directory. Returns `false` if it is already present.
    pub fn insert(&mut self, path: AssetPath, size_bytes: u64) -> bool {
        if self.contains(&path) {
            return false;
        }
        self.total.add(size_bytes);
        self.entries.push(DirectoryCandidate {
            path,
            size_bytes,
            status: CandidateStatus::Unused,
        });
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn total_size(&self) -> u64 {
        self.total.total()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectoryCandidate> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[DirectoryCandidate] {
        &self.entries
    }

    pub fn get(&self, path: &AssetPath) -> Option<&DirectoryCandidate> {
        self.entries.iter().find(|c| &c.path == path)
    }

    pub fn contains(&self, path: &AssetPath) -> bool {
        self.get(path).is_some()
    }

    /// Snapshot of the current candidate paths, in insertion order.
    pub fn paths(&self) -> Vec<AssetPath> {
        self.entries.iter().map(|c| c.path.clone()).collect()
    }

    /// History of skipped and confirmed-used directories.
    pub fn resolved(&self) -> &[DirectoryCandidate] {
        &self.resolved
    }

    /// Commit a resolution: remove the entry and subtract its size.
    ///
    /// Returns the removed candidate, or `None` if the path was not in the
    /// set (already resolved, or never a candidate).
    pub fn apply(&mut self, resolution: &Resolution) -> Option<DirectoryCandidate> {
        let pos = self
            .entries
            .iter()
            .position(|c| &c.path == resolution.path())?;
        let mut entry = self.entries.remove(pos);
        let exact = self.total.subtract(entry.size_bytes);

        match resolution {
            Resolution::Skip(_) => {
                entry.status = CandidateStatus::Skipped;
                self.resolved.push(entry.clone());
            }
            Resolution::ConfirmUsed(_) => {
                entry.status = CandidateStatus::ConfirmedUsed;
                self.resolved.push(entry.clone());
            }
            Resolution::Deleted(_) => {}
        }
        debug!(path = %entry.path, status = ?entry.status, "candidate resolved");
        self.settle(exact);
        Some(entry)
    }

    /// Remove every candidate strictly below `dir` (used after `dir` itself
    /// was deleted from disk, taking its nested candidates with it).
    pub fn remove_nested(&mut self, dir: &AssetPath) -> Vec<DirectoryCandidate> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if entry.path != *dir && entry.path.is_within(dir) {
                removed.push(entry);
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;
        let mut exact = true;
        for entry in &removed {
            exact &= self.total.subtract(entry.size_bytes);
        }
        self.settle(exact);
        removed
    }

    /// Drop all candidates and history.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.resolved.clear();
        self.total.reset();
    }

    /// `true` if the running total equals the sum of the entries.
    pub fn is_consistent(&self) -> bool {
        self.total.total() == self.sum_of_entries()
    }

    /// After a subtraction: recompute the total from the entries when the
    /// subtraction clamped or the running total no longer matches them
    /// (a saturated sum).
    fn settle(&mut self, exact: bool) {
        if !exact || !self.is_consistent() {
            let before = self.total.total();
            let after = self.total.recompute(self.entries.iter().map(|c| c.size_bytes));
            warn!(before, after, "candidate size total drifted; recomputed");
        }
        self.debug_check();
    }

    fn sum_of_entries(&self) -> u64 {
        self.entries
            .iter()
            .map(|c| c.size_bytes)
            .fold(0u64, u64::saturating_add)
    }

    #[inline]
    fn debug_check(&self) {
        debug_assert!(
            self.is_consistent(),
            "candidate total {} != sum of entries {}",
            self.total.total(),
            self.sum_of_entries()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(items: &[(&str, u64)]) -> CandidateSet {
        let mut set = CandidateSet::new();
        for (path, size) in items {
            set.insert(AssetPath::new(path), *size);
        }
        set
    }

    #[test]
    fn insert_tracks_total() {
        let set = set_of(&[("Assets/A", 10), ("Assets/B", 32)]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.total_size(), 42);
        assert!(set.is_consistent());
    }

    #[test]
    fn duplicate_insert_is_ignored() {
        let mut set = set_of(&[("Assets/A", 10)]);
        assert!(!set.insert(AssetPath::new("Assets/A"), 99));
        assert_eq!(set.total_size(), 10);
    }

    #[test]
    fn skip_moves_entry_to_history() {
        let mut set = set_of(&[("Assets/A", 10), ("Assets/B", 32)]);
        let removed = set
            .apply(&Resolution::Skip(AssetPath::new("Assets/A")))
            .unwrap();
        assert_eq!(removed.status, CandidateStatus::Skipped);
        assert_eq!(set.total_size(), 32);
        assert_eq!(set.resolved().len(), 1);
        assert!(set.is_consistent());
    }

    #[test]
    fn confirm_used_marks_history() {
        let mut set = set_of(&[("Assets/A", 10)]);
        set.apply(&Resolution::ConfirmUsed(AssetPath::new("Assets/A")));
        assert!(set.is_empty());
        assert_eq!(set.total_size(), 0);
        assert_eq!(set.resolved()[0].status, CandidateStatus::ConfirmedUsed);
    }

    #[test]
    fn unknown_path_is_noop() {
        let mut set = set_of(&[("Assets/A", 10)]);
        assert!(set
            .apply(&Resolution::Deleted(AssetPath::new("Assets/Z")))
            .is_none());
        assert_eq!(set.total_size(), 10);
    }

    #[test]
    fn remove_nested_keeps_siblings() {
        let mut set = set_of(&[
            ("Assets/A", 100),
            ("Assets/A/Inner", 40),
            ("Assets/AB", 5),
        ]);
        let removed = set.remove_nested(&AssetPath::new("Assets/A"));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].path.as_str(), "Assets/A/Inner");
        assert_eq!(set.len(), 2);
        assert_eq!(set.total_size(), 105);
    }

    #[test]
    fn saturated_total_is_recomputed_after_removal() {
        let mut set = set_of(&[("Assets/A", u64::MAX), ("Assets/B", u64::MAX)]);
        assert_eq!(set.total_size(), u64::MAX);

        set.apply(&Resolution::Skip(AssetPath::new("Assets/A")));
        assert_eq!(set.total_size(), u64::MAX);
        assert!(set.is_consistent());

        let mut nested = set_of(&[("Assets/C", u64::MAX), ("Assets/C/D", 7), ("Assets/E", 1)]);
        nested.remove_nested(&AssetPath::new("Assets/C"));
        assert_eq!(nested.total_size(), u64::MAX);
        assert!(nested.is_consistent());
    }

    #[test]
    fn clear_resets_everything() {
        let mut set = set_of(&[("Assets/A", 10)]);
        set.apply(&Resolution::Skip(AssetPath::new("Assets/A")));
        set.insert(AssetPath::new("Assets/B"), 3);
        set.clear();
        assert!(set.is_empty());
        assert!(set.resolved().is_empty());
        assert_eq!(set.total_size(), 0);
    }
}
