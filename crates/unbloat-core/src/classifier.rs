/// Usage classification of directories.
///
/// A directory is a removal candidate only if *every* asset file below it
/// has no dependents other than itself. The first referenced file marks
/// the whole directory as used and the remaining files are not queried.
///
/// Nested directories share files with their ancestors, so per-file
/// verdicts are memoised for the lifetime of the classifier (one analysis
/// pass). Sidecar metadata files are not assets and are never queried.
use crate::error::Result;
use crate::index::AssetIndex;
use crate::model::AssetPath;
use crate::walker::FsWalker;
use crate::warning::Warning;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryUsage {
    /// No file below the directory is referenced.
    Unused,
    /// `file` has at least one dependent other than itself.
    Used { file: AssetPath },
    /// Part of the directory could not be read, so it cannot be proven unused.
    Unverifiable,
}

impl DirectoryUsage {
    pub fn is_unused(&self) -> bool {
        matches!(self, Self::Unused)
    }
}

pub struct UsageClassifier<'a> {
    index: &'a dyn AssetIndex,
    walker: &'a FsWalker,
    sidecar_extension: &'a str,
    /// file → referenced?
    memo: HashMap<AssetPath, bool>,
    warnings: Vec<Warning>,
}

impl<'a> UsageClassifier<'a> {
    pub fn new(index: &'a dyn AssetIndex, walker: &'a FsWalker, sidecar_extension: &'a str) -> Self {
        Self {
            index,
            walker,
            sidecar_extension,
            memo: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn classify(&mut self, dir: &AssetPath) -> Result<DirectoryUsage> {
        let listing = self.walker.list_files(dir)?;
        let unreadable = !listing.skipped.is_empty();
        for skipped in listing.skipped {
            self.warnings.push(Warning::UnreadableEntry {
                path: skipped.path,
                message: skipped.message,
            });
        }

        for file in &listing.entries {
            if file.is_sidecar(self.sidecar_extension) {
                continue;
            }
            if self.is_referenced(file) {
                debug!(%dir, %file, "directory in use");
                return Ok(DirectoryUsage::Used { file: file.clone() });
            }
        }

        if unreadable {
            warn!("{dir} contains unreadable entries; not offered for removal");
            return Ok(DirectoryUsage::Unverifiable);
        }
        Ok(DirectoryUsage::Unused)
    }

    /// `true` if any asset other than `file` itself depends on it.
    ///
    /// Index failures count as referenced: a file whose usage cannot be
    /// established never makes its directory removable.
    pub fn is_referenced(&mut self, file: &AssetPath) -> bool {
        if let Some(&cached) = self.memo.get(file) {
            return cached;
        }
        let referenced = match self.index.dependents_of(file, true) {
            Ok(dependents) => dependents.iter().any(|d| d != file),
            Err(err) => {
                warn!("dependency lookup failed for {file}: {err}");
                self.warnings.push(Warning::IndexUnavailable {
                    path: file.clone(),
                    message: err.to_string(),
                });
                true
            }
        };
        self.memo.insert(file.clone(), referenced);
        referenced
    }

    /// Number of distinct files whose usage has been looked up.
    pub fn files_checked(&self) -> usize {
        self.memo.len()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryAssetIndex;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &std::path::Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn unreferenced_directory_is_unused() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Assets/Foo/a.png");
        touch(tmp.path(), "Assets/Foo/a.png.meta");
        let index = MemoryAssetIndex::new();
        let walker = FsWalker::new(tmp.path());
        let mut classifier = UsageClassifier::new(&index, &walker, "meta");
        assert_eq!(
            classifier.classify(&AssetPath::new("Assets/Foo")).unwrap(),
            DirectoryUsage::Unused
        );
        // Sidecars are never queried.
        assert_eq!(index.query_count(), 1);
    }

    #[test]
    fn one_dependent_marks_directory_used() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Assets/Foo/a.png");
        touch(tmp.path(), "Assets/Foo/Deep/b.png");
        let mut index = MemoryAssetIndex::new();
        index.add_reference("Assets/Scene.unity", "Assets/Foo/Deep/b.png");
        let walker = FsWalker::new(tmp.path());
        let mut classifier = UsageClassifier::new(&index, &walker, "meta");
        assert_eq!(
            classifier.classify(&AssetPath::new("Assets/Foo")).unwrap(),
            DirectoryUsage::Used {
                file: AssetPath::new("Assets/Foo/Deep/b.png")
            }
        );
    }

    #[test]
    fn self_reported_dependency_does_not_count() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Assets/Foo/a.png");
        let index = MemoryAssetIndex::new().with_self_reporting();
        let walker = FsWalker::new(tmp.path());
        let mut classifier = UsageClassifier::new(&index, &walker, "meta");
        assert!(classifier
            .classify(&AssetPath::new("Assets/Foo"))
            .unwrap()
            .is_unused());
    }

    #[test]
    fn short_circuits_and_memoises() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Assets/Foo/a.png");
        touch(tmp.path(), "Assets/Foo/b.png");
        touch(tmp.path(), "Assets/Foo/c.png");
        let mut index = MemoryAssetIndex::new();
        index.add_reference("Assets/x.prefab", "Assets/Foo/a.png");
        let walker = FsWalker::new(tmp.path());
        let mut classifier = UsageClassifier::new(&index, &walker, "meta");

        classifier.classify(&AssetPath::new("Assets/Foo")).unwrap();
        assert_eq!(index.query_count(), 1, "stops at the first referenced file");

        classifier.classify(&AssetPath::new("Assets/Foo")).unwrap();
        assert_eq!(index.query_count(), 1, "second pass served from memo");
    }

    #[test]
    fn index_failure_is_conservative() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Assets/New/fresh.png");
        let mut index = MemoryAssetIndex::new();
        index.mark_unavailable("Assets/New/fresh.png");
        let walker = FsWalker::new(tmp.path());
        let mut classifier = UsageClassifier::new(&index, &walker, "meta");
        assert!(!classifier
            .classify(&AssetPath::new("Assets/New"))
            .unwrap()
            .is_unused());
        let warnings = classifier.into_warnings();
        assert!(matches!(warnings[0], Warning::IndexUnavailable { .. }));
    }

    #[test]
    fn empty_directory_is_unused() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("Assets/Empty")).unwrap();
        let index = MemoryAssetIndex::new();
        let walker = FsWalker::new(tmp.path());
        let mut classifier = UsageClassifier::new(&index, &walker, "meta");
        assert!(classifier
            .classify(&AssetPath::new("Assets/Empty"))
            .unwrap()
            .is_unused());
    }
}
