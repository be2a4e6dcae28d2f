/// Filesystem walker built on `jwalk`.
///
/// Enumerates directories and files below a project-relative directory and
/// reports file sizes. The walk runs serially on the calling thread and
/// listings are sorted by path, so two walks over an unchanged tree return
/// identical listings.
///
/// Only a missing or unreadable *root* is an error. Entries that cannot be
/// read below it are logged, collected in [`Listing::skipped`] and left out
/// of the results; one bad file never aborts a large walk.
use crate::error::{Error, Result};
use crate::model::AssetPath;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An entry the walker could not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: String,
    pub message: String,
}

/// Result of a walk: the entries found plus the ones that were skipped.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub entries: Vec<AssetPath>,
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
}

#[derive(Debug, Clone)]
pub struct FsWalker {
    project_root: PathBuf,
}

impl FsWalker {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// All directories below `root`, at every depth. `root` itself is excluded.
    pub fn list_subdirectories(&self, root: &AssetPath) -> Result<Listing> {
        self.walk(root, EntryKind::Directory)
    }

    /// All regular files below `dir`, at every depth.
    pub fn list_files(&self, dir: &AssetPath) -> Result<Listing> {
        self.walk(dir, EntryKind::File)
    }

    /// Size of a single file in bytes.
    pub fn size_of(&self, file: &AssetPath) -> Result<u64> {
        let path = file.to_fs_path(&self.project_root);
        std::fs::symlink_metadata(&path)
            .map(|meta| meta.len())
            .map_err(|err| Error::io(path, err))
    }

    /// Sum of the sizes of every file below `dir`.
    ///
    /// Files whose size cannot be read are logged and counted as zero.
    pub fn directory_size(&self, dir: &AssetPath) -> Result<u64> {
        let listing = self.list_files(dir)?;
        let mut total: u64 = 0;
        for file in &listing.entries {
            match self.size_of(file) {
                Ok(size) => total = total.saturating_add(size),
                Err(err) => warn!("skipping size of {file}: {err}"),
            }
        }
        Ok(total)
    }

    /// `true` if `dir` exists on disk as a directory.
    pub fn is_directory(&self, dir: &AssetPath) -> bool {
        dir.to_fs_path(&self.project_root).is_dir()
    }

    fn walk(&self, dir: &AssetPath, kind: EntryKind) -> Result<Listing> {
        let root = dir.to_fs_path(&self.project_root);
        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(Error::RootNotFound(root)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::RootNotFound(root))
            }
            Err(err) => return Err(Error::io(root, err)),
        }
        // A directory that exists but cannot be listed is an error for the
        // root, not a skipped entry.
        if let Err(err) = std::fs::read_dir(&root) {
            return Err(Error::io(root, err));
        }

        let walker = jwalk::WalkDir::new(&root)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .min_depth(1)
            .parallelism(jwalk::Parallelism::Serial);

        let mut listing = Listing::default();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.to_string_lossy().to_string())
                        .unwrap_or_default();
                    warn!("skipping unreadable entry {path}: {err}");
                    listing.skipped.push(SkippedEntry {
                        path,
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            let file_type = entry.file_type();
            let matches = match kind {
                EntryKind::Directory => file_type.is_dir(),
                EntryKind::File => file_type.is_file(),
            };
            if !matches {
                continue;
            }

            let path = entry.path();
            match AssetPath::from_fs_path(&self.project_root, &path) {
                Some(asset) => listing.entries.push(asset),
                None => debug!("ignoring path outside project root: {}", path.display()),
            }
        }

        listing.entries.sort();
        debug!(
            root = %dir,
            found = listing.entries.len(),
            skipped = listing.skipped.len(),
            "walk complete"
        );
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_bytes(path: &Path, n: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![0u8; n]).unwrap();
    }

    /// ```text
    /// Assets/
    ///   A/ a.txt (10)
    ///     Inner/ b.txt (20)
    ///   B/ (empty)
    ///   c.txt (5)
    /// ```
    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_bytes(&tmp.path().join("Assets/A/a.txt"), 10);
        write_bytes(&tmp.path().join("Assets/A/Inner/b.txt"), 20);
        fs::create_dir_all(tmp.path().join("Assets/B")).unwrap();
        write_bytes(&tmp.path().join("Assets/c.txt"), 5);
        tmp
    }

    #[test]
    fn lists_subdirectories_at_all_depths() {
        let tmp = fixture();
        let walker = FsWalker::new(tmp.path());
        let dirs = walker
            .list_subdirectories(&AssetPath::new("Assets"))
            .unwrap()
            .entries;
        let names: Vec<&str> = dirs.iter().map(|d| d.as_str()).collect();
        assert_eq!(names, vec!["Assets/A", "Assets/A/Inner", "Assets/B"]);
    }

    #[test]
    fn lists_files_recursively() {
        let tmp = fixture();
        let walker = FsWalker::new(tmp.path());
        let files = walker.list_files(&AssetPath::new("Assets/A")).unwrap().entries;
        let names: Vec<&str> = files.iter().map(|d| d.as_str()).collect();
        assert_eq!(names, vec!["Assets/A/Inner/b.txt", "Assets/A/a.txt"]);
    }

    #[test]
    fn sizes_files_and_directories() {
        let tmp = fixture();
        let walker = FsWalker::new(tmp.path());
        assert_eq!(walker.size_of(&AssetPath::new("Assets/c.txt")).unwrap(), 5);
        assert_eq!(walker.directory_size(&AssetPath::new("Assets/A")).unwrap(), 30);
        assert_eq!(walker.directory_size(&AssetPath::new("Assets/B")).unwrap(), 0);
        assert_eq!(walker.directory_size(&AssetPath::new("Assets")).unwrap(), 35);
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let walker = FsWalker::new(tmp.path());
        assert!(matches!(
            walker.list_subdirectories(&AssetPath::new("Assets")),
            Err(Error::RootNotFound(_))
        ));
    }

    #[test]
    fn file_root_is_an_error() {
        let tmp = fixture();
        let walker = FsWalker::new(tmp.path());
        assert!(matches!(
            walker.list_files(&AssetPath::new("Assets/c.txt")),
            Err(Error::RootNotFound(_))
        ));
    }
}
