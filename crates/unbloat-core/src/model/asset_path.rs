/// Project-relative asset paths.
///
/// Every file and directory the engine talks about is keyed by an
/// [`AssetPath`]: a slash-separated path relative to the project root
/// (`Assets/Textures/wall.png`). Host separators are normalised on
/// construction so paths coming from the walker, the index and scene files
/// compare equal. Comparison is byte-wise, i.e. case-sensitive.
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetPath(CompactString);

impl AssetPath {
    /// Normalise `raw` into an asset path.
    ///
    /// Backslashes become `/`; empty and `.` segments are dropped, so
    /// `Assets\\Foo//./bar.png/` becomes `Assets/Foo/bar.png`.
    pub fn new(raw: &str) -> Self {
        let mut out = CompactString::with_capacity(raw.len());
        for segment in raw.split(['/', '\\']) {
            if segment.is_empty() || segment == "." {
                continue;
            }
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(segment);
        }
        Self(out)
    }

    /// Build an asset path from an absolute filesystem path below `root`.
    ///
    /// Returns `None` when `path` does not live under `root` or contains
    /// components that cannot be expressed relative to it.
    pub fn from_fs_path(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let mut out = CompactString::default();
        for component in relative.components() {
            match component {
                Component::Normal(name) => {
                    if !out.is_empty() {
                        out.push('/');
                    }
                    out.push_str(&name.to_string_lossy());
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(Self(out))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a child segment (or a relative sub-path).
    pub fn join(&self, child: &str) -> Self {
        if self.is_empty() {
            return Self::new(child);
        }
        Self::new(&format!("{}/{}", self.0, child))
    }

    /// The containing directory, or `None` for a single-segment path.
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rfind('/')
            .map(|pos| Self(CompactString::new(&self.0[..pos])))
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(pos) => &self.0[pos + 1..],
            None => self.0.as_str(),
        }
    }

    /// Extension of the last segment without the dot, if any.
    ///
    /// Dot-files such as `.gitkeep` have no extension.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(pos) => Some(&name[pos + 1..]),
        }
    }

    /// `true` if `self` is `dir` or lies anywhere below it.
    pub fn is_within(&self, dir: &AssetPath) -> bool {
        if dir.is_empty() {
            return true;
        }
        match self.0.strip_prefix(dir.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with('/'),
            None => false,
        }
    }

    /// Path of the sidecar metadata file paired with this asset
    /// (`<path>.<extension>`, e.g. `Assets/Foo.meta`).
    pub fn sidecar(&self, extension: &str) -> Self {
        Self(CompactString::new(format!("{}.{extension}", self.0)))
    }

    /// `true` if this path is itself a sidecar file with the given extension.
    pub fn is_sidecar(&self, extension: &str) -> bool {
        self.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// Resolve against the project root for filesystem access.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in self.0.split('/') {
            path.push(segment);
        }
        path
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for AssetPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
