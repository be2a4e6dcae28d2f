/// The analysis session: candidate set, total, and every operation on them.
///
/// [`Coordinator`] is the only component that commits changes to the
/// candidate set. Collaborators are borrowed through [`Ports`] so the
/// caller keeps ownership and can inspect them once the session ends.
///
/// Batch operations never mutate while iterating: they snapshot the
/// candidate paths, compute an outcome per path, then commit.
use crate::audit::{AuditAction, AuditLog, AuditOutcome, AuditRecord};
use crate::classifier::{DirectoryUsage, UsageClassifier};
use crate::config::AnalysisConfig;
use crate::deletion::{remove_directory, DeletedDirectory, DeletionFailure, DeletionReport, Storage};
use crate::error::{Error, Result};
use crate::index::AssetIndex;
use crate::model::{format_size, AssetPath, CandidateSet, DirectoryCandidate, Resolution};
use crate::progress::{CancelToken, Progress, ProgressSink};
use crate::prompt::Prompt;
use crate::scenes::scanner::ScanTarget;
use crate::scenes::{ReferenceCheck, SceneCatalog, SceneHost, SceneReferenceScanner};
use crate::walker::FsWalker;
use crate::warning::Warning;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

pub const APP_TITLE: &str = "Unbloat Project";
pub const NO_UNUSED_MESSAGE: &str = "No unused directories found!";
pub const NO_REFERENCES_MESSAGE: &str = "No references were found in any build scene.";

/// Borrowed collaborators of a session.
pub struct Ports<'a> {
    pub index: &'a mut dyn AssetIndex,
    pub scenes: &'a mut dyn SceneHost,
    pub catalog: &'a dyn SceneCatalog,
    pub prompt: &'a mut dyn Prompt,
    pub storage: &'a mut dyn Storage,
}

/// Summary of one analysis pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub directories_scanned: usize,
    pub candidates: usize,
    pub total_size_bytes: u64,
    /// Distinct files whose dependents were looked up.
    pub files_checked: usize,
    pub warnings: Vec<Warning>,
    pub cancelled: bool,
    pub elapsed_ms: u64,
    pub summary: String,
}

pub struct Coordinator<'a> {
    config: AnalysisConfig,
    walker: FsWalker,
    ports: Ports<'a>,
    candidates: CandidateSet,
    audit: Option<AuditLog>,
    cancel: CancelToken,
    progress: ProgressSink,
}

impl<'a> Coordinator<'a> {
    /// Start a session over `project_root`.
    ///
    /// Opens the audit log named in `config` (relative paths are resolved
    /// against the project root).
    pub fn new(project_root: impl Into<PathBuf>, config: AnalysisConfig, ports: Ports<'a>) -> Result<Self> {
        let project_root = project_root.into();
        let audit = match &config.audit_log {
            Some(path) => Some(AuditLog::open(&project_root.join(path))?),
            None => None,
        };
        Ok(Self {
            walker: FsWalker::new(project_root),
            config,
            ports,
            candidates: CandidateSet::new(),
            audit,
            cancel: CancelToken::new(),
            progress: ProgressSink::disabled(),
        })
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn project_root(&self) -> &Path {
        self.walker.project_root()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn candidates(&self) -> &[DirectoryCandidate] {
        self.candidates.as_slice()
    }

    /// Skipped and confirmed-used directories since the last analysis.
    pub fn resolved(&self) -> &[DirectoryCandidate] {
        self.candidates.resolved()
    }

    pub fn total_size(&self) -> u64 {
        self.candidates.total_size()
    }

    /// Rebuild the candidate set from scratch.
    ///
    /// Every subdirectory of the asset root is classified; unused ones
    /// become candidates with their current size. Running it twice on an
    /// unchanged project yields the same set.
    pub fn analyze(&mut self) -> Result<AnalysisReport> {
        let start = Instant::now();
        self.candidates.clear();

        let asset_root = self.config.asset_root();
        let listing = self.walker.list_subdirectories(&asset_root)?;
        let mut warnings: Vec<Warning> = listing
            .skipped
            .into_iter()
            .map(|s| Warning::UnreadableEntry {
                path: s.path,
                message: s.message,
            })
            .collect();
        warnings.extend(self.ports.index.warnings());
        let directories: Vec<AssetPath> = listing
            .entries
            .into_iter()
            .filter(|dir| !self.config.is_ignored(dir))
            .collect();
        info!(directories = directories.len(), root = %asset_root, "analysis started");

        let mut unused: Vec<(AssetPath, u64)> = Vec::new();
        let mut cancelled = false;
        let files_checked = {
            let mut classifier = UsageClassifier::new(
                &*self.ports.index,
                &self.walker,
                &self.config.sidecar_extension,
            );
            for (i, dir) in directories.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    info!("analysis cancelled after {i} directories");
                    self.progress.emit(Progress::Cancelled);
                    cancelled = true;
                    break;
                }
                self.progress.emit(Progress::Classifying {
                    index: i,
                    total: directories.len(),
                    path: dir.to_string(),
                });

                match classifier.classify(dir) {
                    Ok(DirectoryUsage::Unused) => match self.walker.directory_size(dir) {
                        Ok(size) => unused.push((dir.clone(), size)),
                        Err(err) => {
                            warn!("skipping {dir}: {err}");
                            warnings.push(Warning::UnreadableEntry {
                                path: dir.to_string(),
                                message: err.to_string(),
                            });
                        }
                    },
                    Ok(usage) => debug!(%dir, ?usage, "not a candidate"),
                    Err(err) => {
                        warn!("skipping {dir}: {err}");
                        self.progress.warning(dir.as_str(), err.to_string());
                        warnings.push(Warning::UnreadableEntry {
                            path: dir.to_string(),
                            message: err.to_string(),
                        });
                    }
                }
            }
            let checked = classifier.files_checked();
            warnings.extend(classifier.into_warnings());
            checked
        };

        if self.config.collapse_nested {
            unused = collapse_nested(unused);
        }
        for (path, size) in unused {
            self.candidates.insert(path, size);
        }

        let summary = if self.candidates.is_empty() {
            self.ports.prompt.inform(APP_TITLE, NO_UNUSED_MESSAGE);
            NO_UNUSED_MESSAGE.to_string()
        } else {
            let message = format!(
                "Found {} unused directories, totaling {}.",
                self.candidates.len(),
                format_size(self.candidates.total_size())
            );
            info!("{message}");
            message
        };

        let elapsed = start.elapsed();
        self.progress.emit(Progress::Complete { duration: elapsed });
        Ok(AnalysisReport {
            directories_scanned: directories.len(),
            candidates: self.candidates.len(),
            total_size_bytes: self.candidates.total_size(),
            files_checked,
            warnings,
            cancelled,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            summary,
        })
    }

    /// Keep `path` without checking it; it leaves the set.
    pub fn skip(&mut self, path: &AssetPath) -> Result<DirectoryCandidate> {
        let removed = self
            .candidates
            .apply(&Resolution::Skip(path.clone()))
            .ok_or_else(|| Error::UnknownCandidate(path.clone()))?;
        info!(%path, "skipped");
        Ok(removed)
    }

    /// Scan every enabled scene for references into `path`.
    ///
    /// A directory with references is confirmed used and leaves the set.
    /// A cancelled check changes nothing.
    pub fn check_references(&mut self, path: &AssetPath) -> Result<ReferenceCheck> {
        if !self.candidates.contains(path) {
            return Err(Error::UnknownCandidate(path.clone()));
        }
        let scenes = self.ports.catalog.scenes()?;
        let target = self.scan_target(path)?;

        let check = {
            let mut scanner = SceneReferenceScanner::new(&*self.ports.index, &mut *self.ports.scenes)
                .with_cancel(self.cancel.clone())
                .with_progress(self.progress.clone());
            scanner.check(target, &scenes)
        };

        if let Some(resolution) = resolution_for(&check) {
            self.candidates.apply(&resolution);
        }
        let (title, message) = check_dialog(&check);
        self.ports.prompt.inform(title, &message);
        Ok(check)
    }

    /// Check every candidate, opening each scene once, then commit all
    /// confirmed-used results together.
    pub fn check_all_references(&mut self) -> Result<Vec<ReferenceCheck>> {
        let paths = self.candidates.paths();
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let scenes = self.ports.catalog.scenes()?;
        let mut targets = Vec::with_capacity(paths.len());
        let mut checks = Vec::new();
        for path in &paths {
            match self.scan_target(path) {
                Ok(target) => targets.push(target),
                Err(err) => {
                    warn!("cannot check {path}: {err}");
                    self.progress.warning(path.as_str(), err.to_string());
                    checks.push(ReferenceCheck::skipped(
                        path.clone(),
                        Warning::UnreadableEntry {
                            path: path.to_string(),
                            message: err.to_string(),
                        },
                    ));
                }
            }
        }

        if !targets.is_empty() {
            let mut scanner = SceneReferenceScanner::new(&*self.ports.index, &mut *self.ports.scenes)
                .with_cancel(self.cancel.clone())
                .with_progress(self.progress.clone());
            checks.extend(scanner.check_many(targets, &scenes));
        }
        checks.sort_by_key(|check| paths.iter().position(|p| *p == check.directory));

        let resolutions: Vec<Resolution> = checks.iter().filter_map(resolution_for).collect();
        for resolution in &resolutions {
            self.candidates.apply(resolution);
        }

        let message = format!(
            "{} of {} directories are referenced by build scenes.",
            resolutions.len(),
            checks.len()
        );
        info!("{message}");
        self.ports.prompt.inform("Reference Check", &message);
        Ok(checks)
    }

    /// Delete one candidate after confirmation.
    pub fn delete(&mut self, path: &AssetPath) -> Result<DeletionReport> {
        if !self.candidates.contains(path) {
            return Err(Error::UnknownCandidate(path.clone()));
        }
        let question = format!("Are you sure you want to delete {path}?");
        if !self.ports.prompt.confirm("Delete Directory", &question) {
            info!(%path, "deletion declined");
            return Ok(DeletionReport::declined());
        }

        let mut report = DeletionReport::default();
        self.delete_one(path, AuditAction::Delete, &mut report);
        if !report.deleted.is_empty() {
            self.refresh_index(&mut report);
        }
        Ok(report)
    }

    /// Delete every candidate after a single confirmation.
    ///
    /// Each directory is attempted independently; failures stay in the set
    /// and are listed in the report. The index is refreshed once at the end.
    pub fn delete_all(&mut self) -> Result<DeletionReport> {
        if self.candidates.is_empty() {
            return Ok(DeletionReport::default());
        }
        if !self
            .ports
            .prompt
            .confirm("Delete All", "Are you sure you want to delete all unused directories?")
        {
            info!("delete all declined");
            return Ok(DeletionReport::declined());
        }

        let mut report = DeletionReport::default();
        for path in self.candidates.paths() {
            if self.cancel.is_cancelled() {
                info!("delete all cancelled");
                self.progress.emit(Progress::Cancelled);
                report.cancelled = true;
                break;
            }
            // Already removed together with a deleted ancestor.
            if !self.candidates.contains(&path) {
                continue;
            }
            self.delete_one(&path, AuditAction::DeleteAll, &mut report);
        }

        if !report.deleted.is_empty() {
            self.refresh_index(&mut report);
        }
        info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            freed = %format_size(report.bytes_freed()),
            "delete all finished"
        );
        Ok(report)
    }

    /// Forget all results.
    pub fn clear(&mut self) {
        self.candidates.clear();
        debug!("results cleared");
    }

    /// Absolute location of `path` on disk, or `None` (with a warning) if
    /// it no longer exists.
    pub fn locate(&self, path: &AssetPath) -> Option<PathBuf> {
        let location = path.to_fs_path(self.walker.project_root());
        if location.exists() {
            Some(location)
        } else {
            warn!("Could not find directory: {path}");
            None
        }
    }

    fn scan_target(&self, dir: &AssetPath) -> Result<ScanTarget> {
        let listing = self.walker.list_files(dir)?;
        let files: HashSet<AssetPath> = listing
            .entries
            .into_iter()
            .filter(|f| !f.is_sidecar(&self.config.sidecar_extension))
            .collect();
        Ok(ScanTarget {
            directory: dir.clone(),
            files,
        })
    }

    fn delete_one(&mut self, path: &AssetPath, action: AuditAction, report: &mut DeletionReport) {
        let recorded = match self.candidates.get(path) {
            Some(candidate) => candidate.size_bytes,
            None => return,
        };
        let removal = remove_directory(
            &mut *self.ports.storage,
            &self.walker,
            path,
            &self.config.sidecar_extension,
        );

        match removal {
            Err(reason) => {
                warn!("could not delete {path}: {reason}");
                self.progress.warning(path.as_str(), reason.clone());
                self.write_audit(AuditRecord::new(action, path, recorded, AuditOutcome::Failed, &reason), report);
                report.failed.push(DeletionFailure {
                    path: path.clone(),
                    reason,
                });
            }
            Ok(removal) => {
                let sidecar = path.sidecar(&self.config.sidecar_extension);
                let warnings = removal.warnings(path, recorded, &sidecar);
                for warning in &warnings {
                    warn!("{warning}");
                }
                let detail = warnings
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                report.warnings.extend(warnings);

                self.candidates.apply(&Resolution::Deleted(path.clone()));
                let nested: Vec<AssetPath> = self
                    .candidates
                    .remove_nested(path)
                    .into_iter()
                    .map(|c| c.path)
                    .collect();
                info!(%path, size = %format_size(recorded), nested = nested.len(), "deleted");
                self.progress.emit(Progress::Deleted {
                    path: path.to_string(),
                    size_bytes: recorded,
                });
                self.write_audit(AuditRecord::new(action, path, recorded, AuditOutcome::Deleted, detail), report);
                report.deleted.push(DeletedDirectory {
                    path: path.clone(),
                    size_bytes: recorded,
                    nested,
                });
            }
        }
    }

    fn write_audit(&mut self, record: AuditRecord, report: &mut DeletionReport) {
        let Some(log) = self.audit.as_mut() else {
            return;
        };
        if let Err(err) = log.record(&record) {
            warn!("{err}");
            report.warnings.push(Warning::AuditWriteFailed {
                message: err.to_string(),
            });
        }
    }

    fn refresh_index(&mut self, report: &mut DeletionReport) {
        if let Err(err) = self.ports.index.refresh() {
            warn!("index refresh failed: {err}");
            report.warnings.push(Warning::RefreshFailed {
                message: err.to_string(),
            });
        }
    }
}

/// Confirmed use for a completed check that found references.
fn resolution_for(check: &ReferenceCheck) -> Option<Resolution> {
    (!check.cancelled && check.references_found()).then(|| Resolution::ConfirmUsed(check.directory.clone()))
}

fn check_dialog(check: &ReferenceCheck) -> (&'static str, String) {
    if check.cancelled {
        return (
            "Reference Check Cancelled",
            format!(
                "Stopped after {} scenes; {} left unchanged.",
                check.scenes_scanned, check.directory
            ),
        );
    }
    if check.references_found() {
        let lines: Vec<String> = check
            .matches
            .iter()
            .map(|m| {
                format!(
                    "Scene: {}, GameObject: {}, Component: {}, Property: {}",
                    m.scene, m.object, m.component, m.field
                )
            })
            .collect();
        return (
            "References Found",
            format!("Found references in the following scenes:\n\n{}", lines.join("\n")),
        );
    }
    let mut message = NO_REFERENCES_MESSAGE.to_string();
    if !check.warnings.is_empty() {
        message.push_str(&format!("\n\n{} scenes could not be opened.", check.warnings.len()));
    }
    ("No References Found", message)
}

/// Keep only candidates that are not inside another candidate.
fn collapse_nested(mut unused: Vec<(AssetPath, u64)>) -> Vec<(AssetPath, u64)> {
    unused.sort_by(|a, b| a.0.cmp(&b.0));
    let mut kept: Vec<(AssetPath, u64)> = Vec::with_capacity(unused.len());
    for (path, size) in unused {
        let nested = kept.iter().any(|(outer, _)| path.is_within(outer));
        if !nested {
            kept.push((path, size));
        }
    }
    kept
}
