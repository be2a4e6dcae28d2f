/// Confirmatory scene scan.
///
/// Before a directory is deleted, every enabled scene is loaded and every
/// serialised field of every component in its hierarchy is inspected. A
/// field holding an object reference that resolves to one of the
/// directory's files is a match.
///
/// Per directory the scan moves through
/// `Idle → (ScenesOpened → Traversing → Closed)* → ReferencesFound | NoReferencesFound`.
/// Scenes are opened one at a time through [`OpenScene`], which closes the
/// scene when dropped, so a scene never outlives its own check even when
/// traversal bails out early. A scene that fails to open is skipped and
/// reported; the remaining scenes are still scanned.
use super::{FieldValue, SceneDescriptor, SceneHandle, SceneHost, SceneObject};
use crate::index::AssetIndex;
use crate::model::AssetPath;
use crate::progress::{CancelToken, Progress, ProgressSink};
use crate::warning::Warning;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    Idle,
    ScenesOpened,
    Traversing,
    Closed,
    ReferencesFound,
    NoReferencesFound,
}

impl ScanPhase {
    fn advance(self, next: ScanPhase) -> ScanPhase {
        use ScanPhase::*;
        let legal = matches!(
            (self, next),
            (Idle | Closed, ScenesOpened)
                | (ScenesOpened, Traversing)
                | (Traversing, Closed)
                | (Idle | Closed, ReferencesFound | NoReferencesFound)
                | (ReferencesFound | NoReferencesFound, Idle)
        );
        debug_assert!(legal, "illegal scan transition {self:?} -> {next:?}");
        trace!(from = ?self, to = ?next, "scan phase");
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    ReferencesFound,
    NoReferencesFound,
}

/// One field that references an asset of the checked directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceMatch {
    pub scene: AssetPath,
    /// Hierarchy path of the object holding the component, `Root/Child`.
    pub object: String,
    pub component: String,
    /// Property path of the field, `items[2].icon`.
    pub field: String,
    /// The referenced asset.
    pub asset: AssetPath,
}

/// Result of checking one directory against the enabled scenes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceCheck {
    pub directory: AssetPath,
    pub matches: Vec<ReferenceMatch>,
    pub scenes_scanned: usize,
    /// Scenes that could not be opened; coverage is partial when non-empty.
    pub warnings: Vec<Warning>,
    /// Stopped before every scene was scanned.
    pub cancelled: bool,
    pub outcome: ScanOutcome,
}

impl ReferenceCheck {
    fn new(directory: AssetPath) -> Self {
        Self {
            directory,
            matches: Vec::new(),
            scenes_scanned: 0,
            warnings: Vec::new(),
            cancelled: false,
            outcome: ScanOutcome::NoReferencesFound,
        }
    }

    /// A directory that could not be checked at all. It counts as having
    /// no references and is partial, so it is never reclassified.
    pub fn skipped(directory: AssetPath, reason: Warning) -> Self {
        let mut check = Self::new(directory);
        check.warnings.push(reason);
        check
    }

    pub fn references_found(&self) -> bool {
        self.outcome == ScanOutcome::ReferencesFound
    }

    /// `true` if some enabled scene was not scanned.
    pub fn is_partial(&self) -> bool {
        self.cancelled || !self.warnings.is_empty()
    }
}

/// Files of one directory to look for.
#[derive(Debug, Clone)]
pub struct ScanTarget {
    pub directory: AssetPath,
    pub files: HashSet<AssetPath>,
}

/// Scoped scene acquisition: closes the scene on drop.
pub struct OpenScene<'h> {
    host: &'h mut dyn SceneHost,
    handle: SceneHandle,
    path: AssetPath,
}

impl<'h> OpenScene<'h> {
    pub fn open(
        host: &'h mut dyn SceneHost,
        path: &AssetPath,
    ) -> Result<Self, crate::error::SceneError> {
        let handle = host.open_additive(path)?;
        debug!(scene = %path, "scene opened");
        Ok(Self {
            host,
            handle,
            path: path.clone(),
        })
    }

    pub fn roots(&self) -> &[SceneObject] {
        self.host.root_objects(self.handle)
    }
}

impl Drop for OpenScene<'_> {
    fn drop(&mut self) {
        self.host.close_discard(self.handle);
        debug!(scene = %self.path, "scene closed");
    }
}

pub struct SceneReferenceScanner<'a> {
    index: &'a dyn AssetIndex,
    host: &'a mut dyn SceneHost,
    cancel: CancelToken,
    progress: ProgressSink,
    phase: ScanPhase,
}

impl<'a> SceneReferenceScanner<'a> {
    pub fn new(index: &'a dyn AssetIndex, host: &'a mut dyn SceneHost) -> Self {
        Self {
            index,
            host,
            cancel: CancelToken::new(),
            progress: ProgressSink::disabled(),
            phase: ScanPhase::Idle,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Check a single directory.
    pub fn check(&mut self, target: ScanTarget, scenes: &[SceneDescriptor]) -> ReferenceCheck {
        let directory = target.directory.clone();
        self.check_many(vec![target], scenes)
            .pop()
            .unwrap_or_else(|| ReferenceCheck::new(directory))
    }

    /// Check several directories, opening each enabled scene once.
    ///
    /// Cancellation is honoured between scenes only; a cancelled check
    /// reports what it found so far with `cancelled` set.
    pub fn check_many(
        &mut self,
        targets: Vec<ScanTarget>,
        scenes: &[SceneDescriptor],
    ) -> Vec<ReferenceCheck> {
        if matches!(
            self.phase,
            ScanPhase::ReferencesFound | ScanPhase::NoReferencesFound
        ) {
            self.phase = self.phase.advance(ScanPhase::Idle);
        }

        let mut results: Vec<ReferenceCheck> = targets
            .iter()
            .map(|t| ReferenceCheck::new(t.directory.clone()))
            .collect();

        for scene in scenes.iter().filter(|s| s.enabled) {
            if self.cancel.is_cancelled() {
                info!("reference check cancelled before {}", scene.path);
                for result in &mut results {
                    result.cancelled = true;
                }
                self.progress.emit(Progress::Cancelled);
                break;
            }

            let guard = match OpenScene::open(&mut *self.host, &scene.path) {
                Ok(guard) => guard,
                Err(err) => {
                    warn!("skipping scene: {err}");
                    self.progress.warning(scene.path.as_str(), err.to_string());
                    for result in &mut results {
                        result.warnings.push(Warning::SceneOpenFailure {
                            scene: scene.path.clone(),
                            reason: err.to_string(),
                        });
                    }
                    continue;
                }
            };
            self.phase = self.phase.advance(ScanPhase::ScenesOpened);
            self.progress.emit(Progress::SceneOpened {
                scene: scene.path.to_string(),
            });

            self.phase = self.phase.advance(ScanPhase::Traversing);
            let mut found = Vec::new();
            collect_matches(&scene.path, guard.roots(), self.index, &targets, &mut found);
            drop(guard);
            self.phase = self.phase.advance(ScanPhase::Closed);

            for (slot, matched) in found {
                results[slot].matches.push(matched);
            }
            for result in &mut results {
                result.scenes_scanned += 1;
            }
        }

        let any_found = results.iter().any(|r| !r.matches.is_empty());
        for result in &mut results {
            if !result.matches.is_empty() {
                result.outcome = ScanOutcome::ReferencesFound;
            }
            debug!(
                directory = %result.directory,
                matches = result.matches.len(),
                scenes = result.scenes_scanned,
                "reference check finished"
            );
        }
        self.phase = self.phase.advance(if any_found {
            ScanPhase::ReferencesFound
        } else {
            ScanPhase::NoReferencesFound
        });
        results
    }
}

/// Walk every object below `roots` and record fields referencing any target.
fn collect_matches(
    scene: &AssetPath,
    roots: &[SceneObject],
    index: &dyn AssetIndex,
    targets: &[ScanTarget],
    out: &mut Vec<(usize, ReferenceMatch)>,
) {
    // Explicit stack: scene hierarchies can be deep.
    let mut stack: Vec<(&SceneObject, String)> = roots
        .iter()
        .rev()
        .map(|root| (root, root.name.clone()))
        .collect();

    while let Some((object, object_path)) = stack.pop() {
        for component in &object.components {
            let mut record = |field_path: &str, asset: &AssetPath| {
                for (slot, target) in targets.iter().enumerate() {
                    if target.files.contains(asset) {
                        out.push((
                            slot,
                            ReferenceMatch {
                                scene: scene.clone(),
                                object: object_path.clone(),
                                component: component.type_name.clone(),
                                field: field_path.to_string(),
                                asset: asset.clone(),
                            },
                        ));
                    }
                }
            };
            for field in &component.fields {
                visit_field(&field.name, &field.value, &mut record, index);
            }
        }
        for child in object.children.iter().rev() {
            stack.push((child, format!("{object_path}/{}", child.name)));
        }
    }
}

fn visit_field(
    path: &str,
    value: &FieldValue,
    on_reference: &mut dyn FnMut(&str, &AssetPath),
    index: &dyn AssetIndex,
) {
    match value {
        FieldValue::Reference(Some(reference)) => {
            if let Some(asset) = index.asset_path_of(reference) {
                on_reference(path, &asset);
            }
        }
        FieldValue::Reference(None) | FieldValue::Scalar(_) => {}
        FieldValue::Struct(fields) => {
            for field in fields {
                visit_field(&format!("{path}.{}", field.name), &field.value, on_reference, index);
            }
        }
        FieldValue::List(items) => {
            for (i, item) in items.iter().enumerate() {
                visit_field(&format!("{path}[{i}]"), item, on_reference, index);
            }
        }
    }
}
