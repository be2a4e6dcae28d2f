/// In-memory scene host.
///
/// Scenes are registered up front as object trees. The host tracks how many
/// scenes are open so callers can verify that open/close calls pair up.
use super::{SceneHandle, SceneHost, SceneObject};
use crate::error::SceneError;
use crate::model::AssetPath;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct MemorySceneHost {
    scenes: HashMap<AssetPath, Vec<SceneObject>>,
    broken: HashSet<AssetPath>,
    open: Option<(SceneHandle, AssetPath)>,
    next_handle: u32,
    opened: Vec<AssetPath>,
    closed: usize,
}

impl MemorySceneHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scene(&mut self, path: &str, roots: Vec<SceneObject>) {
        self.scenes.insert(AssetPath::new(path), roots);
    }

    /// Make opening `path` fail.
    pub fn break_scene(&mut self, path: &str) {
        self.broken.insert(AssetPath::new(path));
    }

    /// Scenes successfully opened so far, in order.
    pub fn opened(&self) -> &[AssetPath] {
        &self.opened
    }

    pub fn close_count(&self) -> usize {
        self.closed
    }

    pub fn is_any_open(&self) -> bool {
        self.open.is_some()
    }
}

impl SceneHost for MemorySceneHost {
    fn open_additive(&mut self, scene: &AssetPath) -> Result<SceneHandle, SceneError> {
        if let Some((_, current)) = &self.open {
            return Err(SceneError::OpenFailure {
                scene: scene.clone(),
                reason: format!("scene host busy with {current}"),
            });
        }
        if self.broken.contains(scene) || !self.scenes.contains_key(scene) {
            return Err(SceneError::OpenFailure {
                scene: scene.clone(),
                reason: "scene could not be loaded".to_string(),
            });
        }
        self.next_handle += 1;
        let handle = SceneHandle(self.next_handle);
        self.open = Some((handle, scene.clone()));
        self.opened.push(scene.clone());
        Ok(handle)
    }

    fn root_objects(&self, handle: SceneHandle) -> &[SceneObject] {
        match &self.open {
            Some((open, path)) if *open == handle => {
                self.scenes.get(path).map(Vec::as_slice).unwrap_or(&[])
            }
            _ => &[],
        }
    }

    fn close_discard(&mut self, handle: SceneHandle) {
        if matches!(&self.open, Some((open, _)) if *open == handle) {
            self.open = None;
            self.closed += 1;
        }
    }
}
