/// Scene graphs and the collaborators that load them.
///
/// A [`SceneHost`] opens a scene by path and exposes its object hierarchy:
/// every [`SceneObject`] carries its components, and every component its
/// serialised fields. A [`SceneCatalog`] says which scenes exist and which
/// of them are enabled for scanning.
pub mod memory;
pub mod scanner;
pub mod unity;
pub mod yaml;

pub use memory::MemorySceneHost;
pub use scanner::{ReferenceCheck, ReferenceMatch, ScanOutcome, ScanPhase, SceneReferenceScanner};
pub use unity::{BuildSettingsCatalog, UnitySceneHost};

use crate::error::{Result, SceneError};
use crate::index::ObjectRef;
use crate::model::AssetPath;
use serde::{Deserialize, Serialize};

/// A scene listed for scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub path: AssetPath,
    pub enabled: bool,
}

impl SceneDescriptor {
    pub fn new(path: &str, enabled: bool) -> Self {
        Self {
            path: AssetPath::new(path),
            enabled,
        }
    }
}

/// Opaque handle to a scene opened by a [`SceneHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneHandle(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub components: Vec<Component>,
    pub children: Vec<SceneObject>,
}

impl SceneObject {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            components: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_child(mut self, child: SceneObject) -> Self {
        self.children.push(child);
        self
    }
}

/// A behaviour attached to an object.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub type_name: String,
    pub fields: Vec<SerializedField>,
}

impl Component {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: FieldValue) -> Self {
        self.fields.push(SerializedField {
            name: name.to_string(),
            value,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SerializedField {
    pub name: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// An object reference; `None` when the field is unassigned.
    Reference(Option<ObjectRef>),
    /// A nested serialisable struct.
    Struct(Vec<SerializedField>),
    /// An array or list.
    List(Vec<FieldValue>),
    Scalar(String),
}

impl FieldValue {
    pub fn reference(guid: &str, file_id: i64) -> Self {
        Self::Reference(Some(ObjectRef::new(guid, file_id)))
    }
}

/// Loads scene graphs. Only one scene may be open at a time.
pub trait SceneHost {
    /// Load `scene` additively and without making it visible.
    fn open_additive(&mut self, scene: &AssetPath) -> std::result::Result<SceneHandle, SceneError>;

    /// Root objects of an open scene; empty for an unknown handle.
    fn root_objects(&self, handle: SceneHandle) -> &[SceneObject];

    /// Close the scene and discard any in-memory changes.
    fn close_discard(&mut self, handle: SceneHandle);
}

/// Source of the scene list.
pub trait SceneCatalog {
    fn scenes(&self) -> Result<Vec<SceneDescriptor>>;
}

/// A fixed scene list.
#[derive(Debug, Clone, Default)]
pub struct StaticSceneCatalog(pub Vec<SceneDescriptor>);

impl SceneCatalog for StaticSceneCatalog {
    fn scenes(&self) -> Result<Vec<SceneDescriptor>> {
        Ok(self.0.clone())
    }
}
