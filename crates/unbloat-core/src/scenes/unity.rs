/// Unity scene host and build-settings catalog.
///
/// Reads text-serialised `.unity` files directly. The object hierarchy is
/// rebuilt from `Transform` parent/child links, and every `MonoBehaviour`
/// becomes a [`Component`] whose serialised fields are exposed as-is.
/// Prefab instances appear as objects carrying their source prefab and any
/// object-reference overrides.
use super::yaml::{self, parse_documents, scalar_text, YamlDocument};
use super::{Component, FieldValue, SceneCatalog, SceneDescriptor, SceneHandle, SceneHost, SceneObject, SerializedField};
use crate::error::{Error, Result, SceneError};
use crate::index::ObjectRef;
use crate::model::AssetPath;
use compact_str::CompactString;
use serde_yml::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CLASS_GAME_OBJECT: u32 = 1;
const CLASS_TRANSFORM: u32 = 4;
const CLASS_MONO_BEHAVIOUR: u32 = 114;
const CLASS_RECT_TRANSFORM: u32 = 224;
const CLASS_PREFAB_INSTANCE: u32 = 1001;

/// Bookkeeping keys present on every MonoBehaviour; not user fields.
const INTERNAL_KEYS: &[&str] = &[
    "m_ObjectHideFlags",
    "m_CorrespondingSourceObject",
    "m_PrefabInstance",
    "m_PrefabAsset",
    "m_GameObject",
    "m_Enabled",
    "m_EditorHideFlags",
    "m_Script",
    "m_Name",
    "m_EditorClassIdentifier",
];

/// Location of the build scene list inside a project.
pub const BUILD_SETTINGS_PATH: &str = "ProjectSettings/EditorBuildSettings.asset";

#[derive(Debug)]
pub struct UnitySceneHost {
    project_root: PathBuf,
    /// script guid → class name.
    script_names: HashMap<CompactString, String>,
    open: Option<(SceneHandle, Vec<SceneObject>)>,
    next_handle: u32,
}

impl UnitySceneHost {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            script_names: HashMap::new(),
            open: None,
            next_handle: 0,
        }
    }

    /// Names used for components whose script guid is known.
    pub fn with_script_names(mut self, names: HashMap<CompactString, String>) -> Self {
        self.script_names = names;
        self
    }
}

impl SceneHost for UnitySceneHost {
    fn open_additive(&mut self, scene: &AssetPath) -> std::result::Result<SceneHandle, SceneError> {
        if self.open.is_some() {
            return Err(SceneError::OpenFailure {
                scene: scene.clone(),
                reason: "another scene is still open".to_string(),
            });
        }
        let path = scene.to_fs_path(&self.project_root);
        let text = std::fs::read_to_string(&path).map_err(|err| SceneError::OpenFailure {
            scene: scene.clone(),
            reason: err.to_string(),
        })?;
        if !text.trim_start().starts_with("%YAML") {
            return Err(SceneError::OpenFailure {
                scene: scene.clone(),
                reason: "not a text-serialised scene".to_string(),
            });
        }

        let roots = load_scene(&text, &self.script_names);
        self.next_handle += 1;
        let handle = SceneHandle(self.next_handle);
        self.open = Some((handle, roots));
        Ok(handle)
    }

    fn root_objects(&self, handle: SceneHandle) -> &[SceneObject] {
        match &self.open {
            Some((open, roots)) if *open == handle => roots,
            _ => &[],
        }
    }

    fn close_discard(&mut self, handle: SceneHandle) {
        if matches!(&self.open, Some((open, _)) if *open == handle) {
            self.open = None;
        }
    }
}

struct TransformInfo {
    game_object: i64,
    children: Vec<i64>,
}

/// Rebuild the object hierarchy of a scene file.
pub fn load_scene(text: &str, script_names: &HashMap<CompactString, String>) -> Vec<SceneObject> {
    let parsed = parse_documents(text);
    if !parsed.skipped.is_empty() {
        warn!("{} scene documents could not be parsed", parsed.skipped.len());
    }

    let mut names: HashMap<i64, String> = HashMap::new();
    let mut game_object_order: Vec<i64> = Vec::new();
    let mut transforms: HashMap<i64, TransformInfo> = HashMap::new();
    let mut transform_of: HashMap<i64, i64> = HashMap::new();
    let mut root_transforms: Vec<i64> = Vec::new();
    let mut behaviours: HashMap<i64, Vec<Component>> = HashMap::new();
    // transform fileID → prefab instances parented under it (0 = scene root).
    let mut prefabs: HashMap<i64, Vec<SceneObject>> = HashMap::new();

    for doc in parsed.documents.iter().filter(|d| !d.stripped) {
        match doc.class_id {
            CLASS_GAME_OBJECT => {
                let name = doc.body.get("m_Name").and_then(scalar_text).unwrap_or_default();
                names.insert(doc.file_id, name);
                game_object_order.push(doc.file_id);
            }
            CLASS_TRANSFORM | CLASS_RECT_TRANSFORM => {
                let game_object = reference_id(&doc.body, "m_GameObject");
                let father = reference_id(&doc.body, "m_Father");
                let children = match doc.body.get("m_Children") {
                    Some(Value::Sequence(items)) => items.iter().filter_map(yaml::file_id).collect(),
                    _ => Vec::new(),
                };
                if father == 0 {
                    root_transforms.push(doc.file_id);
                }
                transform_of.insert(game_object, doc.file_id);
                transforms.insert(
                    doc.file_id,
                    TransformInfo {
                        game_object,
                        children,
                    },
                );
            }
            CLASS_MONO_BEHAVIOUR => {
                let owner = reference_id(&doc.body, "m_GameObject");
                behaviours
                    .entry(owner)
                    .or_default()
                    .push(behaviour_component(doc, script_names));
            }
            CLASS_PREFAB_INSTANCE => {
                let (parent, object) = prefab_instance_object(doc);
                prefabs.entry(parent).or_default().push(object);
            }
            _ => {}
        }
    }

    let ctx = Hierarchy {
        names: &names,
        transforms: &transforms,
        transform_of: &transform_of,
        behaviours: &behaviours,
        prefabs: &prefabs,
    };
    let mut visited: HashSet<i64> = HashSet::new();
    let mut roots = Vec::new();
    for transform in &root_transforms {
        if let Some(info) = transforms.get(transform) {
            if let Some(object) = ctx.build(info.game_object, &mut visited) {
                roots.push(object);
            }
        }
    }
    // Objects without a transform are still scene roots.
    for id in &game_object_order {
        if !transform_of.contains_key(id) {
            if let Some(object) = ctx.build(*id, &mut visited) {
                roots.push(object);
            }
        }
    }
    if let Some(top_level) = prefabs.get(&0) {
        roots.extend(top_level.iter().cloned());
    }
    debug!(roots = roots.len(), "scene hierarchy rebuilt");
    roots
}

struct Hierarchy<'a> {
    names: &'a HashMap<i64, String>,
    transforms: &'a HashMap<i64, TransformInfo>,
    transform_of: &'a HashMap<i64, i64>,
    behaviours: &'a HashMap<i64, Vec<Component>>,
    prefabs: &'a HashMap<i64, Vec<SceneObject>>,
}

impl Hierarchy<'_> {
    fn build(&self, game_object: i64, visited: &mut HashSet<i64>) -> Option<SceneObject> {
        if !visited.insert(game_object) {
            return None;
        }
        let name = self.names.get(&game_object)?;
        let mut object = SceneObject::new(name);
        if let Some(components) = self.behaviours.get(&game_object) {
            object.components = components.clone();
        }
        if let Some(transform) = self.transform_of.get(&game_object) {
            if let Some(info) = self.transforms.get(transform) {
                for child in &info.children {
                    let Some(child_info) = self.transforms.get(child) else {
                        continue;
                    };
                    if let Some(child_object) = self.build(child_info.game_object, visited) {
                        object.children.push(child_object);
                    }
                }
            }
            if let Some(nested) = self.prefabs.get(transform) {
                object.children.extend(nested.iter().cloned());
            }
        }
        Some(object)
    }
}

fn reference_id(body: &Value, key: &str) -> i64 {
    body.get(key).and_then(yaml::file_id).unwrap_or(0)
}

fn behaviour_component(doc: &YamlDocument, script_names: &HashMap<CompactString, String>) -> Component {
    let script_guid = doc.body.get("m_Script").and_then(yaml::guid);
    let type_name = script_guid
        .as_deref()
        .and_then(|guid| script_names.get(guid).cloned())
        .or_else(|| {
            doc.body
                .get("m_EditorClassIdentifier")
                .and_then(scalar_text)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| match &script_guid {
            Some(guid) => format!("MonoBehaviour({guid})"),
            None => doc.type_name.clone(),
        });

    let mut component = Component::new(&type_name);
    if let Value::Mapping(entries) = &doc.body {
        for (key, value) in entries {
            let name = key_text(key);
            if INTERNAL_KEYS.contains(&name.as_str()) {
                continue;
            }
            component.fields.push(SerializedField {
                name,
                value: to_field_value(value),
            });
        }
    }
    component
}

fn key_text(key: &Value) -> String {
    scalar_text(key).unwrap_or_default()
}

fn to_field_value(node: &Value) -> FieldValue {
    match node {
        Value::Tagged(tagged) => to_field_value(&tagged.value),
        Value::Mapping(_) if yaml::is_reference(node) => match yaml::file_id(node) {
            Some(0) | None => FieldValue::Reference(None),
            Some(id) => FieldValue::Reference(Some(ObjectRef::new(
                &yaml::guid(node).unwrap_or_default(),
                id,
            ))),
        },
        Value::Mapping(entries) => FieldValue::Struct(
            entries
                .iter()
                .map(|(name, value)| SerializedField {
                    name: key_text(name),
                    value: to_field_value(value),
                })
                .collect(),
        ),
        Value::Sequence(items) => FieldValue::List(items.iter().map(to_field_value).collect()),
        scalar => FieldValue::Scalar(scalar_text(scalar).unwrap_or_default()),
    }
}

/// A prefab instance as an object: its source prefab plus every override
/// that assigns an object reference. Returns the parent transform id too.
fn prefab_instance_object(doc: &YamlDocument) -> (i64, SceneObject) {
    let modification = doc.body.get("m_Modification");
    let parent = modification
        .map(|m| reference_id(m, "m_TransformParent"))
        .unwrap_or(0);

    let mut name = String::from("Prefab Instance");
    let mut component = Component::new("PrefabInstance");
    if let Some(source) = doc.body.get("m_SourcePrefab") {
        component.fields.push(SerializedField {
            name: "m_SourcePrefab".to_string(),
            value: to_field_value(source),
        });
    }
    if let Some(Value::Sequence(mods)) = modification.and_then(|m| m.get("m_Modifications")) {
        for m in mods {
            let property = m.get("propertyPath").and_then(scalar_text).unwrap_or_default();
            if property == "m_Name" {
                if let Some(value) = m.get("value").and_then(scalar_text) {
                    name = value;
                }
            }
            if let Some(reference) = m.get("objectReference") {
                if let FieldValue::Reference(Some(r)) = to_field_value(reference) {
                    component.fields.push(SerializedField {
                        name: property.clone(),
                        value: FieldValue::Reference(Some(r)),
                    });
                }
            }
        }
    }
    (parent, SceneObject::new(&name).with_component(component))
}

/// Scenes listed in `ProjectSettings/EditorBuildSettings.asset`.
#[derive(Debug, Clone)]
pub struct BuildSettingsCatalog {
    path: PathBuf,
}

impl BuildSettingsCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(BUILD_SETTINGS_PATH))
    }
}

impl SceneCatalog for BuildSettingsCatalog {
    fn scenes(&self) -> Result<Vec<SceneDescriptor>> {
        let text = std::fs::read_to_string(&self.path).map_err(|err| Error::io(&self.path, err))?;
        Ok(parse_build_settings(&text))
    }
}

/// Extract the `m_Scenes` list from build settings text.
pub fn parse_build_settings(text: &str) -> Vec<SceneDescriptor> {
    let parsed = parse_documents(text);
    let Some(Value::Sequence(items)) = parsed
        .documents
        .iter()
        .find_map(|doc| doc.body.get("m_Scenes"))
    else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let path = item.get("path").and_then(scalar_text)?;
            if path.is_empty() {
                return None;
            }
            let enabled = item.get("enabled").and_then(scalar_text).as_deref() == Some("1");
            Some(SceneDescriptor::new(&path, enabled))
        })
        .collect()
}
