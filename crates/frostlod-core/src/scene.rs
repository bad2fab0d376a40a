//! Scene
//!
//! In-memory reference host with:
//! - Generational object handles (stale handles never resolve)
//! - Reference-counted mesh data, freed with its last user
//! - One decimate slot per mesh object
//! - Collection hierarchy under a scene root
//! - Selection, visibility, parenting and armature modifiers

use ahash::AHashMap;
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::host::{HostError, HostResult, MeshHost, ObjectId, ObjectKind};
use crate::policy::DecimateSettings;

/// Name of the root collection every new object is linked into
pub const SCENE_COLLECTION: &str = "Scene Collection";

/// Mesh data identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(u32);

/// Geometry data shared between objects
#[derive(Debug, Clone)]
pub struct MeshData {
    /// Data block name
    pub name: String,
    /// Polygon count
    pub polygon_count: usize,
    /// Number of objects using this data
    users: u32,
}

impl MeshData {
    /// Number of objects using this data
    pub fn users(&self) -> u32 {
        self.users
    }
}

/// Scene object
#[derive(Debug, Clone)]
pub struct Object {
    /// Object name
    pub name: String,
    /// Object kind
    pub kind: ObjectKind,
    /// Geometry data (meshes only)
    mesh: Option<MeshId>,
    /// Decimate slot
    decimate: Option<DecimateSettings>,
    /// Armature modifier target
    armature: Option<ObjectId>,
    /// Parent object
    parent: Option<ObjectId>,
    /// Hidden in the viewport
    pub hidden: bool,
    /// Part of the selection
    pub selected: bool,
}

impl Object {
    fn new(name: impl Into<String>, kind: ObjectKind, mesh: Option<MeshId>) -> Self {
        Self {
            name: name.into(),
            kind,
            mesh,
            decimate: None,
            armature: None,
            parent: None,
            hidden: false,
            selected: false,
        }
    }
}

/// Collection of objects with optional nesting
#[derive(Debug, Clone, Default)]
struct Collection {
    parent: Option<String>,
    children: SmallVec<[String; 8]>,
    objects: Vec<ObjectId>,
}

/// Object slot with generation counter
#[derive(Debug)]
struct Slot {
    generation: u32,
    object: Option<Object>,
}

/// In-memory scene implementing [`MeshHost`]
pub struct Scene {
    /// Object slots indexed by handle index
    slots: Vec<Slot>,
    /// Free slot indices for recycling
    free_indices: Vec<u32>,
    /// Mesh data blocks
    meshes: AHashMap<MeshId, MeshData>,
    /// Next mesh ID to allocate
    next_mesh_id: u32,
    /// Collections by name, in creation order
    collections: IndexMap<String, Collection>,
}

impl Scene {
    /// Create an empty scene with only the root collection
    pub fn new() -> Self {
        let mut collections = IndexMap::new();
        collections.insert(SCENE_COLLECTION.to_string(), Collection::default());

        Self {
            slots: Vec::new(),
            free_indices: Vec::new(),
            meshes: AHashMap::new(),
            next_mesh_id: 0,
            collections,
        }
    }

    /// Add a mesh object with its own geometry data of the same name
    pub fn add_mesh(&mut self, name: impl Into<String>, polygon_count: usize) -> ObjectId {
        let name = name.into();
        let mesh = self.alloc_mesh(MeshData {
            name: name.clone(),
            polygon_count,
            users: 1,
        });
        self.spawn(Object::new(name, ObjectKind::Mesh, Some(mesh)))
    }

    /// Add an armature object
    pub fn add_armature(&mut self, name: impl Into<String>) -> ObjectId {
        self.spawn(Object::new(name, ObjectKind::Armature, None))
    }

    /// Get an object by handle
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.object.as_ref())
    }

    fn object_mut(&mut self, id: ObjectId) -> HostResult<&mut Object> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.object.as_mut())
            .ok_or(HostError::StaleObject(id))
    }

    /// Geometry data of a mesh object
    pub fn mesh_data(&self, id: ObjectId) -> Option<&MeshData> {
        let mesh = self.object(id)?.mesh?;
        self.meshes.get(&mesh)
    }

    /// Whether two objects share one geometry block
    pub fn shares_mesh(&self, a: ObjectId, b: ObjectId) -> bool {
        match (self.object(a).and_then(|o| o.mesh), self.object(b).and_then(|o| o.mesh)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Number of live geometry blocks
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Number of live objects
    pub fn object_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.object.is_some()).count()
    }

    /// Find the first object with the given name
    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.live().find(|(_, obj)| obj.name == name).map(|(id, _)| id)
    }

    /// Set the parent of an object
    pub fn set_parent(&mut self, child: ObjectId, parent: Option<ObjectId>) -> HostResult<()> {
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(HostError::StaleObject(parent));
            }
        }
        self.object_mut(child)?.parent = parent;
        Ok(())
    }

    /// Point the object's armature modifier at `target`
    pub fn set_armature_modifier(&mut self, id: ObjectId, target: Option<ObjectId>) -> HostResult<()> {
        self.object_mut(id)?.armature = target;
        Ok(())
    }

    /// Objects directly linked into a collection
    pub fn collection_objects(&self, name: &str) -> Option<&[ObjectId]> {
        self.collections.get(name).map(|c| c.objects.as_slice())
    }

    /// Child collections of a collection
    pub fn collection_children(&self, name: &str) -> Option<&[String]> {
        self.collections.get(name).map(|c| c.children.as_slice())
    }

    /// Parent of a collection, `None` for the root or an unknown name
    pub fn collection_parent(&self, name: &str) -> Option<&str> {
        self.collections.get(name).and_then(|c| c.parent.as_deref())
    }

    /// Whether the object is part of the selection
    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.object(id).is_some_and(|obj| obj.selected)
    }

    fn live(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.object
                .as_ref()
                .map(|obj| (ObjectId::new(index as u32, slot.generation), obj))
        })
    }

    fn spawn(&mut self, object: Object) -> ObjectId {
        let id = if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.object = Some(object);
            ObjectId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                object: Some(object),
            });
            ObjectId::new(index, 0)
        };

        if let Some(root) = self.collections.get_mut(SCENE_COLLECTION) {
            root.objects.push(id);
        }
        id
    }

    fn alloc_mesh(&mut self, data: MeshData) -> MeshId {
        let id = MeshId(self.next_mesh_id);
        self.next_mesh_id += 1;
        self.meshes.insert(id, data);
        id
    }

    fn mesh_id(&self, id: ObjectId) -> HostResult<MeshId> {
        self.object(id)
            .ok_or(HostError::StaleObject(id))?
            .mesh
            .ok_or(HostError::NotAMesh(id))
    }

    /// Give the object its own copy of shared geometry
    fn make_single_user(&mut self, id: ObjectId) -> HostResult<MeshId> {
        let mesh = self.mesh_id(id)?;
        let shared = self.meshes.get(&mesh).filter(|data| data.users > 1).cloned();
        let Some(data) = shared else {
            return Ok(mesh);
        };

        if let Some(original) = self.meshes.get_mut(&mesh) {
            original.users -= 1;
        }
        let copy = self.alloc_mesh(MeshData { users: 1, ..data });
        self.object_mut(id)?.mesh = Some(copy);
        Ok(copy)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshHost for Scene {
    fn mesh_objects(&self) -> Vec<ObjectId> {
        self.live()
            .filter(|(_, obj)| obj.kind == ObjectKind::Mesh)
            .map(|(id, _)| id)
            .collect()
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.object(id).is_some()
    }

    fn kind(&self, id: ObjectId) -> Option<ObjectKind> {
        self.object(id).map(|obj| obj.kind)
    }

    fn object_name(&self, id: ObjectId) -> Option<&str> {
        self.object(id).map(|obj| obj.name.as_str())
    }

    fn set_object_name(&mut self, id: ObjectId, name: &str) -> HostResult<()> {
        self.object_mut(id)?.name = name.to_string();
        Ok(())
    }

    fn set_mesh_name(&mut self, id: ObjectId, name: &str) -> HostResult<()> {
        let mesh = self.mesh_id(id)?;
        if let Some(data) = self.meshes.get_mut(&mesh) {
            data.name = name.to_string();
        }
        Ok(())
    }

    fn duplicate_object(&mut self, id: ObjectId, linked: bool) -> HostResult<ObjectId> {
        let mut copy = self.object(id).ok_or(HostError::StaleObject(id))?.clone();
        copy.selected = false;

        if let Some(mesh) = copy.mesh {
            if linked {
                if let Some(data) = self.meshes.get_mut(&mesh) {
                    data.users += 1;
                }
            } else if let Some(data) = self.meshes.get(&mesh).cloned() {
                copy.mesh = Some(self.alloc_mesh(MeshData { users: 1, ..data }));
            }
        }

        let memberships = self.object_collections(id);
        let new_id = self.spawn(copy);

        // Copies live where the source lives
        if let Some(root) = self.collections.get_mut(SCENE_COLLECTION) {
            root.objects.retain(|o| *o != new_id);
        }
        for name in memberships {
            self.link_to_collection(new_id, &name)?;
        }
        Ok(new_id)
    }

    fn remove_object(&mut self, id: ObjectId) -> HostResult<()> {
        let object = self
            .slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.object.take())
            .ok_or(HostError::StaleObject(id))?;
        self.free_indices.push(id.index());

        for collection in self.collections.values_mut() {
            collection.objects.retain(|o| *o != id);
        }

        if let Some(mesh) = object.mesh {
            let orphaned = match self.meshes.get_mut(&mesh) {
                Some(data) => {
                    data.users = data.users.saturating_sub(1);
                    data.users == 0
                }
                None => false,
            };
            if orphaned {
                self.meshes.remove(&mesh);
                log::trace!("Freed mesh data of {}", object.name);
            }
        }
        Ok(())
    }

    fn polygon_count(&self, id: ObjectId) -> Option<usize> {
        self.mesh_data(id).map(|data| data.polygon_count)
    }

    fn decimate(&self, id: ObjectId) -> Option<&DecimateSettings> {
        self.object(id).and_then(|obj| obj.decimate.as_ref())
    }

    fn set_decimate(&mut self, id: ObjectId, settings: DecimateSettings) -> HostResult<()> {
        self.mesh_id(id)?;
        self.object_mut(id)?.decimate = Some(settings);
        Ok(())
    }

    fn apply_decimate(&mut self, id: ObjectId) -> HostResult<bool> {
        self.mesh_id(id)?;
        let Some(settings) = self.object_mut(id)?.decimate.take() else {
            return Ok(false);
        };

        let mesh = self.make_single_user(id)?;
        if let Some(data) = self.meshes.get_mut(&mesh) {
            data.polygon_count = settings.estimate(data.polygon_count);
        }
        Ok(true)
    }

    fn ensure_collection(&mut self, name: &str, parent: Option<&str>) -> HostResult<()> {
        if self.collections.contains_key(name) {
            return Ok(());
        }

        let parent = parent.unwrap_or(SCENE_COLLECTION);
        let parent_collection = self
            .collections
            .get_mut(parent)
            .ok_or_else(|| HostError::CollectionNotFound(parent.to_string()))?;
        parent_collection.children.push(name.to_string());

        self.collections.insert(
            name.to_string(),
            Collection {
                parent: Some(parent.to_string()),
                ..Collection::default()
            },
        );
        Ok(())
    }

    fn object_collections(&self, id: ObjectId) -> Vec<String> {
        self.collections
            .iter()
            .filter(|(_, c)| c.objects.contains(&id))
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn link_to_collection(&mut self, id: ObjectId, collection: &str) -> HostResult<()> {
        if !self.contains(id) {
            return Err(HostError::StaleObject(id));
        }
        let target = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| HostError::CollectionNotFound(collection.to_string()))?;
        if !target.objects.contains(&id) {
            target.objects.push(id);
        }
        Ok(())
    }

    fn unlink_from_collection(&mut self, id: ObjectId, collection: &str) -> HostResult<()> {
        let target = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| HostError::CollectionNotFound(collection.to_string()))?;
        target.objects.retain(|o| *o != id);
        Ok(())
    }

    fn armature_of(&self, id: ObjectId) -> Option<ObjectId> {
        let object = self.object(id)?;
        let is_armature = |candidate: &ObjectId| self.kind(*candidate) == Some(ObjectKind::Armature);

        object
            .armature
            .filter(is_armature)
            .or_else(|| object.parent.filter(is_armature))
    }

    fn is_hidden(&self, id: ObjectId) -> bool {
        self.object(id).is_some_and(|obj| obj.hidden)
    }

    fn set_hidden(&mut self, id: ObjectId, hidden: bool) -> HostResult<()> {
        self.object_mut(id)?.hidden = hidden;
        Ok(())
    }

    fn deselect_all(&mut self) {
        for slot in &mut self.slots {
            if let Some(obj) = slot.object.as_mut() {
                obj.selected = false;
            }
        }
    }

    fn set_selected(&mut self, id: ObjectId, selected: bool) -> HostResult<()> {
        self.object_mut(id)?.selected = selected;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::LodPolicy;

    #[test]
    fn test_add_and_find() {
        let mut scene = Scene::new();
        let hull = scene.add_mesh("Hull", 1000);
        let rig = scene.add_armature("Rig");

        assert_eq!(scene.object_count(), 2);
        assert_eq!(scene.find_by_name("Hull"), Some(hull));
        assert_eq!(scene.mesh_objects(), vec![hull]);
        assert_eq!(scene.kind(rig), Some(ObjectKind::Armature));
        assert_eq!(scene.polygon_count(hull), Some(1000));
        assert_eq!(scene.object_collections(hull), vec![SCENE_COLLECTION.to_string()]);
    }

    #[test]
    fn test_stale_handle() {
        let mut scene = Scene::new();
        let hull = scene.add_mesh("Hull", 10);
        scene.remove_object(hull).unwrap();

        // Slot gets reused by a new object, old handle must not resolve
        let other = scene.add_mesh("Other", 5);
        assert_eq!(other.index(), hull.index());
        assert!(!scene.contains(hull));
        assert!(scene.contains(other));
        assert_eq!(scene.object_name(hull), None);
        assert_eq!(scene.set_object_name(hull, "x"), Err(HostError::StaleObject(hull)));
    }

    #[test]
    fn test_deep_duplicate() {
        let mut scene = Scene::new();
        let hull = scene.add_mesh("Hull", 1000);
        let copy = scene.duplicate_object(hull, false).unwrap();

        assert!(!scene.shares_mesh(hull, copy));
        assert_eq!(scene.mesh_count(), 2);
        scene.set_mesh_name(copy, "Hull:lod1").unwrap();
        assert_eq!(scene.mesh_data(hull).unwrap().name, "Hull");
        assert_eq!(scene.mesh_data(copy).unwrap().users(), 1);
    }

    #[test]
    fn test_shared_mesh_refcount() {
        let mut scene = Scene::new();
        let hull = scene.add_mesh("Hull", 1000);
        let linked = scene.duplicate_object(hull, true).unwrap();

        assert!(scene.shares_mesh(hull, linked));
        assert_eq!(scene.mesh_data(hull).unwrap().users(), 2);

        scene.remove_object(linked).unwrap();
        assert_eq!(scene.mesh_count(), 1);
        assert_eq!(scene.mesh_data(hull).unwrap().users(), 1);

        scene.remove_object(hull).unwrap();
        assert_eq!(scene.mesh_count(), 0);
    }

    #[test]
    fn test_apply_decimate_copies_shared_data() {
        let mut scene = Scene::new();
        let hull = scene.add_mesh("Hull", 1000);
        let linked = scene.duplicate_object(hull, true).unwrap();

        let settings = LodPolicy::custom(0.5, 0.1).decimate_for_level(2);
        scene.set_decimate(linked, settings).unwrap();
        assert!(scene.apply_decimate(linked).unwrap());
        assert!(!scene.apply_decimate(linked).unwrap());

        assert_eq!(scene.polygon_count(linked), Some(400));
        assert_eq!(scene.polygon_count(hull), Some(1000));
        assert!(!scene.shares_mesh(hull, linked));
        assert!(scene.decimate(linked).is_none());
    }

    #[test]
    fn test_decimate_requires_mesh() {
        let mut scene = Scene::new();
        let rig = scene.add_armature("Rig");
        let settings = LodPolicy::default().decimate_for_level(1);
        assert_eq!(scene.set_decimate(rig, settings), Err(HostError::NotAMesh(rig)));
    }

    #[test]
    fn test_collections() {
        let mut scene = Scene::new();
        let hull = scene.add_mesh("Hull", 10);

        scene.ensure_collection("LODs", None).unwrap();
        scene.ensure_collection("LOD0", Some("LODs")).unwrap();
        scene.ensure_collection("LOD0", Some("LODs")).unwrap();
        assert_eq!(scene.collection_children("LODs").unwrap(), ["LOD0".to_string()]);
        assert_eq!(scene.collection_parent("LOD0"), Some("LODs"));

        scene.unlink_from_collection(hull, SCENE_COLLECTION).unwrap();
        scene.link_to_collection(hull, "LOD0").unwrap();
        scene.link_to_collection(hull, "LOD0").unwrap();
        assert_eq!(scene.collection_objects("LOD0").unwrap(), [hull]);
        assert_eq!(scene.object_collections(hull), vec!["LOD0".to_string()]);

        assert_eq!(
            scene.link_to_collection(hull, "Missing"),
            Err(HostError::CollectionNotFound("Missing".to_string()))
        );
    }

    #[test]
    fn test_duplicate_keeps_collections() {
        let mut scene = Scene::new();
        let hull = scene.add_mesh("Hull", 10);
        scene.ensure_collection("Ship", None).unwrap();
        scene.unlink_from_collection(hull, SCENE_COLLECTION).unwrap();
        scene.link_to_collection(hull, "Ship").unwrap();

        let copy = scene.duplicate_object(hull, false).unwrap();
        assert_eq!(scene.object_collections(copy), vec!["Ship".to_string()]);
    }

    #[test]
    fn test_armature_lookup() {
        let mut scene = Scene::new();
        let rig = scene.add_armature("Rig");
        let other_rig = scene.add_armature("OtherRig");
        let body = scene.add_mesh("Body", 10);
        let prop = scene.add_mesh("Prop", 10);

        scene.set_parent(body, Some(other_rig)).unwrap();
        assert_eq!(scene.armature_of(body), Some(other_rig));

        scene.set_armature_modifier(body, Some(rig)).unwrap();
        assert_eq!(scene.armature_of(body), Some(rig));

        // A mesh parent is not a skeletal parent
        scene.set_parent(prop, Some(body)).unwrap();
        assert_eq!(scene.armature_of(prop), None);
    }

    #[test]
    fn test_selection_and_visibility() {
        let mut scene = Scene::new();
        let a = scene.add_mesh("A", 1);
        let b = scene.add_mesh("B", 1);

        scene.set_selected(a, true).unwrap();
        scene.set_selected(b, true).unwrap();
        scene.deselect_all();
        assert!(!scene.is_selected(a) && !scene.is_selected(b));

        scene.set_hidden(a, true).unwrap();
        assert!(scene.is_hidden(a));
        assert!(!scene.is_hidden(b));
    }
}
