//! Host Capabilities
//!
//! The engine never owns meshes. Everything it does to the live object set goes
//! through [`MeshHost`], which a host application implements over its own scene:
//! - Object identity (settable names, generational handles)
//! - Reference-counted geometry data (copyable, renameable)
//! - A single decimate slot per object (configurable, appliable)
//! - Collection membership (linkable, unlinkable)
//! - Selection, visibility and skeletal parents

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::DecimateSettings;

/// Host errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Object no longer exists: {0}")]
    StaleObject(ObjectId),

    #[error("Object is not a mesh: {0}")]
    NotAMesh(ObjectId),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
}

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;

/// Object handle with generation counter to detect stale references
///
/// Handles are non-owning. Once the host removes an object, every copy of its
/// handle stops resolving, even if the slot is later reused by a new object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    /// Slot index
    index: u32,
    /// Generation counter
    generation: u32,
}

impl ObjectId {
    /// Create a handle with the given index and generation
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Get the slot index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Get the generation
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Kind of a host object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Mesh,
    Armature,
}

/// Capability interface over the host scene
///
/// Implementations decide how names, meshes and collections are stored. The
/// engine assumes exclusive access for the duration of one call.
pub trait MeshHost {
    /// All live mesh objects, in a stable order
    fn mesh_objects(&self) -> Vec<ObjectId>;

    /// Whether the handle still resolves
    fn contains(&self, id: ObjectId) -> bool;

    /// Kind of the object, `None` if the handle is stale
    fn kind(&self, id: ObjectId) -> Option<ObjectKind>;

    /// Object name, `None` if the handle is stale
    fn object_name(&self, id: ObjectId) -> Option<&str>;

    /// Rename the object
    fn set_object_name(&mut self, id: ObjectId, name: &str) -> HostResult<()>;

    /// Rename the object's geometry data
    fn set_mesh_name(&mut self, id: ObjectId, name: &str) -> HostResult<()>;

    /// Duplicate an object.
    ///
    /// With `linked` the copy shares the source geometry and bumps its user
    /// count; otherwise the geometry is deep-copied.
    fn duplicate_object(&mut self, id: ObjectId, linked: bool) -> HostResult<ObjectId>;

    /// Remove an object, freeing its geometry once nothing else uses it
    fn remove_object(&mut self, id: ObjectId) -> HostResult<()>;

    /// Raw polygon count of the object's geometry
    fn polygon_count(&self, id: ObjectId) -> Option<usize>;

    /// Current decimate configuration, if the object still carries one
    fn decimate(&self, id: ObjectId) -> Option<&DecimateSettings>;

    /// Attach or replace the decimate configuration
    fn set_decimate(&mut self, id: ObjectId, settings: DecimateSettings) -> HostResult<()>;

    /// Bake the decimate configuration into the geometry.
    ///
    /// Returns `false` if there was nothing to apply.
    fn apply_decimate(&mut self, id: ObjectId) -> HostResult<bool>;

    /// Get or create a collection, optionally nested under `parent`
    fn ensure_collection(&mut self, name: &str, parent: Option<&str>) -> HostResult<()>;

    /// Names of the collections the object is linked into
    fn object_collections(&self, id: ObjectId) -> Vec<String>;

    /// Link an object into a collection
    fn link_to_collection(&mut self, id: ObjectId, collection: &str) -> HostResult<()>;

    /// Unlink an object from a collection
    fn unlink_from_collection(&mut self, id: ObjectId, collection: &str) -> HostResult<()>;

    /// Skeletal parent driving the object: the armature modifier target, else an armature parent
    fn armature_of(&self, id: ObjectId) -> Option<ObjectId>;

    /// Whether the object is hidden in the viewport
    fn is_hidden(&self, id: ObjectId) -> bool;

    /// Hide or reveal the object
    fn set_hidden(&mut self, id: ObjectId, hidden: bool) -> HostResult<()>;

    /// Clear the selection
    fn deselect_all(&mut self);

    /// Add or remove an object from the selection
    fn set_selected(&mut self, id: ObjectId, selected: bool) -> HostResult<()>;
}
