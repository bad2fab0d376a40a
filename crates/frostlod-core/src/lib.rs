//! # Frostlod Core
//!
//! Core library for generating level-of-detail variants from template-driven
//! material assignments.
//!
//! This crate provides:
//! - **Host**: Capability interface over the host scene and generational object handles
//! - **Scene**: In-memory host with reference-counted mesh data and collections
//! - **Naming**: The `<material>:lod<level>` convention that indexes generated variants
//! - **Policy**: Ratio decay, presets and decimate configuration per LOD level

pub mod host;
pub mod naming;
pub mod policy;
pub mod scene;

pub use host::{HostError, HostResult, MeshHost, ObjectId, ObjectKind};
pub use naming::{level_from_name, material_from_name, variant_name};
pub use policy::{Axis, DecimateMethod, DecimateSettings, LodPolicy, Preset, Symmetry};
pub use scene::Scene;

/// Highest LOD level sorted into level collections
pub const MAX_ORGANIZED_LEVEL: u32 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let mut scene = Scene::new();
        let id = scene.add_mesh(variant_name("Hull", 2), 10);
        assert_eq!(scene.object_name(id).and_then(level_from_name), Some(2));
        assert_eq!(LodPolicy::default().preset, Preset::High);
    }
}
