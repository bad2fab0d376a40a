//! # Frostlod Assets
//!
//! Mesh template ingestion for Frostlod.
//!
//! ## Features
//! - Sniffing `.res` files for mesh templates without a schema
//! - Heuristic recovery of materials and the LOD span of each
//! - Cacheable catalog of templates in a samples folder

pub mod catalog;
pub mod sniff;
pub mod template;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use catalog::{CatalogCache, CatalogEntry, scan};
pub use sniff::{Classification, classify};
pub use template::{MaterialEntry, TemplateDescriptor, parse, parse_bytes};

/// Asset errors
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Not a mesh template: {}", .0.display())]
    NotATemplate(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    ParseFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No materials found in {}", .0.display())]
    NoMaterials(PathBuf),
}

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;

/// Sniff, parse and require at least one material
pub fn load_template(path: &Path) -> AssetResult<TemplateDescriptor> {
    if !classify(path).is_template() {
        return Err(AssetError::NotATemplate(path.to_path_buf()));
    }

    let descriptor = parse(path)?;
    if descriptor.is_empty() {
        return Err(AssetError::NoMaterials(path.to_path_buf()));
    }

    log::info!(
        "Loaded template {} ({} materials, asset path '{}')",
        descriptor.name,
        descriptor.materials.len(),
        descriptor.asset_path
    );
    for material in &descriptor.materials {
        log::debug!("  {}: LOD {}-{}", material.name, material.min_lod, material.max_lod);
    }
    Ok(descriptor)
}
