//! Export Selection
//!
//! Chooses what goes to the exporter. Encoding is the exporter's business.

use std::path::PathBuf;

use frostlod_core::{MeshHost, ObjectId};

/// Fallback export file stem
pub const DEFAULT_EXPORT_STEM: &str = "mesh";
/// Extension of exported files
pub const EXPORT_EXTENSION: &str = "fbx";

/// Error type exporters report
pub type ExportError = Box<dyn std::error::Error + Send + Sync>;

/// Objects handed to an exporter
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    /// Generated variants
    pub objects: Vec<ObjectId>,
    /// Visible skeletal parents of the variants
    pub armatures: Vec<ObjectId>,
    /// Destination file
    pub file_path: PathBuf,
    /// Unit scale
    pub scale: f64,
}

/// Format-specific exporter
pub trait Exporter<H: MeshHost> {
    /// Encode the requested objects
    fn export(&mut self, host: &H, request: &ExportRequest) -> Result<(), ExportError>;
}

/// Destination file for an export folder and name
pub fn export_file_path(folder: &std::path::Path, name: &str) -> PathBuf {
    let stem = if name.is_empty() { DEFAULT_EXPORT_STEM } else { name };
    folder.join(format!("{stem}.{EXPORT_EXTENSION}"))
}

/// Visible skeletal parents of `objects`, first-seen order, no duplicates
pub fn collect_armatures<H: MeshHost>(host: &H, objects: &[ObjectId]) -> Vec<ObjectId> {
    let mut armatures = Vec::new();
    for &id in objects {
        if let Some(armature) = host.armature_of(id) {
            if !host.is_hidden(armature) && !armatures.contains(&armature) {
                armatures.push(armature);
            }
        }
    }
    armatures
}
