//! # Frostlod Editor
//!
//! LOD authoring workflow on top of a host scene.
//!
//! ## Features
//! - Session binding template materials to source meshes
//! - Generation, ratio refresh, finalize and cleanup of LOD variants
//! - Per-level collections, visibility and selection helpers
//! - Polygon count reporting
//! - Export selection handed to a pluggable exporter
//! - JSON preferences

pub mod export;
pub mod generate;
pub mod preferences;
pub mod session;

use std::path::PathBuf;

use frostlod_assets::AssetError;
use frostlod_core::HostError;
use thiserror::Error;

pub use export::{ExportError, ExportRequest, Exporter};
pub use generate::{GenerationReport, GenerationTask, PolyCountReport, Variant};
pub use preferences::Preferences;
pub use session::{LodSession, MaterialSlot, SessionSettings, SlotStatus};

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Not a mesh template: {}", .0.display())]
    NotATemplate(PathBuf),

    #[error("Template could not be loaded: {0}")]
    ParseFailure(#[source] AssetError),

    #[error("No previously loaded template")]
    NoLastTemplate,

    #[error("No enabled material has a source mesh")]
    NoAssignableSources,

    #[error("No generated LODs in the scene")]
    NoGeneratedLods,

    #[error("No material slot at index {0}")]
    NoSuchSlot(usize),

    #[error("{0} is destructive and needs confirmation")]
    ConfirmationRequired(&'static str),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preferences error: {0}")]
    Preferences(#[from] serde_json::Error),

    #[error("Export failed: {0}")]
    Export(#[source] ExportError),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
