//! Preferences
//!
//! User defaults persisted as JSON, applied to new sessions.

use std::path::{Path, PathBuf};

use frostlod_core::{DecimateMethod, LodPolicy, Preset, Symmetry};
use serde::{Deserialize, Serialize};

use crate::SessionResult;
use crate::session::SessionSettings;

/// Bounds for the export unit scale
pub const EXPORT_SCALE_RANGE: (f64, f64) = (0.001, 1000.0);

/// Persistent user preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Samples folder for new sessions
    pub default_samples_folder: Option<PathBuf>,
    /// Export folder for new sessions
    pub default_export_path: Option<PathBuf>,
    /// Export unit scale
    pub default_export_scale: f64,
    /// Preset for new sessions
    pub default_preset: Preset,
    /// LOD1 ratio for new sessions
    pub default_lod1_ratio: f64,
    /// Ratio step for new sessions
    pub default_ratio_step: f64,
    /// Decimation method for new sessions
    pub default_method: DecimateMethod,
    /// Symmetry for new sessions
    pub default_symmetry: Symmetry,
    /// Apply these defaults when a session starts
    pub auto_apply_defaults: bool,
    /// Record the last loaded template
    pub remember_last_template: bool,
    /// Last loaded template
    pub last_template_path: Option<PathBuf>,
    /// Require confirmation for finalize and cleanup
    pub confirm_destructive: bool,
    /// Sort variants into level collections after generating
    pub auto_organize_collections: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_samples_folder: None,
            default_export_path: None,
            default_export_scale: 0.01,
            default_preset: Preset::High,
            default_lod1_ratio: 0.5,
            default_ratio_step: 0.1,
            default_method: DecimateMethod::Collapse,
            default_symmetry: Symmetry::None,
            auto_apply_defaults: true,
            remember_last_template: true,
            last_template_path: None,
            confirm_destructive: true,
            auto_organize_collections: true,
        }
    }
}

impl Preferences {
    /// Load preferences from a JSON file
    pub fn load(path: &Path) -> SessionResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Load preferences, falling back to defaults if the file is missing or invalid
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(prefs) => prefs,
            Err(err) => {
                log::debug!("Using default preferences ({}): {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Save preferences as pretty-printed JSON
    pub fn save(&self, path: &Path) -> SessionResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Restore factory defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Policy described by the defaults
    pub fn default_policy(&self) -> LodPolicy {
        let mut policy = LodPolicy {
            method: self.default_method,
            symmetry: self.default_symmetry,
            preset: self.default_preset,
            ..LodPolicy::default()
        };
        policy.set_base_ratio(self.default_lod1_ratio);
        policy.set_step(self.default_ratio_step);
        policy
    }

    /// Copy defaults into session settings. Unset folders leave the session's own.
    pub fn apply_to(&self, settings: &mut SessionSettings) {
        if let Some(folder) = &self.default_samples_folder {
            settings.samples_folder = Some(folder.clone());
        }
        if let Some(path) = &self.default_export_path {
            settings.export_path = path.clone();
        }
        settings.set_export_scale(self.default_export_scale);
        settings.policy = self.default_policy();
    }
}
