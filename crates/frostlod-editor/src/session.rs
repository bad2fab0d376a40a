//! LOD Session
//!
//! Owns the loaded template, the material slots bound to source meshes, the
//! scan cache and the settings every operation reads. The host scene is passed
//! into each call and never stored.

use std::path::{Path, PathBuf};

use frostlod_assets::{AssetError, CatalogCache, CatalogEntry, MaterialEntry, TemplateDescriptor};
use frostlod_core::{HostError, LodPolicy, MeshHost, ObjectId, ObjectKind, Preset};
use serde::{Deserialize, Serialize};

use crate::export::{ExportRequest, Exporter, collect_armatures, export_file_path};
use crate::generate::{self, GenerationReport, GenerationTask, PolyCountReport};
use crate::preferences::{EXPORT_SCALE_RANGE, Preferences};
use crate::{SessionError, SessionResult};

/// Scalar settings owned by the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Folder scanned for template subdirectories
    pub samples_folder: Option<PathBuf>,
    /// Export folder
    pub export_path: PathBuf,
    /// Export file stem
    pub export_name: String,
    /// Export unit scale
    pub export_scale: f64,
    /// LOD policy
    pub policy: LodPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            samples_folder: None,
            export_path: PathBuf::from("."),
            export_name: String::from("mesh_export"),
            export_scale: 0.01,
            policy: LodPolicy::default(),
        }
    }
}

impl SessionSettings {
    /// Set the export scale, clamped to its valid range
    pub fn set_export_scale(&mut self, scale: f64) {
        self.export_scale = scale.clamp(EXPORT_SCALE_RANGE.0, EXPORT_SCALE_RANGE.1);
    }
}

/// Binding between a template material and a source mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSlot {
    /// Material and its LOD span
    pub entry: MaterialEntry,
    /// Whether the slot takes part in generation
    pub enabled: bool,
    /// Non-owning reference to the source mesh
    source: Option<ObjectId>,
}

impl MaterialSlot {
    /// Create an enabled, unassigned slot
    pub fn new(entry: MaterialEntry) -> Self {
        Self {
            entry,
            enabled: true,
            source: None,
        }
    }

    /// Material name
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// Assigned handle, whether or not it still resolves
    pub fn source(&self) -> Option<ObjectId> {
        self.source
    }

    /// Assigned source if it still exists in the host
    pub fn resolve<H: MeshHost>(&self, host: &H) -> Option<ObjectId> {
        self.source.filter(|id| host.contains(*id))
    }
}

/// Assignment counts over enabled slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotStatus {
    pub assigned: usize,
    pub unassigned: usize,
    pub total: usize,
}

/// Editing session for one template
#[derive(Debug, Default)]
pub struct LodSession {
    /// Session settings
    pub settings: SessionSettings,
    /// User preferences
    pub preferences: Preferences,
    /// Loaded template
    template: Option<TemplateDescriptor>,
    /// One slot per template material
    slots: Vec<MaterialSlot>,
    /// Samples folder scan cache
    catalog: CatalogCache,
}

impl LodSession {
    /// Create a session, applying preference defaults if enabled
    pub fn new(preferences: Preferences) -> Self {
        let mut settings = SessionSettings::default();
        if preferences.auto_apply_defaults {
            preferences.apply_to(&mut settings);
        }

        Self {
            settings,
            preferences,
            template: None,
            slots: Vec::new(),
            catalog: CatalogCache::new(),
        }
    }

    /// Loaded template
    pub fn template(&self) -> Option<&TemplateDescriptor> {
        self.template.as_ref()
    }

    /// Material slots, sorted by material name
    pub fn slots(&self) -> &[MaterialSlot] {
        &self.slots
    }

    /// Enable or disable a slot
    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> SessionResult<()> {
        self.slot_mut(index)?.enabled = enabled;
        Ok(())
    }

    /// Index of the slot for a material
    pub fn slot_index(&self, material: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name() == material)
    }

    fn slot_mut(&mut self, index: usize) -> SessionResult<&mut MaterialSlot> {
        self.slots.get_mut(index).ok_or(SessionError::NoSuchSlot(index))
    }

    /// Select a preset, overwriting ratio and step unless custom
    pub fn set_preset(&mut self, preset: Preset) {
        self.settings.policy.apply_preset(preset);
    }

    /// Templates in the samples folder, rescanned only when the folder changed
    pub fn catalog(&mut self) -> &[CatalogEntry] {
        self.catalog.entries(self.settings.samples_folder.as_deref())
    }

    /// Change the samples folder
    pub fn set_samples_folder(&mut self, folder: Option<PathBuf>) {
        self.settings.samples_folder = folder;
        self.catalog.invalidate();
    }

    /// Force the next catalog lookup to rescan
    pub fn refresh_catalog(&mut self) {
        self.catalog.invalidate();
    }

    /// Load a template, replacing slots on success only.
    ///
    /// Returns the number of materials.
    pub fn load_template(&mut self, path: &Path) -> SessionResult<usize> {
        let descriptor = frostlod_assets::load_template(path).map_err(|err| match err {
            AssetError::NotATemplate(path) => SessionError::NotATemplate(path),
            other => SessionError::ParseFailure(other),
        })?;

        self.slots = descriptor.materials.iter().cloned().map(MaterialSlot::new).collect();
        let count = self.slots.len();
        self.template = Some(descriptor);

        if self.preferences.remember_last_template {
            self.preferences.last_template_path = Some(path.to_path_buf());
        }
        Ok(count)
    }

    /// Reload the template recorded in preferences
    pub fn load_last_template(&mut self) -> SessionResult<usize> {
        let path = self
            .preferences
            .last_template_path
            .clone()
            .ok_or(SessionError::NoLastTemplate)?;
        self.load_template(&path)
    }

    /// Load a catalog entry if its file still exists
    pub fn select_sample(&mut self, path: &Path) -> SessionResult<usize> {
        if !path.exists() {
            return Err(SessionError::NotATemplate(path.to_path_buf()));
        }
        self.load_template(path)
    }

    /// Bind a mesh to a slot
    pub fn assign<H: MeshHost>(&mut self, host: &H, index: usize, object: ObjectId) -> SessionResult<()> {
        match host.kind(object) {
            Some(ObjectKind::Mesh) => {}
            Some(_) => return Err(HostError::NotAMesh(object).into()),
            None => return Err(HostError::StaleObject(object).into()),
        }
        let slot = self.slot_mut(index)?;
        slot.source = Some(object);
        log::info!("Assigned {} to {}", object, slot.name());
        Ok(())
    }

    /// Unbind a slot
    pub fn clear_assignment(&mut self, index: usize) -> SessionResult<()> {
        self.slot_mut(index)?.source = None;
        Ok(())
    }

    /// Assignment counts over enabled slots; dangling sources count as unassigned
    pub fn slot_status<H: MeshHost>(&self, host: &H) -> SlotStatus {
        let enabled = self.slots.iter().filter(|slot| slot.enabled);
        let total = enabled.clone().count();
        let assigned = enabled.filter(|slot| slot.resolve(host).is_some()).count();
        SlotStatus {
            assigned,
            unassigned: total - assigned,
            total,
        }
    }

    /// Tasks for every enabled slot with a live source
    pub fn tasks<H: MeshHost>(&self, host: &H) -> Vec<GenerationTask> {
        self.slots
            .iter()
            .filter(|slot| slot.enabled)
            .filter_map(|slot| {
                let Some(source) = slot.resolve(host) else {
                    if slot.source.is_some() {
                        log::warn!("Source for {} no longer exists, skipping", slot.name());
                    }
                    return None;
                };
                Some(GenerationTask {
                    source,
                    material: slot.entry.name.clone(),
                    min_lod: slot.entry.min_lod,
                    max_lod: slot.entry.max_lod,
                })
            })
            .collect()
    }

    /// Generate variants for all assigned slots
    pub fn generate<H: MeshHost>(&self, host: &mut H) -> SessionResult<GenerationReport> {
        let tasks = self.tasks(host);
        if tasks.is_empty() {
            return Err(SessionError::NoAssignableSources);
        }

        let status = self.slot_status(host);
        let mut report = generate::generate(host, &self.settings.policy, &tasks);
        report.skipped_slots = status.unassigned;

        if self.preferences.auto_organize_collections {
            match generate::organize(host) {
                Ok(moved) => report.organized = Some(moved),
                Err(err) => log::warn!("Generated LODs could not be organized: {}", err),
            }
        }

        log::info!(
            "Generated {} LODs ({} renamed, {} removed, {} slots skipped)",
            report.created,
            report.renamed,
            report.removed,
            report.skipped_slots
        );
        Ok(report)
    }

    /// Refresh decimate configuration from the current policy
    pub fn update_ratios<H: MeshHost>(&self, host: &mut H) -> SessionResult<usize> {
        let updated = generate::update_ratios(host, &self.settings.policy)?;
        log::info!("Updated {} decimate configurations", updated);
        Ok(updated)
    }

    /// Bake decimation into all variants. Irreversible.
    pub fn finalize<H: MeshHost>(&self, host: &mut H, confirmed: bool) -> SessionResult<usize> {
        self.require_confirmation("finalize", confirmed)?;
        let applied = generate::finalize(host)?;
        log::info!("Applied {} decimate configurations", applied);
        Ok(applied)
    }

    /// Remove all variants above LOD0
    pub fn cleanup<H: MeshHost>(&self, host: &mut H, confirmed: bool) -> SessionResult<usize> {
        self.require_confirmation("cleanup", confirmed)?;
        let removed = generate::cleanup(host)?;
        log::info!("Removed {} LODs (kept LOD0)", removed);
        Ok(removed)
    }

    /// Sort variants into level collections
    pub fn organize<H: MeshHost>(&self, host: &mut H) -> SessionResult<usize> {
        Ok(generate::organize(host)?)
    }

    /// Per-level polygon totals
    pub fn poly_counts<H: MeshHost>(&self, host: &H) -> PolyCountReport {
        generate::poly_counts(host)
    }

    /// Select all variants and their skeletal parents and hand them to the exporter.
    ///
    /// Returns the number of variants exported.
    pub fn export<H, E>(&self, host: &mut H, exporter: &mut E) -> SessionResult<usize>
    where
        H: MeshHost,
        E: Exporter<H>,
    {
        let objects: Vec<ObjectId> = generate::variants(host).into_iter().map(|v| v.id).collect();
        if objects.is_empty() {
            return Err(SessionError::NoGeneratedLods);
        }
        let armatures = collect_armatures(host, &objects);

        host.deselect_all();
        for &id in objects.iter().chain(&armatures) {
            host.set_selected(id, true)?;
        }

        let request = ExportRequest {
            objects,
            armatures,
            file_path: export_file_path(&self.settings.export_path, &self.settings.export_name),
            scale: self.settings.export_scale,
        };
        exporter.export(host, &request).map_err(SessionError::Export)?;

        log::info!("Exported {} meshes to {}", request.objects.len(), request.file_path.display());
        Ok(request.objects.len())
    }

    fn require_confirmation(&self, action: &'static str, confirmed: bool) -> SessionResult<()> {
        if self.preferences.confirm_destructive && !confirmed {
            return Err(SessionError::ConfirmationRequired(action));
        }
        Ok(())
    }
}
