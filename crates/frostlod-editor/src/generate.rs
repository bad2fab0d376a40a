//! Generation State Machine
//!
//! Reconciles generated variants in the host scene with the current tasks.
//! Variants are found by name only, so every call re-derives state from the
//! live object set:
//! - Generate: sweep LOD1+ variants, rename LOD0 sources, rebuild every required level
//! - Update ratios: refresh decimate configuration on unapplied variants
//! - Finalize: bake decimation into geometry (one-way)
//! - Cleanup: remove everything above LOD0
//! - Organize: sort variants into per-level collections
//! - Poly counts: per-level polygon totals, estimated for unapplied variants

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use ahash::AHashSet;
use frostlod_core::naming::{parse_variant_name, variant_name};
use frostlod_core::{HostError, HostResult, LodPolicy, MAX_ORGANIZED_LEVEL, MeshHost, ObjectId};

/// Parent collection of the per-level collections
pub const LOD_PARENT_COLLECTION: &str = "LODs";

/// Collection holding variants of one level
pub fn level_collection(level: u32) -> String {
    format!("LOD{level}")
}

/// Work item for one enabled slot with a live source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    /// Source mesh
    pub source: ObjectId,
    /// Material name
    pub material: String,
    /// Lowest required level
    pub min_lod: u32,
    /// Highest required level
    pub max_lod: u32,
}

impl GenerationTask {
    /// Levels that are produced by duplication (LOD0 is the source itself)
    pub fn duplicated_levels(&self) -> RangeInclusive<u32> {
        self.min_lod.max(1)..=self.max_lod
    }
}

/// Outcome of a generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Variants created, including LOD0 renames
    pub created: usize,
    /// Sources renamed into LOD0 variants
    pub renamed: usize,
    /// LOD1+ variants removed by the sweep
    pub removed: usize,
    /// Enabled slots without a live source
    pub skipped_slots: usize,
    /// Tasks that failed part way
    pub failed: usize,
    /// Variants moved into level collections, if organizing ran
    pub organized: Option<usize>,
}

/// A generated variant found in the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub id: ObjectId,
    pub material: String,
    pub level: u32,
}

/// All mesh objects named by the variant convention
pub fn variants<H: MeshHost>(host: &H) -> Vec<Variant> {
    host.mesh_objects()
        .into_iter()
        .filter_map(|id| {
            let (material, level) = parse_variant_name(host.object_name(id)?)?;
            Some(Variant {
                id,
                material: material.to_string(),
                level,
            })
        })
        .collect()
}

fn find_by_name<H: MeshHost>(host: &H, name: &str) -> Option<ObjectId> {
    host.mesh_objects()
        .into_iter()
        .find(|id| host.object_name(*id) == Some(name))
}

/// Run generation for the given tasks.
///
/// Partial failures are counted, never rolled back.
pub fn generate<H: MeshHost>(host: &mut H, policy: &LodPolicy, tasks: &[GenerationTask]) -> GenerationReport {
    let mut report = GenerationReport {
        removed: sweep(host, tasks),
        ..GenerationReport::default()
    };

    for task in tasks {
        if let Err(err) = generate_task(host, policy, task, &mut report) {
            log::warn!("Generation for {} stopped: {}", task.material, err);
            report.failed += 1;
        }
    }

    if let Err(err) = select_all_variants(host) {
        log::warn!("Could not select generated variants: {}", err);
    }
    report
}

/// Remove every variant above LOD0 so the tasks rebuild them from their
/// current sources. Task sources always survive.
fn sweep<H: MeshHost>(host: &mut H, tasks: &[GenerationTask]) -> usize {
    let sources: AHashSet<ObjectId> = tasks.iter().map(|task| task.source).collect();
    let mut removed = 0;

    for variant in variants(host) {
        if variant.level == 0 || sources.contains(&variant.id) {
            continue;
        }

        match host.remove_object(variant.id) {
            Ok(()) => {
                log::debug!("Removed variant {}:lod{}", variant.material, variant.level);
                removed += 1;
            }
            Err(err) => log::warn!("Could not remove {}: {}", variant.id, err),
        }
    }
    removed
}

/// Strip the LOD0 tag from every mesh other than `keep` named `name`
fn retire_lod0<H: MeshHost>(host: &mut H, name: &str, material: &str, keep: ObjectId) -> HostResult<()> {
    let holders: Vec<ObjectId> = host
        .mesh_objects()
        .into_iter()
        .filter(|&id| id != keep && host.object_name(id) == Some(name))
        .collect();

    for id in holders {
        host.set_object_name(id, material)?;
        host.set_mesh_name(id, material)?;
        log::debug!("Retired previous {} as {}", name, material);
    }
    Ok(())
}

fn generate_task<H: MeshHost>(
    host: &mut H,
    policy: &LodPolicy,
    task: &GenerationTask,
    report: &mut GenerationReport,
) -> HostResult<()> {
    if !host.contains(task.source) {
        return Err(HostError::StaleObject(task.source));
    }
    if task.min_lod == 0 {
        let name = variant_name(&task.material, 0);
        retire_lod0(host, &name, &task.material, task.source)?;
        if host.object_name(task.source) != Some(name.as_str()) {
            host.set_object_name(task.source, &name)?;
            host.set_mesh_name(task.source, &name)?;
            report.created += 1;
            report.renamed += 1;
            log::debug!("Renamed source to {}", name);
        }
    }

    for level in task.duplicated_levels() {
        let name = variant_name(&task.material, level);
        let settings = policy.decimate_for_level(level);

        // Only a task source can still hold the name after the sweep
        if find_by_name(host, &name).is_some() {
            log::warn!("{} is a source mesh, not overwriting it", name);
            continue;
        }

        // Deep copy: variants never share geometry
        let variant = host.duplicate_object(task.source, false)?;
        host.set_object_name(variant, &name)?;
        host.set_mesh_name(variant, &name)?;
        host.set_decimate(variant, settings)?;
        report.created += 1;
        log::debug!("Created {} at ratio {:.2}", name, settings.ratio);
    }
    Ok(())
}

fn select_all_variants<H: MeshHost>(host: &mut H) -> HostResult<()> {
    host.deselect_all();
    for variant in variants(host) {
        host.set_selected(variant.id, true)?;
    }
    Ok(())
}

/// Refresh decimate configuration of every unapplied variant above LOD0
pub fn update_ratios<H: MeshHost>(host: &mut H, policy: &LodPolicy) -> HostResult<usize> {
    let mut updated = 0;
    for variant in variants(host) {
        if variant.level == 0 || host.decimate(variant.id).is_none() {
            continue;
        }
        host.set_decimate(variant.id, policy.decimate_for_level(variant.level))?;
        updated += 1;
    }
    Ok(updated)
}

/// Bake decimation into every variant that still carries a configuration
pub fn finalize<H: MeshHost>(host: &mut H) -> HostResult<usize> {
    let mut applied = 0;
    for variant in variants(host) {
        if host.apply_decimate(variant.id)? {
            applied += 1;
        }
    }
    Ok(applied)
}

/// Remove every variant above LOD0
pub fn cleanup<H: MeshHost>(host: &mut H) -> HostResult<usize> {
    let mut removed = 0;
    for variant in variants(host) {
        if variant.level >= 1 {
            host.remove_object(variant.id)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Move each variant up to [`MAX_ORGANIZED_LEVEL`] into exactly one level collection
pub fn organize<H: MeshHost>(host: &mut H) -> HostResult<usize> {
    let variants = variants(host);
    if variants.is_empty() {
        return Ok(0);
    }

    host.ensure_collection(LOD_PARENT_COLLECTION, None)?;
    for level in 0..=MAX_ORGANIZED_LEVEL {
        host.ensure_collection(&level_collection(level), Some(LOD_PARENT_COLLECTION))?;
    }

    let mut moved = 0;
    for variant in variants {
        if variant.level > MAX_ORGANIZED_LEVEL {
            continue;
        }
        for collection in host.object_collections(variant.id) {
            host.unlink_from_collection(variant.id, &collection)?;
        }
        host.link_to_collection(variant.id, &level_collection(variant.level))?;
        moved += 1;
    }
    Ok(moved)
}

/// Polygon totals per level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolyCountReport {
    pub counts: BTreeMap<u32, usize>,
}

impl PolyCountReport {
    /// Whether no variant was counted
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total for one level
    pub fn level(&self, level: u32) -> Option<usize> {
        self.counts.get(&level).copied()
    }

    /// `(level, count, percent of LOD0)` rows; 0% when LOD0 is absent
    pub fn rows(&self) -> Vec<(u32, usize, f64)> {
        let base = self.level(0).unwrap_or(0);
        self.counts
            .iter()
            .map(|(&level, &count)| {
                let percent = if level == 0 {
                    100.0
                } else if base > 0 {
                    count as f64 / base as f64 * 100.0
                } else {
                    0.0
                };
                (level, count, percent)
            })
            .collect()
    }
}

/// Per-level polygon totals: raw for applied variants, estimated for configured ones
pub fn poly_counts<H: MeshHost>(host: &H) -> PolyCountReport {
    let mut report = PolyCountReport::default();
    for variant in variants(host) {
        let Some(raw) = host.polygon_count(variant.id) else {
            continue;
        };
        let count = host
            .decimate(variant.id)
            .map_or(raw, |settings| settings.estimate(raw));
        *report.counts.entry(variant.level).or_insert(0) += count;
    }
    report
}

/// Select exactly the variants at `level`
pub fn select_level<H: MeshHost>(host: &mut H, level: u32) -> HostResult<usize> {
    host.deselect_all();
    let mut selected = 0;
    for variant in variants(host).into_iter().filter(|v| v.level == level) {
        host.set_selected(variant.id, true)?;
        selected += 1;
    }
    Ok(selected)
}

/// Hide every variant not at `level`
pub fn isolate_level<H: MeshHost>(host: &mut H, level: u32) -> HostResult<()> {
    for variant in variants(host) {
        host.set_hidden(variant.id, variant.level != level)?;
    }
    Ok(())
}

/// Reveal every variant
pub fn show_all<H: MeshHost>(host: &mut H) -> HostResult<()> {
    for variant in variants(host) {
        host.set_hidden(variant.id, false)?;
    }
    Ok(())
}

/// Strip the `:lod0` tag from every LOD0 variant
pub fn rename_lod0_back<H: MeshHost>(host: &mut H) -> HostResult<usize> {
    let mut renamed = 0;
    for variant in variants(host).into_iter().filter(|v| v.level == 0) {
        host.set_object_name(variant.id, &variant.material)?;
        host.set_mesh_name(variant.id, &variant.material)?;
        renamed += 1;
    }
    Ok(renamed)
}
