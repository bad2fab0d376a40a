//! LOD Policy
//!
//! Deterministic simplification parameters per LOD level:
//! - Linear ratio decay from a base ratio with a hard floor
//! - Presets that overwrite base ratio and step
//! - Decimate configuration derived from method and symmetry

use serde::{Deserialize, Serialize};

/// Lowest ratio ever handed to the host
pub const MIN_RATIO: f64 = 0.01;
/// Bounds for the base (LOD1) ratio
pub const BASE_RATIO_RANGE: (f64, f64) = (0.01, 1.0);
/// Bounds for the per-level step
pub const STEP_RANGE: (f64, f64) = (0.01, 0.5);

/// Decimation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecimateMethod {
    #[default]
    Collapse,
    UnSubdivide,
    Planar,
}

/// Symmetry option for the collapse method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Symmetry {
    #[default]
    None,
    X,
    Y,
    Z,
}

/// Quality presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Custom,
    #[default]
    High,
    Medium,
    Aggressive,
}

impl Preset {
    /// Fixed `(base_ratio, step)` pair, `None` for custom
    pub fn values(&self) -> Option<(f64, f64)> {
        match self {
            Self::Custom => None,
            Self::High => Some((0.50, 0.10)),
            Self::Medium => Some((0.50, 0.12)),
            Self::Aggressive => Some((0.40, 0.10)),
        }
    }
}

/// Axis used when symmetry is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Decimate configuration attached to a variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecimateSettings {
    /// Fraction of polygons to keep
    pub ratio: f64,
    /// Decimation method
    pub method: DecimateMethod,
    /// Symmetry axis, only ever set for collapse
    pub symmetry: Option<Axis>,
    /// Triangulate while collapsing
    pub triangulate: bool,
}

impl DecimateSettings {
    /// Polygon count after applying this configuration to `raw` polygons
    pub fn estimate(&self, raw: usize) -> usize {
        (raw as f64 * self.ratio).round() as usize
    }
}

/// Session LOD policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodPolicy {
    /// LOD1 ratio
    pub base_ratio: f64,
    /// Ratio lost per level after LOD1
    pub step: f64,
    /// Decimation method
    pub method: DecimateMethod,
    /// Symmetry (collapse only)
    pub symmetry: Symmetry,
    /// Last selected preset
    pub preset: Preset,
}

impl Default for LodPolicy {
    fn default() -> Self {
        Self {
            base_ratio: 0.50,
            step: 0.10,
            method: DecimateMethod::Collapse,
            symmetry: Symmetry::None,
            preset: Preset::High,
        }
    }
}

impl LodPolicy {
    /// Create a custom policy with the given base ratio and step
    pub fn custom(base_ratio: f64, step: f64) -> Self {
        let mut policy = Self {
            preset: Preset::Custom,
            ..Self::default()
        };
        policy.set_base_ratio(base_ratio);
        policy.set_step(step);
        policy
    }

    /// Select a preset, overwriting base ratio and step unless it is custom
    pub fn apply_preset(&mut self, preset: Preset) {
        self.preset = preset;
        if let Some((base_ratio, step)) = preset.values() {
            self.base_ratio = base_ratio;
            self.step = step;
        }
    }

    /// Set the base ratio, clamped to its valid range
    pub fn set_base_ratio(&mut self, base_ratio: f64) {
        self.base_ratio = base_ratio.clamp(BASE_RATIO_RANGE.0, BASE_RATIO_RANGE.1);
    }

    /// Set the step, clamped to its valid range
    pub fn set_step(&mut self, step: f64) {
        self.step = step.clamp(STEP_RANGE.0, STEP_RANGE.1);
    }

    /// Ratio for a LOD level. Level 0 is never reduced.
    pub fn ratio_for_level(&self, level: u32) -> f64 {
        if level == 0 {
            return 1.0;
        }
        let ratio = self.base_ratio - self.step * f64::from(level - 1);
        ratio.max(MIN_RATIO)
    }

    /// Decimate configuration for a LOD level
    pub fn decimate_for_level(&self, level: u32) -> DecimateSettings {
        let collapse = self.method == DecimateMethod::Collapse;
        let symmetry = match (collapse, self.symmetry) {
            (true, Symmetry::X) => Some(Axis::X),
            (true, Symmetry::Y) => Some(Axis::Y),
            (true, Symmetry::Z) => Some(Axis::Z),
            _ => None,
        };

        DecimateSettings {
            ratio: self.ratio_for_level(level),
            method: self.method,
            symmetry,
            triangulate: collapse,
        }
    }

    /// Estimated polygon counts per level for one source of `source_polys` polygons.
    ///
    /// Matches what generation followed by a poly count would report.
    pub fn preview(&self, source_polys: usize, min_lod: u32, max_lod: u32) -> Vec<(u32, usize)> {
        (min_lod..=max_lod)
            .map(|level| {
                let count = if level == 0 {
                    source_polys
                } else {
                    self.decimate_for_level(level).estimate(source_polys)
                };
                (level, count)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_zero_is_unreduced() {
        for preset in [Preset::High, Preset::Medium, Preset::Aggressive] {
            let mut policy = LodPolicy::default();
            policy.apply_preset(preset);
            assert_eq!(policy.ratio_for_level(0), 1.0);
        }
        assert_eq!(LodPolicy::custom(0.01, 0.5).ratio_for_level(0), 1.0);
    }

    #[test]
    fn test_linear_decay() {
        let policy = LodPolicy::custom(0.5, 0.1);
        assert!((policy.ratio_for_level(1) - 0.5).abs() < 1e-9);
        assert!((policy.ratio_for_level(2) - 0.4).abs() < 1e-9);
        assert!((policy.ratio_for_level(3) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_floor_and_monotonic() {
        let policy = LodPolicy::custom(0.4, 0.12);
        let mut previous = policy.ratio_for_level(0);
        for level in 1..40 {
            let ratio = policy.ratio_for_level(level);
            assert!(ratio <= previous);
            assert!(ratio >= MIN_RATIO);
            previous = ratio;
        }
        assert_eq!(policy.ratio_for_level(30), MIN_RATIO);
    }

    #[test]
    fn test_preset_idempotence() {
        let mut direct = LodPolicy::default();
        direct.apply_preset(Preset::High);

        let mut cycled = LodPolicy::custom(0.9, 0.3);
        cycled.apply_preset(Preset::High);
        cycled.apply_preset(Preset::Medium);
        cycled.apply_preset(Preset::High);
        cycled.apply_preset(Preset::High);

        assert_eq!((cycled.base_ratio, cycled.step), (direct.base_ratio, direct.step));
    }

    #[test]
    fn test_custom_preset_keeps_values() {
        let mut policy = LodPolicy::default();
        policy.apply_preset(Preset::Aggressive);
        policy.set_step(0.2);
        policy.apply_preset(Preset::Custom);
        assert_eq!((policy.base_ratio, policy.step), (0.40, 0.2));
        assert_eq!(policy.preset, Preset::Custom);
    }

    #[test]
    fn test_clamping() {
        let policy = LodPolicy::custom(3.0, 0.0);
        assert_eq!(policy.base_ratio, 1.0);
        assert_eq!(policy.step, 0.01);
    }

    #[test]
    fn test_symmetry_only_for_collapse() {
        let mut policy = LodPolicy::default();
        policy.symmetry = Symmetry::Y;
        let collapse = policy.decimate_for_level(2);
        assert_eq!(collapse.symmetry, Some(Axis::Y));
        assert!(collapse.triangulate);

        policy.method = DecimateMethod::Planar;
        let planar = policy.decimate_for_level(2);
        assert_eq!(planar.symmetry, None);
        assert!(!planar.triangulate);
        assert_eq!(planar.method, DecimateMethod::Planar);
    }

    #[test]
    fn test_preview() {
        let policy = LodPolicy::custom(0.5, 0.1);
        assert_eq!(
            policy.preview(1000, 0, 3),
            vec![(0, 1000), (1, 500), (2, 400), (3, 300)]
        );
        assert_eq!(policy.preview(1000, 2, 2), vec![(2, 400)]);
    }
}
