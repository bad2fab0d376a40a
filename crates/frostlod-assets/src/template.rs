//! Template Parser
//!
//! Recovers the asset path and the material → LOD span table from a mesh
//! template resource. The format has no schema available here, so the parser
//! works on proximity: a material name token is tied to the first mesh path
//! reference with a `_lod<N>` suffix that follows it within a short window.
//!
//! Bytes are treated as single-byte text (one byte, one character), so binary
//! noise never stops the scan.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::bytes::Regex;
use serde::Serialize;

use crate::{AssetError, AssetResult};

/// Bytes after a token that are searched for its mesh reference.
///
/// Tuned on sample files; recalibrate against a larger corpus if accuracy drifts.
pub const LOD_WINDOW: usize = 300;
/// Shortest accepted material name
pub const MIN_TOKEN_LEN: usize = 3;
/// Generic names that are never materials.
///
/// Tuned on sample files alongside [`LOD_WINDOW`].
pub const STOP_WORDS: [&str; 5] = ["mesh", "material", "shader", "lod", "model"];
/// Top-level categories an asset path may start with
pub const ASSET_CATEGORIES: [&str; 4] = ["characters", "vehicles", "weapons", "props"];

static ASSET_PATH: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?-u)((?:{})/[^\x00]+?)(?:_lod|\x00)", ASSET_CATEGORIES.join("|"));
    Regex::new(&pattern).expect("asset path pattern is valid")
});
static NAME_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)([A-Za-z0-9_]+)\x00").expect("token pattern is valid"));
static LEVEL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)_lod[0-9]+$").expect("level tag pattern is valid"));
static MESH_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)Mesh:[^\x00]+_lod([0-9]+)").expect("mesh reference pattern is valid"));

/// One material and the LOD levels it spans
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialEntry {
    /// Material name (case-sensitive)
    pub name: String,
    /// Lowest level the material was seen at
    pub min_lod: u32,
    /// Highest level the material was seen at
    pub max_lod: u32,
}

impl MaterialEntry {
    /// Whether `level` lies within the span
    pub fn spans(&self, level: u32) -> bool {
        (self.min_lod..=self.max_lod).contains(&level)
    }
}

/// Parsed mesh template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateDescriptor {
    /// Display name (containing folder, or file stem)
    pub name: String,
    /// File the template was read from
    pub source: PathBuf,
    /// Asset path inside the game data, empty if none was found
    pub asset_path: String,
    /// Materials sorted by name
    pub materials: Vec<MaterialEntry>,
    /// Materials per level, in first-seen order
    pub levels: BTreeMap<u32, Vec<String>>,
}

impl TemplateDescriptor {
    /// Whether no material was recovered
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Look up a material by name
    pub fn material(&self, name: &str) -> Option<&MaterialEntry> {
        self.materials.iter().find(|m| m.name == name)
    }
}

/// Parse a template file.
///
/// Fails only when the file cannot be read. An empty table is a valid result.
pub fn parse(path: &Path) -> AssetResult<TemplateDescriptor> {
    let data = std::fs::read(path).map_err(|source| AssetError::ParseFailure {
        path: path.to_path_buf(),
        source,
    })?;

    let mut descriptor = parse_bytes(&data);
    descriptor.name = display_name(path);
    descriptor.source = path.to_path_buf();
    Ok(descriptor)
}

/// Parse template bytes
pub fn parse_bytes(data: &[u8]) -> TemplateDescriptor {
    let levels = collect_levels(data);
    let materials = material_spans(&levels);

    TemplateDescriptor {
        name: String::new(),
        source: PathBuf::new(),
        asset_path: find_asset_path(data),
        materials,
        levels,
    }
}

/// Display name for a template: its folder name, else its file stem
pub fn display_name(path: &Path) -> String {
    path.parent()
        .and_then(|parent| parent.file_name())
        .or_else(|| path.file_stem())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// First asset path, running from a known category up to `_lod` or a null byte
pub fn find_asset_path(data: &[u8]) -> String {
    ASSET_PATH
        .captures(data)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_single_byte(m.as_bytes()))
        .unwrap_or_default()
}

/// Whether a null-terminated token can be a material name
pub fn is_material_candidate(token: &str) -> bool {
    if token.len() < MIN_TOKEN_LEN {
        return false;
    }
    if token.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if LEVEL_TAG.is_match(token.as_bytes()) {
        return false;
    }
    let lower = token.to_ascii_lowercase();
    !STOP_WORDS.contains(&lower.as_str())
}

/// LOD level of the first mesh reference in a window
pub fn lod_in_window(window: &[u8]) -> Option<u32> {
    let caps = MESH_REFERENCE.captures(window)?;
    let digits = caps.get(1)?.as_bytes();
    // Digits are ASCII, so this cannot fail; overflow can
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Map each level to the materials referenced at it
pub fn collect_levels(data: &[u8]) -> BTreeMap<u32, Vec<String>> {
    let mut levels: BTreeMap<u32, Vec<String>> = BTreeMap::new();

    for caps in NAME_TOKEN.captures_iter(data) {
        let Some(token) = caps.get(1) else {
            continue;
        };
        // Token bytes are ASCII by construction
        let name = decode_single_byte(token.as_bytes());
        if !is_material_candidate(&name) {
            continue;
        }

        let start = token.start();
        let end = (start + LOD_WINDOW).min(data.len());
        let Some(level) = lod_in_window(&data[start..end]) else {
            continue;
        };

        let materials = levels.entry(level).or_default();
        if !materials.contains(&name) {
            materials.push(name);
        }
    }

    levels
}

/// Min/max level of every material, sorted by name
pub fn material_spans(levels: &BTreeMap<u32, Vec<String>>) -> Vec<MaterialEntry> {
    let mut spans: BTreeMap<&str, (u32, u32)> = BTreeMap::new();

    for (&level, materials) in levels {
        for name in materials {
            spans
                .entry(name.as_str())
                .and_modify(|(min, max)| {
                    *min = (*min).min(level);
                    *max = (*max).max(level);
                })
                .or_insert((level, level));
        }
    }

    spans
        .into_iter()
        .map(|(name, (min_lod, max_lod))| MaterialEntry {
            name: name.to_string(),
            min_lod,
            max_lod,
        })
        .collect()
}

/// Decode bytes one character per byte
pub fn decode_single_byte(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Material name followed closely by its mesh reference, the way templates lay them out
    fn section(material: &str, asset: &str, level: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(material.as_bytes());
        out.extend_from_slice(b"\0\x12\x00\x00\x7f");
        out.extend_from_slice(format!("Mesh:{asset}_lod{level}\0").as_bytes());
        out.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        out
    }

    fn sample_blob() -> Vec<u8> {
        let mut data = b"\x89RES\x01\x00".to_vec();
        data.extend(section("mat_hull", "vehicles/tank/tank_hull", 0));
        data.extend(section("mat_tracks", "vehicles/tank/tank_hull", 0));
        data.extend(section("mat_hull", "vehicles/tank/tank_hull", 1));
        data.extend(section("mat_hull", "vehicles/tank/tank_hull", 2));
        data.extend(section("mat_glass", "vehicles/tank/tank_hull", 2));
        data.extend(section("mat_glass", "vehicles/tank/tank_hull", 3));
        data
    }

    #[test]
    fn test_parse_sample() {
        let descriptor = parse_bytes(&sample_blob());

        assert_eq!(descriptor.asset_path, "vehicles/tank/tank_hull");
        assert_eq!(
            descriptor.materials,
            vec![
                MaterialEntry { name: "mat_glass".into(), min_lod: 2, max_lod: 3 },
                MaterialEntry { name: "mat_hull".into(), min_lod: 0, max_lod: 2 },
                MaterialEntry { name: "mat_tracks".into(), min_lod: 0, max_lod: 0 },
            ]
        );
        assert_eq!(descriptor.levels[&0], vec!["mat_hull".to_string(), "mat_tracks".to_string()]);
        assert_eq!(descriptor.levels[&2], vec!["mat_hull".to_string(), "mat_glass".to_string()]);
    }

    #[test]
    fn test_spans_cover_every_level() {
        let descriptor = parse_bytes(&sample_blob());
        for (level, materials) in &descriptor.levels {
            for name in materials {
                let entry = descriptor.material(name).unwrap();
                assert!(entry.min_lod <= entry.max_lod);
                assert!(entry.spans(*level));
            }
        }
    }

    #[test]
    fn test_duplicates_suppressed_per_level() {
        let mut data = Vec::new();
        data.extend(section("mat_body", "characters/soldier/body", 1));
        data.extend(section("mat_body", "characters/soldier/body", 1));
        let descriptor = parse_bytes(&data);
        assert_eq!(descriptor.levels[&1], vec!["mat_body".to_string()]);
    }

    #[test]
    fn test_candidate_filter() {
        assert!(is_material_candidate("mat_hull"));
        assert!(is_material_candidate("abc"));
        assert!(!is_material_candidate("ab"));
        assert!(!is_material_candidate("12345"));
        assert!(!is_material_candidate("tank_hull_lod2"));
        assert!(!is_material_candidate("tank_hull_LOD12"));
        assert!(!is_material_candidate("Mesh"));
        assert!(!is_material_candidate("SHADER"));
        assert!(is_material_candidate("lod_mesh"));
        assert!(is_material_candidate("hull_lod"));
    }

    #[test]
    fn test_level_tagged_tokens_are_not_materials() {
        // The mesh path itself ends in a null terminated `_lod<N>` token
        let descriptor = parse_bytes(&section("mat_hull", "props/crate/crate", 4));
        assert_eq!(descriptor.materials.len(), 1);
        assert_eq!(descriptor.materials[0].name, "mat_hull");
        assert_eq!(descriptor.materials[0].min_lod, 4);
    }

    #[test]
    fn test_lod_in_window() {
        assert_eq!(lod_in_window(b"xx\0Mesh:props/box_lod3\0"), Some(3));
        assert_eq!(lod_in_window(b"Mesh:props/box_lod1_lod7\0"), Some(7));
        assert_eq!(lod_in_window(b"Mesh:props/box\0 Mesh:props/b_lod2"), Some(2));
        assert_eq!(lod_in_window(b"Mesh:\0_lod2"), None);
        assert_eq!(lod_in_window(b"props/box_lod2"), None);
        assert_eq!(lod_in_window(b"Mesh:props/box_lod99999999999\0"), None);
    }

    #[test]
    fn test_reference_outside_window_discarded() {
        let mut data = b"mat_far\0".to_vec();
        data.extend(std::iter::repeat_n(0x01u8, LOD_WINDOW));
        data.extend_from_slice(b"Mesh:props/far_lod1\0");
        assert!(parse_bytes(&data).is_empty());
    }

    #[test]
    fn test_substring_tokens_evaluated_independently() {
        // `hull` and `hull_trim` are separate tokens
        let mut data = Vec::new();
        data.extend(section("hull", "vehicles/a/a", 0));
        data.extend(section("hull_trim", "vehicles/a/a", 1));
        let descriptor = parse_bytes(&data);
        assert_eq!(descriptor.material("hull").unwrap().max_lod, 0);
        assert_eq!(descriptor.material("hull_trim").unwrap().min_lod, 1);
        assert_eq!(descriptor.materials.len(), 2);
    }

    #[test]
    fn test_asset_path() {
        assert_eq!(find_asset_path(b"\x01\x02characters/pilot/pilot_body_lod0\0"), "characters/pilot/pilot_body");
        assert_eq!(find_asset_path(b"weapons/rifle/stock\0rest"), "weapons/rifle/stock");
        assert_eq!(find_asset_path(b"\xe9props/caf\xe9\0"), "props/caf\u{e9}");
        assert_eq!(find_asset_path(b"textures/wall\0"), "");
        // Unterminated run does not match, a later one does
        assert_eq!(find_asset_path(b"props/\0vehicles/jeep_lod1"), "vehicles/jeep");
        assert_eq!(find_asset_path(b"props/open"), "");
    }

    #[test]
    fn test_blocks_token_only() {
        assert!(parse_bytes(b"blocks\0").is_empty());
        assert!(parse_bytes(b"blocks").is_empty());
    }

    #[test]
    fn test_binary_noise() {
        let noise: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let descriptor = parse_bytes(&noise);
        assert!(descriptor.is_empty());
        assert_eq!(descriptor.asset_path, "");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("samples/tank/tank_mesh.res")), "tank");
        assert_eq!(display_name(Path::new("tank_mesh.res")), "tank_mesh");
    }

    #[test]
    fn test_parse_missing_file() {
        let err = parse(Path::new("/nonexistent/frostlod/x_mesh.res")).unwrap_err();
        assert!(matches!(err, AssetError::ParseFailure { .. }));
    }
}
