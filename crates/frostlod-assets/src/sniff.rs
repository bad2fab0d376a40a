//! Format Sniffer
//!
//! Best-effort classification of `.res` files. Never fails: anything that
//! cannot be read is simply not a template.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Resource file that never describes a mesh template
pub const BLOCKS_FILE_NAME: &str = "blocks.res";
/// File name fragment accepted without looking at content
pub const MESH_RES_SUFFIX: &str = "_mesh.res";
/// How much of the file is inspected for the mesh marker
pub const SNIFF_LEN: usize = 8192;
/// Marker preceding mesh path references
pub const MESH_MARKER: &[u8] = b"Mesh:";

/// Classification result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Template,
    NotTemplate,
}

impl Classification {
    /// Whether the file is a mesh template
    pub fn is_template(&self) -> bool {
        *self == Self::Template
    }
}

/// Whether the file name is the blocks resource
pub fn is_blocks_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase() == BLOCKS_FILE_NAME)
        .unwrap_or(false)
}

/// Classify a candidate file
pub fn classify(path: &Path) -> Classification {
    if is_blocks_file(path) {
        return Classification::NotTemplate;
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if name.contains(MESH_RES_SUFFIX) {
        return Classification::Template;
    }

    match read_prefix(path) {
        Ok(prefix) if contains_marker(&prefix) => Classification::Template,
        Ok(_) => Classification::NotTemplate,
        Err(err) => {
            log::debug!("Could not sniff {}: {}", path.display(), err);
            Classification::NotTemplate
        }
    }
}

/// Whether the mesh marker occurs in the given bytes
pub fn contains_marker(bytes: &[u8]) -> bool {
    bytes.windows(MESH_MARKER.len()).any(|window| window == MESH_MARKER)
}

fn read_prefix(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("frostlod-sniff-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_blocks_never_template() {
        let dir = scratch_dir("blocks");
        let path = dir.join("Blocks.RES");
        std::fs::write(&path, b"Mesh:characters/x_lod0\0").unwrap();
        assert_eq!(classify(&path), Classification::NotTemplate);
    }

    #[test]
    fn test_name_accepted_without_content() {
        // Missing file, but the name alone is enough
        let path = Path::new("/nonexistent/frostlod/tank_MESH.res");
        assert!(classify(path).is_template());
    }

    #[test]
    fn test_content_marker() {
        let dir = scratch_dir("content");
        let with_marker = dir.join("a.res");
        let mut data = vec![0xffu8; 100];
        data.extend_from_slice(b"Mesh:vehicles/tank_lod0\0");
        std::fs::write(&with_marker, &data).unwrap();
        assert!(classify(&with_marker).is_template());

        let without_marker = dir.join("b.res");
        std::fs::write(&without_marker, b"\x00\x01shader\0").unwrap();
        assert!(!classify(&without_marker).is_template());
    }

    #[test]
    fn test_marker_beyond_prefix_ignored() {
        let dir = scratch_dir("late");
        let path = dir.join("late.res");
        let mut data = vec![b'x'; SNIFF_LEN];
        data.extend_from_slice(b"Mesh:");
        std::fs::write(&path, &data).unwrap();
        assert!(!classify(&path).is_template());
    }

    #[test]
    fn test_missing_file() {
        assert_eq!(
            classify(Path::new("/nonexistent/frostlod/plain.res")),
            Classification::NotTemplate
        );
    }
}
