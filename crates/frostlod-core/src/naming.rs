//! Variant Naming
//!
//! Generated variants carry their identity in their name, `<material>:lod<level>`.
//! There is no side table; every query re-derives state from live names.

/// Separator between material name and level tag
pub const LOD_TAG: &str = ":lod";

/// Name of the variant for `material` at `level`
pub fn variant_name(material: &str, level: u32) -> String {
    format!("{material}{LOD_TAG}{level}")
}

/// Split a variant name into material and level.
///
/// The tag is matched case-insensitively and must end the name.
pub fn parse_variant_name(name: &str) -> Option<(&str, u32)> {
    // ASCII lowercasing keeps byte offsets aligned with `name`
    let lower = name.to_ascii_lowercase();
    let tag = lower.rfind(LOD_TAG)?;
    let digits = &name[tag + LOD_TAG.len()..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let level = digits.parse().ok()?;
    Some((&name[..tag], level))
}

/// LOD level encoded in a variant name
pub fn level_from_name(name: &str) -> Option<u32> {
    parse_variant_name(name).map(|(_, level)| level)
}

/// Material encoded in a variant name
pub fn material_from_name(name: &str) -> Option<&str> {
    parse_variant_name(name).map(|(material, _)| material)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_name() {
        assert_eq!(variant_name("Hull", 0), "Hull:lod0");
        assert_eq!(variant_name("mat_body_01", 12), "mat_body_01:lod12");
    }

    #[test]
    fn test_level_from_name() {
        assert_eq!(level_from_name("Hull:lod3"), Some(3));
        assert_eq!(level_from_name("Hull:LOD4"), Some(4));
        assert_eq!(level_from_name("a:lod1:lod2"), Some(2));
        assert_eq!(level_from_name("Hull"), None);
        assert_eq!(level_from_name("Hull:lod"), None);
        assert_eq!(level_from_name("Hull:lod1.001"), None);
        assert_eq!(level_from_name("Hull:lodx"), None);
    }

    #[test]
    fn test_material_from_name() {
        assert_eq!(material_from_name("Hull:lod3"), Some("Hull"));
        assert_eq!(material_from_name("a:lod1:lod2"), Some("a:lod1"));
        assert_eq!(material_from_name("Ünïcode:lod1"), Some("Ünïcode"));
        assert_eq!(material_from_name("plain"), None);
    }
}
