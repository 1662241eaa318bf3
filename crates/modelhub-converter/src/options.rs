//! Form option → converter command line switch mapping.

use std::collections::BTreeMap;

/// Ordered table of form option names and the switches they enable.
///
/// The order here is the order switches appear on the command line.
pub const OPTION_SWITCHES: &[(&str, &str)] = &[
    ("pretransformNormals", "--pretransform-vertices"),
    ("genSmoothNormals", "--gen-smooth-normals"),
    ("getNormals", "--gen-normals"),
    ("calcTangentSpace", "--calc-tangent-space"),
    ("joinIdenticalVertices", "--join-identical-vertices"),
    ("removeRedundantMaterials", "--remove-redundant-materials"),
    ("findDegenerates", "--find-degenerates"),
    ("splitLargeMeshes", "--split-large-meshes"),
    ("limitBoneWeights", "--limit-bone-weights"),
    ("validateDataStructure", "--validate-data-structure"),
    ("improveCacheLocality", "--improve-cache-locality"),
    ("sortByPtype", "--sort-by-ptype"),
    ("convertToLeftHand", "--convert-to-lh"),
    ("flipUVCoords", "--flip-uv"),
    ("flipWindingOrder", "--flip-winding-order"),
    ("transformUVCoords", "--transform-uv-coords"),
    ("generateUVCoords", "--gen-uvcoords"),
    ("findInvalidData", "--find-invalid-data"),
    ("fixNormals", "--fix-normals"),
    ("triangulate", "--triangulate"),
    ("findInstances", "--find-instances"),
    ("optimizeGraph", "--optimize-graph"),
    ("optimizeMeshes", "--optimize-meshes"),
    ("debone", "--debone"),
    ("splitByBoneCount", "--split-by-bone-count"),
];

/// Returns `true` if `name` is one of the known option names.
pub fn is_option_name(name: &str) -> bool {
    OPTION_SWITCHES.iter().any(|(option, _)| *option == name)
}

/// Interpret a submitted form value as a flag.
///
/// Checkbox-style `on` as well as `true`, `1`, and `yes` enable a flag;
/// every other value disables it.
pub fn parse_flag_value(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

/// Switches for every flag that is explicitly enabled, in table order.
///
/// Flags missing from `flags` or set to `false` are skipped; names not in
/// the table are ignored.
pub fn switches_for(flags: &BTreeMap<String, bool>) -> Vec<String> {
    OPTION_SWITCHES
        .iter()
        .filter(|(name, _)| flags.get(*name).copied().unwrap_or(false))
        .map(|(_, switch)| (*switch).to_string())
        .collect()
}
