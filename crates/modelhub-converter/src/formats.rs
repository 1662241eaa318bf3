//! Format registry: recognized input and output model extensions.
//!
//! Both tables are process-wide and immutable. Lookups are case-insensitive.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

/// Whether a format is read or written by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Importable model format.
    Input,
    /// Exportable model format.
    Output,
}

/// Display metadata for one file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    /// Lower-case extension without the leading dot.
    pub extension: &'static str,
    /// Human-readable format name.
    pub display_name: &'static str,
    /// Input or output table membership.
    pub direction: Direction,
}

/// Extension used when a request names no output format or an unknown one.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "mesh";

// ---------------------------------------------------------------------------
// Table macro
// ---------------------------------------------------------------------------

macro_rules! define_formats {
    ($table:ident, $index:ident, $direction:expr, { $($ext:literal => $name:literal),* $(,)? }) => {
        static $table: &[FormatDescriptor] = &[
            $(FormatDescriptor { extension: $ext, display_name: $name, direction: $direction },)*
        ];

        static $index: LazyLock<HashMap<&'static str, &'static FormatDescriptor>> =
            LazyLock::new(|| $table.iter().map(|f| (f.extension, f)).collect());
    };
}

define_formats!(INPUT_FORMATS, INPUT_INDEX, Direction::Input, {
    // Common interchange formats
    "dae"     => "Collada ( .dae )",
    "blend"   => "Blender 3D ( .blend )",
    "3ds"     => "3ds Max 3DS ( .3ds )",
    "ase"     => "3ds Max ASE ( .ase )",
    "obj"     => "Wavefront Object ( .obj )",
    "ifc"     => "Industry Foundation Classes (IFC/Step) ( .ifc )",
    "xgl"     => "XGL ( .xgl )",
    "zgl"     => "XGL ( .zgl )",
    "ply"     => "Stanford Polygon Library ( .ply )",
    "dxf"     => "AutoCAD DXF ( .dxf )",
    "lwo"     => "LightWave ( .lwo )",
    "lws"     => "LightWave Scene ( .lws )",
    "lxo"     => "Modo ( .lxo )",
    "stl"     => "Stereolithography ( .stl )",
    "x"       => "DirectX X ( .x )",
    "ac"      => "AC3D ( .ac )",
    "ms3d"    => "Milkshape 3D ( .ms3d )",
    "cob"     => "TrueSpace ( .cob )",
    "scn"     => "TrueSpace ( .scn )",
    "fbx"     => "Autodesk FBX ( .fbx )",
    // Motion capture formats
    "bvh"     => "Biovision BVH ( .bvh )",
    "csm"     => "CharacterStudio Motion ( .csm )",
    // Graphics engine formats
    "xml"     => "Ogre XML ( .xml )",
    "irrmesh" => "Irrlicht Mesh ( .irrmesh )",
    "irr"     => "Irrlicht Scene ( .irr )",
    // Game file formats
    "md2"     => "Quake II ( .md2 )",
    "md3"     => "Quake III Mesh ( .md3 )",
    "pk3"     => "Quake III Map/BSP ( .pk3 )",
    "mdc"     => "Return to Castle Wolfenstein ( .mdc )",
    "md5"     => "Doom 3 ( .md5 )",
    "md5mesh" => "Doom 3 ( .md5mesh )",
    "smd"     => "Valve Model ( .smd )",
    "vta"     => "Valve Model ( .vta )",
    "m3"      => "Starcraft II M3 ( .m3 )",
    "3d"      => "Unreal ( .3d )",
    // Other file formats
    "b3d"     => "BlitzBasic 3D ( .b3d )",
    "q3d"     => "Quick3D ( .q3d )",
    "q3s"     => "Quick3D ( .q3s )",
    "nff"     => "Neutral File Format ( .nff )",
    "off"     => "Object File Format ( .off )",
    "raw"     => "PovRAY Raw ( .raw )",
    "ter"     => "Terragen Terrain ( .ter )",
    "mdl"     => "3D GameStudio (3DGS) ( .mdl )",
    "hmp"     => "3D GameStudio (3DGS) Terrain ( .hmp )",
    "ndo"     => "Izware Nendo ( .ndo )",
});

define_formats!(OUTPUT_FORMATS, OUTPUT_INDEX, Direction::Output, {
    "mesh" => "Spectre ( .mesh )",
    "dae"  => "Collada ( .dae )",
    "obj"  => "Wavefront Object ( .obj )",
    "stl"  => "Stereolithography ( .stl )",
    "ply"  => "Stanford Polygon Library ( .ply )",
});

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Extract the lower-case extension of a file name or path.
///
/// Only the final path component is considered (both `/` and `\` separate
/// components). A name without a dot has an empty extension.
pub fn extension_of(name: &str) -> String {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match file_name.rfind('.') {
        Some(idx) => file_name[idx + 1..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Returns `true` if `extension` names an importable format.
pub fn is_input_format(extension: &str) -> bool {
    INPUT_INDEX.contains_key(extension.to_ascii_lowercase().as_str())
}

/// Returns `true` if `extension` names an exportable format.
pub fn is_output_format(extension: &str) -> bool {
    OUTPUT_INDEX.contains_key(extension.to_ascii_lowercase().as_str())
}

/// Returns `true` if the file name carries an importable extension.
pub fn is_model_file(name: &str) -> bool {
    is_input_format(&extension_of(name))
}

/// Describe an extension, preferring the input table.
pub fn describe(extension: &str) -> Option<FormatDescriptor> {
    let ext = extension.to_ascii_lowercase();
    INPUT_INDEX
        .get(ext.as_str())
        .or_else(|| OUTPUT_INDEX.get(ext.as_str()))
        .map(|f| **f)
}

/// Describe an extension from the output table only.
pub fn describe_output(extension: &str) -> Option<FormatDescriptor> {
    OUTPUT_INDEX
        .get(extension.to_ascii_lowercase().as_str())
        .map(|f| **f)
}

/// All importable formats in table order.
pub fn input_formats() -> &'static [FormatDescriptor] {
    INPUT_FORMATS
}

/// All exportable formats in table order.
pub fn output_formats() -> &'static [FormatDescriptor] {
    OUTPUT_FORMATS
}

/// MIME type sent with a converted file of the given output extension.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "dae" => "model/vnd.collada+xml",
        "obj" => "model/obj",
        "stl" => "model/stl",
        _ => "application/octet-stream",
    }
}
