//! Helper scripts run inside the scene tool and parsing of their reports.
//!
//! Each script prints exactly one JSON object on a line of its own. The tool
//! itself writes banner and progress lines around it, so the report is the
//! first stdout line starting with `{`.

use camino::Utf8Path;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::SceneError;

/// Counts objects, scenes, materials, meshes, and vertices.
pub const METADATA_SCRIPT: &str = r#"
import bpy
import json
import sys

blend_path = sys.argv[-1]

try:
    bpy.ops.wm.open_mainfile(filepath=blend_path)
except Exception as e:
    print(json.dumps({
        "object_count": 0,
        "scene_count": 0,
        "material_count": 0,
        "mesh_count": 0,
        "total_vertex_count": 0,
        "error": str(e),
    }))
    sys.exit(0)

print(json.dumps({
    "object_count": len(bpy.data.objects),
    "scene_count": len(bpy.data.scenes),
    "material_count": len(bpy.data.materials),
    "mesh_count": len(bpy.data.meshes),
    "total_vertex_count": sum(len(m.vertices) for m in bpy.data.meshes),
    "error": None,
}))
"#;

/// Lists linked libraries and non-packed images as absolute paths.
pub const DEPENDENCIES_SCRIPT: &str = r#"
import bpy
import json
import os
import sys

blend_path = sys.argv[-1]

try:
    bpy.ops.wm.open_mainfile(filepath=blend_path)
except Exception as e:
    print(json.dumps({"external_files": [], "error": str(e)}))
    sys.exit(0)

external_files = set()

for library in bpy.data.libraries:
    if library.filepath:
        external_files.add(library.filepath)

for image in bpy.data.images:
    if image.filepath and not image.packed_file:
        external_files.add(image.filepath)

resolved = []
for f in sorted(external_files):
    absolute = os.path.realpath(bpy.path.abspath(f))
    resolved.append(absolute if os.path.exists(absolute) else f)

print(json.dumps({"external_files": resolved, "error": None}))
"#;

/// Report printed by [`DEPENDENCIES_SCRIPT`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DependencyReport {
    /// Referenced file paths.
    pub external_files: Vec<String>,
    /// Error raised while opening the file.
    pub error: Option<String>,
}

/// Finds the report line in `stdout` and decodes it.
///
/// # Errors
///
/// Returns [`SceneError::Protocol`] if there is no line starting with `{` or
/// the first such line is not a valid report.
///
/// # Examples
///
/// ```
/// use bd_core::SceneMetadata;
/// use bd_scene::script::parse_report;
/// use camino::Utf8Path;
///
/// let stdout = "Blender 4.2\nRead blend: scene.blend\n{\"object_count\": 2}\nBlender quit\n";
/// let meta: SceneMetadata = parse_report(stdout, Utf8Path::new("scene.blend")).unwrap();
/// assert_eq!(meta.object_count, 2);
/// ```
pub fn parse_report<T: DeserializeOwned>(stdout: &str, path: &Utf8Path) -> Result<T, SceneError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('{'))
        .ok_or_else(|| SceneError::protocol(path, "no JSON line in output"))?;

    serde_json::from_str(line).map_err(|e| SceneError::protocol(path, e.to_string()))
}
