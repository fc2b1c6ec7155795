//! Tagged extraction results, one variant per file category.
//!
//! Every [`FileEntry`](crate::FileEntry) carries at most one
//! [`FileMetadata`]. The variant is chosen by whoever ran the extraction:
//! the metadata extractor for leaf and unknown files, the file processor for
//! scene containers.

use serde::{Deserialize, Serialize};

/// Metadata extracted from a single file.
///
/// # Examples
///
/// ```
/// use bd_core::{FileMetadata, TextMetadata};
///
/// let meta = FileMetadata::Text(TextMetadata { line_count: 12, word_count: 80 });
/// assert_eq!(meta.summary(), "12 lines");
/// assert!(meta.error().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileMetadata {
    /// Raster image header information.
    Image(ImageMetadata),
    /// Audio stream parameters.
    Audio(AudioMetadata),
    /// Plain-text statistics.
    Text(TextMetadata),
    /// Interchange 3D model statistics.
    Model(ModelMetadata),
    /// Scene-container information and its outgoing references.
    Container(ContainerMetadata),
    /// Extraction was attempted and failed.
    Failed {
        /// Description of the failure.
        error: String,
    },
}

impl FileMetadata {
    /// Creates a [`FileMetadata::Failed`] value.
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    /// Returns the error recorded by the extraction, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error),
            Self::Container(container) => container.scene.error.as_deref(),
            Self::Image(_) | Self::Audio(_) | Self::Text(_) | Self::Model(_) => None,
        }
    }

    /// Returns the container metadata if this is a scene container.
    #[must_use]
    pub const fn as_container(&self) -> Option<&ContainerMetadata> {
        match self {
            Self::Container(container) => Some(container),
            _ => None,
        }
    }

    /// Returns a short human readable summary for inventory tables.
    ///
    /// Returns `"-"` when there is nothing worth showing.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        match self {
            Self::Image(image) => {
                if let Some(dims) = image.dimensions() {
                    parts.push(dims);
                }
            }
            Self::Audio(audio) => {
                if let Some(duration) = audio.duration_seconds {
                    parts.push(format!("{duration}s"));
                }
                if let Some(channels) = audio.channels {
                    parts.push(format!("{channels}ch"));
                }
                if let Some(bitrate) = audio.bitrate {
                    parts.push(format!("{}kbps", bitrate / 1000));
                }
            }
            Self::Text(text) => parts.push(format!("{} lines", text.line_count)),
            Self::Model(model) => {
                if let Some(vertices) = model.vertices {
                    parts.push(format!("{vertices} verts"));
                }
            }
            Self::Container(container) => {
                if container.scene.object_count > 0 {
                    parts.push(format!("{} objs", container.scene.object_count));
                }
            }
            Self::Failed { .. } => {}
        }

        if parts.is_empty() {
            "-".to_owned()
        } else {
            parts.join(" | ")
        }
    }
}

/// Image header information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Detected format name (e.g. `PNG`).
    pub format: Option<String>,
    /// Width in pixels, when the header could be decoded.
    pub width: Option<u32>,
    /// Height in pixels, when the header could be decoded.
    pub height: Option<u32>,
    /// Pixel layout such as `RGB`, `RGBA`, `L`, or `P` (palette).
    pub mode: Option<String>,
    /// Frames in an animated or single-frame PNG or GIF.
    pub frame_count: Option<u32>,
}

impl ImageMetadata {
    /// Returns `WIDTHxHEIGHT` if both dimensions are known.
    #[must_use]
    pub fn dimensions(&self) -> Option<String> {
        Some(format!("{}x{}", self.width?, self.height?))
    }
}

/// Audio stream parameters.
///
/// WAV, FLAC, MP3, and Ogg Vorbis headers are decoded. Other formats only
/// carry their name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadata {
    /// Container format (lower-cased extension).
    pub format: String,
    /// Channel count.
    pub channels: Option<u16>,
    /// Samples per second.
    pub sample_rate: Option<u32>,
    /// Bits per sample.
    pub bit_depth: Option<u16>,
    /// Average bits per second, for MP3 streams.
    pub bitrate: Option<u32>,
    /// Duration rounded to two decimals.
    pub duration_seconds: Option<f64>,
}

/// Plain-text statistics. Files are decoded lossily as UTF-8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMetadata {
    /// Number of lines.
    pub line_count: usize,
    /// Number of whitespace separated words.
    pub word_count: usize,
}

/// Interchange model statistics. Counts are only available for OBJ files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model format (lower-cased extension).
    pub model_type: String,
    /// `v` records.
    pub vertices: Option<usize>,
    /// `f` records.
    pub faces: Option<usize>,
    /// `vn` records.
    pub normals: Option<usize>,
    /// `vt` records.
    pub texture_coords: Option<usize>,
}

/// Scene statistics reported by the scene tool.
///
/// Missing fields in the tool output default to zero, and a failed call
/// yields [`SceneMetadata::default`].
///
/// # Examples
///
/// ```
/// use bd_core::SceneMetadata;
///
/// let meta: SceneMetadata = serde_json::from_str(r#"{"object_count": 4, "error": null}"#).unwrap();
/// assert_eq!(meta.object_count, 4);
/// assert_eq!(meta.mesh_count, 0);
/// assert!(!meta.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneMetadata {
    /// Number of objects.
    pub object_count: u64,
    /// Number of scenes.
    pub scene_count: u64,
    /// Number of materials.
    pub material_count: u64,
    /// Number of meshes.
    pub mesh_count: u64,
    /// Vertices summed over all meshes.
    pub total_vertex_count: u64,
    /// Error reported by the tool while opening the file.
    pub error: Option<String>,
}

impl SceneMetadata {
    /// Returns `true` if every count is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.object_count == 0
            && self.scene_count == 0
            && self.material_count == 0
            && self.mesh_count == 0
            && self.total_vertex_count == 0
    }
}

/// Metadata stored on a scene-container entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    /// Scene statistics.
    pub scene: SceneMetadata,
    /// Referenced files outside the root that were not followed.
    pub external_links: Vec<String>,
    /// Referenced files whose link would have closed a cycle.
    pub rejected_links: Vec<String>,
}

impl ContainerMetadata {
    /// Creates container metadata with no recorded references.
    #[must_use]
    pub fn new(scene: SceneMetadata) -> Self {
        Self {
            scene,
            ..Self::default()
        }
    }
}
