//! Domain types for blendoc.
//!
//! # Module Organization
//!
//! - [`entry`] - File records and their arena identifiers
//! - [`kind`] - File type derivation and leaf/container classification
//! - [`metadata`] - Tagged per-category extraction results
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use bd_core::{EntryId, FileEntry, FileKind, FileMetadata};
//! ```

mod entry;
mod kind;
mod metadata;

pub use entry::{EntryId, FileEntry};
pub use kind::{CONTAINER_TYPE, FileKind, LEAF_TYPES, UNKNOWN_TYPE, file_type_from_name};
pub use metadata::{
    AudioMetadata, ContainerMetadata, FileMetadata, ImageMetadata, ModelMetadata, SceneMetadata,
    TextMetadata,
};
