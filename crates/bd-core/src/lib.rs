//! Core types, metadata store, and link registry for blendoc.
//!
//! This crate holds the data model shared by every other crate in the
//! workspace:
//!
//! - [`FileEntry`] and [`EntryId`] - one arena-addressed record per discovered file
//! - [`FileMetadata`] - tagged extraction results (image, audio, text, model, container)
//! - [`MetadataStore`] - path/type/folder indices over all entries
//! - [`LinkRegistry`] - cycle-gated directed edge set between file paths
//! - [`Worklist`] - FIFO frontier driven by the file processor
//! - [`Config`] and friends - serde-backed configuration
//!
//! # Example
//!
//! ```
//! use bd_core::{FileEntry, LinkRegistry, MetadataStore};
//! use camino::Utf8Path;
//!
//! let mut store = MetadataStore::new();
//! store.set_root_folder("/project");
//! let id = store.add_entry(FileEntry::new("scene.blend", "/project", 2048, "blend"));
//!
//! let mut links = LinkRegistry::new();
//! assert!(links.add_link(Utf8Path::new("/project/scene.blend"), Utf8Path::new("/project/tex.png")));
//!
//! assert_eq!(store.entry(id).map(|e| e.name()), Some("scene.blend"));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod registry;
pub mod store;
pub mod types;
pub mod worklist;

pub use config::{Config, GraphMode, ReportConfig, ReportFormat, ScanConfig, SceneConfig};
pub use error::ConfigError;
pub use registry::LinkRegistry;
pub use store::{MetadataStore, StoreStats, normalize_path};
pub use types::{
    AudioMetadata, CONTAINER_TYPE, ContainerMetadata, EntryId, FileEntry, FileKind, FileMetadata,
    ImageMetadata, LEAF_TYPES, ModelMetadata, SceneMetadata, TextMetadata, UNKNOWN_TYPE,
    file_type_from_name,
};
pub use worklist::Worklist;

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;
