//! Storage key derivation and logical path helpers.

pub mod resolver;

pub use resolver::{
    FOLDER_MARKER, PathResolver, child_path, folder_marker_key, is_within, normalize, rebase_path,
    slugify,
};
