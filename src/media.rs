//! Image discovery: build the carousel's image list from a local directory.
//!
//! ## Rust concepts
//! - `fs::read_dir()` for directory traversal
//! - `Path` and `PathBuf` for cross-platform file paths
//! - Collecting iterators into `Vec`

use std::fs;
use std::path::{Path, PathBuf};

/// Extensions the decoder is built to read.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

/// Whether `path` looks like a supported image file (case-insensitive).
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Scan `dir` for image files, sorted by file name.
///
/// A missing or unreadable directory yields an empty list; the caller
/// decides whether an empty carousel is an error.
pub fn discover_images(dir: &Path) -> Vec<PathBuf> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            tracing::warn!("Cannot read image directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = read_dir
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_path(path))
        .collect();

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    paths
}

/// Combine explicit locators with the images found in `dir` (if any).
///
/// Explicit locators keep their order and come first.
pub fn collect_locators(explicit: &[String], dir: Option<&Path>) -> Vec<String> {
    let mut locators = explicit.to_vec();
    if let Some(dir) = dir {
        locators.extend(
            discover_images(dir)
                .into_iter()
                .map(|path| path.display().to_string()),
        );
    }
    locators
}
