use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::geoplot_core::error::{GeoplotError, Result};
use crate::geoplot_core::media::{DISCOVERY_EXTENSIONS, has_extension};

/// Split a comma-separated list of root directories and keep the ones that
/// exist. Entries that are not directories are logged and dropped.
pub fn resolve_roots(spec: &str) -> Vec<PathBuf> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            let path = PathBuf::from(s);
            if path.is_dir() {
                Some(path)
            } else {
                log::warn!("Ignoring media path {}: not a directory", path.display());
                None
            }
        })
        .collect()
}

/// Whether discovery picks up `path` as a candidate media file.
pub fn is_candidate(path: &Path) -> bool {
    DISCOVERY_EXTENSIONS.iter().any(|ext| has_extension(path, ext))
}

/// Recursively collect candidate media files below every root.
///
/// The result is sorted and free of duplicates, so overlapping roots are fine.
pub fn discover_media_files(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for root in roots {
        if !root.is_dir() {
            return Err(GeoplotError::NotADirectory(root.clone()));
        }
        log::info!("Discovering media under {}", root.display());

        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_file() && is_candidate(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    log::info!("Discovered {} candidate media files", files.len());
    Ok(files)
}
