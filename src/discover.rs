//! Finding the images of a batch.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::InputConfig;
use crate::error::ScanError;

/// Lists image files under `root` in sorted order.
///
/// Descends into subdirectories only when `config.recursive` is set. Files
/// are matched on extension, case-insensitively.
pub fn discover_images(root: &Path, config: &InputConfig) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::Discovery {
            path: root.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let extensions: Vec<&str> = config.image_extensions.iter().map(String::as_str).collect();
    let mut walker = WalkDir::new(root).follow_links(true);
    if !config.recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| ScanError::Discovery {
            path: root.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), &extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}
