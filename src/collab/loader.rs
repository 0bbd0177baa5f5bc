//! Filesystem image loading.

use std::path::Path;

use image::DynamicImage;

use super::ImageLoader;
use crate::error::ScanError;

/// Loads images from disk with the `image` crate, guessing the format from
/// the file contents.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsImageLoader;

impl ImageLoader for FsImageLoader {
    fn load(&self, path: &Path) -> Result<DynamicImage, ScanError> {
        image::ImageReader::open(path)
            .map_err(|err| ScanError::Read {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(err),
            })?
            .with_guessed_format()
            .map_err(|err| ScanError::Read {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(err),
            })?
            .decode()
            .map_err(|source| ScanError::Read {
                path: path.to_path_buf(),
                source,
            })
    }
}
