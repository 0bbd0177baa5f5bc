//! Stable identifiers for input images.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Identifies one input image across a batch.
///
/// The id is the image path with `\` normalized to `/`, so the same file
/// gets the same id in reports on every platform. The path the image was
/// found at is kept unchanged next to it; anything that touches the
/// filesystem goes through [`ImageId::path`], never through the id.
///
/// Equality, ordering and hashing use the id only.
#[derive(Clone)]
pub struct ImageId {
    id: String,
    path: PathBuf,
}

impl ImageId {
    /// Creates a new ImageId from an arbitrary label. The label doubles as
    /// the path.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let path = PathBuf::from(&id);
        Self { id, path }
    }

    /// Builds the id for an image path.
    pub fn from_path(path: &Path) -> Self {
        Self {
            id: path.to_string_lossy().replace('\\', "/"),
            path: path.to_path_buf(),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Where the image was read from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PartialEq for ImageId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ImageId {}

impl PartialOrd for ImageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ImageId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for ImageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Serialize for ImageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.id)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl From<&str> for ImageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
