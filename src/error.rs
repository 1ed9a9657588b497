use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),
    #[error("failed to read manifest {}: {source}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("found 0 usable image paths in {}", .0.display())]
    EmptyManifest(PathBuf),
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("failed to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("transform failed on {}: {source}", .path.display())]
    Transform {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("could not load image at index {index} or any of the {attempts} entries after it")]
    Exhausted { index: usize, attempts: usize },
    #[error("cannot stack image of size {found:?} into batch of size {expected:?}")]
    ShapeMismatch {
        expected: [usize; 2],
        found: [usize; 2],
    },
}

impl DataError {
    /// Errors raised while building a dataset; these are not recoverable per item.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ManifestNotFound(_) | Self::ManifestRead { .. } | Self::EmptyManifest(_)
        )
    }
}
