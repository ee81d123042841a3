use std::path::PathBuf;

use thiserror::Error;

/// Library error type for collage operations.
///
/// None of these are fatal to the process: a bad directory degrades to an
/// empty catalog and a bad image only skips its grid cell.
#[derive(Debug, Error)]
pub enum Error {
    /// The scan target does not exist or cannot be listed.
    #[error("directory unavailable: {path}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source image failed to open or decode.
    #[error("failed to decode {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Cropping or resampling a decoded image failed.
    #[error("failed to resize {path}: {reason}")]
    Resize { path: PathBuf, reason: String },
}
