//! Image catalog: directory scan, decodability check, fresh shuffle.

use std::path::{Path, PathBuf};

use image::ImageReader;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::Error;

const SUPPORTED_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];

/// A source file captured by a scan. Invalidated, never mutated, by the
/// next scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub path: PathBuf,
}

/// The validated, shuffled list of candidate image files.
///
/// Replaced wholesale on every rescan so that "number of images changed"
/// is a plain length comparison and readers never observe a half-updated
/// list.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<ImageRef>,
}

impl Catalog {
    /// Scan `dir` (non-recursive) for displayable images.
    ///
    /// Every returned entry was verified decodable at scan time; corrupted
    /// or unsupported files are skipped silently. The result is freshly
    /// permuted on every call.
    ///
    /// # Errors
    /// [`Error::DirectoryUnavailable`] if `dir` is missing or not listable.
    /// Callers treat that as an empty catalog, not a fatal condition.
    pub fn scan(dir: &Path) -> Result<Self, Error> {
        if !dir.is_dir() {
            return Err(Error::DirectoryUnavailable {
                path: dir.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "not a readable directory",
                ),
            });
        }
        // Surface listing failures on the root itself as unavailable.
        std::fs::read_dir(dir).map_err(|source| Error::DirectoryUnavailable {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut entries = Vec::new();
        for entry in WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if !has_supported_extension(path) {
                continue;
            }
            if !decodes_as_image(path) {
                debug!(path = %path.display(), "skipping undecodable file");
                continue;
            }
            entries.push(ImageRef {
                path: path.to_path_buf(),
            });
        }

        entries.shuffle(&mut rand::rng());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ImageRef] {
        &self.entries
    }

    /// Uniform sample of `n` distinct entries, capped at the catalog size.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<ImageRef> {
        let n = n.min(self.entries.len());
        rand::seq::index::sample(rng, self.entries.len(), n)
            .into_iter()
            .map(|i| self.entries[i].clone())
            .collect()
    }
}

/// Return `true` if `path` carries one of the supported image extensions
/// (case-insensitive).
#[must_use]
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTS.iter().any(|e| *e == ext)
        })
}

// Header-level decode check, mirroring a quick "can this be opened as an
// image" probe without paying for a full pixel decode.
fn decodes_as_image(path: &Path) -> bool {
    ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .ok()
        .and_then(|r| r.into_dimensions().ok())
        .is_some()
}
