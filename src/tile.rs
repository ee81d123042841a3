//! Tile renderer: source image -> fixed-size square RGBA tile.

use std::path::{Path, PathBuf};

use fast_image_resize as fir;
use image::{DynamicImage, ImageReader, RgbaImage, imageops};
use tracing::trace;

use crate::error::Error;

/// A decoded, cropped, resized square pixel buffer of exactly
/// `edge x edge` RGBA8 pixels, ready for display.
#[derive(Debug, Clone)]
pub struct Tile {
    pub source: PathBuf,
    pub edge: u32,
    pub pixels: RgbaImage,
}

/// A tile plus the screen position of its top-left corner.
#[derive(Debug, Clone)]
pub struct PositionedTile {
    pub tile: Tile,
    pub x: u32,
    pub y: u32,
}

/// Render one source file into an `edge x edge` tile.
///
/// Pipeline: decode, flatten to RGB (alpha and palette discarded, an
/// accepted lossy step), center-crop to a square, Lanczos3 resize. Any
/// failure reports the offending path so the caller can skip that grid
/// cell without aborting the pass.
pub fn render_tile(path: &Path, edge: u32) -> Result<Tile, Error> {
    if edge == 0 {
        return Err(Error::Resize {
            path: path.to_path_buf(),
            reason: "requested zero edge length".into(),
        });
    }

    let decoded = ImageReader::open(path)
        .map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(source),
        })?
        .with_guessed_format()
        .map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(source),
        })?
        .decode()
        .map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    // Flatten transparency/palette onto a plain 3-channel buffer.
    let rgb = decoded.to_rgb8();
    let (w, h) = rgb.dimensions();
    if w == 0 || h == 0 {
        return Err(Error::Resize {
            path: path.to_path_buf(),
            reason: "source image has a zero dimension".into(),
        });
    }

    let (cx, cy, side) = square_crop_bounds(w, h);
    let square = imageops::crop_imm(&rgb, cx, cy, side, side).to_image();
    trace!(path = %path.display(), w, h, side, "center-cropped source");

    let rgba = DynamicImage::ImageRgb8(square).to_rgba8();
    let pixels = resize_exact(path, &rgba, edge)?;

    Ok(Tile {
        source: path.to_path_buf(),
        edge,
        pixels,
    })
}

/// Symmetric center-crop rectangle `(x, y, side)` for a `w x h` source.
///
/// Wider-than-tall sources lose columns (`left = (w - h) / 2`), taller
/// sources lose rows by the mirror rule, squares pass through unchanged.
pub fn square_crop_bounds(w: u32, h: u32) -> (u32, u32, u32) {
    if w > h {
        ((w - h) / 2, 0, h)
    } else if h > w {
        (0, (h - w) / 2, w)
    } else {
        (0, 0, w)
    }
}

fn resize_exact(path: &Path, source: &RgbaImage, edge: u32) -> Result<RgbaImage, Error> {
    if source.dimensions() == (edge, edge) {
        return Ok(source.clone());
    }

    let resize_err = |reason: String| Error::Resize {
        path: path.to_path_buf(),
        reason,
    };

    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .map_err(|e| resize_err(format!("failed to create source view: {e}")))?;
    let mut dst_image = fir::images::Image::new(edge, edge, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .map_err(|e| resize_err(format!("resampling failed: {e}")))?;

    RgbaImage::from_raw(edge, edge, dst_image.into_vec())
        .ok_or_else(|| resize_err("failed to construct resized RGBA image".into()))
}
