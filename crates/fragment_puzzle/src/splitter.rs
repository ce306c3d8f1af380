//! Partitioning a source image into an `n × n` grid of tiles.
//!
//! Splitting happens in two steps:
//!
//! 1. **Crop to ratio** - the largest centred rectangle matching the target
//!    aspect ratio. A source relatively wider than the ratio loses width,
//!    otherwise it loses height, with equal margins on both sides.
//! 2. **Tile** - the crop is cut into equal cells, row by row, each tagged
//!    with its row/column as its reference position.
//!
//! Remainder pixels that do not divide evenly by the grid side are dropped
//! from the right and bottom edges so every cell has the same size.

use image::{DynamicImage, GenericImageView, imageops};
use tracing::{debug, info, instrument};

use crate::{AspectRatio, GridSize, ImageError, Tile, TileSet};

/// Pixel rectangle inside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Computes the largest centred rectangle of a `width × height` image
/// matching `ratio`.
///
/// # Errors
///
/// Returns [`ImageError::DegenerateCrop`] if the resulting rectangle has
/// zero width or height.
#[instrument]
pub fn crop_rect(width: u32, height: u32, ratio: AspectRatio) -> Result<CropRect, ImageError> {
    let degenerate = |w, h| ImageError::DegenerateCrop {
        width: w,
        height: h,
        side: 0,
    };
    if width == 0 || height == 0 {
        return Err(degenerate(width, height));
    }

    let source_ratio = f64::from(width) / f64::from(height);
    let (crop_width, crop_height) = if source_ratio > ratio.value() {
        let target = (f64::from(height) * ratio.value()).round() as u32;
        (target.min(width), height)
    } else {
        let target = (f64::from(width) / ratio.value()).round() as u32;
        (width, target.min(height))
    };

    if crop_width == 0 || crop_height == 0 {
        return Err(degenerate(crop_width, crop_height));
    }

    let rect = CropRect {
        x: (width - crop_width) / 2,
        y: (height - crop_height) / 2,
        width: crop_width,
        height: crop_height,
    };
    debug!(?rect, "Crop rectangle computed");
    Ok(rect)
}

/// Splits `image` into `grid.tile_count()` tiles in row-major reference order.
///
/// Pure: the source image is only read.
///
/// # Errors
///
/// Returns [`ImageError::DegenerateCrop`] if the crop is empty or its cells
/// would be narrower or shorter than one pixel.
#[instrument(skip(image), fields(width = image.width(), height = image.height(), grid = %grid, ratio = %ratio))]
pub fn split_image(
    image: &DynamicImage,
    grid: GridSize,
    ratio: AspectRatio,
) -> Result<TileSet, ImageError> {
    let (width, height) = image.dimensions();
    let rect = crop_rect(width, height, ratio).map_err(|_| ImageError::DegenerateCrop {
        width,
        height,
        side: grid.side(),
    })?;

    let side = grid.side();
    let cell_width = rect.width / side;
    let cell_height = rect.height / side;
    if cell_width == 0 || cell_height == 0 {
        return Err(ImageError::DegenerateCrop {
            width: rect.width,
            height: rect.height,
            side,
        });
    }

    let pixels = image.to_rgba8();
    let tiles: Vec<Tile> = grid
        .positions()
        .map(|position| {
            let cell = imageops::crop_imm(
                &pixels,
                rect.x + position.col * cell_width,
                rect.y + position.row * cell_height,
                cell_width,
                cell_height,
            )
            .to_image();
            Tile::new(position, cell)
        })
        .collect();

    let set = TileSet::new(grid, ratio, tiles).map_err(|_| ImageError::DegenerateCrop {
        width: rect.width,
        height: rect.height,
        side,
    })?;

    info!(tiles = set.len(), cell_width, cell_height, "Image split into tiles");
    Ok(set)
}

/// Decodes an encoded raster image (PNG or JPEG).
///
/// # Errors
///
/// Returns [`ImageError::Decode`] if the bytes are not a supported image.
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(value: f64) -> AspectRatio {
        AspectRatio::new(value).expect("valid ratio")
    }

    #[test]
    fn test_wide_source_crops_width_centred() {
        let rect = crop_rect(1000, 500, ratio(1.0)).expect("crop");
        assert_eq!(
            rect,
            CropRect {
                x: 250,
                y: 0,
                width: 500,
                height: 500
            }
        );
    }

    #[test]
    fn test_tall_source_crops_height_centred() {
        let rect = crop_rect(400, 1000, ratio(0.8)).expect("crop");
        assert_eq!(
            rect,
            CropRect {
                x: 0,
                y: 250,
                width: 400,
                height: 500
            }
        );
    }

    #[test]
    fn test_matching_ratio_keeps_whole_image() {
        let rect = crop_rect(800, 600, AspectRatio::LANDSCAPE_4_3).expect("crop");
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (0, 0, 800, 600));
    }

    #[test]
    fn test_zero_sized_source_is_degenerate() {
        assert!(matches!(
            crop_rect(0, 10, ratio(1.0)),
            Err(ImageError::DegenerateCrop { .. })
        ));
    }

    #[test]
    fn test_extreme_ratio_is_degenerate() {
        assert!(matches!(
            crop_rect(10, 10, ratio(0.001)),
            Err(ImageError::DegenerateCrop { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(ImageError::Decode(_))
        ));
    }
}
