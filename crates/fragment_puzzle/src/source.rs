//! Named image lookup with a fallback image.

use std::collections::HashMap;

use image::DynamicImage;
use tracing::{instrument, warn};

use crate::ImageError;

/// Resolves image names to decoded images.
pub trait ImageProvider {
    /// Loads the image registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Missing`] if no image has that name and
    /// [`ImageError::Decode`] if it cannot be decoded.
    fn load(&self, name: &str) -> Result<DynamicImage, ImageError>;

    /// Loads `name`, substituting `fallback` if it is missing or undecodable.
    ///
    /// # Errors
    ///
    /// Returns the fallback's error if the fallback also fails.
    fn load_or_fallback(&self, name: &str, fallback: &str) -> Result<DynamicImage, ImageError> {
        self.load(name).or_else(|e| {
            warn!(name, fallback, error = %e, "Image unavailable, using fallback");
            self.load(fallback)
        })
    }
}

/// In-memory image registry.
#[derive(Debug, Clone, Default)]
pub struct MemoryImages {
    images: HashMap<String, DynamicImage>,
}

impl MemoryImages {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `image` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, image: DynamicImage) {
        self.images.insert(name.into(), image);
    }

    /// Builder form of [`MemoryImages::insert`].
    pub fn with(mut self, name: impl Into<String>, image: DynamicImage) -> Self {
        self.insert(name, image);
        self
    }
}

impl ImageProvider for MemoryImages {
    #[instrument(skip(self))]
    fn load(&self, name: &str) -> Result<DynamicImage, ImageError> {
        self.images
            .get(name)
            .cloned()
            .ok_or_else(|| ImageError::Missing(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::new(width, height))
    }

    #[test]
    fn test_missing_image_falls_back() {
        let images = MemoryImages::new().with("userButton", solid(4, 5));
        let image = images.load_or_fallback("lvl1", "userButton").expect("fallback");
        assert_eq!((image.width(), image.height()), (4, 5));
    }

    #[test]
    fn test_missing_fallback_reports_fallback_name() {
        let images = MemoryImages::new();
        let err = images.load_or_fallback("lvl1", "userButton").unwrap_err();
        assert_eq!(err, ImageError::Missing("userButton".to_string()));
    }
}
