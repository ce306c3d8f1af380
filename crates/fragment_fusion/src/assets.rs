//! Level images read from a directory on disk.

use std::path::{Path, PathBuf};

use fragment_puzzle::{ImageError, ImageProvider, decode_image};
use image::DynamicImage;
use tracing::{debug, instrument};

const EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Resolves image names to `<dir>/<name>.png`, `.jpg` or `.jpeg`.
#[derive(Debug, Clone)]
pub struct DirectoryImages {
    root: PathBuf,
}

impl DirectoryImages {
    /// Creates a provider rooted at `root`.
    #[instrument(skip(root), fields(root = %root.as_ref().display()))]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Returns the asset directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let direct = self.root.join(name);
        if direct.extension().is_some() && direct.is_file() {
            return Some(direct);
        }
        EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{name}.{ext}")))
            .find(|path| path.is_file())
    }
}

impl ImageProvider for DirectoryImages {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    fn load(&self, name: &str) -> Result<DynamicImage, ImageError> {
        let path = self
            .resolve(name)
            .ok_or_else(|| ImageError::Missing(name.to_string()))?;
        debug!(path = %path.display(), "Reading image");
        let bytes = std::fs::read(&path)
            .map_err(|e| ImageError::Decode(format!("{}: {}", path.display(), e)))?;
        decode_image(&bytes)
    }
}
