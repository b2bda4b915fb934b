//! Image enumeration, random spot-check selection and label loading

use crate::annotation::{decode_labels, LabelBox, MalformedLine};
use crate::{Error, Result};
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Recognized image extensions, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Extension of companion label files.
pub const LABEL_EXTENSION: &str = "txt";

/// One image with whatever annotations could be loaded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Image file
    pub image_path: PathBuf,
    /// Derived companion label path, whether or not it exists
    pub label_path: PathBuf,
    /// Decoded boxes, in file order
    pub boxes: Vec<LabelBox>,
    /// Whether the label file exists
    pub has_label: bool,
    /// Lines skipped during decoding
    pub malformed: Vec<MalformedLine>,
}

impl Sample {
    /// File name of the image, for log and title use.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.image_path
            .file_name()
            .map_or_else(|| self.image_path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }
}

/// Derive the label path for an image.
///
/// Every `images` substring becomes `labels` and the extension becomes
/// [`LABEL_EXTENSION`]: `ds/images/train/1.jpg` -> `ds/labels/train/1.txt`.
/// Note the replacement is textual, so `images_backup/` also changes.
#[must_use]
pub fn derive_label_path(image_path: &Path) -> PathBuf {
    let substituted = image_path.to_string_lossy().replace("images", "labels");
    PathBuf::from(substituted).with_extension(LABEL_EXTENSION)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Enumerates images in a directory and loads their labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleLoader;

impl SampleLoader {
    /// Create a loader.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// List image files directly inside `dir`, sorted by path.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if `dir` is missing or unreadable
    /// - [`Error::EmptyDataset`] if no recognized image is found
    pub fn list_images(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(Error::configuration(format!(
                "image directory {} does not exist",
                dir.display()
            )));
        }

        let entries = std::fs::read_dir(dir).map_err(|e| {
            Error::configuration(format!("cannot read image directory {}: {e}", dir.display()))
        })?;

        let mut images: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_image_extension(path))
            .collect();

        if images.is_empty() {
            return Err(Error::EmptyDataset(dir.to_path_buf()));
        }

        images.sort();
        debug!(dir = %dir.display(), count = images.len(), "Listed images");
        Ok(images)
    }

    /// Pick `min(n, available)` distinct images uniformly at random.
    ///
    /// # Errors
    ///
    /// Same as [`SampleLoader::list_images`].
    pub fn select<R: Rng + ?Sized>(&self, dir: &Path, n: usize, rng: &mut R) -> Result<Vec<PathBuf>> {
        let images = self.list_images(dir)?;
        let amount = n.min(images.len());

        Ok(rand::seq::index::sample(rng, images.len(), amount)
            .into_iter()
            .map(|idx| images[idx].clone())
            .collect())
    }

    /// Select and load `min(n, available)` samples.
    ///
    /// # Errors
    ///
    /// Same as [`SampleLoader::list_images`].
    pub fn sample<R: Rng + ?Sized>(&self, dir: &Path, n: usize, rng: &mut R) -> Result<Vec<Sample>> {
        Ok(self
            .select(dir, n, rng)?
            .into_iter()
            .map(|path| self.load(path))
            .collect())
    }

    /// Load the labels for one image. A missing or unreadable label file
    /// yields `has_label = false`, never an error.
    #[must_use]
    pub fn load(&self, image_path: PathBuf) -> Sample {
        let label_path = derive_label_path(&image_path);

        let contents = if label_path.is_file() {
            match std::fs::read_to_string(&label_path) {
                Ok(contents) => Some(contents),
                Err(e) => {
                    warn!(file = %label_path.display(), error = %e, "Unreadable label file");
                    None
                }
            }
        } else {
            None
        };

        let (boxes, malformed, has_label) = match contents {
            Some(contents) => {
                let decoded = decode_labels(&contents);
                (decoded.boxes, decoded.malformed, true)
            }
            None => (Vec::new(), Vec::new(), false),
        };

        Sample {
            image_path,
            label_path,
            boxes,
            has_label,
            malformed,
        }
    }
}
