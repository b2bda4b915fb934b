//! Dataset label verification (pre-flight spot-check)
//!
//! Samples a handful of images, decodes their annotations and hands overlay
//! render requests to a [`Renderer`]. Selection is randomized per call so
//! repeated checks look at different slices of the dataset.
//!
//! Problems inside one sample (malformed line, missing label file,
//! undecodable image) are logged and counted; only setup failures
//! (missing directory, no images) abort the call.

pub mod render;

pub use render::{OverlayRenderer, Renderer};

use crate::annotation::{denormalize, LabelBox, PixelCorners, BOUNDS_EPSILON};
use crate::dataset::{ClassNames, SampleLoader};
use crate::Result;
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything needed to draw one sample's overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// Image file
    pub image_path: PathBuf,
    /// Window/file title
    pub title: String,
    /// Decoded boxes with their pixel corners
    pub boxes: Vec<(LabelBox, PixelCorners)>,
    /// True when the image has no label file
    pub missing_label: bool,
}

/// Outcome of one verification pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    /// Samples selected
    pub samples: usize,
    /// Overlays handed to the renderer successfully
    pub rendered: usize,
    /// Images that could not be decoded or displayed
    pub skipped_images: usize,
    /// Images without a label file
    pub missing_labels: usize,
    /// Label lines that failed to decode
    pub malformed_lines: usize,
    /// Decoded boxes outside the normalized range
    pub out_of_bounds_boxes: usize,
    /// Render requests, in selection order
    pub requests: Vec<RenderRequest>,
}

impl VerificationReport {
    /// True if no sample showed any problem.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.skipped_images == 0
            && self.missing_labels == 0
            && self.malformed_lines == 0
            && self.out_of_bounds_boxes == 0
    }
}

/// Samples images, decodes labels and drives a [`Renderer`].
#[derive(Debug)]
pub struct DatasetVerifier<R> {
    loader: SampleLoader,
    renderer: R,
    class_names: ClassNames,
}

impl<R: Renderer> DatasetVerifier<R> {
    /// Create a verifier around a renderer.
    pub fn new(loader: SampleLoader, renderer: R) -> Self {
        Self {
            loader,
            renderer,
            class_names: ClassNames::default(),
        }
    }

    /// Use dataset class names for box labels instead of `Class <id>`.
    #[must_use]
    pub fn with_class_names(mut self, class_names: ClassNames) -> Self {
        self.class_names = class_names;
        self
    }

    /// Borrow the renderer (e.g. to inspect saved files).
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Spot-check `n` random images from `image_dir`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Configuration`] if the directory is missing,
    /// [`crate::Error::EmptyDataset`] if it has no images.
    pub fn verify<G: Rng + ?Sized>(
        &mut self,
        image_dir: &Path,
        n: usize,
        rng: &mut G,
    ) -> Result<VerificationReport> {
        info!(dir = %image_dir.display(), requested = n, "Checking dataset labels");
        let samples = self.loader.sample(image_dir, n, rng)?;

        let mut report = VerificationReport {
            samples: samples.len(),
            ..VerificationReport::default()
        };

        for sample in samples {
            let name = sample.file_name();

            for bad in &sample.malformed {
                warn!(file = %name, line = bad.line_number, reason = %bad.reason, "Skipping malformed annotation");
            }
            report.malformed_lines += sample.malformed.len();

            if !sample.has_label {
                warn!(file = %name, "Image has no label file");
                report.missing_labels += 1;
            }

            let Some(mut image) = self.renderer.load(&sample.image_path) else {
                warn!(file = %name, "Cannot decode image, skipping");
                report.skipped_images += 1;
                continue;
            };
            let (width, height) = self.renderer.dimensions(&image);

            let mut boxes = Vec::with_capacity(sample.boxes.len());
            for label in &sample.boxes {
                if !label.is_in_bounds(BOUNDS_EPSILON) {
                    warn!(file = %name, class_id = label.class_id, cx = label.cx, cy = label.cy, w = label.w, h = label.h, "Box exceeds image bounds");
                    report.out_of_bounds_boxes += 1;
                }
                boxes.push((*label, denormalize(label, width, height)));
            }

            let request = RenderRequest {
                image_path: sample.image_path,
                title: format!("Check: {name}"),
                boxes,
                missing_label: !sample.has_label,
            };

            for (label, corners) in &request.boxes {
                let text = self.class_names.get(label.class_id).map_or_else(
                    || format!("Class {}", label.class_id),
                    str::to_string,
                );
                self.renderer.draw_box(&mut image, *corners, label.class_id, &text);
            }
            if request.missing_label {
                self.renderer.mark_missing(&mut image);
            }

            match self.renderer.display(image, &request.title) {
                Ok(()) => report.rendered += 1,
                Err(e) => {
                    warn!(file = %name, error = %e, "Failed to display overlay");
                    report.skipped_images += 1;
                }
            }
            report.requests.push(request);
        }

        info!(
            samples = report.samples,
            rendered = report.rendered,
            missing_labels = report.missing_labels,
            malformed_lines = report.malformed_lines,
            "Verification finished"
        );
        Ok(report)
    }
}
