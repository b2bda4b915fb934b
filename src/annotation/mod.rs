//! Annotation decoding for YOLO-style label files
//!
//! One box per line, five whitespace-separated fields:
//!
//! ```text
//! class_id cx cy w h
//! 0 0.512 0.430 0.120 0.088
//! ```
//!
//! `class_id` is a non-negative integer; the remaining four fields are
//! center-size coordinates normalized to the image dimensions.
//!
//! ## Example
//!
//! ```rust
//! use detbench::annotation::{decode_line, denormalize};
//!
//! let label = decode_line("3 0.5 0.5 0.2 0.4")?;
//! let corners = denormalize(&label, 640, 480);
//! assert_eq!((corners.x1, corners.y1, corners.x2, corners.y2), (256, 144, 384, 336));
//! # Ok::<(), detbench::Error>(())
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Overshoot tolerated past the `[0, 1]` edges before a box is flagged.
pub const BOUNDS_EPSILON: f64 = 1e-3;

const FIELD_COUNT: usize = 5;

/// A decoded bounding box in normalized center-size form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelBox {
    /// Class index into the dataset's class names
    pub class_id: u32,
    /// Center x, fraction of image width
    pub cx: f64,
    /// Center y, fraction of image height
    pub cy: f64,
    /// Width, fraction of image width
    pub w: f64,
    /// Height, fraction of image height
    pub h: f64,
}

impl LabelBox {
    /// Create a box from raw normalized values.
    #[must_use]
    pub const fn new(class_id: u32, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            class_id,
            cx,
            cy,
            w,
            h,
        }
    }

    /// Check that every edge lies within `[-eps, 1 + eps]`.
    #[must_use]
    pub fn is_in_bounds(&self, eps: f64) -> bool {
        let within = |center: f64, extent: f64| {
            center - extent / 2.0 >= -eps && center + extent / 2.0 <= 1.0 + eps
        };
        within(self.cx, self.w) && within(self.cy, self.h)
    }
}

/// Pixel-space corners of a box, inclusive and clamped to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelCorners {
    /// Left edge
    pub x1: u32,
    /// Top edge
    pub y1: u32,
    /// Right edge
    pub x2: u32,
    /// Bottom edge
    pub y2: u32,
}

/// Decode one label line into a [`LabelBox`].
///
/// Range is not validated here; see [`LabelBox::is_in_bounds`].
///
/// # Errors
///
/// Returns [`Error::MalformedAnnotation`] if the line does not hold exactly
/// five tokens, the class id is not a non-negative integer, or a coordinate
/// is not a finite number.
pub fn decode_line(line: &str) -> Result<LabelBox> {
    let trimmed = line.trim();
    let malformed = |reason: String| Error::MalformedAnnotation {
        line: trimmed.to_string(),
        reason,
    };

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.len() != FIELD_COUNT {
        return Err(malformed(format!(
            "expected {FIELD_COUNT} fields, found {}",
            tokens.len()
        )));
    }

    let class_id = tokens[0]
        .parse::<u32>()
        .map_err(|_| malformed(format!("class id {:?} is not a non-negative integer", tokens[0])))?;

    let mut coords = [0.0_f64; 4];
    for (slot, token) in coords.iter_mut().zip(&tokens[1..]) {
        let value = token
            .parse::<f64>()
            .map_err(|_| malformed(format!("coordinate {token:?} is not numeric")))?;
        if !value.is_finite() {
            return Err(malformed(format!("coordinate {token:?} is not finite")));
        }
        *slot = value;
    }

    let [cx, cy, w, h] = coords;
    Ok(LabelBox::new(class_id, cx, cy, w, h))
}

/// Convert a normalized box to clamped pixel corners on a `width` x `height` canvas.
///
/// Corners are rounded to the nearest pixel, then clamped to
/// `[0, width-1] x [0, height-1]`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn denormalize(label: &LabelBox, width: u32, height: u32) -> PixelCorners {
    let to_pixel = |norm: f64, extent: u32| -> u32 {
        let max = f64::from(extent.saturating_sub(1));
        (norm * f64::from(extent)).round().clamp(0.0, max) as u32
    };

    PixelCorners {
        x1: to_pixel(label.cx - label.w / 2.0, width),
        y1: to_pixel(label.cy - label.h / 2.0, height),
        x2: to_pixel(label.cx + label.w / 2.0, width),
        y2: to_pixel(label.cy + label.h / 2.0, height),
    }
}

/// Inverse of [`denormalize`], up to rounding and clamping.
#[must_use]
pub fn renormalize(class_id: u32, corners: &PixelCorners, width: u32, height: u32) -> LabelBox {
    let (w, h) = (f64::from(width), f64::from(height));
    let (x1, x2) = (f64::from(corners.x1), f64::from(corners.x2));
    let (y1, y2) = (f64::from(corners.y1), f64::from(corners.y2));

    LabelBox::new(
        class_id,
        (x1 + x2) / 2.0 / w,
        (y1 + y2) / 2.0 / h,
        (x2 - x1) / w,
        (y2 - y1) / h,
    )
}

/// Boxes and rejected lines decoded from one label file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedLabels {
    /// Successfully decoded boxes, in file order
    pub boxes: Vec<LabelBox>,
    /// Lines that failed to decode
    pub malformed: Vec<MalformedLine>,
}

/// A label line that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number in the label file
    pub line_number: usize,
    /// Decoder error message
    pub reason: String,
}

/// Decode every non-blank line of a label file's contents.
///
/// Malformed lines are collected, never fatal.
#[must_use]
pub fn decode_labels(contents: &str) -> DecodedLabels {
    let mut decoded = DecodedLabels::default();

    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match decode_line(line) {
            Ok(label) => decoded.boxes.push(label),
            Err(e) => decoded.malformed.push(MalformedLine {
                line_number: idx + 1,
                reason: e.to_string(),
            }),
        }
    }

    decoded
}
