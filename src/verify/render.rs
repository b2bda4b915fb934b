//! Image I/O and overlay rendering

use crate::annotation::PixelCorners;
use crate::Result;
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const BOX_THICKNESS: u32 = 2;
const MISSING_FRAME_THICKNESS: u32 = 6;
const MISSING_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

const PALETTE: [Rgba<u8>; 6] = [
    Rgba([0, 255, 0, 255]),
    Rgba([0, 160, 255, 255]),
    Rgba([255, 200, 0, 255]),
    Rgba([255, 64, 192, 255]),
    Rgba([0, 255, 255, 255]),
    Rgba([160, 96, 255, 255]),
];

/// Image loading and drawing capability used by the verifier.
pub trait Renderer {
    /// Decoded image handle.
    type Image;

    /// Decode an image; `None` if it cannot be read.
    fn load(&mut self, path: &Path) -> Option<Self::Image>;

    /// Pixel `(width, height)` of a loaded image.
    fn dimensions(&self, image: &Self::Image) -> (u32, u32);

    /// Draw one box outline.
    fn draw_box(&mut self, image: &mut Self::Image, corners: PixelCorners, class_id: u32, label: &str);

    /// Mark an image whose annotation file is missing.
    fn mark_missing(&mut self, image: &mut Self::Image);

    /// Show or persist the finished overlay.
    ///
    /// # Errors
    ///
    /// Implementation-specific output failure.
    fn display(&mut self, image: Self::Image, title: &str) -> Result<()>;
}

/// Renders overlays with the `image` crate and saves them as PNG files.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    out_dir: PathBuf,
    saved: Vec<PathBuf>,
}

impl OverlayRenderer {
    /// Create a renderer writing into `out_dir` (created on first save).
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            saved: Vec::new(),
        }
    }

    /// Files written so far.
    #[must_use]
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }

    fn output_path(&self, title: &str) -> PathBuf {
        let stem: String = title
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
            .collect();
        // keep the image extension: a.jpg and a.png must not collide
        self.out_dir.join(format!("{stem}.png"))
    }
}

impl Renderer for OverlayRenderer {
    type Image = RgbaImage;

    fn load(&mut self, path: &Path) -> Option<RgbaImage> {
        image::open(path).map(|img| img.into_rgba8()).ok()
    }

    fn dimensions(&self, image: &RgbaImage) -> (u32, u32) {
        image.dimensions()
    }

    fn draw_box(&mut self, image: &mut RgbaImage, corners: PixelCorners, class_id: u32, label: &str) {
        let color = PALETTE[class_id as usize % PALETTE.len()];
        debug!(label, ?corners, "Drawing box");
        draw_rect(image, corners, color, BOX_THICKNESS);
    }

    fn mark_missing(&mut self, image: &mut RgbaImage) {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return;
        }
        let frame = PixelCorners {
            x1: 0,
            y1: 0,
            x2: w - 1,
            y2: h - 1,
        };
        draw_rect(image, frame, MISSING_COLOR, MISSING_FRAME_THICKNESS);
    }

    fn display(&mut self, image: RgbaImage, title: &str) -> Result<()> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.output_path(title);
        image.save(&path)?;
        info!(title, file = %path.display(), "Saved overlay");
        self.saved.push(path);
        Ok(())
    }
}

/// Draw a rectangle border with the given thickness, growing inward.
pub fn draw_rect(img: &mut RgbaImage, corners: PixelCorners, color: Rgba<u8>, thickness: u32) {
    let (w, h) = img.dimensions();
    let PixelCorners { x1, y1, x2, y2 } = corners;
    for t in 0..thickness {
        let xx0 = x1.saturating_add(t);
        let yy0 = y1.saturating_add(t);
        let xx1 = x2.saturating_sub(t);
        let yy1 = y2.saturating_sub(t);
        if xx0 >= w || yy0 >= h || xx1 >= w || yy1 >= h || xx0 > xx1 || yy0 > yy1 {
            continue;
        }
        for x in xx0..=xx1 {
            img.put_pixel(x, yy0, color);
            img.put_pixel(x, yy1, color);
        }
        for y in yy0..=yy1 {
            img.put_pixel(xx0, y, color);
            img.put_pixel(xx1, y, color);
        }
    }
}
