//! Dataset verification tests against scratch dataset trees

use detbench::annotation::PixelCorners;
use detbench::dataset::{DatasetDescriptor, SampleLoader};
use detbench::verify::{DatasetVerifier, OverlayRenderer, Renderer};
use detbench::Error;
use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

/// `root/images/train` + `root/labels/train` layout
struct Fixture {
    _tmp: TempDir,
    images: PathBuf,
    labels: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let images = tmp.path().join("ds").join("images").join("train");
        let labels = tmp.path().join("ds").join("labels").join("train");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::create_dir_all(&labels).unwrap();
        Self {
            _tmp: tmp,
            images,
            labels,
        }
    }

    fn image(&self, name: &str, w: u32, h: u32) -> &Self {
        RgbaImage::new(w, h).save(self.images.join(name)).unwrap();
        self
    }

    fn label(&self, stem: &str, contents: &str) -> &Self {
        std::fs::write(self.labels.join(format!("{stem}.txt")), contents).unwrap();
        self
    }
}

/// Records every call instead of drawing
#[derive(Default)]
struct RecordingRenderer {
    drawn: Vec<(String, PixelCorners, u32)>,
    missing: usize,
    displayed: Vec<String>,
}

struct FakeImage {
    width: u32,
    height: u32,
}

impl Renderer for RecordingRenderer {
    type Image = FakeImage;

    fn load(&mut self, path: &Path) -> Option<FakeImage> {
        image::image_dimensions(path)
            .ok()
            .map(|(width, height)| FakeImage { width, height })
    }

    fn dimensions(&self, image: &FakeImage) -> (u32, u32) {
        (image.width, image.height)
    }

    fn draw_box(&mut self, _image: &mut FakeImage, corners: PixelCorners, class_id: u32, label: &str) {
        self.drawn.push((label.to_string(), corners, class_id));
    }

    fn mark_missing(&mut self, _image: &mut FakeImage) {
        self.missing += 1;
    }

    fn display(&mut self, _image: FakeImage, title: &str) -> detbench::Result<()> {
        self.displayed.push(title.to_string());
        Ok(())
    }
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

// =============================================================================
// Verification Tests
// =============================================================================

#[test]
fn test_malformed_line_skipped_and_counted() {
    let fx = Fixture::new();
    fx.image("a.png", 100, 100).label(
        "a",
        "0 0.5 0.5 0.2 0.2\n1 0.25 0.25 0.1 0.1\n0 0.5 0.5\n2 0.75 0.75 0.1 0.1\n",
    );

    let mut verifier = DatasetVerifier::new(SampleLoader::new(), RecordingRenderer::default());
    let report = verifier.verify(&fx.images, 1, &mut rng()).unwrap();

    assert_eq!(report.malformed_lines, 1);
    assert_eq!(report.requests[0].boxes.len(), 3);
    assert_eq!(verifier.renderer().drawn.len(), 3);
    assert_eq!(report.rendered, 1);
}

#[test]
fn test_missing_label_is_rendered_distinctly() {
    let fx = Fixture::new();
    fx.image("unlabeled.png", 32, 32);

    let mut verifier = DatasetVerifier::new(SampleLoader::new(), RecordingRenderer::default());
    let report = verifier.verify(&fx.images, 5, &mut rng()).unwrap();

    assert_eq!(report.missing_labels, 1);
    assert!(report.requests[0].missing_label);
    assert_eq!(verifier.renderer().missing, 1);
    assert_eq!(verifier.renderer().displayed, ["Check: unlabeled.png"]);
    assert!(!report.is_clean());
}

#[test]
fn test_sample_count_capped_at_available() {
    let fx = Fixture::new();
    for name in ["1.png", "2.png", "3.png"] {
        fx.image(name, 16, 16);
    }

    let mut verifier = DatasetVerifier::new(SampleLoader::new(), RecordingRenderer::default());
    let report = verifier.verify(&fx.images, 10, &mut rng()).unwrap();

    assert_eq!(report.samples, 3);
    let unique: HashSet<_> = report.requests.iter().map(|r| &r.image_path).collect();
    assert_eq!(unique.len(), 3);
}

#[test]
fn test_empty_directory_is_empty_dataset() {
    let fx = Fixture::new();
    std::fs::write(fx.images.join("notes.txt"), "not an image").unwrap();

    let mut verifier = DatasetVerifier::new(SampleLoader::new(), RecordingRenderer::default());
    let err = verifier.verify(&fx.images, 3, &mut rng()).unwrap_err();

    assert!(matches!(err, Error::EmptyDataset(ref dir) if dir == &fx.images));
}

#[test]
fn test_undecodable_image_skipped() {
    let fx = Fixture::new();
    fx.image("good.png", 20, 20);
    std::fs::write(fx.images.join("broken.jpg"), b"definitely not a jpeg").unwrap();

    let mut verifier = DatasetVerifier::new(SampleLoader::new(), RecordingRenderer::default());
    let report = verifier.verify(&fx.images, 2, &mut rng()).unwrap();

    assert_eq!(report.samples, 2);
    assert_eq!(report.skipped_images, 1);
    assert_eq!(report.rendered, 1);
    assert_eq!(report.requests.len(), 1);
}

#[test]
fn test_out_of_bounds_box_warned_and_clamped() {
    let fx = Fixture::new();
    fx.image("edge.png", 50, 50).label("edge", "0 0.0 0.5 0.2 0.2\n");

    let mut verifier = DatasetVerifier::new(SampleLoader::new(), RecordingRenderer::default());
    let report = verifier.verify(&fx.images, 1, &mut rng()).unwrap();

    assert_eq!(report.out_of_bounds_boxes, 1);
    let (_, corners) = report.requests[0].boxes[0];
    assert_eq!(corners.x1, 0);
    assert_eq!(corners.x2, 5);
}

#[test]
fn test_class_names_label_boxes() {
    let fx = Fixture::new();
    fx.image("a.png", 40, 40).label("a", "1 0.5 0.5 0.5 0.5\n3 0.5 0.5 0.1 0.1\n");

    let yaml = fx.images.parent().unwrap().parent().unwrap().join("data.yaml");
    std::fs::write(&yaml, "train: images/train\nnames: [car, truck]\n").unwrap();
    let descriptor = DatasetDescriptor::load(&yaml).unwrap();
    assert_eq!(descriptor.train_dir(), fx.images.as_path());

    let mut verifier = DatasetVerifier::new(SampleLoader::new(), RecordingRenderer::default())
        .with_class_names(descriptor.class_names().clone());
    verifier.verify(descriptor.train_dir(), 1, &mut rng()).unwrap();

    let labels: Vec<&str> = verifier.renderer().drawn.iter().map(|(l, _, _)| l.as_str()).collect();
    assert_eq!(labels, ["truck", "Class 3"]);
}

// =============================================================================
// Overlay Renderer Tests
// =============================================================================

#[test]
fn test_overlay_renderer_writes_png() {
    let fx = Fixture::new();
    fx.image("car.png", 64, 48).label("car", "0 0.5 0.5 0.5 0.5\n");
    let out = fx.images.parent().unwrap().join("overlays");

    let mut verifier = DatasetVerifier::new(SampleLoader::new(), OverlayRenderer::new(&out));
    let report = verifier.verify(&fx.images, 1, &mut rng()).unwrap();
    assert_eq!(report.rendered, 1);

    let saved = verifier.renderer().saved();
    assert_eq!(saved, [out.join("Check__car.png.png")]);

    let overlay = image::open(&saved[0]).unwrap().into_rgba8();
    let corners = report.requests[0].boxes[0].1;
    assert_eq!(*overlay.get_pixel(corners.x1, corners.y1), Rgba([0, 255, 0, 255]));
    assert_eq!(*overlay.get_pixel(32, 24), Rgba([0, 0, 0, 0]));
}

#[test]
fn test_overlay_renderer_frames_missing_label() {
    let fx = Fixture::new();
    fx.image("lonely.png", 30, 30);
    let out = fx.images.parent().unwrap().join("overlays");

    let mut verifier = DatasetVerifier::new(SampleLoader::new(), OverlayRenderer::new(&out));
    verifier.verify(&fx.images, 1, &mut rng()).unwrap();

    let overlay = image::open(out.join("Check__lonely.png.png")).unwrap().into_rgba8();
    assert_eq!(*overlay.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    assert_eq!(*overlay.get_pixel(15, 15), Rgba([0, 0, 0, 0]));
}

#[test]
fn test_overlay_names_distinct_for_same_stem() {
    let fx = Fixture::new();
    fx.image("a.png", 10, 10);
    image::RgbImage::new(12, 12).save(fx.images.join("a.jpg")).unwrap();
    let out = fx.images.parent().unwrap().join("overlays");

    let mut verifier = DatasetVerifier::new(SampleLoader::new(), OverlayRenderer::new(&out));
    let report = verifier.verify(&fx.images, 2, &mut rng()).unwrap();
    assert_eq!(report.rendered, 2);

    let mut saved = verifier.renderer().saved().to_vec();
    saved.sort();
    assert_eq!(saved, [out.join("Check__a.jpg.png"), out.join("Check__a.png.png")]);
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 2);
}
