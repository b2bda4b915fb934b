//! # detbench: Detection Dataset Verification and Model Benchmarking
//!
//! Two tools around a YOLO-format object detection dataset:
//!
//! - **Label verification** ([`verify`]): spot-check a random sample of
//!   images, decode their normalized box annotations ([`annotation`]) and
//!   render overlays so labeling mistakes are visible before training.
//! - **Benchmark orchestration** ([`experiment`]): train and validate a queue
//!   of models under one shared hyperparameter profile, isolate per-model
//!   failures, and export a ranked comparison table.
//!
//! ## Design Principles
//!
//! - **Contain, don't abort**: a malformed label line or a failing model run
//!   is recorded and logged; only setup errors stop an invocation
//! - **Explicit session state**: one [`config::SessionConfig`] value, built
//!   once and passed by reference; no process-wide mutable settings
//! - **One run at a time**: the trainer owns the accelerator for the whole call
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use detbench::dataset::{DatasetDescriptor, SampleLoader};
//! use detbench::verify::{DatasetVerifier, OverlayRenderer};
//!
//! let descriptor = DatasetDescriptor::load("data.yaml")?;
//! let mut verifier = DatasetVerifier::new(SampleLoader::new(), OverlayRenderer::new("overlays"))
//!     .with_class_names(descriptor.class_names().clone());
//!
//! let report = verifier.verify(descriptor.train_dir(), 3, &mut rand::thread_rng())?;
//! println!("{} overlays, {} missing labels", report.rendered, report.missing_labels);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod annotation;
pub mod config;
pub mod dataset;
pub mod error;
pub mod experiment;
pub mod verify;

pub use error::{Error, Result};
