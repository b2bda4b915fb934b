//! Multi-model benchmark orchestration
//!
//! ```text
//! SessionConfig ──> ExperimentRunner ──(per model, in order)──> Trainer
//!                        │                                        │
//!   ModelRegistry ───────┘                       train / evaluate / introspect
//!   HyperparameterProfile (shared, read-only)
//!                        │
//!                        └──> RunOutcome ──> ResultsAggregator ──> CSV
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use detbench::config::SessionConfig;
//! use detbench::experiment::{
//!     EvalMetrics, ExperimentRunner, HyperparameterProfile, ModelRegistry, ResultsAggregator,
//!     TrainRequest, TrainedArtifact, Trainer, TrainerError,
//! };
//! use std::path::Path;
//!
//! struct Stub;
//!
//! impl Trainer for Stub {
//!     fn train(&self, req: &TrainRequest<'_>) -> Result<TrainedArtifact, TrainerError> {
//!         Ok(TrainedArtifact { weights: format!("{}/{}/best.pt", req.project, req.run_name) })
//!     }
//!
//!     fn evaluate(&self, _: &TrainedArtifact, _: &Path, _: &str) -> Result<EvalMetrics, TrainerError> {
//!         Ok(EvalMetrics { map50: 0.9, map50_95: 0.6, precision: 0.85, recall: 0.8 })
//!     }
//! }
//!
//! let profile = HyperparameterProfile::preset("finetune-v1")?;
//! let config = SessionConfig::new("bench", "data.yaml", profile);
//! let mut registry = ModelRegistry::new();
//! registry.insert("YOLOv8n", "yolov8n.pt")?;
//!
//! let mut results = ResultsAggregator::new();
//! let summary = ExperimentRunner::new(&config, Stub).run(&registry, &mut results);
//! assert_eq!(summary.succeeded, 1);
//! assert_eq!(results.ranked()[0].model(), "YOLOv8n");
//! # Ok::<(), detbench::Error>(())
//! ```

mod aggregator;
mod metric_record;
mod profile;
mod registry;
mod run_record;
mod runner;
mod trainer;

pub use aggregator::{ResultRow, ResultsAggregator};
pub use metric_record::{RunMetrics, METRIC_NAMES};
pub use profile::{HyperValue, HyperparameterOverrides, HyperparameterProfile};
pub use registry::{ModelRegistry, ModelSpec};
pub use run_record::{FailedPhase, RunOutcome, RunState, RunStatus};
pub use runner::{ExperimentRunner, RunSummary};
pub use trainer::{
    CommandTrainer, EvalMetrics, ModelInfo, TrainRequest, TrainedArtifact, Trainer, TrainerError,
};
