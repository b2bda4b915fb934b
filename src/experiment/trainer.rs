//! Trainer/evaluator capability
//!
//! The orchestrator never looks inside training. It hands a [`TrainRequest`]
//! to a [`Trainer`], gets back an opaque [`TrainedArtifact`], and asks the
//! same trainer to evaluate it on the validation split.
//!
//! [`CommandTrainer`] is the production implementation: it drives an external
//! bridge program (typically a thin wrapper around a detection framework's
//! CLI) with one blocking subprocess call per phase.
//!
//! ## Bridge protocol
//!
//! ```text
//! <program> [args..] train    --weights W --data D --project P --name N key=value..
//!     -> {"weights": "P/N/weights/best.pt"}
//! <program> [args..] evaluate --weights W --data D --split val
//!     -> {"map50": 0.91, "map50_95": 0.62, "precision": 0.88, "recall": 0.83}
//! <program> [args..] info     --weights W
//!     -> {"params": 3157200, "flops": 8.9e9}
//! ```
//!
//! Each call must exit 0 and print a single JSON object as the last
//! non-empty line of stdout.

use super::HyperparameterProfile;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

/// Stderr lines kept for the failure message.
const STDERR_TAIL: usize = 5;

/// Trainer/evaluator failure, contained at the run boundary.
#[derive(Error, Debug)]
pub enum TrainerError {
    /// Bridge program could not be started
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// Program name
        program: String,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Bridge program exited non-zero
    #[error("{phase} exited with {status}: {stderr}")]
    Exit {
        /// `train`, `evaluate` or `info`
        phase: &'static str,
        /// Exit status text
        status: String,
        /// Captured stderr (last lines)
        stderr: String,
    },

    /// Bridge output was not the expected JSON object
    #[error("{phase} produced invalid output: {reason}")]
    Protocol {
        /// `train`, `evaluate` or `info`
        phase: &'static str,
        /// Parse failure
        reason: String,
    },

    /// Any other trainer-reported failure
    #[error("{0}")]
    Other(String),
}

/// Arguments for one training run.
#[derive(Debug, Clone, Copy)]
pub struct TrainRequest<'a> {
    /// Initial weights (file or hub identifier)
    pub weights: &'a str,
    /// Dataset descriptor file
    pub dataset: &'a Path,
    /// Shared hyperparameters
    pub hyperparameters: &'a HyperparameterProfile,
    /// Run name (the model's display name)
    pub run_name: &'a str,
    /// Project (session) name; outputs land under `project/run_name`
    pub project: &'a str,
}

/// Weights produced by a training run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainedArtifact {
    /// Path or identifier of the best checkpoint
    pub weights: String,
}

/// Raw metrics reported by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    /// mAP at IoU 0.5
    pub map50: f64,
    /// mAP at IoU 0.5..0.95
    pub map50_95: f64,
    /// Mean precision
    pub precision: f64,
    /// Mean recall
    pub recall: f64,
}

/// Model size as reported by introspection; each field may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Parameter count
    #[serde(default)]
    pub params: Option<u64>,
    /// Forward-pass FLOPs
    #[serde(default)]
    pub flops: Option<f64>,
}

/// External training and evaluation capability.
///
/// Calls block until the run finishes; implementations may assume exclusive
/// use of the accelerator for the duration of a call.
pub trait Trainer {
    /// Train from `request.weights` on `request.dataset`.
    ///
    /// # Errors
    ///
    /// Any failure (missing weights, resource exhaustion, download failure).
    fn train(&self, request: &TrainRequest<'_>) -> Result<TrainedArtifact, TrainerError>;

    /// Evaluate trained weights on a dataset split.
    ///
    /// # Errors
    ///
    /// Any evaluation failure.
    fn evaluate(
        &self,
        artifact: &TrainedArtifact,
        dataset: &Path,
        split: &str,
    ) -> Result<EvalMetrics, TrainerError>;

    /// Parameter count and compute cost, if the trainer can tell.
    fn introspect(&self, _artifact: &TrainedArtifact) -> Option<ModelInfo> {
        None
    }
}

impl<T: Trainer + ?Sized> Trainer for &T {
    fn train(&self, request: &TrainRequest<'_>) -> Result<TrainedArtifact, TrainerError> {
        (**self).train(request)
    }

    fn evaluate(
        &self,
        artifact: &TrainedArtifact,
        dataset: &Path,
        split: &str,
    ) -> Result<EvalMetrics, TrainerError> {
        (**self).evaluate(artifact, dataset, split)
    }

    fn introspect(&self, artifact: &TrainedArtifact) -> Option<ModelInfo> {
        (**self).introspect(artifact)
    }
}

/// Runs an external bridge program for each phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTrainer {
    program: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandTrainer {
    /// Create a trainer invoking `program` with leading `args`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    /// Run the bridge from `dir` instead of the current directory.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Build (without running) the command line for a training call.
    #[must_use]
    pub fn train_args(request: &TrainRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "train".to_string(),
            "--weights".to_string(),
            request.weights.to_string(),
            "--data".to_string(),
            request.dataset.display().to_string(),
            "--project".to_string(),
            request.project.to_string(),
            "--name".to_string(),
            request.run_name.to_string(),
        ];
        args.extend(
            request
                .hyperparameters
                .iter()
                .map(|(key, value)| format!("{key}={value}")),
        );
        args
    }

    fn invoke<T>(&self, phase: &'static str, phase_args: &[String]) -> Result<T, TrainerError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .args(phase_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        debug!(program = %self.program.display(), phase, ?phase_args, "Invoking trainer bridge");
        let spawn_error = |source| TrainerError::Spawn {
            program: self.program.display().to_string(),
            source,
        };
        let mut child = command.spawn().map_err(spawn_error)?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // both pipes drained concurrently so neither can fill and stall the child
        let (stdout_tail, stderr_tail) = std::thread::scope(|scope| {
            let errors = scope.spawn(move || {
                stderr
                    .map(|pipe| relay_lines(pipe, phase, STDERR_TAIL))
                    .unwrap_or_default()
            });
            let last = stdout
                .map(|pipe| relay_lines(pipe, phase, 1))
                .unwrap_or_default();
            (last, errors.join().unwrap_or_default())
        });
        let status = child.wait().map_err(spawn_error)?;

        if !status.success() {
            return Err(TrainerError::Exit {
                phase,
                status: status.to_string(),
                stderr: Vec::from(stderr_tail).join("\n"),
            });
        }

        let last = stdout_tail
            .into_iter()
            .next_back()
            .ok_or_else(|| TrainerError::Protocol {
                phase,
                reason: "empty stdout".to_string(),
            })?;

        serde_json::from_str(last.trim()).map_err(|e| TrainerError::Protocol {
            phase,
            reason: e.to_string(),
        })
    }
}

/// Log each non-blank line as it arrives, keeping only the last `keep`.
fn relay_lines<R: Read>(pipe: R, phase: &'static str, keep: usize) -> VecDeque<String> {
    let mut tail = VecDeque::with_capacity(keep);
    for line in BufReader::new(pipe).lines().map_while(Result::ok) {
        if line.trim().is_empty() {
            continue;
        }
        info!(target: "detbench::bridge", phase, "{line}");
        if tail.len() >= keep {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail
}

impl Trainer for CommandTrainer {
    fn train(&self, request: &TrainRequest<'_>) -> Result<TrainedArtifact, TrainerError> {
        self.invoke("train", &Self::train_args(request))
    }

    fn evaluate(
        &self,
        artifact: &TrainedArtifact,
        dataset: &Path,
        split: &str,
    ) -> Result<EvalMetrics, TrainerError> {
        let args = [
            "evaluate".to_string(),
            "--weights".to_string(),
            artifact.weights.clone(),
            "--data".to_string(),
            dataset.display().to_string(),
            "--split".to_string(),
            split.to_string(),
        ];
        self.invoke("evaluate", &args)
    }

    fn introspect(&self, artifact: &TrainedArtifact) -> Option<ModelInfo> {
        let args = [
            "info".to_string(),
            "--weights".to_string(),
            artifact.weights.clone(),
        ];
        match self.invoke::<ModelInfo>("info", &args) {
            Ok(info) => Some(info),
            Err(e) => {
                debug!(error = %e, "Model introspection unavailable");
                None
            }
        }
    }
}
