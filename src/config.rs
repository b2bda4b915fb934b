//! Session configuration
//!
//! One YAML file describes a whole benchmark session. It is loaded once,
//! resolved against its own directory, and passed by reference to the
//! runner and the exporter.
//!
//! ```yaml
//! session: YOLO_Benchmark          # project name; outputs land under it
//! dataset: data.yaml               # dataset descriptor
//! output: benchmark_results.csv    # written to <output_dir>/<output>
//! profile: baseline-v1             # hyperparameter preset
//! hyperparameters:                 # optional overrides, applied in order
//!   epochs: 100
//!   device: cpu
//! models:                          # run order = document order
//!   YOLOv8n: yolov8n.pt
//!   YOLOv11n: yolo11n.pt
//! trainer:
//!   program: detbench-bridge
//!   args: []
//! ```

use crate::experiment::{
    CommandTrainer, HyperparameterOverrides, HyperparameterProfile, ModelRegistry,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default CSV file name.
pub const DEFAULT_OUTPUT: &str = "benchmark_results.csv";

/// Default hyperparameter preset.
pub const DEFAULT_PROFILE: &str = "baseline-v1";

/// Default bridge program for [`CommandTrainer`].
pub const DEFAULT_TRAINER_PROGRAM: &str = "detbench-bridge";

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

fn default_split() -> String {
    "val".to_string()
}

/// External trainer invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Bridge program (looked up on `PATH` unless a path)
    #[serde(default = "default_program")]
    pub program: PathBuf,
    /// Arguments placed before the phase subcommand
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_program() -> PathBuf {
    PathBuf::from(DEFAULT_TRAINER_PROGRAM)
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSessionConfig {
    session: String,
    dataset: PathBuf,
    #[serde(default = "default_output")]
    output: String,
    #[serde(default)]
    output_dir: Option<PathBuf>,
    #[serde(default = "default_profile")]
    profile: String,
    #[serde(default)]
    hyperparameters: HyperparameterOverrides,
    models: ModelRegistry,
    #[serde(default)]
    trainer: TrainerConfig,
    #[serde(default = "default_split")]
    split: String,
}

/// Everything one benchmark session needs, resolved and immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    session: String,
    base_dir: PathBuf,
    dataset: PathBuf,
    export_path: PathBuf,
    profile: HyperparameterProfile,
    models: ModelRegistry,
    trainer: TrainerConfig,
    split: String,
}

impl SessionConfig {
    /// Build a config in code. Export goes to `<session>/benchmark_results.csv`.
    #[must_use]
    pub fn new(
        session: impl Into<String>,
        dataset: impl Into<PathBuf>,
        profile: HyperparameterProfile,
    ) -> Self {
        let session = session.into();
        Self {
            export_path: PathBuf::from(&session).join(DEFAULT_OUTPUT),
            session,
            base_dir: PathBuf::from("."),
            dataset: dataset.into(),
            profile,
            models: ModelRegistry::new(),
            trainer: TrainerConfig::default(),
            split: default_split(),
        }
    }

    /// Replace the model registry.
    #[must_use]
    pub fn with_models(mut self, models: ModelRegistry) -> Self {
        self.models = models;
        self
    }

    /// Replace the export path.
    #[must_use]
    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = path.into();
        self
    }

    /// Load a session file.
    ///
    /// Relative paths resolve against the file's directory, made absolute
    /// first so the result does not depend on the trainer's working
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file is missing or invalid,
    /// the preset is unknown, no model is registered, or the dataset
    /// descriptor does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("cannot read session config {}: {e}", path.display()))
        })?;
        // must be absolute: the trainer also runs from base_dir
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let base_dir = std::path::absolute(parent).map_err(|e| {
            Error::configuration(format!("cannot resolve {}: {e}", parent.display()))
        })?;

        let config = Self::from_yaml(&contents, base_dir)?;
        if !config.dataset.is_file() {
            return Err(Error::configuration(format!(
                "dataset descriptor {} not found",
                config.dataset.display()
            )));
        }
        Ok(config)
    }

    /// Parse session YAML, resolving relative paths against `base_dir`.
    ///
    /// # Errors
    ///
    /// Same as [`SessionConfig::load`], except the dataset file is not checked.
    pub fn from_yaml(contents: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        let raw: RawSessionConfig = serde_yaml::from_str(contents)
            .map_err(|e| Error::configuration(format!("invalid session config: {e}")))?;

        if raw.session.trim().is_empty() {
            return Err(Error::configuration("session name must not be empty"));
        }
        if raw.models.is_empty() {
            return Err(Error::configuration("no models registered"));
        }
        if Path::new(&raw.output).file_name().is_none() {
            return Err(Error::configuration(format!(
                "output {:?} is not a file name",
                raw.output
            )));
        }

        let profile =
            HyperparameterProfile::preset(&raw.profile)?.with_overrides(raw.hyperparameters.0);
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { base_dir.join(p) };
        let output_dir = resolve(raw.output_dir.unwrap_or_else(|| PathBuf::from(&raw.session)));

        Ok(Self {
            dataset: resolve(raw.dataset),
            export_path: output_dir.join(&raw.output),
            session: raw.session,
            profile,
            models: raw.models,
            trainer: raw.trainer,
            split: raw.split,
            base_dir,
        })
    }

    /// Session (project) name.
    #[must_use]
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Directory the config was resolved against.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Dataset descriptor path.
    #[must_use]
    pub fn dataset(&self) -> &Path {
        &self.dataset
    }

    /// Where the ranked CSV is written.
    #[must_use]
    pub fn export_path(&self) -> &Path {
        &self.export_path
    }

    /// Shared hyperparameter profile.
    #[must_use]
    pub const fn profile(&self) -> &HyperparameterProfile {
        &self.profile
    }

    /// Models in run order.
    #[must_use]
    pub const fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Trainer invocation settings.
    #[must_use]
    pub const fn trainer(&self) -> &TrainerConfig {
        &self.trainer
    }

    /// Split used for validation.
    #[must_use]
    pub fn split(&self) -> &str {
        &self.split
    }

    /// Build the subprocess trainer described by this config, run from
    /// [`SessionConfig::base_dir`].
    #[must_use]
    pub fn command_trainer(&self) -> CommandTrainer {
        CommandTrainer::new(self.trainer.program.clone(), self.trainer.args.clone())
            .working_dir(&self.base_dir)
    }
}
