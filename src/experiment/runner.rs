//! Experiment Runner - sequential, failure-isolated benchmark loop
//!
//! Runs execute one at a time in registry order: the trainer assumes
//! exclusive ownership of the accelerator for the whole call. A failing run
//! becomes a [`RunOutcome`] with a reason and the loop moves on; no single
//! model can abort the batch.

use super::{
    FailedPhase, ModelSpec, ModelRegistry, ResultsAggregator, RunMetrics, RunOutcome, RunState,
    TrainRequest, Trainer,
};
use crate::config::SessionConfig;
use chrono::Utc;
use tracing::{error, info, info_span, warn};

/// Counts for one benchmark session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Runs started
    pub attempted: usize,
    /// Runs that produced metrics
    pub succeeded: usize,
    /// Runs that failed
    pub failed: usize,
}

impl RunSummary {
    /// True if at least one run succeeded.
    #[must_use]
    pub const fn any_succeeded(&self) -> bool {
        self.succeeded > 0
    }
}

/// Drives every registered model through a [`Trainer`].
#[derive(Debug)]
pub struct ExperimentRunner<'a, T> {
    config: &'a SessionConfig,
    trainer: T,
}

impl<'a, T: Trainer> ExperimentRunner<'a, T> {
    /// Create a runner for one session.
    pub const fn new(config: &'a SessionConfig, trainer: T) -> Self {
        Self { config, trainer }
    }

    /// Run every model in `registry`, streaming each outcome into
    /// `aggregator` as soon as it is known.
    pub fn run(&self, registry: &ModelRegistry, aggregator: &mut ResultsAggregator) -> RunSummary {
        let mut summary = RunSummary::default();
        let total = registry.len();
        info!(
            session = %self.config.session(),
            profile = %self.config.profile().label(),
            models = total,
            "Starting benchmark session"
        );

        for (index, spec) in registry.iter().enumerate() {
            let _span = info_span!("run", model = %spec.display_name()).entered();
            info!(
                weights = %spec.weight_reference(),
                position = index + 1,
                total,
                "Starting model"
            );

            let outcome = self.run_one(index, spec);
            summary.attempted += 1;
            if outcome.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }

            if let Err(e) = aggregator.record(outcome) {
                warn!(error = %e, "Outcome not recorded");
            }
        }

        info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Benchmark session finished"
        );
        summary
    }

    fn run_one(&self, index: usize, spec: &ModelSpec) -> RunOutcome {
        let started_at = Utc::now();
        let name = spec.display_name();
        let mut state = RunState::Pending;

        advance(&mut state, RunState::Training, name);
        let request = TrainRequest {
            weights: spec.weight_reference(),
            dataset: self.config.dataset(),
            hyperparameters: self.config.profile(),
            run_name: name,
            project: self.config.session(),
        };
        let artifact = match self.trainer.train(&request) {
            Ok(artifact) => artifact,
            Err(e) => {
                advance(&mut state, RunState::Failed, name);
                error!(model = %name, error = %e, "Training failed, skipping to next model");
                return RunOutcome::failed(spec.clone(), index, FailedPhase::Training, e.to_string(), started_at);
            }
        };

        advance(&mut state, RunState::Validating, name);
        let eval = match self
            .trainer
            .evaluate(&artifact, self.config.dataset(), self.config.split())
        {
            Ok(eval) => eval,
            Err(e) => {
                advance(&mut state, RunState::Failed, name);
                error!(model = %name, error = %e, "Validation failed, skipping to next model");
                return RunOutcome::failed(spec.clone(), index, FailedPhase::Validating, e.to_string(), started_at);
            }
        };

        let info = self.trainer.introspect(&artifact).unwrap_or_default();
        let metrics = RunMetrics::new(eval.map50, eval.map50_95, eval.precision, eval.recall)
            .with_model_info(info.params, info.flops);

        advance(&mut state, RunState::Succeeded, name);
        info!(model = %name, map50 = eval.map50, weights = %artifact.weights, "Model finished");
        RunOutcome::succeeded(spec.clone(), index, metrics, started_at)
    }
}

fn advance(state: &mut RunState, next: RunState, model: &str) {
    debug_assert!(state.can_transition_to(next), "{state:?} -> {next:?}");
    let message = if next.is_terminal() { "Run settled" } else { "Run state" };
    info!(model, from = ?*state, to = ?next, "{message}");
    *state = next;
}
