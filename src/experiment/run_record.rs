//! Run Record - lifecycle state and final outcome of one model run

use super::{ModelSpec, RunMetrics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a single model run.
///
/// `Pending -> Training -> Validating -> Succeeded`, with `Failed`
/// reachable from `Training` and `Validating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Queued, not started.
    Pending,
    /// Trainer call in flight.
    Training,
    /// Evaluator call in flight.
    Validating,
    /// Metrics extracted.
    Succeeded,
    /// Trainer or evaluator returned an error.
    Failed,
}

impl RunState {
    /// True for `Succeeded` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Check whether `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Training)
                | (Self::Training, Self::Validating | Self::Failed)
                | (Self::Validating, Self::Succeeded | Self::Failed)
        )
    }
}

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Trained and validated.
    Succeeded,
    /// Training or validation failed.
    Failed,
}

/// Phase in which a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailedPhase {
    /// Trainer error.
    Training,
    /// Evaluator error.
    Validating,
}

/// Outcome of one model run, created exactly once per registry entry.
///
/// `metrics` is present iff the run succeeded; `failure_reason` iff it failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    model: ModelSpec,
    registry_index: usize,
    status: RunStatus,
    metrics: Option<RunMetrics>,
    failure_reason: Option<String>,
    failed_phase: Option<FailedPhase>,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
}

impl RunOutcome {
    /// Build a successful outcome.
    #[must_use]
    pub fn succeeded(
        model: ModelSpec,
        registry_index: usize,
        metrics: RunMetrics,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            model,
            registry_index,
            status: RunStatus::Succeeded,
            metrics: Some(metrics),
            failure_reason: None,
            failed_phase: None,
            started_at,
            ended_at: Utc::now(),
        }
    }

    /// Build a failed outcome.
    #[must_use]
    pub fn failed(
        model: ModelSpec,
        registry_index: usize,
        phase: FailedPhase,
        reason: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            model,
            registry_index,
            status: RunStatus::Failed,
            metrics: None,
            failure_reason: Some(reason.into()),
            failed_phase: Some(phase),
            started_at,
            ended_at: Utc::now(),
        }
    }

    /// Model this run belongs to.
    #[must_use]
    pub const fn model(&self) -> &ModelSpec {
        &self.model
    }

    /// Position of the model in the registry (tie-break key).
    #[must_use]
    pub const fn registry_index(&self) -> usize {
        self.registry_index
    }

    /// Final status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// True if the run succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    /// Metrics, present iff succeeded.
    #[must_use]
    pub const fn metrics(&self) -> Option<&RunMetrics> {
        self.metrics.as_ref()
    }

    /// Failure reason, present iff failed.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Phase that failed, present iff failed.
    #[must_use]
    pub const fn failed_phase(&self) -> Option<FailedPhase> {
        self.failed_phase
    }

    /// When training started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the outcome was recorded.
    #[must_use]
    pub const fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }
}
