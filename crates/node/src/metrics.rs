use std::{ops::Deref, sync::Arc, time::Duration};

use blobcast_types::submission::SubmissionStage;
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{
        counter::Counter,
        family::Family,
        histogram::{Histogram, exponential_buckets, linear_buckets},
    },
    registry::Registry,
};

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StageLabel {
    pub stage: String,
}

#[derive(Clone, Debug)]
pub struct SubmissionMetrics(Arc<Inner>);

impl Deref for SubmissionMetrics {
    type Target = Inner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub struct Inner {
    started: Counter,
    succeeded: Counter,
    failed: Counter,
    stage_transitions: Family<StageLabel, Counter>,

    submission_time: Histogram,
    commitment_time: Histogram,
    confirmation_attempts: Histogram,
}

impl Inner {
    pub fn new() -> Self {
        Self {
            started: Counter::default(),
            succeeded: Counter::default(),
            failed: Counter::default(),
            stage_transitions: Family::default(),

            // 0.5s .. ~8.5min
            submission_time: Histogram::new(exponential_buckets(0.5, 2.0, 11)),
            commitment_time: Histogram::new(exponential_buckets(0.001, 2.0, 10)),
            confirmation_attempts: Histogram::new(linear_buckets(1.0, 3.0, 10)),
        }
    }
}

impl Default for Inner {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionMetrics {
    pub fn new() -> Self {
        Self(Arc::new(Inner::new()))
    }

    pub fn register(registry: &mut Registry) -> Self {
        let metrics = Self::new();
        let registry = registry.sub_registry_with_prefix("blobcast");

        registry.register(
            "submissions_started",
            "Submission requests that passed input validation",
            metrics.started.clone(),
        );
        registry.register(
            "submissions_succeeded",
            "Submissions whose blob transaction was broadcast",
            metrics.succeeded.clone(),
        );
        registry.register(
            "submissions_failed",
            "Submissions that ended in an error",
            metrics.failed.clone(),
        );
        registry.register(
            "stage_transitions",
            "Submission stage transitions by target stage",
            metrics.stage_transitions.clone(),
        );
        registry.register(
            "submission_time",
            "End-to-end submission time (seconds)",
            metrics.submission_time.clone(),
        );
        registry.register(
            "commitment_time",
            "Time to commit, prove and self-verify a blob (seconds)",
            metrics.commitment_time.clone(),
        );
        registry.register(
            "confirmation_attempts",
            "Receipt polls needed to confirm a transaction",
            metrics.confirmation_attempts.clone(),
        );

        metrics
    }

    pub fn record_started(&self) {
        self.started.inc();
    }

    pub fn record_succeeded(&self, elapsed: Duration) {
        self.succeeded.inc();
        self.submission_time.observe(elapsed.as_secs_f64());
    }

    pub fn record_failed(&self, elapsed: Duration) {
        self.failed.inc();
        self.submission_time.observe(elapsed.as_secs_f64());
    }

    pub fn record_stage(&self, stage: SubmissionStage) {
        self.stage_transitions.get_or_create(&StageLabel { stage: stage.as_str().to_owned() }).inc();
    }

    pub fn observe_commitment_time(&self, duration: Duration) {
        self.commitment_time.observe(duration.as_secs_f64());
    }

    pub fn observe_confirmation_attempts(&self, attempts: u32) {
        self.confirmation_attempts.observe(attempts as f64);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            started: self.started.get(),
            succeeded: self.succeeded.get(),
            failed: self.failed.get(),
        }
    }

    pub fn stage_count(&self, stage: SubmissionStage) -> u64 {
        self.stage_transitions.get_or_create(&StageLabel { stage: stage.as_str().to_owned() }).get()
    }
}

impl Default for SubmissionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
}
