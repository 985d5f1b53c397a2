//! Ordered execution of weighted steps

use super::progress::{Progress, ProgressFactory, ProgressUpdate};
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

/// One step of a pipeline; identified by its position
#[async_trait]
pub trait ToolRunner: Send + Sync {
    fn description(&self) -> String;

    async fn run(&self, progress: &dyn Progress) -> Result<()>;
}

#[derive(Debug)]
pub struct StepFailure {
    pub index: usize,
    pub description: String,
    pub error: Error,
}

/// What a finished run did; failures only appear when errors were tolerated
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub completed: usize,
    pub failures: Vec<StepFailure>,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct PipelinedToolRunner {
    steps: Vec<Box<dyn ToolRunner>>,
    inner_progress: Box<dyn ProgressFactory>,
    weights: Vec<f64>,
    continue_on_error: bool,
}

impl PipelinedToolRunner {
    /// Fails when explicit weights do not match the number of steps
    pub fn new(
        steps: Vec<Box<dyn ToolRunner>>,
        inner_progress: impl ProgressFactory + 'static,
        weights: Option<Vec<f64>>,
        continue_on_error: bool,
    ) -> Result<Self> {
        let weights = match weights {
            Some(weights) if weights.len() != steps.len() => {
                return Err(Error::InvalidPipeline(format!(
                    "{} weights given for {} steps",
                    weights.len(),
                    steps.len()
                )));
            }
            Some(weights) => weights,
            None => equal_weights(steps.len()),
        };

        Ok(Self { steps, inner_progress: Box::new(inner_progress), weights, continue_on_error })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order
    ///
    /// Without `continue_on_error` the first failing step's error is returned
    /// and no later step runs.
    pub async fn run(&self, progress: &dyn Progress) -> Result<PipelineReport> {
        let total = self.steps.len();
        let mut report = PipelineReport::default();

        for (index, (step, weight)) in self.steps.iter().zip(&self.weights).enumerate() {
            let description = step.description();
            let tag = format!("[{}/{}]", index + 1, total);
            progress.report(ProgressUpdate::message(format!("{} {}", tag, description)));

            let inner = self.inner_progress.create(progress, index, total);
            match step.run(inner.as_ref()).await {
                Ok(()) => {
                    debug!("{} {} finished", tag, description);
                    report.completed += 1;
                    progress.report(ProgressUpdate::increment(*weight));
                }
                Err(error) => {
                    warn!("{} {} failed: {}", tag, description, error);
                    progress.report(ProgressUpdate::message(format!("{} {} failed: {}", tag, description, error)));
                    if !self.continue_on_error {
                        return Err(error);
                    }
                    report.failures.push(StepFailure { index, description, error });
                }
            }
        }

        Ok(report)
    }
}

/// Equal shares summing to 100
pub fn equal_weights(steps: usize) -> Vec<f64> {
    if steps == 0 {
        return Vec::new();
    }
    vec![100.0 / steps as f64; steps]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::progress::{NestedProgressFactory, RecordedProgress, SilentProgress};
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Step {
        name: &'static str,
        fail: bool,
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ToolRunner for Step {
        fn description(&self) -> String {
            self.name.to_string()
        }

        async fn run(&self, progress: &dyn Progress) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            progress.report(ProgressUpdate::message(format!("inside {}", self.name)));
            if self.fail {
                return Err(Error::Precondition(format!("{} broke", self.name)));
            }
            Ok(())
        }
    }

    fn steps(failing: Option<usize>, count: usize) -> (Vec<Box<dyn ToolRunner>>, Vec<Arc<AtomicUsize>>) {
        const NAMES: [&str; 4] = ["configure", "build", "analyze", "patch"];
        let counters: Vec<_> = (0..count).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let steps = counters
            .iter()
            .enumerate()
            .map(|(i, runs)| {
                Box::new(Step { name: NAMES[i % NAMES.len()], fail: failing == Some(i), runs: runs.clone() })
                    as Box<dyn ToolRunner>
            })
            .collect();
        (steps, counters)
    }

    fn run_counts(counters: &[Arc<AtomicUsize>]) -> Vec<usize> {
        counters.iter().map(|c| c.load(Ordering::SeqCst)).collect()
    }

    #[tokio::test]
    async fn test_equal_split_for_three_steps() {
        let (steps, _) = steps(None, 3);
        let runner = PipelinedToolRunner::new(steps, SilentProgress, None, false).unwrap();
        let progress = RecordedProgress::new();

        let report = runner.run(&progress).await.unwrap();

        assert_eq!(report.completed, 3);
        let increments = progress.increments();
        assert_eq!(increments.len(), 3);
        for increment in increments {
            assert!((increment - 100.0 / 3.0).abs() < 1e-9);
        }
        assert_eq!(progress.messages(), vec!["[1/3] configure", "[2/3] build", "[3/3] analyze"]);
    }

    #[test]
    fn test_mismatched_weights_fail_at_construction() {
        let (steps, counters) = steps(None, 3);
        let result = PipelinedToolRunner::new(steps, SilentProgress, Some(vec![50.0, 50.0]), false);

        assert!(matches!(result, Err(Error::InvalidPipeline(_))));
        assert_eq!(run_counts(&counters), vec![0, 0, 0]);
    }

    #[tokio::test]
    async fn test_fail_fast_stops_after_failing_step() {
        let (steps, counters) = steps(Some(1), 4);
        let runner = PipelinedToolRunner::new(steps, SilentProgress, None, false).unwrap();
        let progress = RecordedProgress::new();

        let err = runner.run(&progress).await.unwrap_err();

        assert_eq!(err.to_string(), "Precondition failed: build broke");
        assert_eq!(run_counts(&counters), vec![1, 1, 0, 0]);
        assert_eq!(progress.increments(), vec![25.0]);
    }

    #[tokio::test]
    async fn test_continue_on_error_attempts_every_step() {
        let (steps, counters) = steps(Some(1), 4);
        let runner = PipelinedToolRunner::new(steps, SilentProgress, None, true).unwrap();
        let progress = RecordedProgress::new();

        let report = runner.run(&progress).await.unwrap();

        assert_eq!(run_counts(&counters), vec![1, 1, 1, 1]);
        assert_eq!(report.completed, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert!(progress.messages().contains(&"[2/4] build failed: Precondition failed: build broke".to_string()));
    }

    #[tokio::test]
    async fn test_explicit_weights_and_nested_messages() {
        let (steps, _) = steps(None, 2);
        let runner =
            PipelinedToolRunner::new(steps, NestedProgressFactory, Some(vec![80.0, 20.0]), false).unwrap();
        let progress = RecordedProgress::new();

        runner.run(&progress).await.unwrap();

        assert_eq!(progress.increments(), vec![80.0, 20.0]);
        assert_eq!(
            progress.messages(),
            vec!["[1/2] configure", "[1/2]   inside configure", "[2/2] build", "[2/2]   inside build"]
        );
    }

    proptest! {
        #[test]
        fn prop_equal_weights_sum_to_hundred(steps in 1usize..64) {
            let weights = equal_weights(steps);
            prop_assert_eq!(weights.len(), steps);
            prop_assert!((weights.iter().sum::<f64>() - 100.0).abs() < 1e-6);
            prop_assert!(weights.windows(2).all(|pair| pair[0] == pair[1]));
        }
    }
}
