//! Progress reporting for pipelined steps

use std::sync::Mutex;

/// A message, a progress increment, or both
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    pub message: Option<String>,
    /// Percentage points added to the running total
    pub increment: Option<f64>,
}

impl ProgressUpdate {
    pub fn message(message: impl Into<String>) -> Self {
        Self { message: Some(message.into()), increment: None }
    }

    pub fn increment(increment: f64) -> Self {
        Self { message: None, increment: Some(increment) }
    }
}

pub trait Progress: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Builds the progress reporter a step runs with
pub trait ProgressFactory: Send + Sync {
    fn create<'a>(&self, outer: &'a dyn Progress, index: usize, total: usize) -> Box<dyn Progress + 'a>;
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

impl ProgressFactory for SilentProgress {
    fn create<'a>(&self, _outer: &'a dyn Progress, _index: usize, _total: usize) -> Box<dyn Progress + 'a> {
        Box::new(SilentProgress)
    }
}

/// Forwards a step's messages to the outer reporter under the step tag
///
/// Increments are dropped: the runner accounts for the step as a whole.
pub struct NestedProgress<'a> {
    outer: &'a dyn Progress,
    tag: String,
}

impl<'a> NestedProgress<'a> {
    pub fn new(outer: &'a dyn Progress, index: usize, total: usize) -> Self {
        Self { outer, tag: format!("[{}/{}]", index + 1, total) }
    }
}

impl Progress for NestedProgress<'_> {
    fn report(&self, update: ProgressUpdate) {
        if let Some(message) = update.message {
            self.outer.report(ProgressUpdate::message(format!("{}   {}", self.tag, message)));
        }
    }
}

/// Factory for [`NestedProgress`]
#[derive(Debug, Clone, Copy, Default)]
pub struct NestedProgressFactory;

impl ProgressFactory for NestedProgressFactory {
    fn create<'a>(&self, outer: &'a dyn Progress, index: usize, total: usize) -> Box<dyn Progress + 'a> {
        Box::new(NestedProgress::new(outer, index, total))
    }
}

/// Keeps every update, in order
#[derive(Debug, Default)]
pub struct RecordedProgress {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl RecordedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.updates().into_iter().filter_map(|update| update.message).collect()
    }

    pub fn increments(&self) -> Vec<f64> {
        self.updates().into_iter().filter_map(|update| update.increment).collect()
    }
}

impl Progress for RecordedProgress {
    fn report(&self, update: ProgressUpdate) {
        self.updates.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_progress_tags_messages_and_drops_increments() {
        let outer = RecordedProgress::new();
        let nested = NestedProgressFactory.create(&outer, 1, 3);

        nested.report(ProgressUpdate::message("linking"));
        nested.report(ProgressUpdate::increment(50.0));

        assert_eq!(outer.messages(), vec!["[2/3]   linking"]);
        assert!(outer.increments().is_empty());
    }

    #[test]
    fn test_silent_progress() {
        let outer = RecordedProgress::new();
        SilentProgress.create(&outer, 0, 1).report(ProgressUpdate::message("ignored"));
        assert!(outer.updates().is_empty());
    }
}
