use std::sync::Arc;

/// Progress update published to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub stage: String,
    pub percent: f64, // 0-100 across the whole staged load
}

/// Host callback receiving progress updates.
pub type ProgressSink = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// A slice `[start, end]` of the 0-100 progress scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressRange {
    pub start: f64,
    pub end: f64,
}

impl ProgressRange {
    pub const FULL: ProgressRange = ProgressRange { start: 0.0, end: 100.0 };

    pub fn new(start: f64, end: f64) -> Self { Self { start, end } }

    /// Split into `parts` equal consecutive ranges; the last one ends exactly at `end`.
    pub fn split(&self, parts: usize) -> Vec<ProgressRange> {
        let width = (self.end - self.start) / parts.max(1) as f64;
        (0..parts)
            .map(|i| ProgressRange {
                start: self.start + width * i as f64,
                end: if i + 1 == parts { self.end } else { self.start + width * (i + 1) as f64 },
            })
            .collect()
    }

    /// Value after `done` of `total` steps. Completion (or an empty total) maps exactly to `end`.
    pub fn at(&self, done: usize, total: usize) -> f64 {
        if total == 0 || done >= total { return self.end }
        self.start + (self.end - self.start) * done as f64 / total as f64
    }
}

/// Publishes a stage's progress, never letting the value go backwards.
pub struct ProgressReporter {
    stage: String,
    sink: Option<ProgressSink>,
    last: f64,
}

impl ProgressReporter {
    pub fn new(stage: impl Into<String>, sink: Option<ProgressSink>, start: f64) -> Self {
        Self { stage: stage.into(), sink, last: start }
    }

    #[inline] pub fn last(&self) -> f64 { self.last }

    /// Publish `value`, clamped so the sequence is non-decreasing.
    pub fn publish(&mut self, value: f64) -> f64 {
        self.last = self.last.max(value);
        if let Some(sink) = &self.sink {
            sink(&ProgressEvent { stage: self.stage.clone(), percent: self.last });
        }
        self.last
    }
}
