mod batch;
mod cancel;
mod progress;
mod stage;

use std::{thread, time::Duration};

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::LoaderConfig;
use crate::feature::FeatureRecord;
use crate::intersect::ZoneSet;
use crate::layer::{Graphic, Layer};
use crate::panel::LayerSpec;

pub use batch::{batch_size, batches, num_batches};
pub use cancel::{CancelToken, Cancelled};
pub use progress::{ProgressEvent, ProgressRange, ProgressReporter, ProgressSink};
pub use stage::{LoadState, StageMachine};

/// Outcome of loading one collection into a layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub layer: String,
    pub total: usize,    // Records in the collection
    pub added: usize,    // Graphics added to the layer
    pub skipped: usize,  // Malformed records
    pub filtered: usize, // Well-formed records outside the zone set
    pub batches: usize,
}

/// Builds a layer from raw records in fixed batches, pausing between batches.
pub struct BatchLoader<'a> {
    batch_count: usize,
    yield_delay: Duration,
    cancel: &'a CancelToken,
}

impl<'a> BatchLoader<'a> {
    pub fn new(config: &LoaderConfig, cancel: &'a CancelToken) -> Self {
        Self { batch_count: config.batch_count, yield_delay: config.yield_delay(), cancel }
    }

    /// Load `records` into a new layer named after `spec`.
    ///
    /// Malformed records are skipped and counted. When `zones` is given, only records whose
    /// anchor lies inside a zone are kept. `on_batch(done, total)` runs after every batch,
    /// and once with `(0, 0)` for an empty collection. The cancel token is checked before
    /// each batch.
    pub fn load(
        &self,
        spec: &LayerSpec,
        records: &[Value],
        zones: Option<&ZoneSet>,
        on_batch: &mut dyn FnMut(usize, usize),
    ) -> Result<(Layer, LoadReport)> {
        let mut layer = Layer::new(spec.name.as_str());
        let mut report = LoadReport { layer: spec.name.clone(), total: records.len(), ..Default::default() };

        let size = batch_size(records.len(), self.batch_count);
        let total_batches = num_batches(records.len(), self.batch_count);

        for (b, batch) in records.chunks(size).enumerate() {
            self.cancel.check()?;

            for (offset, value) in batch.iter().enumerate() {
                let rec = match FeatureRecord::from_value(b * size + offset, value, &spec.geometry_field) {
                    Ok(rec) => rec,
                    Err(e) => {
                        trace!(layer = %spec.name, "skipping record: {e:#}");
                        report.skipped += 1;
                        continue;
                    }
                };

                if let Some(zones) = zones {
                    if !zones.matches(&rec.shape, spec.anchor) {
                        report.filtered += 1;
                        continue;
                    }
                }

                let style = spec.style.style(&rec);
                let popup = spec.popup.render(&rec);
                layer.add(Graphic { feature: rec.index, primitive: rec.shape.into(), style, popup });
                report.added += 1;
            }

            report.batches += 1;
            on_batch(b + 1, total_batches);
            debug!(layer = %spec.name, batch = b + 1, of = total_batches, features = layer.len(), "batch loaded");

            if !self.yield_delay.is_zero() { thread::sleep(self.yield_delay) }
        }

        if records.is_empty() { on_batch(0, 0) }

        Ok((layer, report))
    }
}
